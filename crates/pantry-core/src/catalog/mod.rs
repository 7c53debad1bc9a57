//! Canonical food catalog
//!
//! A catalog is an ordered, immutable list of [`CatalogEntry`] values. The
//! order matters: the matcher walks it front to back and stops at the first
//! entry that qualifies.

mod data;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

pub use data::BUILTIN_ENTRIES;

/// A canonical food with its baseline shelf life and known aliases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub canonical_name: String,
    pub baseline_shelf_life_days: u32,
    pub aliases: BTreeSet<String>,
}

impl CatalogEntry {
    /// Create an entry. The canonical name is always one of its aliases and
    /// aliases are stored lowercased.
    pub fn new<I, S>(canonical_name: &str, baseline_shelf_life_days: u32, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: BTreeSet<String> = aliases
            .into_iter()
            .map(|alias| alias.as_ref().trim().to_lowercase())
            .filter(|alias| !alias.is_empty())
            .collect();
        set.insert(canonical_name.trim().to_lowercase());

        Self {
            canonical_name: canonical_name.trim().to_string(),
            baseline_shelf_life_days: baseline_shelf_life_days.max(1),
            aliases: set,
        }
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(String::as_str)
    }
}

/// Ordered collection of catalog entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

static BUILTIN: LazyLock<Catalog> = LazyLock::new(|| {
    Catalog::from_entries(
        BUILTIN_ENTRIES
            .iter()
            .map(|(name, days, aliases)| CatalogEntry::new(name, *days, aliases.iter())),
    )
});

impl Catalog {
    /// The catalog compiled into the binary, built on first access
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn from_entries<I: IntoIterator<Item = CatalogEntry>>(entries: I) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact, case-insensitive lookup by canonical name
    pub fn find(&self, canonical_name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| entry.canonical_name.eq_ignore_ascii_case(canonical_name))
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

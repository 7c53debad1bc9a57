use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{Catalog, CatalogEntry};

/// Compiled-in catalog: (canonical name, baseline shelf life in days, aliases)
pub const BUILTIN_ENTRIES: &[(&str, u32, &[&str])] = &[
    ("banana", 7, &["bananas", "plantain"]),
    ("apple", 30, &["apples", "green apple", "red apple"]),
    ("orange", 21, &["oranges", "mandarin", "tangerine"]),
    ("broccoli", 7, &["broccolis", "broccoli florets"]),
    ("carrot", 21, &["carrots", "baby carrots"]),
    ("sandwich", 2, &["sandwiches", "sub", "wrap"]),
    ("hot dog", 7, &["hotdog", "hot dogs", "sausage", "frankfurter"]),
    ("pizza", 4, &["pizzas", "pizza slice"]),
    ("donut", 3, &["donuts", "doughnut", "doughnuts"]),
    ("cake", 5, &["cakes", "cupcake", "cheesecake"]),
];

impl Catalog {
    /// Load a catalog from a text file.
    ///
    /// One entry per line: `canonical name\-baseline days\-alias,alias,...`.
    /// The alias part may be omitted. Blank lines and `#` comments are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Catalog> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open catalog: {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| {
                format!("Failed to read line {} from {}", line_num + 1, path.display())
            })?;

            if let Some(entry) = parse_line(&line, line_num + 1)? {
                entries.push(entry);
            }
        }

        tracing::info!(
            entries = entries.len(),
            path = %path.display(),
            "Loaded food catalog"
        );
        Ok(Catalog::from_entries(entries))
    }

    /// Parse catalog lines held in memory, same format as [`Catalog::load`]
    pub fn parse_str(contents: &str) -> Result<Catalog> {
        let mut entries = Vec::new();
        for (line_num, line) in contents.lines().enumerate() {
            if let Some(entry) = parse_line(line, line_num + 1)? {
                entries.push(entry);
            }
        }
        Ok(Catalog::from_entries(entries))
    }
}

fn parse_line(line: &str, line_num: usize) -> Result<Option<CatalogEntry>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split(r"\-").map(|s| s.trim()).collect();

    if parts.len() < 2 || parts[0].is_empty() {
        tracing::warn!(
            line = line_num,
            content = line,
            "Invalid catalog line (expected name\\-days\\-aliases), skipping"
        );
        return Ok(None);
    }

    let days = parts[1]
        .parse::<u32>()
        .with_context(|| format!("Invalid shelf life at line {}: '{}'", line_num, parts[1]))?;
    if days == 0 {
        anyhow::bail!("Shelf life must be at least one day at line {}", line_num);
    }

    let aliases: Vec<&str> = parts
        .get(2)
        .map(|raw| raw.split(',').map(str::trim).collect())
        .unwrap_or_default();

    Ok(Some(CatalogEntry::new(parts[0], days, aliases)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_str() -> Result<()> {
        let catalog = Catalog::parse_str(
            "# pantry staples\n\nmilk\\-7\\-whole milk, skim milk\nbread\\-5\n",
        )?;

        assert_eq!(catalog.len(), 2);
        let milk = &catalog.entries()[0];
        assert_eq!(milk.canonical_name, "milk");
        assert_eq!(milk.baseline_shelf_life_days, 7);
        assert!(milk.aliases.contains("skim milk"));
        assert_eq!(catalog.entries()[1].aliases.len(), 1);
        Ok(())
    }

    #[test]
    fn test_malformed_line_skipped() -> Result<()> {
        let catalog = Catalog::parse_str("just a name\neggs\\-21\\-egg")?;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].canonical_name, "eggs");
        Ok(())
    }

    #[test]
    fn test_invalid_days_is_error() {
        let err = Catalog::parse_str("eggs\\-three weeks").unwrap_err();
        assert!(err.to_string().contains("line 1"));
        assert!(Catalog::parse_str("eggs\\-0").is_err());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "yogurt\\-14\\-yoghurt,greek yogurt")?;
        writeln!(file, "cheese\\-28")?;

        let catalog = Catalog::load(file.path())?;
        assert_eq!(catalog.len(), 2);
        assert!(catalog.find("Yogurt").is_some());
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(Catalog::load("/nonexistent/catalog.txt").is_err());
    }
}

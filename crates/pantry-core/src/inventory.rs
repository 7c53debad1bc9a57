//! Inventory record drafts handed to the data store

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::expiry::{ExpiryStatus, format_expiry, remaining_days};
use crate::spoilage::SpoilageAssessment;

/// Product name used when a detection does not resolve to a catalog entry
pub const UNKNOWN_ITEM: &str = "Unknown Item";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemDraft {
    pub product_name: String,
    pub quantity: u32,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub confidence: Option<f64>,
    pub spoilage: Option<SpoilageAssessment>,
}

impl InventoryItemDraft {
    pub fn new(
        product_name: impl Into<String>,
        quantity: u32,
        purchase_date: NaiveDate,
        expiry_date: NaiveDate,
    ) -> Result<Self> {
        let draft = Self {
            product_name: product_name.into(),
            quantity,
            purchase_date,
            expiry_date,
            confidence: None,
            spoilage: None,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Re-check a draft that did not come through [`InventoryItemDraft::new`],
    /// e.g. one deserialized from a file
    pub fn validate(&self) -> Result<()> {
        if self.product_name.trim().is_empty() {
            bail!("Product name must not be empty");
        }
        if self.quantity == 0 {
            bail!("Quantity must be at least 1 (got 0 for '{}')", self.product_name);
        }
        Ok(())
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn with_spoilage(mut self, spoilage: SpoilageAssessment) -> Self {
        self.spoilage = Some(spoilage);
        self
    }

    pub fn is_unknown(&self) -> bool {
        self.product_name == UNKNOWN_ITEM
    }

    pub fn remaining_days(&self, today: NaiveDate) -> i64 {
        remaining_days(self.expiry_date, today)
    }

    pub fn display(&self, today: NaiveDate) -> ExpiryDisplay {
        let remaining = self.remaining_days(today);
        ExpiryDisplay {
            product_name: self.product_name.clone(),
            quantity: self.quantity,
            remaining_days: remaining,
            formatted_expiry: format_expiry(self.expiry_date),
            status: ExpiryStatus::from_remaining(remaining),
        }
    }
}

/// Row shown in an inventory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryDisplay {
    pub product_name: String,
    pub quantity: u32,
    pub remaining_days: i64,
    pub formatted_expiry: String,
    pub status: ExpiryStatus,
}

/// Order drafts by expiry date, soonest first; stable for equal dates
pub fn sort_by_expiry(drafts: &mut [InventoryItemDraft]) {
    drafts.sort_by_key(|draft| draft.expiry_date);
}

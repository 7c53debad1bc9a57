//! Human-readable output for the command line

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pantry_core::expiry::{format_expiry, remaining_days};
use pantry_core::{sort_by_expiry, ExpiryStatus, InventoryItemDraft};
use pantry_cv::{DetectionScan, LabelExtraction};
use std::path::Path;

pub fn print_scan(scan: &DetectionScan, today: NaiveDate) {
    let display = scan.draft.display(today);

    println!("Detected: {}", display.product_name);
    println!(
        "  detector label: {} ({:.0}% confidence, {} attempt(s))",
        scan.detection.label,
        scan.detection.confidence * 100.0,
        scan.attempts
    );
    if let Some(alias) = &scan.matched_alias {
        println!("  catalog alias: {}", alias);
    }
    if scan.low_confidence {
        println!("  warning: best detection stayed below the acceptance confidence");
    }
    if let Some(spoilage) = &scan.draft.spoilage {
        println!(
            "  condition: {} ({:.1}% discoloured)",
            spoilage.level, spoilage.spoilage_percentage
        );
    }
    println!(
        "  expires: {} ({})",
        display.formatted_expiry,
        describe(display.status, display.remaining_days)
    );
    println!("  processed in {}ms", scan.processing_time_ms);
}

pub fn print_label(extraction: &LabelExtraction, today: NaiveDate) {
    let remaining = remaining_days(extraction.expiry_date, today);

    match extraction.extracted.iso_date() {
        Some(date) => println!("Printed expiry: {}", date),
        None => println!("No printed expiry found, using fallback shelf life"),
    }
    if let Some(failure) = &extraction.ocr_failure {
        println!("  OCR failed: {}", failure);
    }
    println!(
        "  expires: {} ({})",
        format_expiry(extraction.expiry_date),
        describe(ExpiryStatus::from_remaining(remaining), remaining)
    );
}

/// Read a JSON array of drafts, applying the same checks as
/// [`InventoryItemDraft::new`] to each
pub fn load_drafts(path: &Path) -> Result<Vec<InventoryItemDraft>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read drafts from {}", path.display()))?;
    let drafts: Vec<InventoryItemDraft> =
        serde_json::from_str(&contents).context("Invalid drafts file")?;

    for (index, draft) in drafts.iter().enumerate() {
        draft
            .validate()
            .with_context(|| format!("Invalid draft #{} in {}", index + 1, path.display()))?;
    }

    Ok(drafts)
}

/// Inventory sorted soonest-expiring first
pub fn print_inventory(mut drafts: Vec<InventoryItemDraft>, today: NaiveDate) {
    if drafts.is_empty() {
        println!("Inventory is empty");
        return;
    }

    sort_by_expiry(&mut drafts);

    let width = drafts
        .iter()
        .map(|draft| draft.product_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Item".len());

    println!("{:<width$}  {:>3}  {:<12}  Status", "Item", "Qty", "Expires");
    for draft in &drafts {
        let display = draft.display(today);
        println!(
            "{:<width$}  {:>3}  {:<12}  {}",
            display.product_name,
            display.quantity,
            display.formatted_expiry,
            describe(display.status, display.remaining_days)
        );
    }
}

fn describe(status: ExpiryStatus, remaining_days: i64) -> String {
    match status {
        ExpiryStatus::Expired => format!("expired {} day(s) ago", -remaining_days),
        ExpiryStatus::ExpiringSoon if remaining_days == 0 => "expires today".to_string(),
        ExpiryStatus::ExpiringSoon => format!("{} day(s) left, use soon", remaining_days),
        ExpiryStatus::Fresh => format!("{} day(s) left", remaining_days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_drafts_rejects_invalid_entries() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("drafts.json");

        std::fs::write(
            &path,
            r#"[{"product_name": "milk", "quantity": 2, "purchase_date": "2024-05-01",
                 "expiry_date": "2024-05-09", "confidence": null, "spoilage": null}]"#,
        )?;
        assert_eq!(load_drafts(&path)?.len(), 1);

        std::fs::write(
            &path,
            r#"[{"product_name": " ", "quantity": 1, "purchase_date": "2024-05-01",
                 "expiry_date": "2024-05-09", "confidence": null, "spoilage": null}]"#,
        )?;
        let err = load_drafts(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid draft #1"));
        Ok(())
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(ExpiryStatus::Expired, -2), "expired 2 day(s) ago");
        assert_eq!(describe(ExpiryStatus::ExpiringSoon, 0), "expires today");
        assert_eq!(describe(ExpiryStatus::ExpiringSoon, 3), "3 day(s) left, use soon");
        assert_eq!(describe(ExpiryStatus::Fresh, 12), "12 day(s) left");
    }
}

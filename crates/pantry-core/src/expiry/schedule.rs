//! Shelf-life scheduling and expiry display helpers

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Shelf life assumed for items the catalog does not know
pub const DEFAULT_SHELF_LIFE_DAYS: u32 = 7;

/// Shelf life assumed when no printed date could be read from a label
pub const LABEL_FALLBACK_DAYS: u32 = 30;

/// Items with fewer remaining days than this are flagged as expiring soon
pub const EXPIRING_SOON_DAYS: i64 = 7;

/// `max(1, floor(baseline * (1 - reduction)))`, reduction clamped to `[0, 1]`.
///
/// Evaluated in whole hundredths of the reduction so that `1 - 0.8` stays
/// exactly `0.2`.
pub fn adjusted_shelf_life_days(baseline_days: u32, reduction: f64) -> u32 {
    let reduction = if reduction.is_nan() { 0.0 } else { reduction.clamp(0.0, 1.0) };
    let kept_hundredths = 100 - (reduction * 100.0).round() as u64;
    let adjusted = baseline_days as u64 * kept_hundredths / 100;
    adjusted.max(1) as u32
}

/// Suggested expiry for a purchase, shortened by visual spoilage
pub fn schedule(baseline_days: u32, reduction: f64, purchase_date: NaiveDate) -> NaiveDate {
    add_days(purchase_date, adjusted_shelf_life_days(baseline_days, reduction))
}

/// Expiry for the label flow: the printed date as-is, or
/// `purchase_date + fallback_days` when none was read
pub fn schedule_label(
    extracted: Option<NaiveDate>,
    purchase_date: NaiveDate,
    fallback_days: u32,
) -> NaiveDate {
    extracted.unwrap_or_else(|| add_days(purchase_date, fallback_days))
}

/// Whole days from `today` until `expiry`; negative once expired
pub fn remaining_days(expiry: NaiveDate, today: NaiveDate) -> i64 {
    expiry.signed_duration_since(today).num_days()
}

/// `MMM dd, yyyy`, e.g. `May 02, 2024`
pub fn format_expiry(expiry: NaiveDate) -> String {
    expiry.format("%b %d, %Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
    Fresh,
}

impl ExpiryStatus {
    pub fn from_remaining(remaining_days: i64) -> Self {
        if remaining_days < 0 {
            ExpiryStatus::Expired
        } else if remaining_days < EXPIRING_SOON_DAYS {
            ExpiryStatus::ExpiringSoon
        } else {
            ExpiryStatus::Fresh
        }
    }
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(days as u64))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_heavy_spoilage_floors_at_one_day() {
        let purchase = ymd(2024, 3, 10);
        assert_eq!(adjusted_shelf_life_days(7, 0.8), 1);
        assert_eq!(schedule(7, 0.8, purchase), ymd(2024, 3, 11));
        assert_eq!(schedule(1, 1.0, purchase), ymd(2024, 3, 11));
    }

    #[test]
    fn test_fresh_item_keeps_baseline() {
        assert_eq!(schedule(30, 0.0, ymd(2024, 1, 1)), ymd(2024, 1, 31));
    }

    #[test]
    fn test_partial_reduction() {
        assert_eq!(adjusted_shelf_life_days(21, 0.5), 10);
        assert_eq!(adjusted_shelf_life_days(10, 0.2), 8);
        assert_eq!(adjusted_shelf_life_days(30, 0.8), 6);
        assert_eq!(adjusted_shelf_life_days(10, 0.8), 2);
        assert_eq!(adjusted_shelf_life_days(15, 0.8), 3);
        assert_eq!(schedule(30, 0.8, ymd(2024, 1, 1)), ymd(2024, 1, 7));
        // out-of-range reductions are clamped
        assert_eq!(adjusted_shelf_life_days(10, -1.0), 10);
        assert_eq!(adjusted_shelf_life_days(10, 2.0), 1);
    }

    #[test]
    fn test_expiry_after_purchase() {
        let purchase = ymd(2024, 2, 28);
        for baseline in [1, 2, 7, 30, 365] {
            for reduction in [0.0, 0.2, 0.5, 0.8, 1.0] {
                assert!(schedule(baseline, reduction, purchase) > purchase);
            }
        }
    }

    #[test]
    fn test_schedule_label() {
        let purchase = ymd(2024, 1, 1);
        let printed = ymd(2024, 5, 12);
        assert_eq!(schedule_label(Some(printed), purchase, LABEL_FALLBACK_DAYS), printed);
        assert_eq!(schedule_label(None, purchase, LABEL_FALLBACK_DAYS), ymd(2024, 1, 31));
    }

    #[test]
    fn test_display_helpers() {
        let today = ymd(2024, 5, 1);
        assert_eq!(remaining_days(ymd(2024, 5, 12), today), 11);
        assert_eq!(remaining_days(ymd(2024, 4, 30), today), -1);
        assert_eq!(format_expiry(ymd(2024, 5, 2)), "May 02, 2024");

        assert_eq!(ExpiryStatus::from_remaining(-1), ExpiryStatus::Expired);
        assert_eq!(ExpiryStatus::from_remaining(0), ExpiryStatus::ExpiringSoon);
        assert_eq!(ExpiryStatus::from_remaining(6), ExpiryStatus::ExpiringSoon);
        assert_eq!(ExpiryStatus::from_remaining(7), ExpiryStatus::Fresh);
    }
}

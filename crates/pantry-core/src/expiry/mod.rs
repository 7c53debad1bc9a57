//! Expiry dates: extraction from label text and shelf-life scheduling

mod extractor;
mod schedule;

pub use extractor::{DateFormat, EXPIRY_KEYWORDS, ExpiryExtractor, ExtractedExpiry};
pub use schedule::{
    DEFAULT_SHELF_LIFE_DAYS, EXPIRING_SOON_DAYS, ExpiryStatus, LABEL_FALLBACK_DAYS,
    adjusted_shelf_life_days, format_expiry, remaining_days, schedule, schedule_label,
};

//! Pantry core library
//!
//! Image-free building blocks of the food recognition pipeline: label
//! similarity, the food catalog and its matcher, spoilage bands, printed
//! expiry extraction and shelf-life scheduling.

pub mod catalog;
pub mod expiry;
pub mod inventory;
pub mod matcher;
pub mod similarity;
pub mod spoilage;

pub use catalog::{Catalog, CatalogEntry};
pub use expiry::{ExpiryExtractor, ExpiryStatus, ExtractedExpiry};
pub use inventory::{ExpiryDisplay, InventoryItemDraft, UNKNOWN_ITEM, sort_by_expiry};
pub use matcher::{CatalogMatch, CatalogMatcher, MatchPolicy, MatcherConfig};
pub use similarity::similarity;
pub use spoilage::{PixelThresholds, SpoilageAssessment, SpoilageBands, SpoilageLevel};

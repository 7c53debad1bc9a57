//! Pantry Computer Vision Library
//!
//! Food recognition and freshness estimation on top of an external object
//! detector and OCR engine.

pub mod bbox;
pub mod detection;
pub mod error;
pub mod label;
pub mod pipeline;
pub mod spoilage;
pub mod utils;

// Re-export commonly used types
pub use bbox::{BBox, BBoxCollection};
pub use detection::{
    CancelHandle, CancelSignal, ModelHandle, PipelineConfig, RetryController, RetryOutcome,
    RetryState,
};
pub use error::PipelineError;
pub use label::{ExpirySource, LabelExtraction, LabelReader};
pub use pipeline::{DetectionScan, FoodScanner};
pub use spoilage::SpoilageEstimator;

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Collaborator traits for the external models
pub mod traits {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, RgbImage};

    /// Object detector returning labelled boxes in source-image pixels
    #[async_trait]
    pub trait Detector: Send + Sync {
        async fn detect(&self, image: &RgbImage) -> Result<BBoxCollection>;

        /// Stable name for logging
        fn name(&self) -> &str {
            let full = std::any::type_name::<Self>();
            full.rsplit("::").next().unwrap_or(full)
        }
    }

    /// Loads a detector model; used by [`ModelHandle`] on first use
    #[async_trait]
    pub trait ModelLoader: Send + Sync {
        type Model: Detector + 'static;

        async fn load(&self) -> Result<Self::Model>;
    }

    /// OCR engine returning the recognised text, one line per text line
    #[async_trait]
    pub trait TextRecognizer: Send + Sync {
        async fn recognize(&self, image: &DynamicImage) -> Result<String>;
    }
}

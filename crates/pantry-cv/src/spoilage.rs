//! Pixel-level spoilage estimate over a detected region

use crate::bbox::BBox;
use crate::detection::SpoilageConfig;
use crate::error::PipelineError;
use crate::utils::ImageUtils;
use image::RgbImage;
use pantry_core::spoilage::PixelClass;
use pantry_core::{PixelThresholds, SpoilageAssessment, SpoilageBands};

#[derive(Debug, Clone, Default)]
pub struct SpoilageEstimator {
    pixels: PixelThresholds,
    bands: SpoilageBands,
}

impl SpoilageEstimator {
    pub fn new(config: &SpoilageConfig) -> Self {
        Self {
            pixels: config.pixels,
            bands: config.bands.clone(),
        }
    }

    /// Assess a whole buffer. An empty buffer reads as fresh; callers are
    /// expected to reject empty regions first.
    pub fn assess(&self, region: &RgbImage) -> SpoilageAssessment {
        let (brown, dark) = self.count(region);
        let total = region.width() as u64 * region.height() as u64;
        SpoilageAssessment::from_counts(brown, dark, total, &self.bands)
    }

    /// Assess the part of `image` covered by a detection box
    pub fn assess_region(
        &self,
        image: &RgbImage,
        bbox: &BBox,
    ) -> Result<SpoilageAssessment, PipelineError> {
        let region = ImageUtils::crop_to_bbox(image, bbox).ok_or_else(|| {
            PipelineError::InvalidImage(format!(
                "detection box {}x{} at ({}, {}) is empty inside a {}x{} image",
                bbox.width,
                bbox.height,
                bbox.x,
                bbox.y,
                image.width(),
                image.height()
            ))
        })?;

        let assessment = self.assess(&region);
        tracing::debug!(
            level = %assessment.level,
            spoilage = assessment.spoilage_percentage,
            brown = assessment.brown_percentage,
            dark = assessment.dark_percentage,
            "Spoilage assessed"
        );
        Ok(assessment)
    }

    /// Brown and dark pixel counts
    #[cfg(feature = "parallel")]
    fn count(&self, region: &RgbImage) -> (u64, u64) {
        use rayon::prelude::*;

        region
            .as_raw()
            .par_chunks_exact(3)
            .fold(|| (0, 0), |acc, pixel| self.tally(acc, pixel))
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
    }

    /// Brown and dark pixel counts
    #[cfg(not(feature = "parallel"))]
    fn count(&self, region: &RgbImage) -> (u64, u64) {
        region
            .as_raw()
            .chunks_exact(3)
            .fold((0, 0), |acc, pixel| self.tally(acc, pixel))
    }

    fn tally(&self, (brown, dark): (u64, u64), pixel: &[u8]) -> (u64, u64) {
        match self.pixels.classify(pixel[0], pixel[1], pixel[2]) {
            PixelClass::Brown => (brown + 1, dark),
            PixelClass::Dark => (brown, dark + 1),
            PixelClass::Other => (brown, dark),
        }
    }
}

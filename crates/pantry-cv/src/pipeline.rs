//! High-level food scanner
//!
//! Sequences detection, catalog matching, spoilage estimation and expiry
//! scheduling into an inventory draft, and label OCR into an expiry date.

use crate::Result;
use crate::bbox::BBox;
use crate::detection::{
    CancelSignal, LowConfidencePolicy, ModelHandle, PipelineConfig, RetryController, RetryOutcome,
};
use crate::error::PipelineError;
use crate::label::{LabelExtraction, LabelReader};
use crate::spoilage::SpoilageEstimator;
use crate::traits::{Detector, ModelLoader, TextRecognizer};
use crate::utils::ImageUtils;
use anyhow::Context;
use chrono::NaiveDate;
use image::{DynamicImage, RgbImage, RgbaImage};
use pantry_core::expiry::schedule;
use pantry_core::{Catalog, CatalogMatcher, ExpiryExtractor, InventoryItemDraft, UNKNOWN_ITEM};
use serde::Serialize;
use std::path::Path;

/// Result of the detection flow
#[derive(Debug, Clone, Serialize)]
pub struct DetectionScan {
    pub draft: InventoryItemDraft,
    /// The box the draft describes: the candidate that resolved to the
    /// catalog entry, or the winning detection when none did
    pub detection: BBox,
    /// Catalog alias the label resolved through, if any
    pub matched_alias: Option<String>,
    pub attempts: u32,
    /// The detection never reached the acceptance confidence and was kept
    /// under [`LowConfidencePolicy::AcceptBest`]
    pub low_confidence: bool,
    pub processing_time_ms: u64,
}

/// Main scanner, borrowing a catalog for its lifetime
pub struct FoodScanner<'c> {
    config: PipelineConfig,
    catalog: &'c Catalog,
    estimator: SpoilageEstimator,
    labels: LabelReader,
}

impl<'c> FoodScanner<'c> {
    /// Create new scanner
    pub fn new(config: PipelineConfig, catalog: &'c Catalog) -> Result<Self> {
        config.validate()?;

        let estimator = SpoilageEstimator::new(&config.spoilage);
        let labels = LabelReader::new(ExpiryExtractor::default(), config.label_fallback_days);

        Ok(Self {
            config,
            catalog,
            estimator,
            labels,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Detection flow using the shared model handle
    pub async fn detect_with_model<L: ModelLoader>(
        &self,
        model: &ModelHandle<L>,
        image: &RgbImage,
        purchase_date: NaiveDate,
        cancel: &CancelSignal,
    ) -> std::result::Result<DetectionScan, PipelineError> {
        let detector = model.detector().await?;
        self.detect_from_image(detector.as_ref(), image, purchase_date, cancel)
            .await
    }

    /// Detection flow from an image file
    pub async fn detect_from_file<D: Detector + ?Sized, P: AsRef<Path>>(
        &self,
        detector: &D,
        image_path: P,
        purchase_date: NaiveDate,
        cancel: &CancelSignal,
    ) -> std::result::Result<DetectionScan, PipelineError> {
        let image = ImageUtils::load_rgb(&image_path)
            .map_err(|e| PipelineError::InvalidImage(format!("{e:#}")))?;

        self.detect_from_image(detector, &image, purchase_date, cancel)
            .await
    }

    /// Detection flow from an RGBA camera frame
    pub async fn detect_from_rgba_image<D: Detector + ?Sized>(
        &self,
        detector: &D,
        frame: &RgbaImage,
        purchase_date: NaiveDate,
        cancel: &CancelSignal,
    ) -> std::result::Result<DetectionScan, PipelineError> {
        let image = ImageUtils::rgba_to_rgb(frame);
        self.detect_from_image(detector, &image, purchase_date, cancel)
            .await
    }

    /// Core detection flow: retry loop, spoilage on the winning box,
    /// catalog lookup and expiry scheduling
    pub async fn detect_from_image<D: Detector + ?Sized>(
        &self,
        detector: &D,
        image: &RgbImage,
        purchase_date: NaiveDate,
        cancel: &CancelSignal,
    ) -> std::result::Result<DetectionScan, PipelineError> {
        let start_time = std::time::Instant::now();

        let mut retry =
            RetryController::new(self.config.retry.clone(), self.config.allowed_classes.clone());

        let (best, attempts, low_confidence) = match retry.run(detector, image, cancel).await {
            RetryOutcome::Succeeded { best, attempts } => (best, attempts, false),
            RetryOutcome::LowConfidence { best, attempts } => {
                match self.config.retry.low_confidence_policy {
                    LowConfidencePolicy::Report => {
                        return Err(PipelineError::LowConfidence {
                            detection: best.detection,
                            attempts,
                        });
                    }
                    LowConfidencePolicy::AcceptBest => (best, attempts, true),
                }
            }
            RetryOutcome::NoDetection { attempts } => {
                return Err(PipelineError::NoDetection { attempts });
            }
            RetryOutcome::Cancelled { attempts, .. } => {
                return Err(PipelineError::Cancelled { attempts });
            }
        };

        let matcher = CatalogMatcher::new(self.catalog, self.config.matching.clone());
        let matched = matcher.match_candidates(best.candidates.candidates());

        // name, confidence and spoilage all describe the same box
        let detection = matched
            .as_ref()
            .and_then(|found| best.candidates.as_slice().get(found.candidate_index))
            .unwrap_or(&best.detection)
            .clone();

        let spoilage = self.estimator.assess_region(image, &detection)?;

        let (product_name, baseline_days, matched_alias) = match &matched {
            Some(found) => (
                found.entry.canonical_name.clone(),
                found.entry.baseline_shelf_life_days,
                Some(found.alias.to_string()),
            ),
            None => {
                tracing::info!(
                    label = %detection.label,
                    "Detection did not resolve to a catalog entry"
                );
                (
                    UNKNOWN_ITEM.to_string(),
                    self.config.default_shelf_life_days,
                    None,
                )
            }
        };

        let expiry_date = schedule(
            baseline_days,
            spoilage.shelf_life_reduction_factor,
            purchase_date,
        );

        let draft = InventoryItemDraft::new(product_name, 1, purchase_date, expiry_date)?
            .with_confidence(detection.confidence)
            .with_spoilage(spoilage);

        let processing_time_ms = start_time.elapsed().as_millis() as u64;

        tracing::info!(
            product = %draft.product_name,
            expiry = %draft.expiry_date,
            attempts,
            low_confidence,
            "Scan completed"
        );

        Ok(DetectionScan {
            draft,
            detection,
            matched_alias,
            attempts,
            low_confidence,
            processing_time_ms,
        })
    }

    /// Label flow: OCR, printed-date extraction, fallback expiry
    pub async fn extract_from_label<R: TextRecognizer + ?Sized>(
        &self,
        recognizer: &R,
        image: &DynamicImage,
        purchase_date: NaiveDate,
    ) -> LabelExtraction {
        self.labels.extract(recognizer, image, purchase_date).await
    }

    /// Label flow from an image file
    pub async fn extract_from_label_file<R: TextRecognizer + ?Sized, P: AsRef<Path>>(
        &self,
        recognizer: &R,
        image_path: P,
        purchase_date: NaiveDate,
    ) -> std::result::Result<LabelExtraction, PipelineError> {
        let image = ImageUtils::load(&image_path)
            .map_err(|e| PipelineError::InvalidImage(format!("{e:#}")))?;

        Ok(self.extract_from_label(recognizer, &image, purchase_date).await)
    }

    /// Export a scan in JSON format
    pub fn export_json(&self, scan: &DetectionScan, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(scan).context("Failed to serialize scan")?;

        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write JSON to: {:?}", output_path))?;

        Ok(())
    }
}

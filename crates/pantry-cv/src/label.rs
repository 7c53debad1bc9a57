//! Expiry dates from product label photos

use crate::error::PipelineError;
use crate::traits::TextRecognizer;
use chrono::NaiveDate;
use image::DynamicImage;
use pantry_core::expiry::{LABEL_FALLBACK_DAYS, schedule_label};
use pantry_core::{ExpiryExtractor, ExtractedExpiry, InventoryItemDraft};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirySource {
    /// Read from the label
    Printed,
    /// Purchase date plus the fallback shelf life
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelExtraction {
    pub expiry_date: NaiveDate,
    pub source: ExpirySource,
    pub extracted: ExtractedExpiry,
    /// Set when OCR itself failed
    pub ocr_failure: Option<String>,
}

impl LabelExtraction {
    pub fn is_fallback(&self) -> bool {
        self.source == ExpirySource::Fallback
    }

    /// Draft for a label scan; the caller supplies what OCR cannot read
    pub fn into_draft(
        self,
        product_name: impl Into<String>,
        quantity: u32,
        purchase_date: NaiveDate,
    ) -> anyhow::Result<InventoryItemDraft> {
        InventoryItemDraft::new(product_name, quantity, purchase_date, self.expiry_date)
    }
}

#[derive(Debug, Clone)]
pub struct LabelReader {
    extractor: ExpiryExtractor,
    fallback_days: u32,
}

impl Default for LabelReader {
    fn default() -> Self {
        Self::new(ExpiryExtractor::default(), LABEL_FALLBACK_DAYS)
    }
}

impl LabelReader {
    /// `fallback_days` is floored at 1 so a fallback expiry is always after
    /// the purchase date
    pub fn new(extractor: ExpiryExtractor, fallback_days: u32) -> Self {
        Self {
            extractor,
            fallback_days: fallback_days.max(1),
        }
    }

    /// Run OCR and keep the non-blank lines
    pub async fn read_text<R: TextRecognizer + ?Sized>(
        recognizer: &R,
        image: &DynamicImage,
    ) -> Result<String, PipelineError> {
        let raw = recognizer
            .recognize(image)
            .await
            .map_err(|e| PipelineError::OcrFailure(format!("{e:#}")))?;

        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// OCR a label and derive its expiry date. OCR failures fall back to
    /// the default shelf life instead of failing the run.
    pub async fn extract<R: TextRecognizer + ?Sized>(
        &self,
        recognizer: &R,
        image: &DynamicImage,
        purchase_date: NaiveDate,
    ) -> LabelExtraction {
        match Self::read_text(recognizer, image).await {
            Ok(text) => self.extract_text(&text, purchase_date),
            Err(e) => {
                tracing::warn!(error = %e, "Label OCR failed, using fallback expiry");
                let mut extraction = self.extract_text("", purchase_date);
                extraction.ocr_failure = Some(e.to_string());
                extraction
            }
        }
    }

    /// Derive the expiry date from already recognised text
    pub fn extract_text(&self, text: &str, purchase_date: NaiveDate) -> LabelExtraction {
        let extracted = self.extractor.extract(text);
        let source = if extracted.is_found() {
            ExpirySource::Printed
        } else {
            ExpirySource::Fallback
        };

        LabelExtraction {
            expiry_date: schedule_label(extracted.date, purchase_date, self.fallback_days),
            source,
            extracted,
            ocr_failure: None,
        }
    }
}

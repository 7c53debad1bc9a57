//! Pipeline outcome errors

use crate::bbox::BBox;
use serde::Serialize;
use thiserror::Error;

/// Ways a pipeline run can end without a usable result
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The detection model could not be loaded
    #[error("detection model unavailable: {0}")]
    ModelUnavailable(String),

    /// Every attempt finished without a food-class detection
    #[error("no food item detected after {attempts} attempt(s)")]
    NoDetection { attempts: u32 },

    /// The best detection stayed below the acceptance confidence
    #[error(
        "best detection {:?} has confidence {:.2}, below the acceptance threshold",
        .detection.label,
        .detection.confidence
    )]
    LowConfidence { detection: BBox, attempts: u32 },

    /// Text recognition failed
    #[error("text recognition failed: {0}")]
    OcrFailure(String),

    /// The run was cancelled by its host
    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },

    /// Unreadable image or an empty detection region
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    /// Stable short code
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ModelUnavailable(_) => "model_unavailable",
            PipelineError::NoDetection { .. } => "no_detection",
            PipelineError::LowConfidence { .. } => "low_confidence",
            PipelineError::OcrFailure(_) => "ocr_failure",
            PipelineError::Cancelled { .. } => "cancelled",
            PipelineError::InvalidImage(_) => "invalid_image",
            PipelineError::Internal(_) => "internal",
        }
    }

    /// Status line for the person holding the camera
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::ModelUnavailable(_) => "Model not loaded. Please try again.",
            PipelineError::NoDetection { .. } => "No food item detected.",
            PipelineError::LowConfidence { .. } => "Could not identify the item confidently.",
            PipelineError::OcrFailure(_) | PipelineError::Internal(_) => "Processing failed.",
            PipelineError::Cancelled { .. } => "Scan cancelled.",
            PipelineError::InvalidImage(_) => "Could not read the image.",
        }
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("type", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

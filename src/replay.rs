//! File-backed collaborators for the command line
//!
//! The detection model and the OCR engine live outside this crate. The CLI
//! replays their recorded output instead: detections as JSON, label text as
//! plain text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{DynamicImage, RgbImage};
use pantry_cv::traits::{Detector, ModelLoader, TextRecognizer};
use pantry_cv::BBoxCollection;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Either one detection list per attempt, or a single list repeated on
/// every attempt
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Recording {
    PerAttempt(Vec<BBoxCollection>),
    Repeated(BBoxCollection),
}

/// Plays back recorded detector output, one entry per call. Calls past the
/// end of a per-attempt recording see no detections.
pub struct ReplayDetector {
    attempts: Vec<BBoxCollection>,
    repeat: bool,
    calls: AtomicUsize,
}

impl ReplayDetector {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read detections from {}", path.display()))?;

        Self::from_json(&contents)
            .with_context(|| format!("Invalid detections file {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let recording: Recording = serde_json::from_str(contents)?;

        let (attempts, repeat) = match recording {
            Recording::PerAttempt(attempts) => (attempts, false),
            Recording::Repeated(detections) => (vec![detections], true),
        };

        tracing::debug!(attempts = attempts.len(), repeat, "Loaded recorded detections");

        Ok(Self {
            attempts,
            repeat,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Detector for ReplayDetector {
    async fn detect(&self, _image: &RgbImage) -> pantry_cv::Result<BBoxCollection> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = if self.repeat { 0 } else { call };

        Ok(self.attempts.get(index).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "replay"
    }
}

/// Loads a [`ReplayDetector`] through the shared model handle
pub struct ReplayLoader {
    path: PathBuf,
}

impl ReplayLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ModelLoader for ReplayLoader {
    type Model = ReplayDetector;

    async fn load(&self) -> pantry_cv::Result<ReplayDetector> {
        ReplayDetector::load(&self.path)
    }
}

/// Returns the contents of a text file as the recognised label text
pub struct FileTextRecognizer {
    path: PathBuf,
}

impl FileTextRecognizer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TextRecognizer for FileTextRecognizer {
    async fn recognize(&self, _image: &DynamicImage) -> pantry_cv::Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read OCR text from {}", self.path.display()))
    }
}

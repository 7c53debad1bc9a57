//! Bounded detector retry loop
//!
//! `Idle -> Attempting -> {Succeeded, Exhausted}`, plus `Cancelled` when the
//! host stops the scan. Suspension points are the detector call and the
//! backoff sleep; both are raced against the cancel signal.

use super::cancel::CancelSignal;
use super::config::RetryConfig;
use crate::bbox::{BBox, BBoxCollection};
use crate::traits::Detector;
use image::RgbImage;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum RetryState {
    Idle,
    Attempting { attempt: u32 },
    Succeeded,
    Exhausted,
    Cancelled,
}

/// Best detection seen so far, with the food detections of the attempt
/// that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub detection: BBox,
    pub candidates: BBoxCollection,
    pub attempt: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// Best confidence reached the acceptance threshold
    Succeeded { best: Observation, attempts: u32 },
    /// Attempts ran out with only sub-threshold food detections
    LowConfidence { best: Observation, attempts: u32 },
    /// Attempts ran out without any food detection
    NoDetection { attempts: u32 },
    /// The host cancelled the scan
    Cancelled { best: Option<Observation>, attempts: u32 },
}

impl RetryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. }
            | RetryOutcome::LowConfidence { attempts, .. }
            | RetryOutcome::NoDetection { attempts }
            | RetryOutcome::Cancelled { attempts, .. } => *attempts,
        }
    }
}

pub struct RetryController {
    config: RetryConfig,
    allowed_classes: Vec<String>,
    state: RetryState,
    best: Option<Observation>,
}

impl RetryController {
    pub fn new(config: RetryConfig, allowed_classes: Vec<String>) -> Self {
        Self {
            config,
            allowed_classes,
            state: RetryState::Idle,
            best: None,
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    pub fn best(&self) -> Option<&Observation> {
        self.best.as_ref()
    }

    /// Drive the detector until a detection clears the acceptance
    /// confidence, the attempts run out, or `cancel` fires.
    ///
    /// A detector error counts as an attempt with no detections.
    pub async fn run<D: Detector + ?Sized>(
        &mut self,
        detector: &D,
        image: &RgbImage,
        cancel: &CancelSignal,
    ) -> RetryOutcome {
        self.best = None;
        let max_retries = self.config.max_retries.max(1);
        let backoff = self.config.backoff();
        let mut attempts = 0;

        for attempt in 1..=max_retries {
            if cancel.is_cancelled() {
                return self.cancelled(attempts);
            }

            self.state = RetryState::Attempting { attempt };
            attempts = attempt;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(attempts),
                result = detector.detect(image) => result,
            };

            let detections = match result {
                Ok(detections) => detections,
                Err(e) => {
                    tracing::warn!(
                        detector = detector.name(),
                        attempt,
                        error = %e,
                        "Detector call failed"
                    );
                    BBoxCollection::new()
                }
            };

            self.observe(detections, attempt);

            let best_confidence = self.best.as_ref().map(|b| b.detection.confidence);
            tracing::debug!(attempt, best_confidence = ?best_confidence, "Detection attempt finished");

            if let Some(best) = self.accepted() {
                self.state = RetryState::Succeeded;
                tracing::info!(
                    attempts,
                    label = %best.detection.label,
                    confidence = best.detection.confidence,
                    "Detection accepted"
                );
                return RetryOutcome::Succeeded { best, attempts };
            }

            if attempt < max_retries && !backoff.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return self.cancelled(attempts),
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
        }

        self.state = RetryState::Exhausted;
        match self.best.clone() {
            Some(best) => {
                tracing::warn!(
                    attempts,
                    label = %best.detection.label,
                    confidence = best.detection.confidence,
                    "Retries exhausted below acceptance confidence"
                );
                RetryOutcome::LowConfidence { best, attempts }
            }
            None => {
                tracing::info!(attempts, "Retries exhausted without a food detection");
                RetryOutcome::NoDetection { attempts }
            }
        }
    }

    /// Keep the attempt's top food detection if it strictly beats the best
    fn observe(&mut self, detections: BBoxCollection, attempt: u32) {
        let mut candidates = detections.retain_labels(&self.allowed_classes);
        candidates.sort_by_confidence();

        let Some(top) = candidates.best().cloned() else {
            return;
        };

        let improves = self
            .best
            .as_ref()
            .is_none_or(|best| top.confidence > best.detection.confidence);

        if improves {
            self.best = Some(Observation {
                detection: top,
                candidates,
                attempt,
            });
        }
    }

    fn accepted(&self) -> Option<Observation> {
        self.best
            .as_ref()
            .filter(|best| best.detection.confidence >= self.config.acceptance_confidence)
            .cloned()
    }

    fn cancelled(&mut self, attempts: u32) -> RetryOutcome {
        self.state = RetryState::Cancelled;
        tracing::info!(attempts, "Detection cancelled");
        RetryOutcome::Cancelled {
            best: self.best.clone(),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use crate::detection::cancel::cancel_pair;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Replays one scripted response per call; empty once the script ends
    struct ScriptedDetector {
        script: Mutex<VecDeque<Result<BBoxCollection>>>,
        calls: AtomicU32,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Result<BBoxCollection>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Detector for ScriptedDetector {
        async fn detect(&self, _image: &RgbImage) -> Result<BBoxCollection> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(BBoxCollection::new()))
        }
    }

    fn single(label: &str, confidence: f64) -> Result<BBoxCollection> {
        Ok(BBoxCollection::from_vec(vec![
            BBox::new(0, 0, 8, 8, confidence).with_label(label),
        ]))
    }

    fn controller(backoff_ms: u64) -> RetryController {
        RetryController::new(
            RetryConfig {
                backoff_ms,
                ..Default::default()
            },
            vec!["banana".into(), "apple".into()],
        )
    }

    fn image() -> RgbImage {
        RgbImage::new(8, 8)
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let detector = ScriptedDetector::new(vec![
            single("banana", 0.2),
            single("banana", 0.3),
            single("banana", 0.6),
            single("banana", 0.9),
        ]);
        let mut retry = controller(0);

        let outcome = retry.run(&detector, &image(), &CancelSignal::never()).await;

        match outcome {
            RetryOutcome::Succeeded { best, attempts } => {
                assert_eq!(attempts, 3);
                assert_eq!(best.detection.confidence, 0.6);
                assert_eq!(best.attempt, 3);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(detector.calls(), 3);
        assert_eq!(retry.state(), RetryState::Succeeded);
    }

    #[tokio::test]
    async fn test_no_detection_after_all_attempts() {
        let detector = ScriptedDetector::new(vec![
            single("person", 0.99),
            Ok(BBoxCollection::new()),
            single("laptop", 0.8),
        ]);
        let mut retry = controller(0);

        let outcome = retry.run(&detector, &image(), &CancelSignal::never()).await;

        assert_eq!(outcome, RetryOutcome::NoDetection { attempts: 5 });
        assert_eq!(detector.calls(), 5);
        assert_eq!(retry.state(), RetryState::Exhausted);
    }

    #[tokio::test]
    async fn test_low_confidence_keeps_best() {
        let detector = ScriptedDetector::new(vec![
            single("banana", 0.2),
            single("apple", 0.45),
            single("banana", 0.45),
            single("banana", 0.1),
        ]);
        let mut retry = controller(0);

        let outcome = retry.run(&detector, &image(), &CancelSignal::never()).await;

        match outcome {
            RetryOutcome::LowConfidence { best, attempts } => {
                assert_eq!(attempts, 5);
                // equal confidence does not replace the earlier best
                assert_eq!(best.detection.label, "apple");
                assert_eq!(best.attempt, 2);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_detector_errors_count_as_attempts() {
        let detector = ScriptedDetector::new(vec![
            Err(anyhow::anyhow!("inference failed")),
            Err(anyhow::anyhow!("inference failed")),
            single("apple", 0.7),
        ]);
        let mut retry = controller(0);

        let outcome = retry.run(&detector, &image(), &CancelSignal::never()).await;
        assert!(matches!(outcome, RetryOutcome::Succeeded { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_filters_before_picking_best() {
        let detector = ScriptedDetector::new(vec![Ok(BBoxCollection::from_vec(vec![
            BBox::new(0, 0, 4, 4, 0.95).with_label("dining table"),
            BBox::new(0, 0, 4, 4, 0.55).with_label("banana"),
            BBox::new(0, 0, 4, 4, 0.51).with_label("apple"),
        ]))]);
        let mut retry = controller(0);

        let outcome = retry.run(&detector, &image(), &CancelSignal::never()).await;
        let RetryOutcome::Succeeded { best, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(best.detection.label, "banana");
        assert_eq!(best.candidates.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_between_attempts() {
        let detector = ScriptedDetector::new(vec![
            single("banana", 0.2),
            single("banana", 0.3),
            single("banana", 0.6),
        ]);
        let mut retry = controller(500);

        let started = tokio::time::Instant::now();
        let outcome = retry.run(&detector, &image(), &CancelSignal::never()).await;

        assert!(matches!(outcome, RetryOutcome::Succeeded { attempts: 3, .. }));
        // two waits: after the first and second attempts only
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_last_attempt() {
        let detector = ScriptedDetector::new(vec![]);
        let mut retry = controller(500);

        let started = tokio::time::Instant::now();
        let outcome = retry.run(&detector, &image(), &CancelSignal::never()).await;

        assert_eq!(outcome, RetryOutcome::NoDetection { attempts: 5 });
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2000));
        assert!(elapsed < Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let detector = ScriptedDetector::new(vec![single("banana", 0.2)]);
        let mut retry = controller(500);
        let (handle, signal) = cancel_pair();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            handle.cancel();
        });

        let outcome = retry.run(&detector, &image(), &signal).await;
        canceller.await.expect("canceller finished");

        match outcome {
            RetryOutcome::Cancelled { best, attempts } => {
                assert_eq!(attempts, 1);
                assert_eq!(best.map(|b| b.detection.confidence), Some(0.2));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(detector.calls(), 1);
        assert_eq!(retry.state(), RetryState::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let detector = ScriptedDetector::new(vec![single("banana", 0.9)]);
        let mut retry = controller(0);
        let (handle, signal) = cancel_pair();
        handle.cancel();

        let outcome = retry.run(&detector, &image(), &signal).await;

        assert_eq!(outcome, RetryOutcome::Cancelled { best: None, attempts: 0 });
        assert_eq!(detector.calls(), 0);
    }
}

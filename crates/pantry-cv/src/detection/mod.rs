//! Detection: configuration, model lifecycle and the retry loop

pub mod cancel;
pub mod config;
pub mod model;
pub mod retry;

pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use config::{LowConfidencePolicy, PipelineConfig, RetryConfig, SpoilageConfig};
pub use model::ModelHandle;
pub use retry::{Observation, RetryController, RetryOutcome, RetryState};

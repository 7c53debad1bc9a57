//! Detection model lifecycle
//!
//! The model is loaded once on first use and shared by every scan until the
//! owner disposes it. A disposed handle reloads on the next use.

use crate::error::PipelineError;
use crate::traits::ModelLoader;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct ModelHandle<L: ModelLoader> {
    loader: L,
    model: Mutex<Option<Arc<L::Model>>>,
}

impl<L: ModelLoader> ModelHandle<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            model: Mutex::new(None),
        }
    }

    /// Load the model now if it is not loaded yet
    pub async fn initialize(&self) -> Result<(), PipelineError> {
        self.detector().await.map(|_| ())
    }

    /// The cached model, loading it on first use
    pub async fn detector(&self) -> Result<Arc<L::Model>, PipelineError> {
        let mut slot = self.model.lock().await;
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let model = self.loader.load().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load detection model");
            PipelineError::ModelUnavailable(format!("{e:#}"))
        })?;

        tracing::info!("Detection model loaded");
        let model = Arc::new(model);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    pub async fn is_initialized(&self) -> bool {
        self.model.lock().await.is_some()
    }

    /// Drop the cached model. Scans already holding it finish normally.
    /// Returns whether a model was loaded.
    pub async fn dispose(&self) -> bool {
        let released = self.model.lock().await.take().is_some();
        if released {
            tracing::info!("Detection model released");
        }
        released
    }
}

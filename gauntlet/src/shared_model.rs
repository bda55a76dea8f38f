//! A named, reloadable handle to one of the two competing models.
//!
//! Many matches read from the same model at once, while the training loop
//! occasionally swaps in new weights. The handle guards this with a
//! reader/writer lock: reads are shared, a reload is exclusive. Tokio's
//! `RwLock` is write-preferring, so a pending reload is only waiting for
//! the readers that were already in flight when it arrived. A continuous
//! stream of new matches can never starve it, they queue up behind the
//! reload and observe the new weights.

use std::sync::Arc;

use log::info;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};

use crate::{backends::ModelEvaluator, ArenaError};

/// Which of the two arena slots a model handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelName {
    Challenger,
    Best,
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelName::Challenger => write!(f, "challenger"),
            ModelName::Best => write!(f, "best"),
        }
    }
}

/// Shared read access to a model for the duration of one match.
///
/// Dropping the guard releases the read slot. Since the drop also runs on
/// error paths and panics, a crashed match can never leave a read slot
/// behind and block a later reload forever.
pub type ModelReadGuard<M> = OwnedRwLockReadGuard<M>;

pub struct SharedModel<M> {
    name: ModelName,
    backend: Arc<RwLock<M>>,
}

// Derived Clone would ask for M: Clone, the Arc makes that unnecessary.
impl<M> Clone for SharedModel<M> {
    fn clone(&self) -> Self {
        SharedModel {
            name: self.name,
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<M: ModelEvaluator> SharedModel<M> {
    pub fn new(name: ModelName, backend: M) -> Self {
        SharedModel {
            name,
            backend: Arc::new(RwLock::new(backend)),
        }
    }

    /// Waits while a reload is running or pending, then takes a read slot.
    pub async fn acquire_read(&self) -> ModelReadGuard<M> {
        Arc::clone(&self.backend).read_owned().await
    }

    /// Swap the underlying weights for the given checkpoint.
    ///
    /// Waits until every in-flight match has released its read slot and
    /// keeps new matches out until the load is done, so no match can ever
    /// observe a partially loaded model. A failed load is propagated and
    /// leaves the previous weights in place.
    pub async fn reload(&self, checkpoint: &str) -> Result<(), ArenaError> {
        let mut backend = Arc::clone(&self.backend).write_owned().await;
        backend
            .load(checkpoint)
            .await
            .map_err(|cause| ArenaError::CheckpointRejected {
                model: self.name,
                checkpoint: checkpoint.to_owned(),
                cause,
            })?;
        info!("The {} model now serves checkpoint {}.", self.name, checkpoint);
        Ok(())
    }
}

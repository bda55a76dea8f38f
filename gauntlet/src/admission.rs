//! Bounds the number of concurrently running matches to the compute workers
//! that are actually available.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::ArenaError;

/// Counting semaphore with one permit per worker. A match may only start
/// once it holds a slot, which caps peak concurrency at `num_workers` no
/// matter how many games a round schedules.
pub struct AdmissionController {
    slots: Arc<Semaphore>,
}

/// Permission to run one concurrent match.
///
/// The permit is given back when the slot is dropped. That happens on every
/// way out of a match, including aborts and panics, so admission capacity
/// cannot leak.
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionController {
    pub fn new(num_workers: usize) -> Self {
        AdmissionController {
            slots: Arc::new(Semaphore::new(num_workers)),
        }
    }

    /// Waits until a worker is free, then reserves it.
    pub async fn admit(&self) -> Result<AdmissionSlot, ArenaError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| ArenaError::AdmissionClosed)?;
        Ok(AdmissionSlot { _permit: permit })
    }

    /// Number of matches that could start right now without waiting.
    pub fn free_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::merger::error::{MergerError, MergerResult};

/// Cancellation handle passed to `Merger::merge`.
///
/// Clones share the same flag, so a caller on another thread can cancel a
/// query before its merge starts. The flag is checked once, on merge entry.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    cancelled: Arc<AtomicBool>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(MergerError::Cancelled)` once cancelled
    pub fn check(&self) -> MergerResult<()> {
        if self.is_cancelled() {
            return Err(MergerError::Cancelled);
        }
        Ok(())
    }
}

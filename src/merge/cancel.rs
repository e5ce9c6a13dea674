use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::{MergeError, MergeResult};

/// Shared cancellation flag plus the first error that raised it.
///
/// Producers and the writer poll [`AbortSignal::check`] at their safe points: before claiming a
/// source, before opening it, before each enqueue and before each write.
#[derive(Debug, Default)]
pub struct AbortSignal {
    cancelled: AtomicBool,
    first_error: Mutex<Option<MergeError>>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// `Err(Cancelled)` once any component has failed.
    pub fn check(&self) -> MergeResult<()> {
        if self.is_cancelled() {
            Err(MergeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Record `err` (unless an earlier error is already recorded) and cancel.
    ///
    /// `Cancelled` itself is never recorded; it only echoes an earlier failure.
    pub fn fail(&self, err: MergeError) {
        {
            let mut slot = self
                .first_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() && !matches!(err, MergeError::Cancelled) {
                *slot = Some(err);
            }
        }
        self.cancel();
    }

    /// The recorded error, if any.
    pub fn take_error(&self) -> Option<MergeError> {
        self.first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

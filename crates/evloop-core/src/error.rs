//! Error types for the scheduler core.
//!
//! The source reports three runtime error conditions at the point a
//! directive is interpreted: an unrecognized yield value, a malformed
//! `When` argument, and queue overflow. The first two are dispatch errors
//! that only exist because the source's yields are untyped — [`Directive`]
//! being a closed, typed enum means the compiler rejects both at build
//! time. The HPQ grows rather than overflowing (§4.3), so only NQ/LPQ
//! overflow survives as a runtime condition here.
//!
//! No `thiserror`: this crate is `no_std`, so `Display` and
//! [`core::error::Error`] are implemented by hand, the same way
//! `planck_noalloc::vec::ArrayVecError` does it.

use core::fmt;

use crate::id::TaskId;

/// Which timed queue overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    /// The normal-priority timed queue.
    Normal,
    /// The low-priority timed queue.
    LowPriority,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::LowPriority => "low-priority",
        })
    }
}

/// Errors the loop or its queues can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopError {
    /// A queue is at its configured capacity and cannot accept another
    /// entry.
    QueueFull(QueueKind),
    /// A task's `resume` call unwound (panicked and was caught at the
    /// boundary, or returned an error the loop chose to surface rather than
    /// silently drop).
    TaskFailed(TaskId),
    /// The reactor reported an error while polling for readiness.
    ReactorError,
}

impl fmt::Display for LoopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull(kind) => write!(f, "{kind} queue is full"),
            Self::TaskFailed(id) => write!(f, "{id} failed to resume"),
            Self::ReactorError => f.write_str("reactor poll failed"),
        }
    }
}

impl core::error::Error for LoopError {}

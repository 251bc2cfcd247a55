//! The loop's contract with whatever performs blocking waits and I/O
//! readiness fan-out.
//!
//! Modeled pull-style rather than push-style: `wait` fills a
//! caller-supplied [`ReadyList`] instead of reaching back into the loop's
//! queues itself. A reactor holding a back-reference to the loop it serves
//! would need `&mut EventLoop` while the loop itself is mid-call into
//! `reactor.wait` — an aliasing cycle Rust's borrow checker has no clean
//! answer for. Pulling a list out avoids the cycle entirely; see
//! `DESIGN.md` for the full reasoning.

use core::fmt;

use evloop_core::id::{IoHandle, TaskId};
use planck_noalloc::vec::ArrayVec;

/// Maximum number of tasks a single [`Reactor::wait`] call can report ready
/// in one pass.
pub const READY_CAP: usize = 32;

/// Fixed-capacity buffer of tasks the reactor found ready.
pub type ReadyList = ArrayVec<TaskId, READY_CAP>;

/// An error raised by the reactor. Never fatal to the loop: a failing
/// `wait` is treated exactly like an early return (the loop just re-runs
/// selection), and a failing registration is surfaced to the task that
/// requested it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactorError(pub &'static str);

impl fmt::Display for ReactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reactor error: {}", self.0)
    }
}

impl core::error::Error for ReactorError {}

/// External I/O multiplexer consulted by the dispatch loop.
pub trait Reactor {
    /// Blocks for up to `delay_ms` milliseconds (`None` = indefinite),
    /// filling `ready` with tasks that became I/O-ready. May return early.
    ///
    /// # Errors
    /// Implementors may fail the wait; the loop does not treat this as
    /// fatal.
    fn wait(&mut self, delay_ms: Option<u32>, ready: &mut ReadyList) -> Result<(), ReactorError>;

    /// Registers `task` to be scheduled via `call_soon` once `handle`
    /// becomes readable.
    ///
    /// # Errors
    /// Returns an error if this reactor does not support read readiness.
    fn add_reader(&mut self, handle: IoHandle, task: TaskId) -> Result<(), ReactorError>;

    /// Registers `task` to be scheduled via `call_soon` once `handle`
    /// becomes writable.
    ///
    /// # Errors
    /// Returns an error if this reactor does not support write readiness.
    fn add_writer(&mut self, handle: IoHandle, task: TaskId) -> Result<(), ReactorError>;

    /// Deregisters read-readiness interest on `handle`, if any.
    fn remove_reader(&mut self, handle: IoHandle);

    /// Deregisters write-readiness interest on `handle`, if any.
    fn remove_writer(&mut self, handle: IoHandle);
}

/// A [`Reactor`] with no I/O backing: `wait` parks for the platform sleep
/// (std feature) or returns immediately (no I/O fan-out either way), and
/// every registration call errors. Suitable for timer-only workloads and
/// as the default when an embedder hasn't wired in a real reactor yet.
#[derive(Debug, Default)]
pub struct NullReactor;

impl Reactor for NullReactor {
    fn wait(&mut self, delay_ms: Option<u32>, _ready: &mut ReadyList) -> Result<(), ReactorError> {
        #[cfg(feature = "std")]
        if let Some(ms) = delay_ms {
            std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
        }
        #[cfg(not(feature = "std"))]
        let _ = delay_ms;
        Ok(())
    }

    fn add_reader(&mut self, _handle: IoHandle, _task: TaskId) -> Result<(), ReactorError> {
        Err(ReactorError("NullReactor has no I/O backing"))
    }

    fn add_writer(&mut self, _handle: IoHandle, _task: TaskId) -> Result<(), ReactorError> {
        Err(ReactorError("NullReactor has no I/O backing"))
    }

    fn remove_reader(&mut self, _handle: IoHandle) {}

    fn remove_writer(&mut self, _handle: IoHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_reactor_wait_never_errors() {
        let mut r = NullReactor;
        let mut ready = ReadyList::new();
        assert!(r.wait(Some(0), &mut ready).is_ok());
        assert!(ready.is_empty());
    }

    #[test]
    fn null_reactor_registration_errors() {
        let mut r = NullReactor;
        assert!(r.add_reader(IoHandle::new(1), TaskId::new(1)).is_err());
        assert!(r.add_writer(IoHandle::new(1), TaskId::new(1)).is_err());
    }
}

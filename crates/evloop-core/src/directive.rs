//! Suspension directives — the values a [`Task`](crate::task::Task) yields
//! to tell the loop how to reschedule it.
//!
//! This is a closed sum type rather than the source's open-ended "yield
//! whatever, the loop does `isinstance` checks" scheme (§9 guidance: dispatch
//! on a tag, not on identity checks). Two consequences fall out of making it
//! closed: the dispatch `match` in the loop is exhaustive, so there is no
//! runtime "unknown directive" error to report — the compiler refuses to
//! build a loop that doesn't handle every variant.

use alloc::boxed::Box;

use crate::id::IoHandle;
use crate::task::Task;
use crate::value::Value;

/// A zero-argument predicate evaluated once per tick while it is pending in
/// the HPQ.
pub type Predicate = Box<dyn FnMut() -> bool + Send>;

/// What a task yields to request scheduling behavior.
pub enum Directive {
    /// Normal-priority re-enqueue after `secs` seconds (fractional seconds,
    /// truncated to milliseconds — not rounded, for parity with the
    /// source).
    Sleep(f64),
    /// Normal-priority re-enqueue after exactly `ms` milliseconds.
    SleepMs(u64),
    /// Low-priority re-enqueue after `secs` seconds (truncated to ms).
    After(f64),
    /// Low-priority re-enqueue after exactly `ms` milliseconds.
    AfterMs(u64),
    /// High-priority registration: resume on the first tick `pred()` is
    /// truthy.
    When(Predicate),
    /// Register for read-readiness on `handle`; the loop does not
    /// re-enqueue (the reactor will, via `call_soon`, once ready).
    IoRead(IoHandle),
    /// Register for write-readiness on `handle`; see [`Directive::IoRead`].
    IoWrite(IoHandle),
    /// Deregister read-readiness interest, then fall through to a
    /// zero-delay normal-priority re-enqueue.
    IoReadDone(IoHandle),
    /// Deregister write-readiness interest, then fall through to a
    /// zero-delay normal-priority re-enqueue.
    IoWriteDone(IoHandle),
    /// Terminate `run_forever`, returning this value.
    StopLoop(Value),
    /// Zero-delay normal-priority re-enqueue (the source's bare `None`
    /// yield — a fair yield that still gives other ready work a turn).
    Requeue,
    /// Schedule `task` with `call_soon` and re-enqueue the yielding task
    /// with zero delay (the source's bare nested-generator yield).
    Spawn(Box<dyn Task>),
}

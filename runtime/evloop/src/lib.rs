//! Cooperative single-threaded event loop for memory-constrained targets.
//!
//! Drives user-supplied resumable [`Task`](evloop_core::Task)s forward by
//! calling them back at appointed times, interleaving three priority
//! classes (high-priority predicate-gated, normal-priority timed,
//! low-priority timed with bounded-overdue fairness) and I/O readiness
//! notifications from an external [`Reactor`]. See [`EventLoop`] for the
//! dispatch loop and [`get_event_loop`] for the process-wide singleton.
//!
//! Without the `std` feature this crate is `no_std`: an embedder supplies
//! its own `Clock` over a hardware tick source and a [`log`] sink, and a
//! task panicking mid-resume is not caught (no unwinding support without
//! an allocator-backed unwinder on bare metal).
#![cfg_attr(not(test), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod config;
#[cfg(feature = "std")]
pub mod clock;
mod event_loop;
pub mod log;
pub mod reactor;
#[cfg(feature = "std")]
mod singleton;

pub use config::LoopConfig;
pub use event_loop::EventLoop;
pub use reactor::{NullReactor, Reactor, ReactorError, ReadyList, READY_CAP};

#[cfg(feature = "std")]
pub use clock::SystemClock;
#[cfg(feature = "std")]
pub use singleton::get_event_loop;

pub use evloop_core::{
    Args, Clock, Directive, IoHandle, LoopError, Predicate, QueueKind, Step, Task, TaskId, Value,
};

//! Process-wide singleton accessor, mirroring the source's module-level
//! `_event_loop` consulted by `ensure_future`/`Task()`-style helpers.
//!
//! Backed by `thread_local!`, not a cross-thread `Mutex`/`OnceLock`: the
//! loop is deliberately `!Sync` (§5), so "exactly one instance live at a
//! time" is enforced structurally by keeping it behind thread-local
//! storage rather than by a lock an embedder could accidentally contend
//! on from a second thread.

use std::cell::RefCell;

use crate::{EventLoop, LoopConfig, NullReactor, SystemClock};

thread_local! {
    static LOOP: RefCell<Option<EventLoop<SystemClock, NullReactor>>> = const { RefCell::new(None) };
}

/// Runs `f` against the thread-local singleton loop, constructing it with
/// `qlen`/`lpqlen` on first use. Later calls ignore their capacity
/// arguments and reuse the already-constructed instance, exactly like the
/// source: the first call fixes the capacities.
///
/// Looking the instance up lazily on every call, rather than capturing a
/// reference once at definition time, resolves the source's latent bug
/// where `ensure_future`/`Task()` close over `_event_loop` before it is
/// initialized — see `DESIGN.md`.
pub fn get_event_loop<F, T>(qlen: u16, lpqlen: u16, f: F) -> T
where
    F: FnOnce(&mut EventLoop<SystemClock, NullReactor>) -> T,
{
    LOOP.with(|cell| {
        let mut guard = cell.borrow_mut();
        let evloop = guard.get_or_insert_with(|| {
            let config = LoopConfig {
                qlen,
                lpqlen,
                ..LoopConfig::default()
            };
            EventLoop::new(config, SystemClock::new(), NullReactor)
        });
        f(evloop)
    })
}

//! Host clock backing.
//!
//! `evloop-core::Clock` only specifies the wraparound contract; this
//! module supplies the one concrete implementation the `std` feature can
//! provide for free. A bare-metal embedder supplies its own `Clock` over a
//! hardware tick counter instead.

#[cfg(feature = "std")]
use std::time::Instant;

use evloop_core::Clock;

/// Millisecond clock backed by [`std::time::Instant`], truncated to `u32`.
///
/// Truncating a monotonically increasing `u128`-scale instant to `u32`
/// milliseconds wraps roughly every 49.7 days. That is the wraparound
/// behavior the scheduler is built to handle, not a defect to work around.
#[cfg(feature = "std")]
pub struct SystemClock {
    start: Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Creates a clock whose epoch is the moment of construction.
    #[must_use]
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> u32 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "wrapping to u32 milliseconds is the documented clock contract"
        )]
        {
            self.start.elapsed().as_millis() as u32
        }
    }
}

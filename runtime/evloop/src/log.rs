//! Minimal logging facade.
//!
//! `no_std` crates can't pull in `log`/`tracing` — there's no guarantee an
//! allocator-free target has anywhere to route a `Record` to. Instead this
//! mirrors the kernel's print-hook pattern: a single function pointer,
//! installed once by the embedder, that every log call goes through. On a
//! hosted build with the `std` feature, [`init_stderr`] installs a sink
//! that writes to stderr so tests and examples see output without any
//! setup.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Severity of a log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-tick dispatch tracing — the source's `DEBUG`-gated prints.
    Trace,
    /// Development-time diagnostics.
    Debug,
    /// Routine operational events.
    Info,
    /// Recoverable, task-local problems (e.g. a dropped `TaskError`).
    Warn,
    /// Loop-fatal conditions surfaced to the embedder.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

/// A log sink: called with the level and a fully formatted message.
pub type SinkFn = fn(LogLevel, &str);

static SINK: AtomicUsize = AtomicUsize::new(0);
static MIN_LEVEL: AtomicUsize = AtomicUsize::new(LogLevel::Info as usize);

/// Installs the process-wide log sink. Later calls replace earlier ones;
/// there is no way to uninstall once set.
pub fn set_sink(sink: SinkFn) {
    SINK.store(sink as usize, Ordering::Release);
}

/// Sets the minimum level that reaches the sink. Calls below this level
/// are dropped before formatting, so a disabled `Trace` costs one atomic
/// load.
pub fn set_min_level(level: LogLevel) {
    MIN_LEVEL.store(level as usize, Ordering::Release);
}

/// Routes `msg` to the installed sink if `level` is at or above the
/// current minimum. No-op if no sink has been installed.
pub fn log(level: LogLevel, args: fmt::Arguments<'_>) {
    if (level as usize) < MIN_LEVEL.load(Ordering::Relaxed) {
        return;
    }
    let ptr = SINK.load(Ordering::Acquire);
    if ptr == 0 {
        return;
    }
    // SAFETY: the only value ever stored is a `SinkFn` cast to `usize` by
    // `set_sink`, so transmuting back through a raw pointer is valid.
    let sink: SinkFn = unsafe { core::mem::transmute::<usize, SinkFn>(ptr) };
    let mut buf = FormatBuf::new();
    let _ = fmt::Write::write_fmt(&mut buf, args);
    sink(level, buf.as_str());
}

/// Fixed-capacity scratch buffer for formatting a log line without
/// allocating. Messages longer than the buffer are truncated.
struct FormatBuf {
    data: [u8; 192],
    len: usize,
}

impl FormatBuf {
    fn new() -> Self {
        Self { data: [0; 192], len: 0 }
    }

    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.data[..self.len]).unwrap_or("<non-utf8 log message>")
    }
}

impl fmt::Write for FormatBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let remaining = self.data.len() - self.len;
        let take = remaining.min(s.len());
        self.data[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

/// Installs a sink that writes `"[LEVEL] msg"` lines to stderr.
#[cfg(feature = "std")]
pub fn init_stderr() {
    fn sink(level: LogLevel, msg: &str) {
        eprintln!("[{level}] {msg}");
    }
    set_sink(sink);
}

/// Logs at [`LogLevel::Trace`].
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log::log($crate::log::LogLevel::Trace, format_args!($($arg)*))
    };
}

/// Logs at [`LogLevel::Warn`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log::log($crate::log::LogLevel::Warn, format_args!($($arg)*))
    };
}

/// Logs at [`LogLevel::Error`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log::log($crate::log::LogLevel::Error, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicU32;

    static CALLS: AtomicU32 = AtomicU32::new(0);

    fn counting_sink(_level: LogLevel, _msg: &str) {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn sink_receives_messages_at_or_above_min_level() {
        set_sink(counting_sink);
        set_min_level(LogLevel::Warn);
        let before = CALLS.load(Ordering::SeqCst);
        log(LogLevel::Debug, format_args!("suppressed"));
        log(LogLevel::Error, format_args!("delivered"));
        assert_eq!(CALLS.load(Ordering::SeqCst), before + 1);
        set_min_level(LogLevel::Info);
    }

    #[test]
    fn format_buf_truncates_rather_than_panics() {
        let mut buf = FormatBuf::new();
        let long = "x".repeat(500);
        fmt::Write::write_str(&mut buf, &long).unwrap();
        assert_eq!(buf.len, 192);
    }
}

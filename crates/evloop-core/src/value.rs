//! Argument and yield-payload values.
//!
//! The source this scheduler is ported from is dynamically typed: callback
//! arguments and directive payloads can be anything. `Value` is the closed
//! set of shapes we actually need to carry; anything else rides in
//! [`Value::Boxed`] (the one allocating case, expected to be rare and paid
//! once at task-creation time, never on the hot resume path).

use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use crate::id::IoHandle;
use planck_noalloc::vec::ArrayVec;

/// Maximum number of [`Value`]s a single call/resume can carry without
/// falling back to [`Value::Boxed`].
pub const MAX_ARGS: usize = 4;

/// A single argument or yielded payload.
pub enum Value {
    /// No meaningful payload.
    Unit,
    /// A signed integer (used for e.g. `StopLoop` exit codes).
    Int(i64),
    /// An unsigned integer (used for e.g. millisecond durations).
    UInt(u64),
    /// A boolean.
    Bool(bool),
    /// An I/O handle.
    Handle(IoHandle),
    /// Anything else, type-erased. Allocates once when constructed.
    Boxed(Box<dyn Any + Send>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("Unit"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::UInt(v) => write!(f, "UInt({v})"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Handle(v) => write!(f, "Handle({v})"),
            Self::Boxed(_) => f.write_str("Boxed(..)"),
        }
    }
}

impl Value {
    /// Returns the inner `i64` if this is [`Value::Int`].
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the inner `u64` if this is [`Value::UInt`].
    #[must_use]
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the inner `bool` if this is [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<IoHandle> for Value {
    fn from(v: IoHandle) -> Self {
        Self::Handle(v)
    }
}

/// A fixed-capacity argument list passed to a callback or task resume.
///
/// Backed by [`ArrayVec`], so building and passing arguments never
/// allocates beyond whatever an individual [`Value::Boxed`] needed.
pub type Args = ArrayVec<Value, MAX_ARGS>;

/// Builds an empty [`Args`] list.
#[must_use]
pub fn no_args() -> Args {
    Args::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conversions() {
        let v: Value = 5i64.into();
        assert_eq!(v.as_int(), Some(5));
        let v: Value = true.into();
        assert_eq!(v.as_bool(), Some(true));
    }

    #[test]
    fn args_fixed_capacity() {
        let mut args = no_args();
        args.push(Value::Int(1));
        args.push(Value::UInt(2));
        assert_eq!(args.len(), 2);
        assert_eq!(args.as_slice()[0].as_int(), Some(1));
    }

    #[test]
    fn debug_does_not_panic_on_boxed() {
        let v = Value::Boxed(Box::new(42u32));
        let rendered = format!("{v:?}");
        assert_eq!(rendered, "Boxed(..)");
    }
}

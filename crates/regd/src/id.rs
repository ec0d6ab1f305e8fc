use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FUNCTION: AtomicU64 = AtomicU64::new(1);
static NEXT_DECORATOR: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Function`](crate::Function).
///
/// Clones of a function share the identity; two functions built from the same
/// closure do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(u64);

impl FunctionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_FUNCTION.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw token value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

/// Process-unique identity of a decorator.
///
/// Equality is reference identity: decorators are never compared by behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecoratorId(u64);

impl DecoratorId {
    pub(crate) fn next() -> Self {
        Self(NEXT_DECORATOR.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw token value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DecoratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decorator#{}", self.0)
    }
}

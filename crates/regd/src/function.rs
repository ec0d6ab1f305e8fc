//! Callable values that can carry decorator annotations.

use crate::error::{RegistryError, Result};
use crate::id::{DecoratorId, FunctionId};
use parking_lot::RwLock;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

type Call<A, R> = dyn Fn(A) -> R + Send + Sync;

/// Whether a function owns an annotation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Ordinary function; annotations are created on first tracked decoration.
    Tracked,
    /// Opaque function that cannot carry annotations.
    Native,
}

/// A shared, type-erased callable taking `A` and returning `R`.
///
/// Cloning is cheap and preserves identity: every clone answers to the same
/// [`FunctionId`] and sees the same annotations.
pub struct Function<A, R> {
    inner: Arc<FunctionInner<A, R>>,
}

struct FunctionInner<A, R> {
    id: FunctionId,
    name: Cow<'static, str>,
    kind: FunctionKind,
    call: Box<Call<A, R>>,
    slot: RwLock<Option<Slot<A, R>>>,
}

struct Slot<A, R> {
    decorator: Option<DecoratorId>,
    native: Option<Function<A, R>>,
    decorators: Vec<DecoratorId>,
}

// Manual impl so slots can be created without `A: Default`.
impl<A, R> Default for Slot<A, R> {
    fn default() -> Self {
        Self { decorator: None, native: None, decorators: Vec::new() }
    }
}

/// Snapshot of a function's annotation record.
///
/// `decorators` is filled on the real (innermost) function only; wrappers point
/// at it through `native`.
pub struct Annotations<A, R> {
    /// Tracked decorator that produced this function.
    pub decorator: Option<DecoratorId>,
    /// Real function under this wrapper.
    pub native: Option<Function<A, R>>,
    /// Tracked decorators applied to this function, in application order.
    pub decorators: Vec<DecoratorId>,
}

impl<A: 'static, R: 'static> Function<A, R> {
    /// Wraps a closure into a trackable function.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::build(name.into(), FunctionKind::Tracked, Box::new(f))
    }

    /// Wraps a closure into an opaque function that refuses annotations.
    pub fn native<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::build(name.into(), FunctionKind::Native, Box::new(f))
    }

    fn build(name: Cow<'static, str>, kind: FunctionKind, call: Box<Call<A, R>>) -> Self {
        Self {
            inner: Arc::new(FunctionInner {
                id: FunctionId::next(),
                name,
                kind,
                call,
                slot: RwLock::new(None),
            }),
        }
    }
}

impl<A, R> Function<A, R> {
    /// Invokes the function.
    pub fn call(&self, args: A) -> R {
        (self.inner.call)(args)
    }

    #[must_use]
    pub fn id(&self) -> FunctionId {
        self.inner.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn kind(&self) -> FunctionKind {
        self.inner.kind
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        self.inner.kind == FunctionKind::Native
    }

    /// Returns `true` when both handles are the same function.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns a snapshot of the annotation record, or `None` if no tracked
    /// decorator has touched this function yet.
    #[must_use]
    pub fn annotations(&self) -> Option<Annotations<A, R>> {
        self.inner.slot.read().as_ref().map(|slot| Annotations {
            decorator: slot.decorator,
            native: slot.native.clone(),
            decorators: slot.decorators.clone(),
        })
    }

    /// Follows `native` links down to the innermost function.
    #[must_use]
    pub fn real(&self) -> Self {
        let mut current = self.clone();
        loop {
            let next = current.inner.slot.read().as_ref().and_then(|slot| slot.native.clone());
            match next {
                Some(native) if !native.same_as(&current) => current = native,
                _ => return current,
            }
        }
    }

    /// Tracked decorators recorded on this function's chain, in application order.
    #[must_use]
    pub fn decorators(&self) -> Vec<DecoratorId> {
        self.real().inner.slot.read().as_ref().map(|slot| slot.decorators.clone()).unwrap_or_default()
    }

    /// Returns `true` if `decorator` is recorded on this function's chain.
    #[must_use]
    pub fn has_decorator(&self, decorator: DecoratorId) -> bool {
        self.real()
            .inner
            .slot
            .read()
            .as_ref()
            .is_some_and(|slot| slot.decorators.contains(&decorator))
    }

    pub(crate) fn ensure_trackable(&self) -> Result<()> {
        if self.is_native() {
            return Err(RegistryError::InvalidTarget {
                message: format!("'{}' ({}) cannot carry annotations", self.name(), self.id())
                    .into(),
                context: None,
            });
        }
        Ok(())
    }

    /// Marks this function as the product of `decorator` wrapping `native`.
    pub(crate) fn stamp(&self, decorator: DecoratorId, native: &Self) -> Result<()> {
        self.ensure_trackable()?;
        let mut guard = self.inner.slot.write();
        let slot = guard.get_or_insert_with(Slot::default);
        slot.decorator = Some(decorator);
        if !self.same_as(native) {
            slot.native = Some(native.clone());
        }
        Ok(())
    }

    /// Appends `decorator` to this function's record. Returns `false` when
    /// `dedupe` is set and the identity was already present.
    pub(crate) fn append(&self, decorator: DecoratorId, dedupe: bool) -> Result<bool> {
        self.ensure_trackable()?;
        let mut guard = self.inner.slot.write();
        let slot = guard.get_or_insert_with(Slot::default);
        if dedupe && slot.decorators.contains(&decorator) {
            return Ok(false);
        }
        slot.decorators.push(decorator);
        Ok(true)
    }
}

impl<A, R> Clone for Function<A, R> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<A, R> fmt::Debug for Function<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("kind", &self.inner.kind)
            .finish_non_exhaustive()
    }
}

impl<A, R> fmt::Debug for Annotations<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotations")
            .field("decorator", &self.decorator)
            .field("native", &self.native.as_ref().map(Function::id))
            .field("decorators", &self.decorators)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let f = Function::new("double", |x: i32| x * 2);
        let g = f.clone();
        assert_eq!(f.id(), g.id());
        assert!(f.same_as(&g));
        assert_eq!(g.call(21), 42);
    }

    #[test]
    fn annotations_are_created_lazily() {
        let f = Function::new("noop", |(): ()| ());
        assert!(f.annotations().is_none());

        let d = DecoratorId::next();
        assert!(f.append(d, true).unwrap());
        let ann = f.annotations().expect("slot should exist after append");
        assert_eq!(ann.decorators, vec![d]);
        assert!(ann.native.is_none());
    }

    #[test]
    fn append_dedupes_when_asked() {
        let f = Function::new("noop", |(): ()| ());
        let d = DecoratorId::next();
        assert!(f.append(d, true).unwrap());
        assert!(!f.append(d, true).unwrap());
        assert!(f.append(d, false).unwrap());
        assert_eq!(f.decorators(), vec![d, d]);
    }

    #[test]
    fn stamp_on_self_does_not_loop() {
        let f = Function::new("identity", |x: u8| x);
        f.stamp(DecoratorId::next(), &f).unwrap();
        assert!(f.real().same_as(&f));
    }

    #[test]
    fn native_functions_refuse_annotations() {
        let f = Function::native("len", |s: String| s.len());
        assert!(f.is_native());
        assert!(matches!(
            f.append(DecoratorId::next(), true),
            Err(RegistryError::InvalidTarget { .. })
        ));
        assert!(f.annotations().is_none());
        assert_eq!(f.call("abc".to_owned()), 3);
    }
}

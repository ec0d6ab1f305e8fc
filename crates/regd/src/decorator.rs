//! Decorators: callables that take a [`Function`] and return a replacement.

use crate::error::Result;
use crate::function::Function;
use crate::id::DecoratorId;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

type Apply<A, R> = dyn Fn(Function<A, R>) -> Result<Function<A, R>> + Send + Sync;
type Factory<P, A, R> = dyn Fn(P) -> Decorator<A, R> + Send + Sync;

/// Anything that answers to a decorator identity in queries.
pub trait DecoratorIdentity {
    fn decorator_id(&self) -> DecoratorId;
}

impl DecoratorIdentity for DecoratorId {
    fn decorator_id(&self) -> DecoratorId {
        *self
    }
}

impl<T: DecoratorIdentity + ?Sized> DecoratorIdentity for &T {
    fn decorator_id(&self) -> DecoratorId {
        (**self).decorator_id()
    }
}

/// A function-to-function transformation with a stable identity.
///
/// Clones share the identity. A decorator returned by
/// [`Registry::register`](crate::Registry::register) is *tracked*: applying it
/// records its identity on the decorated function.
pub struct Decorator<A, R> {
    id: DecoratorId,
    name: Cow<'static, str>,
    tracked: bool,
    apply: Arc<Apply<A, R>>,
}

impl<A: 'static, R: 'static> Decorator<A, R> {
    /// Builds a decorator from an infallible transformation.
    ///
    /// # Example
    /// ```rust
    /// use regd::{Decorator, Function};
    ///
    /// let plus_one = Decorator::new("plus_one", |f: Function<i32, i32>| {
    ///     Function::new(f.name().to_owned(), move |x| f.call(x) + 1)
    /// });
    ///
    /// let square = plus_one.apply(Function::new("square", |x: i32| x * x)).unwrap();
    /// assert_eq!(square.call(3), 10);
    /// ```
    pub fn new<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Function<A, R>) -> Function<A, R> + Send + Sync + 'static,
    {
        Self::try_new(name, move |function| Ok(f(function)))
    }

    /// Builds a decorator whose transformation may fail. Failures are returned
    /// to the caller of [`Decorator::apply`] unchanged.
    pub fn try_new<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Function<A, R>) -> Result<Function<A, R>> + Send + Sync + 'static,
    {
        Self { id: DecoratorId::next(), name: name.into(), tracked: false, apply: Arc::new(f) }
    }

    pub(crate) fn tracked<F>(id: DecoratorId, name: Cow<'static, str>, f: F) -> Self
    where
        F: Fn(Function<A, R>) -> Result<Function<A, R>> + Send + Sync + 'static,
    {
        Self { id, name, tracked: true, apply: Arc::new(f) }
    }
}

impl<A, R> Decorator<A, R> {
    /// Applies the decorator to `function`.
    ///
    /// # Errors
    /// Returns whatever the underlying transformation returns; tracked decorators
    /// additionally fail with [`RegistryError::InvalidTarget`](crate::RegistryError::InvalidTarget)
    /// when the input or output cannot carry annotations.
    pub fn apply(&self, function: Function<A, R>) -> Result<Function<A, R>> {
        (self.apply)(function)
    }

    #[must_use]
    pub fn id(&self) -> DecoratorId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` for decorators produced by a registry.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.tracked
    }
}

impl<A, R> DecoratorIdentity for Decorator<A, R> {
    fn decorator_id(&self) -> DecoratorId {
        self.id
    }
}

impl<A, R> Clone for Decorator<A, R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            tracked: self.tracked,
            apply: Arc::clone(&self.apply),
        }
    }
}

impl<A, R> fmt::Debug for Decorator<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorator")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tracked", &self.tracked)
            .finish_non_exhaustive()
    }
}

/// A decorator factory: takes parameters `P` and produces a [`Decorator`].
///
/// Once registered, every decorator it produces records the factory's identity,
/// so one query covers all parameterizations.
pub struct ParametrizedDecorator<P, A, R> {
    id: DecoratorId,
    name: Cow<'static, str>,
    tracked: bool,
    factory: Arc<Factory<P, A, R>>,
}

impl<P: 'static, A: 'static, R: 'static> ParametrizedDecorator<P, A, R> {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, factory: F) -> Self
    where
        F: Fn(P) -> Decorator<A, R> + Send + Sync + 'static,
    {
        Self { id: DecoratorId::next(), name: name.into(), tracked: false, factory: Arc::new(factory) }
    }

    pub(crate) fn tracked<F>(id: DecoratorId, name: Cow<'static, str>, factory: F) -> Self
    where
        F: Fn(P) -> Decorator<A, R> + Send + Sync + 'static,
    {
        Self { id, name, tracked: true, factory: Arc::new(factory) }
    }
}

impl<P, A, R> ParametrizedDecorator<P, A, R> {
    /// Produces the decorator for `params`.
    pub fn with(&self, params: P) -> Decorator<A, R> {
        (self.factory)(params)
    }

    #[must_use]
    pub fn id(&self) -> DecoratorId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.tracked
    }
}

impl<P, A, R> DecoratorIdentity for ParametrizedDecorator<P, A, R> {
    fn decorator_id(&self) -> DecoratorId {
        self.id
    }
}

impl<P, A, R> Clone for ParametrizedDecorator<P, A, R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            tracked: self.tracked,
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<P, A, R> fmt::Debug for ParametrizedDecorator<P, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParametrizedDecorator")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tracked", &self.tracked)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    fn negate() -> Decorator<i32, i32> {
        Decorator::new("negate", |f: Function<i32, i32>| Function::new("negated", move |x| -f.call(x)))
    }

    #[test]
    fn distinct_decorators_have_distinct_ids() {
        let a = negate();
        let b = negate();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
        assert!(!a.is_tracked());
    }

    #[test]
    fn try_new_propagates_failure() {
        let failing = Decorator::try_new("failing", |_f: Function<(), ()>| {
            Err(RegistryError::InvalidTarget { message: "refused".into(), context: None })
        });
        let err = failing.apply(Function::new("f", |(): ()| ())).unwrap_err();
        assert_eq!(err.to_string(), "Invalid target: refused");
    }

    #[test]
    fn factory_produces_parameterized_decorators() {
        let add = ParametrizedDecorator::new("add", |n: i32| {
            Decorator::new("add_n", move |f: Function<i32, i32>| {
                Function::new("added", move |x| f.call(x) + n)
            })
        });
        let plus_five = add.with(5);
        let f = plus_five.apply(Function::new("id", |x: i32| x)).unwrap();
        assert_eq!(f.call(1), 6);
        assert_eq!(add.decorator_id(), add.id());
    }
}

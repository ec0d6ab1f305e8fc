use crate::config::RegistryConfig;
use crate::decorator::{Decorator, DecoratorIdentity, ParametrizedDecorator};
use crate::error::{RegistryError, Result};
use crate::function::Function;
use crate::id::{DecoratorId, FunctionId};
use fxhash::{FxHashMap, FxHashSet};
use parking_lot::RwLock;
use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Shape of a registered decorator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoratorKind {
    /// Takes the function directly.
    Plain,
    /// Takes parameters first, then the function.
    Parametrized,
}

/// Bookkeeping kept for every registered decorator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Identity recorded on decorated functions.
    pub id: DecoratorId,
    /// Identity of the decorator that was registered.
    pub source: DecoratorId,
    pub name: Cow<'static, str>,
    pub kind: DecoratorKind,
    /// Successful tracked applications so far.
    pub applications: u64,
}

#[derive(Debug, Default)]
struct RegistryState {
    registrations: FxHashMap<DecoratorId, Registration>,
    sources: FxHashMap<DecoratorId, DecoratorId>,
}

/// Records which decorators wrapped which functions.
///
/// The registry is a cheap handle: clones share state. Build one at startup and
/// pass it to the code that registers decorators and answers queries.
///
/// # Example
/// ```rust
/// use regd::{Decorator, Function, Registry};
///
/// # fn main() -> regd::Result<()> {
/// let registry = Registry::new();
///
/// let logged = registry.register(&Decorator::new("logged", |f: Function<i32, i32>| {
///     Function::new("logged", move |x| f.call(x))
/// }));
/// let other = registry.register(&Decorator::new("other", |f: Function<i32, i32>| f));
///
/// let double = logged.apply(Function::new("double", |x: i32| x * 2))?;
///
/// assert_eq!(double.call(4), 8);
/// assert!(registry.is_decorated_with(&double, &logged)?);
/// assert!(!registry.is_decorated_with(&double, &other)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    config: RegistryConfig,
    state: Arc<RwLock<RegistryState>>,
}

impl Registry {
    /// Creates an empty registry with the default [`RegistryConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with an explicit configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self { config, state: Arc::default() }
    }

    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns a tracked version of `decorator`.
    ///
    /// The result behaves exactly like `decorator`, and additionally records its
    /// identity on every function it decorates. Registering the same decorator
    /// again yields a decorator with the same identity; registering a decorator
    /// this registry already tracks returns it unchanged. A decorator tracked by
    /// another registry is wrapped again, so both registries record it.
    pub fn register<A: 'static, R: 'static>(&self, decorator: &Decorator<A, R>) -> Decorator<A, R> {
        if decorator.is_tracked() && self.owns(decorator.id()) {
            return decorator.clone();
        }

        let id = self.registration_for(decorator.id(), decorator.name(), DecoratorKind::Plain);
        let inner = decorator.clone();
        let registry = self.clone();

        Decorator::tracked(id, Cow::Owned(decorator.name().to_owned()), move |function| {
            registry.apply_tracked(id, &inner, function)
        })
    }

    /// Returns a tracked version of a decorator factory.
    ///
    /// Every decorator the factory produces records the factory's tracked identity.
    pub fn register_parametrized<P: 'static, A: 'static, R: 'static>(
        &self,
        decorator: &ParametrizedDecorator<P, A, R>,
    ) -> ParametrizedDecorator<P, A, R> {
        if decorator.is_tracked() && self.owns(decorator.id()) {
            return decorator.clone();
        }

        let id =
            self.registration_for(decorator.id(), decorator.name(), DecoratorKind::Parametrized);
        let factory = decorator.clone();
        let registry = self.clone();

        ParametrizedDecorator::tracked(
            id,
            Cow::Owned(decorator.name().to_owned()),
            move |params| {
                let inner = factory.with(params);
                let registry = registry.clone();
                let name = Cow::Owned(inner.name().to_owned());
                Decorator::tracked(id, name, move |function| {
                    registry.apply_tracked(id, &inner, function)
                })
            },
        )
    }

    /// Registers a type-erased value, which must be a `Decorator<A, R>`.
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidDecorator`] if `candidate` is anything else.
    pub fn register_erased<A: 'static, R: 'static>(
        &self,
        candidate: Box<dyn Any + Send + Sync>,
    ) -> Result<Decorator<A, R>> {
        let decorator =
            candidate.downcast::<Decorator<A, R>>().map_err(|_| RegistryError::InvalidDecorator {
                message: format!("expected {}", std::any::type_name::<Decorator<A, R>>()).into(),
                context: Some("Value is not a decorator".into()),
            })?;
        Ok(self.register(&decorator))
    }

    /// Checks whether `function` carries the marker of `decorator`.
    ///
    /// Decorators that never went through [`Registry::register`] never match.
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidTarget`] for native functions when
    /// `strict_targets` is enabled.
    pub fn is_decorated_with<A, R>(
        &self,
        function: &Function<A, R>,
        decorator: &impl DecoratorIdentity,
    ) -> Result<bool> {
        if !self.accepts(function)? {
            return Ok(false);
        }
        let id = decorator.decorator_id();
        let found = function.has_decorator(id);
        trace!(function = %function.id(), decorator = %id, found, "Decoration query");
        Ok(found)
    }

    /// Like [`Registry::is_decorated_with`], for a type-erased target.
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidTarget`] if `target` is not a `Function<A, R>`,
    /// or under the same conditions as [`Registry::is_decorated_with`].
    pub fn is_decorated_with_erased<A: 'static, R: 'static>(
        &self,
        target: &dyn Any,
        decorator: &impl DecoratorIdentity,
    ) -> Result<bool> {
        let function =
            target.downcast_ref::<Function<A, R>>().ok_or_else(|| RegistryError::InvalidTarget {
                message: format!("expected {}", std::any::type_name::<Function<A, R>>()).into(),
                context: Some("Value is not a function".into()),
            })?;
        self.is_decorated_with(function, decorator)
    }

    /// Tracked decorators applied to `function`'s chain, in application order.
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidTarget`] for native functions when
    /// `strict_targets` is enabled.
    pub fn decorators_of<A, R>(&self, function: &Function<A, R>) -> Result<Vec<DecoratorId>> {
        if !self.accepts(function)? {
            return Ok(Vec::new());
        }
        Ok(function.decorators())
    }

    /// The innermost function under all tracked wrappers.
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidTarget`] for native functions when
    /// `strict_targets` is enabled.
    pub fn real_function<A, R>(&self, function: &Function<A, R>) -> Result<Function<A, R>> {
        if !self.accepts(function)? {
            return Ok(function.clone());
        }
        Ok(function.real())
    }

    /// Filters named functions down to those carrying `decorator`.
    ///
    /// Native functions are skipped rather than rejected.
    pub fn decorated_with<'a, A: 'a, R: 'a, I>(
        &self,
        functions: I,
        decorator: &impl DecoratorIdentity,
    ) -> Vec<(&'a str, &'a Function<A, R>)>
    where
        I: IntoIterator<Item = (&'a str, &'a Function<A, R>)>,
    {
        let id = decorator.decorator_id();
        functions
            .into_iter()
            .filter(|(_, function)| !function.is_native() && function.has_decorator(id))
            .collect()
    }

    /// Filters named functions down to those carrying any tracked decorator.
    ///
    /// Functions sharing one real function are reported once, under the first
    /// name encountered.
    pub fn all_decorated<'a, A: 'a, R: 'a, I>(
        &self,
        functions: I,
    ) -> Vec<(&'a str, &'a Function<A, R>)>
    where
        I: IntoIterator<Item = (&'a str, &'a Function<A, R>)>,
    {
        let mut seen = FxHashSet::<FunctionId>::default();
        functions
            .into_iter()
            .filter(|(_, function)| {
                !function.is_native()
                    && !function.decorators().is_empty()
                    && seen.insert(function.real().id())
            })
            .collect()
    }

    /// Bookkeeping for a registered decorator, looked up by either its tracked
    /// identity or the identity of the decorator that was registered.
    #[must_use]
    pub fn registration(&self, decorator: &impl DecoratorIdentity) -> Option<Registration> {
        let id = decorator.decorator_id();
        let state = self.state.read();
        let tracked = state.sources.get(&id).copied().unwrap_or(id);
        state.registrations.get(&tracked).cloned()
    }

    #[must_use]
    pub fn is_registered(&self, decorator: &impl DecoratorIdentity) -> bool {
        self.registration(decorator).is_some()
    }

    /// Number of registered decorators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().registrations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn owns(&self, id: DecoratorId) -> bool {
        self.state.read().registrations.contains_key(&id)
    }

    fn registration_for(&self, source: DecoratorId, name: &str, kind: DecoratorKind) -> DecoratorId {
        let mut state = self.state.write();
        if let Some(existing) = state.sources.get(&source) {
            debug!(decorator = name, id = %existing, "Decorator already registered");
            return *existing;
        }

        let id = DecoratorId::next();
        state.sources.insert(source, id);
        state.registrations.insert(
            id,
            Registration { id, source, name: Cow::Owned(name.to_owned()), kind, applications: 0 },
        );
        drop(state);

        debug!(decorator = name, %id, %source, ?kind, "Decorator registered");
        id
    }

    fn apply_tracked<A, R>(
        &self,
        id: DecoratorId,
        inner: &Decorator<A, R>,
        function: Function<A, R>,
    ) -> Result<Function<A, R>> {
        function.ensure_trackable().inspect_err(|_| {
            warn!(decorator = inner.name(), function = function.name(), "Refusing native target");
        })?;
        let native = function.real();

        let wrapped = inner.apply(function)?;
        wrapped.ensure_trackable().inspect_err(|_| {
            warn!(decorator = inner.name(), function = wrapped.name(), "Decorator returned a native function");
        })?;

        // A wrapper that already carries a record keeps its own chain.
        let target = if wrapped.annotations().is_some() && !wrapped.same_as(&native) {
            wrapped.real()
        } else {
            wrapped.stamp(id, &native)?;
            native
        };
        let appended = target.append(id, self.config.dedupe)?;

        if let Some(registration) = self.state.write().registrations.get_mut(&id) {
            registration.applications = registration.applications.saturating_add(1);
        }

        trace!(
            decorator = inner.name(),
            %id,
            native = %target.id(),
            wrapped = %wrapped.id(),
            appended,
            "Decorator applied"
        );
        Ok(wrapped)
    }

    /// `Ok(true)` when the function can be inspected, `Ok(false)` for a native
    /// function under relaxed targets.
    fn accepts<A, R>(&self, function: &Function<A, R>) -> Result<bool> {
        match function.ensure_trackable() {
            Ok(()) => Ok(true),
            Err(err) if self.config.strict_targets => {
                warn!(function = function.name(), "Rejected native target");
                Err(err)
            },
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passthrough(name: &'static str) -> Decorator<i32, i32> {
        Decorator::new(name, |f: Function<i32, i32>| {
            Function::new(f.name().to_owned(), move |x| f.call(x))
        })
    }

    #[test]
    fn register_is_idempotent() {
        let registry = Registry::new();
        let raw = passthrough("pass");

        let first = registry.register(&raw);
        let second = registry.register(&raw);

        assert_eq!(first.id(), second.id());
        assert_ne!(first.id(), raw.id());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.register(&first).id(), first.id());
    }

    #[test]
    fn registration_lookup_by_source_or_tracked() {
        let registry = Registry::new();
        let raw = passthrough("pass");
        let tracked = registry.register(&raw);

        let by_raw = registry.registration(&raw).expect("registered");
        let by_tracked = registry.registration(&tracked).expect("registered");
        assert_eq!(by_raw, by_tracked);
        assert_eq!(by_raw.kind, DecoratorKind::Plain);
        assert_eq!(by_raw.source, raw.id());
        assert_eq!(by_raw.applications, 0);
    }

    #[test]
    fn applications_are_counted() {
        let registry = Registry::new();
        let tracked = registry.register(&passthrough("pass"));

        tracked.apply(Function::new("a", |x: i32| x)).unwrap();
        tracked.apply(Function::new("b", |x: i32| x)).unwrap();

        assert_eq!(registry.registration(&tracked).map(|r| r.applications), Some(2));
    }

    #[test]
    fn separate_registries_do_not_share_state() {
        let a = Registry::new();
        let b = Registry::new();
        let raw = passthrough("pass");

        let _ = a.register(&raw);
        assert!(a.is_registered(&raw));
        assert!(!b.is_registered(&raw));
        assert!(b.is_empty());
    }

    #[test]
    fn decorator_tracked_elsewhere_is_registered_here_too() {
        let a = Registry::new();
        let b = Registry::new();

        let in_a = a.register(&passthrough("pass"));
        let in_b = b.register(&in_a);

        assert_ne!(in_b.id(), in_a.id());
        assert_eq!(b.len(), 1);
        assert!(b.is_registered(&in_b));
        assert!(b.is_registered(&in_a));
        assert_eq!(b.registration(&in_a).map(|r| r.source), Some(in_a.id()));
        assert_eq!(b.register(&in_b).id(), in_b.id());

        let f = in_b.apply(Function::new("f", |x: i32| x + 1)).unwrap();
        assert_eq!(f.call(1), 2);
        assert!(a.is_decorated_with(&f, &in_a).unwrap());
        assert!(b.is_decorated_with(&f, &in_b).unwrap());
        assert_eq!(a.registration(&in_a).map(|r| r.applications), Some(1));
        assert_eq!(b.registration(&in_b).map(|r| r.applications), Some(1));
    }

    #[test]
    fn relaxed_targets_answer_false_for_native() {
        let registry =
            Registry::with_config(RegistryConfig { strict_targets: false, ..RegistryConfig::default() });
        let tracked = registry.register(&passthrough("pass"));
        let native = Function::native("abs", i32::abs);

        assert!(!registry.is_decorated_with(&native, &tracked).unwrap());
        assert!(registry.decorators_of(&native).unwrap().is_empty());
        assert!(registry.real_function(&native).unwrap().same_as(&native));
    }
}

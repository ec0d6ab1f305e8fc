//! # Decorator Registry
//!
//! Tags functions with the decorators that wrapped them and answers
//! "was `f` wrapped by `d`?" without unwrapping closures by hand.
//!
//! ## Overview
//!
//! * [`Function`] is a shared callable with an identity and a lazily created
//!   annotation record ([`Annotations`]).
//! * [`Decorator`] turns a function into a replacement function.
//! * [`Registry::register`] returns a *tracked* decorator: same behavior, plus the
//!   decorator's identity is appended to the record of the function it wraps.
//! * [`Registry::is_decorated_with`] checks the record, through any number of
//!   wrapping layers.
//!
//! Identity is always reference identity ([`DecoratorId`], [`FunctionId`]); two
//! decorators that behave the same are still different decorators.
//!
//! # Example
//!
//! ```rust
//! use regd::{Decorator, Function, Registry};
//!
//! # fn main() -> regd::Result<()> {
//! let registry = Registry::new();
//!
//! let traced = registry.register(&Decorator::new("traced", |f: Function<u32, u32>| {
//!     Function::new("traced", move |x| f.call(x))
//! }));
//! let cached = registry.register(&Decorator::new("cached", |f: Function<u32, u32>| {
//!     Function::new("cached", move |x| f.call(x))
//! }));
//!
//! let inc = Function::new("inc", |x: u32| x + 1);
//! let inc = cached.apply(traced.apply(inc)?)?;
//!
//! assert_eq!(inc.call(1), 2);
//! assert!(registry.is_decorated_with(&inc, &traced)?);
//! assert!(registry.is_decorated_with(&inc, &cached)?);
//! assert_eq!(registry.real_function(&inc)?.name(), "inc");
//! # Ok(())
//! # }
//! ```

mod config;
mod decorator;
mod error;
mod function;
mod id;
mod registry;

pub use crate::config::{RegistryConfig, load_config};
pub use decorator::{Decorator, DecoratorIdentity, ParametrizedDecorator};
pub use error::{RegistryError, RegistryErrorExt, Result};
pub use function::{Annotations, Function, FunctionKind};
pub use id::{DecoratorId, FunctionId};
pub use registry::{DecoratorKind, Registration, Registry};

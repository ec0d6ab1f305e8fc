#![allow(dead_code)]

use regd::{Decorator, Function, ParametrizedDecorator};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type Args = Vec<i64>;
pub type Target = Function<Args, Args>;

/// Returns its arguments unchanged.
pub fn echo(name: &'static str) -> Target {
    Function::new(name, |args: Args| args)
}

/// Plain pass-through decorator that is never registered.
pub fn free_decorator() -> Decorator<Args, Args> {
    Decorator::new("free_decorator", |f: Target| {
        Function::new(f.name().to_owned(), move |args| f.call(args))
    })
}

/// Plain pass-through decorator.
pub fn just_decorator() -> Decorator<Args, Args> {
    Decorator::new("just_decorator", |f: Target| {
        Function::new(f.name().to_owned(), move |args| f.call(args))
    })
}

/// Decorator factory; the parameters are accepted and ignored.
pub fn decorator_with_args() -> ParametrizedDecorator<(i64, i64, i64), Args, Args> {
    ParametrizedDecorator::new("decorator_with_args", |_params: (i64, i64, i64)| {
        Decorator::new("decorator", |f: Target| {
            Function::new(f.name().to_owned(), move |args| f.call(args))
        })
    })
}

/// Decorator that counts calls through the wrapper.
pub fn counting(counter: Arc<AtomicUsize>) -> Decorator<Args, Args> {
    Decorator::new("counting", move |f: Target| {
        let counter = Arc::clone(&counter);
        Function::new(f.name().to_owned(), move |args| {
            counter.fetch_add(1, Ordering::SeqCst);
            f.call(args)
        })
    })
}

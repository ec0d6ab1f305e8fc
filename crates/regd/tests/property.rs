pub mod fixtures;

use fixtures::*;
use proptest::prelude::*;
use regd::{Decorator, Function, Registry};

fn scale(factor: i64) -> Decorator<Args, Args> {
    Decorator::new("scale", move |f: Target| {
        Function::new(f.name().to_owned(), move |args: Args| {
            f.call(args.into_iter().map(|v| v.wrapping_mul(factor)).collect())
        })
    })
}

proptest! {
    #[test]
    fn tracked_wrapper_matches_untracked(
        args in proptest::collection::vec(any::<i64>(), 0..64),
        factor in any::<i64>(),
    ) {
        let plain = scale(factor).apply(echo("plain")).unwrap();

        let registry = Registry::new();
        let tracked_scale = registry.register(&scale(factor));
        let tracked = tracked_scale.apply(echo("tracked")).unwrap();

        prop_assert_eq!(plain.call(args.clone()), tracked.call(args));
        prop_assert!(registry.is_decorated_with(&tracked, &tracked_scale).unwrap());
    }

    #[test]
    fn every_stacked_decorator_is_discoverable(depth in 1usize..12) {
        let registry = Registry::new();
        let decorators: Vec<_> =
            (0..depth).map(|_| registry.register(&just_decorator())).collect();

        let mut function = echo("stacked");
        for decorator in &decorators {
            function = decorator.apply(function).unwrap();
        }

        for decorator in &decorators {
            prop_assert!(registry.is_decorated_with(&function, decorator).unwrap());
        }
        let ids: Vec<_> = decorators.iter().map(Decorator::id).collect();
        prop_assert_eq!(registry.decorators_of(&function).unwrap(), ids);
        prop_assert_eq!(function.call(vec![1, 2, 3]), vec![1, 2, 3]);
    }
}

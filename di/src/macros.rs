//! Public macros for resolution at call sites where a missing dependency is a startup bug.

/// Resolves a type or capability, panicking with the resolution error on failure.
///
/// Without a container the [`global`](crate::global) container is used;
/// `in <container>` selects another one.
///
/// # Panics
///
/// Panics if the service cannot be resolved. For a non-panicking version,
/// call [`Container::resolve`](crate::Container::resolve) directly.
///
/// # Examples
///
/// ```
/// use fibre_di::{resolve, Container};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let container = Container::new();
/// container
///   .provide(|| EnglishGreeter)
///   .bind(|it| it as Arc<dyn Greeter>);
///
/// let greeter = resolve!(in container, trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
///
/// let concrete = resolve!(in container, EnglishGreeter);
/// assert_eq!(concrete.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
  // resolve!(trait MyTrait)
  (trait $trait_ident:ident) => {
    $crate::resolve!(in $crate::global(), trait $trait_ident)
  };

  // resolve!(in container, trait MyTrait)
  (in $container:expr, trait $trait_ident:ident) => {
    $container
      .resolve_capability::<dyn $trait_ident>()
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required capability {}: {}",
          std::any::type_name::<dyn $trait_ident>(),
          err
        )
      })
  };

  // resolve!(in container, MyService)
  (in $container:expr, $type:ty) => {
    $container
      .resolve::<$type>()
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required service {}: {}",
          std::any::type_name::<$type>(),
          err
        )
      })
  };

  // resolve!(MyService)
  ($type:ty) => {
    $crate::resolve!(in $crate::global(), $type)
  };
}

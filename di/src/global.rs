//! The global container instance and access functions.

use crate::container::Container;
use once_cell::sync::Lazy;

// Created on first access, in a thread-safe manner.
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(Container::default);

/// Provides a reference to the process-wide container.
///
/// Convenient when wiring is spread over several modules of one binary.
/// Tests and libraries should prefer their own [`Container`] so their
/// providers do not collide with the application's.
///
/// # Examples
///
/// ```
/// use fibre_di::global;
///
/// struct Banner(String);
///
/// global().provide(|| Banner(String::from("Hello from global!")));
/// assert_eq!(global().resolve::<Banner>().unwrap().0, "Hello from global!");
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}

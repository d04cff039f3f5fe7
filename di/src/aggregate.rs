//! Resolving a struct field by field.

use crate::container::Container;
use crate::error::{Error, Result};
use std::any::Any;
use std::sync::Arc;

/// A struct whose fields are filled from a [`Container`].
///
/// Usually implemented with [`impl_aggregate!`](crate::impl_aggregate).
pub trait Aggregate {
  fn resolve_fields(&mut self, fields: &mut Fields<'_>) -> Result<()>;
}

/// Field-level access to a container during [`Container::resolve_to_struct`].
pub struct Fields<'c> {
  container: &'c Container,
}

impl<'c> Fields<'c> {
  pub(crate) fn new(container: &'c Container) -> Self {
    Self { container }
  }

  /// Resolves the slot's type and stores it, or reports the failure under `name`.
  pub fn field<T: ?Sized + Any + Send + Sync>(
    &mut self,
    name: &'static str,
    slot: &mut Option<Arc<T>>,
  ) -> Result<()> {
    let value = self
      .container
      .resolve::<T>()
      .map_err(|source| Error::Field {
        field: name,
        source: Box::new(source),
      })?;
    *slot = Some(value);
    Ok(())
  }
}

/// Implements [`Aggregate`] for a struct whose listed fields are `Option<Arc<T>>` slots.
///
/// Fields are resolved in the order they are listed; unlisted fields are skipped.
///
/// ```
/// use fibre_di::{impl_aggregate, Container};
/// use std::sync::Arc;
///
/// struct Settings { port: u16 }
///
/// #[derive(Default)]
/// struct Handles {
///   settings: Option<Arc<Settings>>,
/// }
///
/// impl_aggregate!(Handles { settings });
///
/// let container = Container::new();
/// let _ = container.provide(|| Settings { port: 8080 });
///
/// let mut handles = Handles::default();
/// container.resolve_to_struct(&mut handles).unwrap();
/// assert_eq!(handles.settings.unwrap().port, 8080);
/// ```
#[macro_export]
macro_rules! impl_aggregate {
  ($target:ty { $($field:ident),* $(,)? }) => {
    impl $crate::Aggregate for $target {
      fn resolve_fields(&mut self, fields: &mut $crate::Fields<'_>) -> $crate::Result<()> {
        $( fields.field(stringify!($field), &mut self.$field)?; )*
        Ok(())
      }
    }
  };
}

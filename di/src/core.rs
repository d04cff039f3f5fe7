//! Core, non-public data structures for the wiring engine.

use crate::error::Error;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type-erased instance. It always holds an `Arc<T>` for the key it was stored under.
pub type Erased = Arc<dyn Any + Send + Sync>;

pub(crate) fn erase<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Erased {
  Arc::new(value)
}

pub(crate) fn unerase<T: ?Sized + Any + Send + Sync>(value: &Erased) -> Option<Arc<T>> {
  value.downcast_ref::<Arc<T>>().cloned()
}

/// Descriptor of a concrete type or a capability (`dyn Trait`).
///
/// Equality and hashing only consider the `TypeId`; the name is carried
/// along for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
}

impl TypeKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeKey({})", self.name)
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// An RAII guard marking a produced type as under construction.
///
/// Acquiring fails with [`Error::Cycle`] if the key is already marked, which
/// means the provider was reached again through its own dependency chain.
/// Dropping the guard releases the mark on every exit path, unwinding included.
pub(crate) struct ConstructionGuard<'a> {
  in_progress: &'a RefCell<HashSet<TypeKey>>,
  key: TypeKey,
}

impl<'a> ConstructionGuard<'a> {
  pub(crate) fn acquire(
    in_progress: &'a RefCell<HashSet<TypeKey>>,
    key: TypeKey,
    provider: &str,
  ) -> Result<Self, Error> {
    // `insert` returns `false` if the value was already present.
    if !in_progress.borrow_mut().insert(key) {
      return Err(Error::Cycle {
        provider: provider.to_owned(),
      });
    }
    Ok(Self { in_progress, key })
  }
}

impl Drop for ConstructionGuard<'_> {
  fn drop(&mut self) {
    self.in_progress.borrow_mut().remove(&self.key);
  }
}

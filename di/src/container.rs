//! The main `Container` struct and its associated methods.

use crate::aggregate::{Aggregate, Fields};
use crate::core::{unerase, TypeKey};
use crate::error::{BoxError, Error, LookupKind, Result};
use crate::provider::{Constructor, Provider, ProviderHandle};
use crate::registry::{ManagedService, Registry};
use parking_lot::ReentrantMutex;
use std::any::Any;
use std::sync::Arc;

/// The dependency graph container.
///
/// Holds the registered providers and every instance built from them. All
/// instances are singletons that live as long as the container.
///
/// Registration and resolution share one reentrant lock: a whole recursive
/// construction chain runs while holding it, so graph construction is fully
/// serialized across threads. A constructor may itself resolve from the same
/// container on the same thread; such nested lookups take part in cycle
/// detection like ordinary parameters. Registering providers from inside a
/// constructor panics.
#[derive(Default)]
pub struct Container {
  registry: ReentrantMutex<Registry>,
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  // --- Registration ---

  /// Registers an infallible constructor.
  ///
  /// Every parameter must be an `Arc<D>`; each is resolved from the graph
  /// by the type `D`, unless an override of type `D` is attached with
  /// [`ProviderHandle::arg`].
  ///
  /// # Panics
  ///
  /// Panics if a provider for the same produced type is already registered.
  pub fn provide<Args, C>(&self, constructor: C) -> ProviderHandle<'_, C::Output>
  where
    C: Constructor<Args>,
    C::Output: Any + Send + Sync,
  {
    self.register(Provider::new(constructor))
  }

  /// Registers a constructor returning `Result<T, E>`.
  ///
  /// An `Err` aborts the resolution that triggered it and is reported as
  /// [`Error::Construction`] with the provider's name attached.
  ///
  /// # Panics
  ///
  /// Panics if a provider for the same produced type is already registered.
  pub fn provide_fallible<Args, C, T, E>(&self, constructor: C) -> ProviderHandle<'_, T>
  where
    C: Constructor<Args, Output = std::result::Result<T, E>>,
    T: Any + Send + Sync,
    E: Into<BoxError>,
  {
    self.register(Provider::new_fallible(constructor))
  }

  fn register<T: Any + Send + Sync>(&self, provider: Provider) -> ProviderHandle<'_, T> {
    let index = self.registry.lock().register(provider);
    ProviderHandle::new(self, index)
  }

  pub(crate) fn update_provider(&self, index: usize, update: impl FnOnce(&mut Provider)) {
    self.registry.lock().update(index, update);
  }

  // --- Resolution ---

  /// Resolves `T` by type: the first provider producing `T`, or binding `T` as a capability.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.resolve_as::<T>(LookupKind::Type)
  }

  /// Resolves the capability `I` (a `dyn Trait` type): the first registered
  /// provider that binds it wins.
  pub fn resolve_capability<I: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<I>> {
    self.resolve_as::<I>(LookupKind::Capability)
  }

  fn resolve_as<T: ?Sized + Any + Send + Sync>(&self, kind: LookupKind) -> Result<Arc<T>> {
    let registry = self.registry.lock();
    let instance = registry.resolve(TypeKey::of::<T>(), kind)?;
    unerase::<T>(&instance).ok_or(Error::TypeMismatch {
      type_name: std::any::type_name::<T>(),
    })
  }

  /// Resolves every field `target` declares, in declaration order.
  ///
  /// Stops at the first field that fails and reports it as [`Error::Field`];
  /// fields after it are left untouched.
  pub fn resolve_to_struct<A: Aggregate + ?Sized>(&self, target: &mut A) -> Result<()> {
    target.resolve_fields(&mut Fields::new(self))
  }

  // --- Inspection ---

  /// Type names of every instance built so far, in construction order.
  pub fn creation_order(&self) -> Vec<&'static str> {
    self.registry.lock().creation_order()
  }

  pub fn provider_count(&self) -> usize {
    self.registry.lock().provider_count()
  }

  pub(crate) fn managed_services(&self) -> Vec<ManagedService> {
    self.registry.lock().managed()
  }
}

//! Provider storage and the resolution algorithm.

use crate::core::{ConstructionGuard, Erased, TypeKey};
use crate::error::{Error, LookupKind, Result};
use crate::lifecycle::Lifecycle;
use crate::provider::Provider;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// An instance the registry actually built, in construction order.
struct Constructed {
  provider: String,
  key: TypeKey,
  lifecycle: Option<Arc<dyn Lifecycle>>,
}

/// A constructed instance that takes part in orchestrated start and stop.
#[derive(Clone)]
pub(crate) struct ManagedService {
  pub(crate) name: String,
  pub(crate) service: Arc<dyn Lifecycle>,
}

/// All wiring state of one container.
///
/// Every field uses interior mutability so that resolution can run through
/// `&self`: the in-progress guard and recursive lookups borrow the registry
/// at the same time, and a constructor may resolve re-entrantly through the
/// container's lock. Borrows of the cache and lists are never held across a
/// constructor call.
#[derive(Default)]
pub(crate) struct Registry {
  providers: RefCell<Vec<Provider>>,
  cache: RefCell<HashMap<TypeKey, Erased>>,
  in_progress: RefCell<HashSet<TypeKey>>,
  constructed: RefCell<Vec<Constructed>>,
}

impl Registry {
  /// Adds a provider and returns its index.
  ///
  /// # Panics
  ///
  /// Panics if a provider for the same produced type exists, or if called
  /// from a constructor while a resolution is in progress.
  pub(crate) fn register(&self, provider: Provider) -> usize {
    let mut providers = self.providers_mut();
    if providers.iter().any(|p| p.produces == provider.produces) {
      panic!("duplicate provider for {}", provider.produces);
    }
    tracing::debug!(provider = %provider.name, produces = %provider.produces, "registered provider");
    providers.push(provider);
    providers.len() - 1
  }

  pub(crate) fn update(&self, index: usize, update: impl FnOnce(&mut Provider)) {
    let mut providers = self.providers_mut();
    if let Some(provider) = providers.get_mut(index) {
      update(provider);
    }
  }

  fn providers_mut(&self) -> std::cell::RefMut<'_, Vec<Provider>> {
    self
      .providers
      .try_borrow_mut()
      .unwrap_or_else(|_| panic!("providers cannot be changed while a resolution is in progress"))
  }

  pub(crate) fn provider_count(&self) -> usize {
    self.providers.borrow().len()
  }

  /// Resolves `key`, constructing whatever part of the graph is missing.
  ///
  /// The first registered provider that satisfies `key` wins; later matches
  /// are never considered, even when several bind the same capability.
  pub(crate) fn resolve(&self, key: TypeKey, kind: LookupKind) -> Result<Erased> {
    if let Some(hit) = self.cached(&key) {
      tracing::trace!(%key, "resolved from cache");
      return Ok(hit);
    }

    let providers = self.providers.borrow();
    let provider = providers
      .iter()
      .find(|p| p.satisfies(&key))
      .ok_or(Error::NotFound {
        kind,
        type_name: key.name(),
      })?;

    let instance = self.instance_of(provider)?;
    let view = provider
      .view(&key, &instance)
      .ok_or(Error::TypeMismatch {
        type_name: key.name(),
      })?;
    self.cache.borrow_mut().insert(key, view.clone());
    Ok(view)
  }

  fn cached(&self, key: &TypeKey) -> Option<Erased> {
    self.cache.borrow().get(key).cloned()
  }

  /// Returns the provider's single instance, building it on first use.
  fn instance_of(&self, provider: &Provider) -> Result<Erased> {
    if let Some(hit) = self.cached(&provider.produces) {
      return Ok(hit);
    }

    let _guard = ConstructionGuard::acquire(&self.in_progress, provider.produces, &provider.name)?;

    let mut args = Vec::with_capacity(provider.parameters.len());
    for parameter in &provider.parameters {
      if let Some(value) = provider.overrides.get(parameter) {
        args.push(value.clone());
        continue;
      }
      let value = self
        .resolve(*parameter, LookupKind::Type)
        .map_err(|source| Error::Dependency {
          provider: provider.name.clone(),
          source: Box::new(source),
        })?;
      args.push(value);
    }

    let instance = provider
      .invoke(&args)
      .map_err(|source| Error::Construction {
        provider: provider.name.clone(),
        source,
      })?;

    let lifecycle = provider.lifecycle.as_ref().and_then(|probe| probe(&instance));
    tracing::debug!(
      provider = %provider.name,
      produces = %provider.produces,
      managed = lifecycle.is_some(),
      "constructed instance"
    );

    self
      .cache
      .borrow_mut()
      .insert(provider.produces, instance.clone());
    self.constructed.borrow_mut().push(Constructed {
      provider: provider.name.clone(),
      key: provider.produces,
      lifecycle,
    });

    Ok(instance)
  }

  pub(crate) fn creation_order(&self) -> Vec<&'static str> {
    self
      .constructed
      .borrow()
      .iter()
      .map(|c| c.key.name())
      .collect()
  }

  /// Constructed instances with lifecycle membership, in construction order.
  pub(crate) fn managed(&self) -> Vec<ManagedService> {
    self
      .constructed
      .borrow()
      .iter()
      .filter_map(|c| {
        c.lifecycle.as_ref().map(|service| ManagedService {
          name: c.provider.clone(),
          service: service.clone(),
        })
      })
      .collect()
  }
}

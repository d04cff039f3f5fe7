//! Providers: constructor metadata, the invocation adapter and the registration handle.

use crate::container::Container;
use crate::core::{erase, unerase, Erased, TypeKey};
use crate::error::BoxError;
use crate::lifecycle::Lifecycle;
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// A constructor parameter that can be satisfied from the graph or from an override.
///
/// Every parameter is an `Arc<D>`, where `D` may be a concrete type or a
/// capability such as `dyn Repo + Send + Sync`.
pub trait Dependency: Sized + Send + 'static {
  fn key() -> TypeKey;

  #[doc(hidden)]
  fn from_erased(value: &Erased) -> Option<Self>;
}

impl<D: ?Sized + Any + Send + Sync> Dependency for Arc<D> {
  fn key() -> TypeKey {
    TypeKey::of::<D>()
  }

  fn from_erased(value: &Erased) -> Option<Self> {
    unerase::<D>(value)
  }
}

/// Any function or closure whose parameters are all [`Dependency`] values.
///
/// `Args` is the tuple of parameter types; it is inferred from the
/// callable's signature and lets one callable type be described without
/// runtime inspection.
pub trait Constructor<Args>: Send + Sync + 'static {
  type Output;

  fn parameters() -> Vec<TypeKey>;

  #[doc(hidden)]
  fn construct(&self, args: &[Erased]) -> Result<Self::Output, BoxError>;
}

fn mismatch<D: Dependency>() -> BoxError {
  format!("argument does not match parameter type {}", D::key()).into()
}

macro_rules! impl_constructor {
  ($($param:ident),*) => {
    impl<Func, Out, $($param,)*> Constructor<($($param,)*)> for Func
    where
      Func: Fn($($param),*) -> Out + Send + Sync + 'static,
      $($param: Dependency,)*
    {
      type Output = Out;

      fn parameters() -> Vec<TypeKey> {
        vec![$(<$param as Dependency>::key()),*]
      }

      #[allow(non_snake_case, unused_mut, unused_variables)]
      fn construct(&self, args: &[Erased]) -> Result<Out, BoxError> {
        let mut args = args.iter();
        $(
          let $param = match args.next().and_then(<$param as Dependency>::from_erased) {
            Some(value) => value,
            None => return Err(mismatch::<$param>()),
          };
        )*
        Ok((self)($($param),*))
      }
    }
  };
}

impl_constructor!();
impl_constructor!(A1);
impl_constructor!(A1, A2);
impl_constructor!(A1, A2, A3);
impl_constructor!(A1, A2, A3, A4);
impl_constructor!(A1, A2, A3, A4, A5);
impl_constructor!(A1, A2, A3, A4, A5, A6);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7, A8);

/// A tuple of override values for [`ProviderHandle::args`].
pub trait ArgSet {
  #[doc(hidden)]
  fn into_overrides(self) -> Vec<(TypeKey, Erased)>;
}

macro_rules! impl_arg_set {
  ($($value:ident),+) => {
    impl<$($value: Any + Send + Sync),+> ArgSet for ($($value,)+) {
      #[allow(non_snake_case)]
      fn into_overrides(self) -> Vec<(TypeKey, Erased)> {
        let ($($value,)+) = self;
        vec![$((TypeKey::of::<$value>(), erase(Arc::new($value)))),+]
      }
    }
  };
}

impl_arg_set!(V1);
impl_arg_set!(V1, V2);
impl_arg_set!(V1, V2, V3);
impl_arg_set!(V1, V2, V3, V4);
impl_arg_set!(V1, V2, V3, V4, V5);
impl_arg_set!(V1, V2, V3, V4, V5, V6);

type Invoke = Box<dyn Fn(&[Erased]) -> Result<Erased, BoxError> + Send + Sync>;
type Cast = Box<dyn Fn(&Erased) -> Option<Erased> + Send + Sync>;
pub(crate) type LifecycleProbe = Box<dyn Fn(&Erased) -> Option<Arc<dyn Lifecycle>> + Send + Sync>;

/// A capability the produced type satisfies, with the cast that produces its view.
struct Capability {
  key: TypeKey,
  cast: Cast,
}

pub(crate) struct Provider {
  pub(crate) name: String,
  pub(crate) produces: TypeKey,
  pub(crate) parameters: Vec<TypeKey>,
  pub(crate) overrides: HashMap<TypeKey, Erased>,
  pub(crate) lifecycle: Option<LifecycleProbe>,
  capabilities: Vec<Capability>,
  invoke: Invoke,
}

impl Provider {
  pub(crate) fn new<Args, C>(constructor: C) -> Self
  where
    C: Constructor<Args>,
    C::Output: Any + Send + Sync,
  {
    Self::with_invoke::<C::Output, _>(
      std::any::type_name::<C>(),
      C::parameters(),
      move |args| Ok(erase(Arc::new(constructor.construct(args)?))),
    )
  }

  pub(crate) fn new_fallible<Args, C, T, E>(constructor: C) -> Self
  where
    C: Constructor<Args, Output = Result<T, E>>,
    T: Any + Send + Sync,
    E: Into<BoxError>,
  {
    Self::with_invoke::<T, _>(
      std::any::type_name::<C>(),
      C::parameters(),
      move |args| {
        let value = constructor.construct(args)?.map_err(Into::<BoxError>::into)?;
        Ok(erase(Arc::new(value)))
      },
    )
  }

  fn with_invoke<T: Any + Send + Sync, F>(name: &str, parameters: Vec<TypeKey>, invoke: F) -> Self
  where
    F: Fn(&[Erased]) -> Result<Erased, BoxError> + Send + Sync + 'static,
  {
    Self {
      name: name.to_owned(),
      produces: TypeKey::of::<T>(),
      parameters,
      overrides: HashMap::new(),
      lifecycle: None,
      capabilities: Vec::new(),
      invoke: Box::new(invoke),
    }
  }

  /// Whether this provider can serve `key`, either as its own type or as a bound capability.
  pub(crate) fn satisfies(&self, key: &TypeKey) -> bool {
    self.produces == *key || self.capabilities.iter().any(|c| c.key == *key)
  }

  /// The view of `instance` to store under `key`.
  pub(crate) fn view(&self, key: &TypeKey, instance: &Erased) -> Option<Erased> {
    if self.produces == *key {
      return Some(instance.clone());
    }
    self
      .capabilities
      .iter()
      .find(|c| c.key == *key)
      .and_then(|c| (c.cast)(instance))
  }

  pub(crate) fn invoke(&self, args: &[Erased]) -> Result<Erased, BoxError> {
    (self.invoke)(args)
  }
}

/// Returned by [`Container::provide`]; attaches overrides, capabilities and
/// lifecycle membership to the provider it was created for.
pub struct ProviderHandle<'c, T> {
  container: &'c Container,
  index: usize,
  _marker: PhantomData<fn() -> T>,
}

impl<'c, T: Any + Send + Sync> ProviderHandle<'c, T> {
  pub(crate) fn new(container: &'c Container, index: usize) -> Self {
    Self {
      container,
      index,
      _marker: PhantomData,
    }
  }

  /// Binds `value` as the argument for every parameter of type `Arc<V>`.
  ///
  /// Overrides take precedence over graph resolution, which is how plain
  /// values such as configuration strings enter the graph.
  pub fn arg<V: Any + Send + Sync>(self, value: V) -> Self {
    self.add_overrides(vec![(TypeKey::of::<V>(), erase(Arc::new(value)))]);
    self
  }

  /// Binds several values at once, each keyed by its own type.
  pub fn args<A: ArgSet>(self, values: A) -> Self {
    self.add_overrides(values.into_overrides());
    self
  }

  /// Declares that the produced type satisfies the capability `I`.
  ///
  /// `cast` is usually the identity closure, `|it| it`, and relies on unsized
  /// coercion from `Arc<T>` to `Arc<dyn Trait>`.
  pub fn bind<I, F>(self, cast: F) -> Self
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
  {
    let capability = Capability {
      key: TypeKey::of::<I>(),
      cast: Box::new(move |instance: &Erased| unerase::<T>(instance).map(|it| erase(cast(it)))),
    };
    self
      .container
      .update_provider(self.index, |provider| provider.capabilities.push(capability));
    self
  }

  /// Replaces the diagnostic name, which defaults to the constructor's type name.
  pub fn named(self, name: impl Into<String>) -> Self {
    let name = name.into();
    self
      .container
      .update_provider(self.index, |provider| provider.name = name);
    self
  }

  fn add_overrides(&self, overrides: Vec<(TypeKey, Erased)>) {
    self.container.update_provider(self.index, |provider| {
      tracing::trace!(provider = %provider.name, count = overrides.len(), "attaching overrides");
      provider.overrides.extend(overrides);
    });
  }
}

impl<'c, T: Lifecycle> ProviderHandle<'c, T> {
  /// Includes instances of this provider in orchestrated start and stop.
  pub fn managed(self) -> Self {
    let probe: LifecycleProbe =
      Box::new(|instance: &Erased| unerase::<T>(instance).map(|it| it as Arc<dyn Lifecycle>));
    self
      .container
      .update_provider(self.index, |provider| provider.lifecycle = Some(probe));
    self
  }
}

//! The capability pair driven by the [`App`](crate::App) orchestrator.

use crate::context::Context;
use crate::error::BoxError;
use async_trait::async_trait;

/// A constructed instance that takes part in ordered startup and shutdown.
///
/// Providers opt in with [`ProviderHandle::managed`](crate::ProviderHandle::managed).
/// Implementing this trait alone is not enough: an instance whose provider
/// was registered without `managed()` is never started or stopped.
/// Each call runs on its own task and receives a context bounded by the
/// orchestrator's timeout for that phase; implementations should watch
/// [`Context::done`] if they can block for long.
#[async_trait]
pub trait Lifecycle: Send + Sync + 'static {
  async fn start(&self, ctx: Context) -> Result<(), BoxError>;

  async fn stop(&self, ctx: Context) -> Result<(), BoxError>;
}

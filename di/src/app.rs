//! Ordered, deadline-bounded startup and shutdown of constructed services.

use crate::config::{AppConfig, DEFAULT_START_TIMEOUT, DEFAULT_STOP_TIMEOUT};
use crate::container::Container;
use crate::context::{Context, Done};
use crate::error::{Error, Phase, Result};
use crate::registry::ManagedService;
use std::time::Duration;
use tracing::Dispatch;

/// Drives [`Lifecycle`](crate::Lifecycle) instances of one container.
///
/// Services are started in the order they were constructed and stopped in
/// reverse. Only instances that exist when `start` or `stop` is called take
/// part; `App` never constructs anything itself.
///
/// Each `start`/`stop` call runs on a spawned task raced against the
/// phase's deadline. When the deadline wins, the task is abandoned rather
/// than cancelled and may keep running in the background.
pub struct App<'c> {
  container: &'c Container,
  start_timeout: Duration,
  stop_timeout: Duration,
  logger: Option<Dispatch>,
}

impl<'c> App<'c> {
  pub fn new(container: &'c Container) -> Self {
    Self {
      container,
      start_timeout: DEFAULT_START_TIMEOUT,
      stop_timeout: DEFAULT_STOP_TIMEOUT,
      logger: None,
    }
  }

  pub fn from_config(container: &'c Container, config: &AppConfig) -> Self {
    Self::new(container)
      .with_start_timeout(config.start_timeout)
      .with_stop_timeout(config.stop_timeout)
  }

  /// Zero disables the bound.
  pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
    self.start_timeout = timeout;
    self
  }

  /// Zero disables the bound.
  pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
    self.stop_timeout = timeout;
    self
  }

  /// Sends progress events to `logger`. Without one the orchestrator is silent.
  pub fn with_logger(mut self, logger: impl Into<Dispatch>) -> Self {
    self.logger = Some(logger.into());
    self
  }

  /// Starts every managed service in construction order.
  ///
  /// Stops at the first failure; the services after it are not started.
  pub async fn start(&self, ctx: &Context) -> Result<()> {
    let ctx = bounded(ctx, self.start_timeout);
    let services = self.container.managed_services();
    self.log(|| tracing::info!(services = services.len(), "Starting..."));

    for service in &services {
      if let Err(err) = call(&ctx, service, Phase::Start).await {
        if let Error::DeadlineExceeded { .. } = err {
          self.log(|| tracing::error!(service = %service.name, "Start timed out."));
        } else {
          self.log(|| tracing::error!(error = %err, "Failed to start."));
        }
        return Err(err);
      }
    }

    self.log(|| tracing::info!("Started."));
    Ok(())
  }

  /// Stops every managed service in reverse construction order.
  ///
  /// Every service gets a stop attempt even after an earlier one failed.
  /// Deadline expiries are logged but never returned; otherwise the first
  /// error encountered is returned. When any service missed the deadline the
  /// final log line is "Stop timed out." rather than "Stopped.".
  pub async fn stop(&self, ctx: &Context) -> Result<()> {
    let ctx = bounded(ctx, self.stop_timeout);
    let services = self.container.managed_services();
    self.log(|| tracing::info!(services = services.len(), "Stopping..."));

    let mut first_err = None;
    let mut timed_out = false;
    for service in services.iter().rev() {
      match call(&ctx, service, Phase::Stop).await {
        Ok(()) => {}
        Err(Error::DeadlineExceeded { .. }) => {
          timed_out = true;
          self.log(|| tracing::warn!(service = %service.name, "Stop deadline exceeded."));
        }
        Err(err) => {
          self.log(|| tracing::error!(error = %err, "Failed to stop cleanly."));
          first_err.get_or_insert(err);
        }
      }
    }

    match first_err {
      Some(err) => Err(err),
      None if timed_out => {
        self.log(|| tracing::warn!("Stop timed out."));
        Ok(())
      }
      None => {
        self.log(|| tracing::info!("Stopped."));
        Ok(())
      }
    }
  }

  /// Starts all services, waits for `ctx` to finish, then stops them.
  ///
  /// Stopping always uses a fresh context bounded only by the stop timeout,
  /// so shutdown still runs after `ctx` is gone. If starting fails, the
  /// services that did start are stopped and the start error is returned.
  pub async fn run(&self, ctx: Context) -> Result<()> {
    if let Err(err) = self.start(&ctx).await {
      if let Err(stop_err) = self.stop(&Context::background()).await {
        self.log(|| tracing::error!(error = %stop_err, "Stop after failed start also failed."));
      }
      return Err(err);
    }

    let reason = ctx.done().await;
    self.log(|| tracing::info!(?reason, "Shutting down."));

    self.stop(&Context::background()).await
  }

  fn log(&self, event: impl FnOnce()) {
    if let Some(logger) = &self.logger {
      tracing::dispatcher::with_default(logger, event);
    }
  }
}

fn bounded(ctx: &Context, timeout: Duration) -> Context {
  if timeout.is_zero() {
    ctx.clone()
  } else {
    ctx.with_timeout(timeout)
  }
}

/// Runs one service's hook on its own task and races it against `ctx`.
async fn call(ctx: &Context, service: &ManagedService, phase: Phase) -> Result<()> {
  let instance = service.service.clone();
  let hook_ctx = ctx.clone();
  let task = tokio::spawn(async move {
    match phase {
      Phase::Start => instance.start(hook_ctx).await,
      Phase::Stop => instance.stop(hook_ctx).await,
    }
  });

  let name = || service.name.clone();
  tokio::select! {
    joined = task => match joined {
      Ok(Ok(())) => Ok(()),
      Ok(Err(source)) => Err(Error::Lifecycle { service: name(), phase, source }),
      Err(join_err) => Err(Error::Lifecycle { service: name(), phase, source: Box::new(join_err) }),
    },
    done = ctx.done() => Err(match done {
      Done::DeadlineExceeded => Error::DeadlineExceeded { service: name(), phase },
      Done::Cancelled => Error::Cancelled { service: name(), phase },
    }),
  }
}

use fibre_di::{async_trait, App, BoxError, Container, Context, Lifecycle};
use std::sync::Arc;
use std::time::Duration;

struct Database;

#[async_trait]
impl Lifecycle for Database {
  async fn start(&self, _ctx: Context) -> Result<(), BoxError> {
    tracing::info!("database connected");
    Ok(())
  }

  async fn stop(&self, _ctx: Context) -> Result<(), BoxError> {
    tracing::info!("database disconnected");
    Ok(())
  }
}

struct HttpServer {
  _db: Arc<Database>,
  port: u16,
}

#[async_trait]
impl Lifecycle for HttpServer {
  async fn start(&self, _ctx: Context) -> Result<(), BoxError> {
    tracing::info!(port = self.port, "listening");
    Ok(())
  }

  async fn stop(&self, ctx: Context) -> Result<(), BoxError> {
    // Drain in-flight requests, but never past the stop deadline.
    tokio::select! {
      _ = tokio::time::sleep(Duration::from_millis(200)) => {}
      reason = ctx.done() => tracing::warn!(?reason, "drain cut short"),
    }
    tracing::info!("server stopped");
    Ok(())
  }
}

#[tokio::main]
async fn main() -> Result<(), fibre_di::Error> {
  tracing_subscriber::fmt().init();

  let container = Container::new();
  container.provide(|| Database).managed();
  container
    .provide(|db: Arc<Database>, port: Arc<u16>| HttpServer { _db: db, port: *port })
    .arg(8080_u16)
    .managed();

  // Builds Database first, then HttpServer; that is the start order.
  container.resolve::<HttpServer>()?;

  let ctx = Context::background();
  let signal = ctx.clone();
  tokio::spawn(async move {
    let _ = tokio::signal::ctrl_c().await;
    signal.cancel();
  });

  // Stop automatically after a second so the example terminates on its own.
  App::new(&container)
    .with_stop_timeout(Duration::from_secs(5))
    .with_logger(tracing::dispatcher::get_default(|d| d.clone()))
    .run(ctx.with_timeout(Duration::from_secs(1)))
    .await
}

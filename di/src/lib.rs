//! # Fibre DI
//!
//! A constructor-driven dependency graph wiring engine for Rust.
//!
//! Register constructors with a [`Container`]; when a type is requested the
//! container resolves each constructor parameter from the graph, builds the
//! missing instances bottom-up and caches every one of them as a singleton.
//! An [`App`] can then start the constructed services in the order they were
//! built and stop them in reverse, with a deadline per phase.
//!
//! ## Core Concepts
//!
//! - **Provider**: one registered constructor. Its parameters (`Arc<D>` each)
//!   and produced type are read from its signature.
//! - **Capability**: a `dyn Trait` type a provider declares with
//!   [`ProviderHandle::bind`]. The first registered provider binding a
//!   capability serves it.
//! - **Override**: a value attached with [`ProviderHandle::arg`] that satisfies
//!   a parameter of its type instead of the graph.
//! - **Lifecycle**: providers registered with [`ProviderHandle::managed`] are
//!   started and stopped by [`App`].
//!
//! ## Quick Start
//!
//! ```
//! use fibre_di::Container;
//! use std::sync::Arc;
//!
//! trait Repo: Send + Sync {
//!   fn find(&self) -> String;
//! }
//!
//! struct DbClient {
//!   dsn: String,
//! }
//!
//! struct SqlRepo {
//!   db: Arc<DbClient>,
//! }
//!
//! impl Repo for SqlRepo {
//!   fn find(&self) -> String {
//!     format!("rows from {}", self.db.dsn)
//!   }
//! }
//!
//! struct Service {
//!   repo: Arc<dyn Repo>,
//! }
//!
//! let container = Container::new();
//! container
//!   .provide(|dsn: Arc<String>| DbClient { dsn: (*dsn).clone() })
//!   .arg(String::from("postgres://localhost/app"));
//! container
//!   .provide(|db: Arc<DbClient>| SqlRepo { db })
//!   .bind(|it| it as Arc<dyn Repo>);
//! container.provide(|repo: Arc<dyn Repo>| Service { repo });
//!
//! let service = container.resolve::<Service>().unwrap();
//! assert_eq!(service.repo.find(), "rows from postgres://localhost/app");
//! ```

mod aggregate;
mod app;
mod config;
mod container;
mod context;
mod core;
mod error;
mod global;
mod lifecycle;
mod macros;
mod provider;
mod registry;

pub use aggregate::{Aggregate, Fields};
pub use app::App;
pub use config::{parse_duration, AppConfig, DEFAULT_START_TIMEOUT, DEFAULT_STOP_TIMEOUT};
pub use container::Container;
pub use context::{Context, Done};
pub use crate::core::TypeKey;
pub use error::{BoxError, Error, LookupKind, Phase, Result};
pub use global::global;
pub use lifecycle::Lifecycle;
pub use provider::{ArgSet, Constructor, Dependency, ProviderHandle};

pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;

use std::fmt;
use thiserror::Error;

/// Boxed error returned by constructors and lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The orchestrator phase a lifecycle error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Start,
  Stop,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Phase::Start => f.write_str("start"),
      Phase::Stop => f.write_str("stop"),
    }
  }
}

/// How a failed lookup was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
  Type,
  Capability,
}

impl fmt::Display for LookupKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LookupKind::Type => f.write_str("type"),
      LookupKind::Capability => f.write_str("capability"),
    }
  }
}

/// The main error type for `fibre_di`.
#[derive(Debug, Error)]
pub enum Error {
  #[error("no provider found for {kind} {type_name}")]
  NotFound {
    kind: LookupKind,
    type_name: &'static str,
  },

  #[error("circular dependency detected: {provider}")]
  Cycle { provider: String },

  #[error("constructor {provider} failed: {source}")]
  Construction {
    provider: String,
    #[source]
    source: BoxError,
  },

  #[error("{source} [constructor: {provider}]")]
  Dependency {
    provider: String,
    #[source]
    source: Box<Error>,
  },

  #[error("failed to resolve field `{field}`: {source}")]
  Field {
    field: &'static str,
    #[source]
    source: Box<Error>,
  },

  #[error("stored instance does not have the expected type {type_name}")]
  TypeMismatch { type_name: &'static str },

  #[error("{service} failed to {phase}: {source}")]
  Lifecycle {
    service: String,
    phase: Phase,
    #[source]
    source: BoxError,
  },

  #[error("{service} did not {phase} before the deadline")]
  DeadlineExceeded { service: String, phase: Phase },

  #[error("{service} was cancelled during {phase}")]
  Cancelled { service: String, phase: Phase },

  #[error("Failed to parse configuration: {0}")]
  Config(String),
}

impl Error {
  /// Walks through `Dependency` and `Field` wrappers to the error that started the chain.
  pub fn root_cause(&self) -> &Error {
    match self {
      Error::Dependency { source, .. } | Error::Field { source, .. } => source.root_cause(),
      other => other,
    }
  }

  pub fn is_cycle(&self) -> bool {
    matches!(self.root_cause(), Error::Cycle { .. })
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self.root_cause(), Error::NotFound { .. })
  }

  pub fn is_deadline_exceeded(&self) -> bool {
    matches!(self.root_cause(), Error::DeadlineExceeded { .. })
  }
}

/// A specialized `Result` type for `fibre_di` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

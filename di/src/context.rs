//! A cancellable, deadline-bearing context for lifecycle calls.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Context`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Done {
  Cancelled,
  DeadlineExceeded,
}

/// Pairs a [`CancellationToken`] with an optional deadline.
///
/// Cloning is cheap and clones share the same token. Derived contexts use a
/// child token, so cancelling a parent cancels every context derived from it
/// but not the other way round.
#[derive(Debug, Clone)]
pub struct Context {
  token: CancellationToken,
  deadline: Option<Instant>,
}

impl Context {
  /// A context that is never cancelled by anyone else and has no deadline.
  pub fn background() -> Self {
    Self::new(CancellationToken::new())
  }

  /// Wraps an externally owned token, e.g. one cancelled by a signal handler.
  pub fn new(token: CancellationToken) -> Self {
    Self {
      token,
      deadline: None,
    }
  }

  /// A timeout too large to express as an instant derives a context without a deadline of its own.
  pub fn with_timeout(&self, timeout: Duration) -> Self {
    match Instant::now().checked_add(timeout) {
      Some(deadline) => self.with_deadline(deadline),
      None => Self {
        token: self.token.child_token(),
        deadline: self.deadline,
      },
    }
  }

  /// Derives a context that also finishes at `deadline`. An earlier inherited deadline wins.
  pub fn with_deadline(&self, deadline: Instant) -> Self {
    let deadline = match self.deadline {
      Some(current) if current <= deadline => current,
      _ => deadline,
    };
    Self {
      token: self.token.child_token(),
      deadline: Some(deadline),
    }
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.deadline
  }

  pub fn token(&self) -> &CancellationToken {
    &self.token
  }

  pub fn cancel(&self) {
    self.token.cancel();
  }

  /// Returns why the context finished, or `None` while it is still live.
  pub fn err(&self) -> Option<Done> {
    if self.token.is_cancelled() {
      return Some(Done::Cancelled);
    }
    match self.deadline {
      Some(deadline) if deadline <= Instant::now() => Some(Done::DeadlineExceeded),
      _ => None,
    }
  }

  /// Completes when the token is cancelled or the deadline passes.
  pub async fn done(&self) -> Done {
    match self.deadline {
      Some(deadline) => tokio::select! {
        _ = self.token.cancelled() => Done::Cancelled,
        _ = tokio::time::sleep_until(deadline) => Done::DeadlineExceeded,
      },
      None => {
        self.token.cancelled().await;
        Done::Cancelled
      }
    }
  }
}

impl Default for Context {
  fn default() -> Self {
    Self::background()
  }
}

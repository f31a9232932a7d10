//! Bookkeeping for asynchronous operations started by the session.

use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
  Refresh,
  Analyze,
  Extract,
  Search,
}

impl fmt::Display for OperationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      OperationKind::Refresh => "refresh",
      OperationKind::Analyze => "analyze",
      OperationKind::Extract => "extract",
      OperationKind::Search => "search",
    };
    f.write_str(name)
  }
}

/// Identifies one started operation. Generations grow monotonically per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
  pub kind: OperationKind,
  pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum OperationState {
  Idle,
  Pending { in_flight: usize },
}

/// Per-kind state machine: `idle -> pending -> idle`, counting overlapping
/// requests so one settling never hides another still in flight.
#[derive(Debug, Clone, Default)]
pub struct OperationTracker {
  in_flight: usize,
  issued: u64,
  /// Generations at or below this were invalidated.
  floor: u64,
}

impl OperationTracker {
  pub fn start(&mut self) -> u64 {
    self.in_flight += 1;
    self.issued += 1;
    self.issued
  }

  /// Mark `generation` as settled. Returns whether it is still the newest
  /// request of its kind and was not invalidated since.
  pub fn settle(&mut self, generation: u64) -> bool {
    self.in_flight = self.in_flight.saturating_sub(1);
    self.is_current(generation)
  }

  pub fn is_current(&self, generation: u64) -> bool {
    generation == self.issued && generation > self.floor
  }

  /// Every request issued so far becomes stale.
  pub fn invalidate(&mut self) {
    self.floor = self.issued;
  }

  pub fn is_pending(&self) -> bool {
    self.in_flight > 0
  }

  pub fn state(&self) -> OperationState {
    match self.in_flight {
      0 => OperationState::Idle,
      in_flight => OperationState::Pending { in_flight },
    }
  }
}

/// A started operation whose response has not been applied yet.
///
/// The future owns everything it needs, so a driver may hold several of
/// these while still mutating the session.
#[must_use = "a pending operation must be resolved and finished, or abandoned"]
pub struct Pending<T> {
  ticket: Ticket,
  future: BoxFuture<'static, Result<T>>,
}

impl<T> Pending<T> {
  pub(crate) fn new(ticket: Ticket, future: BoxFuture<'static, Result<T>>) -> Self {
    Self { ticket, future }
  }

  pub fn ticket(&self) -> Ticket {
    self.ticket
  }

  /// Wait for the response. Session state is untouched until the result is
  /// handed back to the matching `finish_*` method.
  pub async fn resolve(self) -> Settled<T> {
    let result = self.future.await;
    Settled { ticket: self.ticket, result }
  }
}

impl<T> fmt::Debug for Pending<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pending").field("ticket", &self.ticket).finish_non_exhaustive()
  }
}

/// A response waiting to be applied.
#[derive(Debug)]
pub struct Settled<T> {
  ticket: Ticket,
  result: Result<T>,
}

impl<T> Settled<T> {
  pub fn ticket(&self) -> Ticket {
    self.ticket
  }

  pub fn is_ok(&self) -> bool {
    self.result.is_ok()
  }

  pub(crate) fn into_parts(self) -> (Ticket, Result<T>) {
    (self.ticket, self.result)
  }
}

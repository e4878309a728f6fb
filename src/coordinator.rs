//! Request lifecycle coordinator.
//!
//! Arbitrates asynchronous operations grouped by operation class. Starting
//! operation k+1 of a class cancels operation k; only a completion whose id is
//! still the class's live sequence id may touch shared state. Classes are
//! independent of each other.
//!
//! Cancellation is cooperative. A cancelled call may still finish, so the
//! [`RequestCoordinator::is_current`] check is the authoritative guard.
use crate::error::ServiceError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Operation classes used by the session and CLI host.
pub mod classes {
    pub const PROFILES: &str = "profiles";
    pub const READINESS: &str = "readiness";
    pub const RESULTS: &str = "results";
    pub const DETAIL: &str = "detail";
    pub const REPORT: &str = "report";
    pub const COUNTIES: &str = "counties";
}

/// Shared cancellation flag handed to the network boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the signal has fired.
    pub fn ensure_live(&self) -> Result<(), ServiceError> {
        if self.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        Ok(())
    }
}

/// Handle for one started operation.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub class: String,
    pub id: u64,
    signal: CancelSignal,
}

impl RequestTicket {
    pub fn signal(&self) -> &CancelSignal {
        &self.signal
    }
}

/// Outcome of a tracked operation.
///
/// `Stale` is not an error: the result was superseded and must be dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T> {
    Applied(T),
    Stale,
}

impl<T> Completion<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Completion::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Completion::Applied(value) => Some(value),
            Completion::Stale => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Completion<U> {
        match self {
            Completion::Applied(value) => Completion::Applied(f(value)),
            Completion::Stale => Completion::Stale,
        }
    }
}

#[derive(Debug, Default)]
struct Tracker {
    sequence_id: u64,
    cancel: Option<CancelSignal>,
}

/// Process-wide map from operation class to its live sequence id and cancel token.
#[derive(Debug, Default)]
pub struct RequestCoordinator {
    trackers: Mutex<BTreeMap<String, Tracker>>,
}

impl RequestCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Tracker>> {
        // Tracker updates are single assignments; a poisoned map is still consistent.
        self.trackers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new operation of `class`, cancelling the previous one if outstanding.
    pub fn begin(&self, class: &str) -> RequestTicket {
        let mut trackers = self.lock();
        let tracker = trackers.entry(class.to_string()).or_default();
        tracker.sequence_id += 1;
        if let Some(previous) = tracker.cancel.take() {
            previous.cancel();
            tracing::debug!(class, superseded_by = tracker.sequence_id, "cancelled in-flight request");
        }
        let signal = CancelSignal::new();
        tracker.cancel = Some(signal.clone());
        RequestTicket {
            class: class.to_string(),
            id: tracker.sequence_id,
            signal,
        }
    }

    /// True iff `id` is the live sequence id of `class`.
    pub fn is_current(&self, class: &str, id: u64) -> bool {
        self.lock()
            .get(class)
            .is_some_and(|tracker| tracker.sequence_id == id)
    }

    /// Clear the stored cancel token, but only if `id` is still current.
    pub fn finish(&self, class: &str, id: u64) {
        let mut trackers = self.lock();
        if let Some(tracker) = trackers.get_mut(class) {
            if tracker.sequence_id == id {
                tracker.cancel = None;
            }
        }
    }

    /// Abort the live operation of `class` without starting a new one.
    ///
    /// The sequence id is left alone; the cancelled call can still complete
    /// as current if nothing newer was started.
    pub fn cancel(&self, class: &str) {
        let mut trackers = self.lock();
        if let Some(signal) = trackers.get_mut(class).and_then(|tracker| tracker.cancel.take()) {
            signal.cancel();
            tracing::debug!(class, "cancelled request");
        }
    }

    pub fn live_sequence(&self, class: &str) -> u64 {
        self.lock()
            .get(class)
            .map(|tracker| tracker.sequence_id)
            .unwrap_or(0)
    }

    pub fn has_live_token(&self, class: &str) -> bool {
        self.lock()
            .get(class)
            .is_some_and(|tracker| tracker.cancel.is_some())
    }

    /// Deliver `value` for `ticket`: applied if current, otherwise dropped.
    pub fn complete<T>(&self, ticket: &RequestTicket, value: T) -> Completion<T> {
        if !self.is_current(&ticket.class, ticket.id) {
            tracing::debug!(class = %ticket.class, id = ticket.id, "dropping stale completion");
            return Completion::Stale;
        }
        self.finish(&ticket.class, ticket.id);
        Completion::Applied(value)
    }

    /// Run `call` as one tracked operation of `class`.
    ///
    /// Errors from a superseded call are dropped along with its value.
    pub fn track<T, E>(
        &self,
        class: &str,
        call: impl FnOnce(&RequestTicket) -> Result<T, E>,
    ) -> Result<Completion<T>, E> {
        let ticket = self.begin(class);
        let result = call(&ticket);
        match self.complete(&ticket, result) {
            Completion::Applied(result) => result.map(Completion::Applied),
            Completion::Stale => Ok(Completion::Stale),
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

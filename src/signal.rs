//! Signal delivery for suspended executions.
//!
//! Each execution owns one inbox with a single slot. The discipline is:
//!
//! - a `human_in_the_loop` step clears the slot when it starts, so a value sent
//!   for an earlier step never reaches a later one;
//! - the first value delivered after the clear is kept; later deliveries are
//!   dropped until the slot is consumed;
//! - waiting is a condition wait on [`tokio::sync::Notify`], never a poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Name of the signal carrying a reviewer decision
pub const DECISION_SIGNAL: &str = "decision";

/// Synthetic value a timed-out wait resolves to
pub const TIMEOUT_SIGNAL_VALUE: &str = "timeout";

/// An external input delivered to a running execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Unique ID of the signal
    pub id: String,

    /// Name of the signal
    pub name: String,

    /// Value used for transition matching
    pub value: String,

    /// Time the signal was received
    pub received_at: DateTime<Utc>,
}

impl Signal {
    /// Create a new signal received now
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            value: value.into(),
            received_at: Utc::now(),
        }
    }

    /// Create a decision signal
    pub fn decision(value: impl Into<String>) -> Self {
        Self::new(DECISION_SIGNAL, value)
    }
}

/// What the inbox did with a delivered signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDisposition {
    /// Stored in the slot
    Accepted,
    /// Discarded because the slot already holds a value
    Dropped,
}

/// Single-slot signal inbox
#[derive(Debug, Default)]
pub struct SignalInbox {
    slot: Mutex<Option<Signal>>,
    notify: Notify,
}

impl SignalInbox {
    /// Create an empty inbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a signal. Wakes the waiter, if any.
    #[instrument(skip(self), fields(signal.name = %signal.name, signal.value = %signal.value))]
    pub async fn deliver(&self, signal: Signal) -> SignalDisposition {
        let mut slot = self.slot.lock().await;
        if let Some(pending) = slot.as_ref() {
            warn!(
                "Dropping signal '{}': '{}' is already pending",
                signal.value, pending.value
            );
            return SignalDisposition::Dropped;
        }
        debug!("Signal stored");
        *slot = Some(signal);
        drop(slot);
        self.notify.notify_one();
        SignalDisposition::Accepted
    }

    /// Discard any pending signal, returning it
    pub async fn clear(&self) -> Option<Signal> {
        let stale = self.slot.lock().await.take();
        if let Some(signal) = &stale {
            debug!("Cleared stale signal '{}'", signal.value);
        }
        stale
    }

    /// Take the pending signal without waiting
    pub async fn try_take(&self) -> Option<Signal> {
        self.slot.lock().await.take()
    }

    /// Wait for the next signal.
    ///
    /// Returns `None` if `timeout` elapses first.
    pub async fn wait(&self, timeout: Option<Duration>) -> Option<Signal> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(signal) = self.try_take().await {
                return Some(signal);
            }
            // notify_one stores a permit, so a delivery between the check
            // above and this await still wakes us.
            match deadline {
                Some(deadline) => {
                    if timeout_at(deadline, self.notify.notified()).await.is_err() {
                        return self.try_take().await;
                    }
                }
                None => self.notify.notified().await,
            }
        }
    }
}

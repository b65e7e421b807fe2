//! Publish/subscribe registry for state change notifications.
//!
//! Observers are called synchronously, in subscription order, after a
//! transition has been fully applied. A failing observer (an `Err` result or
//! a panic) is logged and skipped; it never reaches the caller that mutated
//! the state and never prevents later observers from running.

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;

use crate::event::StateEvent;
use crate::state::ComplexityState;

pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;
pub type ObserverResult = std::result::Result<(), ObserverError>;

/// Read-only consumer of state events.
pub trait Observer {
    fn notify(&self, event: &StateEvent, state: &ComplexityState) -> ObserverResult;
}

impl<F> Observer for F
where
    F: Fn(&StateEvent, &ComplexityState) -> ObserverResult,
{
    fn notify(&self, event: &StateEvent, state: &ComplexityState) -> ObserverResult {
        self(event, state)
    }
}

/// Token returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub(crate) struct ObserverRegistry {
    entries: Vec<(SubscriptionId, Box<dyn Observer>)>,
    next_id: u64,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(&mut self, observer: Box<dyn Observer>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Notify every observer in order. Returns how many failed.
    pub(crate) fn dispatch(&self, event: &StateEvent, state: &ComplexityState) -> usize {
        let mut failures = 0;
        for (id, observer) in &self.entries {
            match catch_unwind(AssertUnwindSafe(|| observer.notify(event, state))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    tracing::warn!(subscription = ?id, kind = event.kind(), "observer failed: {e}");
                }
                Err(payload) => {
                    failures += 1;
                    let msg = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "non-string panic payload".to_string());
                    tracing::warn!(
                        subscription = ?id,
                        kind = event.kind(),
                        "observer panicked: {msg}"
                    );
                }
            }
        }
        failures
    }
}

//! In-process event bus.
//!
//! Two kinds of listeners are supported:
//! - **handlers** registered for a set of [`EventKind`]s, awaited in
//!   registration order on every dispatch; events they return are dispatched
//!   as a follow-on batch once the current batch has been fully handled
//! - **observers** holding a tokio [`broadcast`] receiver, which get a copy of
//!   every dispatched event and never influence the dispatch

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

use campushub_domain::error::CampusError;
use campushub_domain::event::{DomainEvent, EventKind};

use crate::ports::{EventHandler, EventPublisher};

/// Upper bound on follow-on batches produced by a single dispatch.
const MAX_CASCADE_ROUNDS: usize = 16;

#[derive(Clone)]
struct Subscription {
    kinds: Vec<EventKind>,
    handler: Arc<dyn EventHandler>,
}

/// Outcome of a [`InProcessEventBus::dispatch`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Distinct events dispatched, follow-ups included.
    pub events: usize,
    /// Batches handed to a handler.
    pub deliveries: usize,
    /// Deliveries whose handler returned an error.
    pub failures: usize,
    /// Batches processed: the initial one plus follow-ons.
    pub rounds: usize,
}

/// In-process event bus.
///
/// Publishing succeeds even when nobody listens, and a failing handler never
/// makes the publisher fail: the error is logged and the remaining handlers
/// still run.
pub struct InProcessEventBus {
    sender: broadcast::Sender<DomainEvent>,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given observer channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe a passive observer to events on this bus.
    ///
    /// Returns a receiver that will get all events dispatched *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Register `handler` for events of the given kinds.
    pub fn register(&self, kinds: &[EventKind], handler: Arc<dyn EventHandler>) {
        tracing::debug!(handler = handler.name(), ?kinds, "registering event handler");
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                kinds: kinds.to_vec(),
                handler,
            });
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn snapshot(&self) -> Vec<Subscription> {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Deliver `events` to observers and handlers, then deliver the follow-on
    /// events produced by handlers, until nothing new is produced.
    ///
    /// An event id seen twice within one dispatch is delivered once.
    pub async fn dispatch(&self, events: Vec<DomainEvent>) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([events]);

        while let Some(batch) = queue.pop_front() {
            if report.rounds == MAX_CASCADE_ROUNDS {
                tracing::warn!(
                    dropped_batches = queue.len() + 1,
                    "event cascade exceeded {MAX_CASCADE_ROUNDS} rounds, dropping the rest"
                );
                break;
            }

            let batch: Vec<DomainEvent> = batch.into_iter().filter(|e| seen.insert(e.id)).collect();
            if batch.is_empty() {
                continue;
            }
            report.rounds += 1;
            report.events += batch.len();

            for event in &batch {
                // only fails when there are no observers
                let _ = self.sender.send(event.clone());
            }

            for subscription in self.snapshot() {
                let selected: Vec<DomainEvent> = batch
                    .iter()
                    .filter(|e| subscription.kinds.contains(&e.kind()))
                    .cloned()
                    .collect();
                if selected.is_empty() {
                    continue;
                }

                report.deliveries += 1;
                match subscription.handler.handle(&selected).await {
                    Ok(follow_ups) => {
                        if !follow_ups.is_empty() {
                            queue.push_back(follow_ups);
                        }
                    }
                    Err(err) => {
                        report.failures += 1;
                        tracing::warn!(
                            %err,
                            handler = subscription.handler.name(),
                            events = selected.len(),
                            "event handler failed"
                        );
                    }
                }
            }
        }

        report
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: DomainEvent) -> impl Future<Output = Result<(), CampusError>> + Send {
        self.publish_all(vec![event])
    }

    fn publish_all(
        &self,
        events: Vec<DomainEvent>,
    ) -> impl Future<Output = Result<(), CampusError>> + Send {
        async move {
            let report = self.dispatch(events).await;
            tracing::debug!(?report, "events dispatched");
            Ok(())
        }
    }
}

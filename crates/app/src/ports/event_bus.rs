//! Event bus ports — publishing domain events and reacting to them.

use std::future::Future;
use std::pin::Pin;

use campushub_domain::error::CampusError;
use campushub_domain::event::DomainEvent;

/// Publishes domain events to interested subscribers.
///
/// Publishing happens after the emitting aggregate has been saved. A failure
/// reported here never undoes that save.
pub trait EventPublisher {
    /// Publish a single event.
    fn publish(&self, event: DomainEvent) -> impl Future<Output = Result<(), CampusError>> + Send;

    /// Publish events emitted by one operation as a single batch, in order.
    fn publish_all(
        &self,
        events: Vec<DomainEvent>,
    ) -> impl Future<Output = Result<(), CampusError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: DomainEvent) -> impl Future<Output = Result<(), CampusError>> + Send {
        (**self).publish(event)
    }

    fn publish_all(
        &self,
        events: Vec<DomainEvent>,
    ) -> impl Future<Output = Result<(), CampusError>> + Send {
        (**self).publish_all(events)
    }
}

/// Future returned by [`EventHandler::handle`].
pub type HandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<DomainEvent>, CampusError>> + Send + 'a>>;

/// A subscriber reacting to a batch of events of the kinds it registered for.
///
/// Handlers are stored as trait objects by the bus, hence the boxed future.
/// Events returned on success are dispatched by the bus as a follow-on batch.
/// Handlers must be idempotent: the same event may be delivered more than once.
pub trait EventHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// React to `events`, returning the events this reaction produced.
    fn handle<'a>(&'a self, events: &'a [DomainEvent]) -> HandlerFuture<'a>;
}

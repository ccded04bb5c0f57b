//! Event bus port: publish device events.

use std::future::Future;

use ldpm_domain::error::LdpmError;
use ldpm_domain::event::DeviceEvent;

/// Publishes device events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: DeviceEvent) -> impl Future<Output = Result<(), LdpmError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: DeviceEvent) -> impl Future<Output = Result<(), LdpmError>> + Send {
        (**self).publish(event)
    }
}

//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod activity;
pub mod clock;
pub mod event_bus;
pub mod protocol;
pub mod registry;
pub mod schedule_repo;

pub use activity::ActivityLog;
pub use clock::{Clock, SystemClock};
pub use event_bus::EventPublisher;
pub use protocol::{ProtocolClient, ProtocolError};
pub use registry::DeviceRegistry;
pub use schedule_repo::ScheduleRepository;

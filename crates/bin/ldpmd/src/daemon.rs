//! Wiring: builds every component from a [`Config`] and runs the drivers.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use ldpm_adapter_memory::{MemoryActivityLog, MemoryRegistry, MemoryScheduleStore};
use ldpm_adapter_rest::{RestError, RestProtocolClient};
use ldpm_adapter_simple_ip::SimpleIpProtocolClient;
use ldpm_app::event_bus::InProcessEventBus;
use ldpm_app::ports::SystemClock;
use ldpm_app::scheduler::Scheduler;
use ldpm_app::services::bulk_dispatcher::BulkDispatcher;
use ldpm_app::services::command_service::CommandService;
use ldpm_app::services::device_adapter::DeviceAdapter;
use ldpm_app::services::status_tracker::StatusTracker;
use ldpm_app::status_poller::StatusPoller;
use ldpm_domain::energy::{EnergyRates, EnergyReport};
use ldpm_domain::error::LdpmError;
use ldpm_domain::event::DeviceEvent;

use crate::config::Config;
use crate::inventory::{Inventory, InventoryError};

const EVENT_CAPACITY: usize = 256;

pub type Registry = Arc<MemoryRegistry>;
pub type Events = Arc<InProcessEventBus>;
pub type Adapter = DeviceAdapter<RestProtocolClient, SimpleIpProtocolClient, Registry, Events>;
pub type Commands = CommandService<Registry, Adapter, Arc<MemoryActivityLog>>;

type Poller = StatusPoller<Registry, Adapter, Events>;
type RuleScheduler = Scheduler<Arc<MemoryScheduleStore>, Commands, MemoryActivityLog, SystemClock>;

/// Errors raised while assembling the daemon.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("invalid inventory")]
    Inventory(#[from] InventoryError),

    #[error("failed to load inventory")]
    Registry(#[from] LdpmError),

    #[error("failed to set up REST client")]
    Rest(#[from] RestError),
}

/// Handles shared by the drivers and anything embedding the daemon.
#[derive(Clone)]
pub struct Services {
    pub registry: Registry,
    pub schedules: Arc<MemoryScheduleStore>,
    pub activity: Arc<MemoryActivityLog>,
    pub events: Events,
    pub commands: Arc<Commands>,
}

/// Fully wired daemon, not yet running.
pub struct Daemon {
    pub services: Services,
    poller: Option<Poller>,
    scheduler: Option<RuleScheduler>,
    energy: EnergyRates,
}

impl Daemon {
    /// Build every component described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError`] when the inventory is inconsistent or the HTTP
    /// client cannot be created.
    pub fn build(config: &Config) -> Result<Self, DaemonError> {
        let inventory = Inventory::from_config(config)?;
        let registry = Arc::new(MemoryRegistry::from_inventory(
            inventory.devices,
            inventory.groups,
        )?);
        let schedules = Arc::new(MemoryScheduleStore::new(inventory.schedules));
        let activity = Arc::new(MemoryActivityLog::default());
        let events = Arc::new(InProcessEventBus::new(EVENT_CAPACITY));

        let tracker = Arc::new(StatusTracker::new(
            Arc::clone(&registry),
            Arc::clone(&events),
        ));
        let settings = config.control.settings();
        let adapter = DeviceAdapter::new(
            RestProtocolClient::new(config.rest.clone())?,
            SimpleIpProtocolClient::new(config.simple_ip.clone()),
            Arc::clone(&tracker),
            settings,
        );
        let dispatcher = BulkDispatcher::new(Arc::new(adapter), settings.pool_size);
        let commands = Arc::new(CommandService::new(
            Arc::clone(&registry),
            dispatcher.clone(),
            Arc::clone(&activity),
        ));

        let poller = config.poller.enabled.then(|| {
            StatusPoller::new(
                Arc::clone(&registry),
                dispatcher,
                tracker,
                config.poller.interval(),
            )
        });
        let scheduler = config.scheduler.enabled.then(|| {
            Scheduler::new(
                Arc::clone(&schedules),
                Arc::clone(&commands),
                Arc::clone(&activity),
                SystemClock,
                config.scheduler.settings(&config.control),
            )
        });

        Ok(Self {
            services: Services {
                registry,
                schedules,
                activity,
                events,
                commands,
            },
            poller,
            scheduler,
            energy: config.energy,
        })
    }

    /// Spawn the poller, the scheduler and the state-change log.
    #[must_use]
    pub fn start(self) -> RunningDaemon {
        let Self {
            services,
            poller,
            scheduler,
            energy,
        } = self;

        let mut tasks = vec![tokio::spawn(log_state_changes(services.events.subscribe()))];
        if let Some(poller) = poller {
            tasks.push(poller.start());
        }
        if let Some(scheduler) = scheduler {
            tasks.push(scheduler.start());
        }
        tracing::info!(tasks = tasks.len(), "daemon started");

        RunningDaemon {
            services,
            energy,
            tasks,
        }
    }
}

/// A daemon whose background tasks are running.
pub struct RunningDaemon {
    pub services: Services,
    energy: EnergyRates,
    tasks: Vec<JoinHandle<()>>,
}

impl RunningDaemon {
    /// Savings accumulated in the activity log so far.
    #[must_use]
    pub fn savings(&self) -> EnergyReport {
        self.services
            .activity
            .energy_savings(ldpm_domain::time::now(), &self.energy)
    }

    /// Stop every background task. In-flight commands are abandoned.
    pub fn shutdown(self) -> EnergyReport {
        let report = self.savings();
        for task in &self.tasks {
            task.abort();
        }
        report
    }
}

async fn log_state_changes(mut events: broadcast::Receiver<DeviceEvent>) {
    loop {
        match events.recv().await {
            Ok(DeviceEvent::StateChanged(change)) => {
                tracing::info!(
                    device_id = %change.device_id,
                    from = %change.from,
                    to = %change.to,
                    "device state changed"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "state change log fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVENTORY: &str = r#"
        [poller]
        enabled = false

        [[devices]]
        name = "lobby"
        address = "10.0.0.20"

        [[groups]]
        name = "ground floor"
        members = ["lobby"]

        [[schedules]]
        name = "morning"
        cron = "0 8 * * MON-FRI"
        action = "power-on"
        group = "ground floor"
    "#;

    #[tokio::test]
    async fn should_seed_storage_from_inventory() {
        let config: Config = toml::from_str(INVENTORY).unwrap();

        let daemon = Daemon::build(&config).unwrap();

        assert_eq!(daemon.services.registry.groups().len(), 1);
        assert!(daemon.poller.is_none());
        assert!(daemon.scheduler.is_some());
    }

    #[tokio::test]
    async fn should_fail_on_inconsistent_inventory() {
        let config: Config = toml::from_str(
            r#"
            [[groups]]
            name = "ground floor"
            members = ["ghost"]
            "#,
        )
        .unwrap();

        assert!(matches!(
            Daemon::build(&config),
            Err(DaemonError::Inventory(_))
        ));
    }

    #[tokio::test]
    async fn should_report_no_savings_before_any_command() {
        let config: Config = toml::from_str(INVENTORY).unwrap();
        let running = Daemon::build(&config).unwrap().start();

        let report = running.shutdown();

        assert!(report.devices.is_empty());
    }
}

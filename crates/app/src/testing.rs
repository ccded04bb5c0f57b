//! In-memory port doubles shared by the use-case tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use ldpm_domain::command::PowerAction;
use ldpm_domain::device::{Device, DeviceStatus, PowerState};
use ldpm_domain::energy::PowerLogEntry;
use ldpm_domain::error::LdpmError;
use ldpm_domain::event::DeviceEvent;
use ldpm_domain::id::{DeviceId, GroupId};
use ldpm_domain::outcome::{ErrorKind, Protocol};
use ldpm_domain::schedule::{ScheduleExecution, ScheduleRule};
use ldpm_domain::time::Timestamp;

use crate::ports::{
    ActivityLog, Clock, DeviceRegistry, EventPublisher, ProtocolClient, ProtocolError,
    ScheduleRepository,
};

pub fn device(name: &str) -> Device {
    Device::builder()
        .name(name)
        .address(format!("{name}.local"))
        .build()
        .unwrap()
}

// ── Registry ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRegistry {
    devices: Mutex<HashMap<DeviceId, Device>>,
    groups: Mutex<HashMap<GroupId, Vec<DeviceId>>>,
    pub updates: Mutex<Vec<(DeviceId, DeviceStatus)>>,
}

impl InMemoryRegistry {
    pub fn with(devices: &[Device]) -> Self {
        let registry = Self::default();
        {
            let mut store = registry.devices.lock().unwrap();
            for device in devices {
                store.insert(device.id, device.clone());
            }
        }
        registry
    }

    pub fn add_group(&self, id: GroupId, members: &[DeviceId]) {
        self.groups.lock().unwrap().insert(id, members.to_vec());
    }

    pub fn status_of(&self, id: DeviceId) -> Option<DeviceStatus> {
        self.devices.lock().unwrap().get(&id).map(|d| d.status)
    }
}

impl DeviceRegistry for InMemoryRegistry {
    fn get_device(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, LdpmError>> + Send {
        let result = self.devices.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, LdpmError>> + Send {
        let result: Vec<Device> = self.devices.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn group_members(
        &self,
        id: GroupId,
    ) -> impl Future<Output = Result<Option<Vec<Device>>, LdpmError>> + Send {
        let devices = self.devices.lock().unwrap();
        let result = self.groups.lock().unwrap().get(&id).map(|members| {
            members
                .iter()
                .filter_map(|m| devices.get(m).cloned())
                .collect()
        });
        async { Ok(result) }
    }

    fn update_status(
        &self,
        id: DeviceId,
        status: DeviceStatus,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send {
        if let Some(device) = self.devices.lock().unwrap().get_mut(&id) {
            device.status = status;
        }
        self.updates.lock().unwrap().push((id, status));
        async { Ok(()) }
    }
}

// ── Event publisher ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<DeviceEvent>>,
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: DeviceEvent) -> impl Future<Output = Result<(), LdpmError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}

// ── Activity log ───────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingActivity {
    pub executions: Mutex<Vec<ScheduleExecution>>,
    pub power: Mutex<Vec<PowerLogEntry>>,
}

impl ActivityLog for RecordingActivity {
    fn record_execution(
        &self,
        execution: ScheduleExecution,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send {
        self.executions.lock().unwrap().push(execution);
        async { Ok(()) }
    }

    fn record_power(
        &self,
        entry: PowerLogEntry,
    ) -> impl Future<Output = Result<(), LdpmError>> + Send {
        self.power.lock().unwrap().push(entry);
        async { Ok(()) }
    }
}

// ── Schedules & clock ──────────────────────────────────────────

#[derive(Default)]
pub struct StaticSchedules {
    rules: Mutex<Vec<ScheduleRule>>,
}

impl StaticSchedules {
    pub fn set(&self, rules: Vec<ScheduleRule>) {
        *self.rules.lock().unwrap() = rules;
    }
}

impl ScheduleRepository for StaticSchedules {
    fn snapshot(&self) -> impl Future<Output = Result<Vec<ScheduleRule>, LdpmError>> + Send {
        let rules = self.rules.lock().unwrap().clone();
        async { Ok(rules) }
    }
}

pub struct FixedClock(pub Mutex<Timestamp>);

impl FixedClock {
    pub fn at(ts: Timestamp) -> Self {
        Self(Mutex::new(ts))
    }

    pub fn set(&self, ts: Timestamp) {
        *self.0.lock().unwrap() = ts;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.0.lock().unwrap()
    }
}

// ── Protocol stub ──────────────────────────────────────────────

/// What the stub answers for one call.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Reply(PowerState),
    Fail(ErrorKind),
    /// Never answers; the caller's timeout has to cut it.
    Hang,
}

fn error_for(kind: ErrorKind, timeout: Duration) -> ProtocolError {
    match kind {
        ErrorKind::Timeout => ProtocolError::Timeout(timeout),
        ErrorKind::Network => ProtocolError::Network(Box::new(std::io::Error::from(
            std::io::ErrorKind::ConnectionRefused,
        ))),
        ErrorKind::Auth => ProtocolError::Auth,
        ErrorKind::ProtocolUnsupported => ProtocolError::Unsupported("stub".to_string()),
        ErrorKind::Device => ProtocolError::Device("stub".to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub address: String,
    pub credential: Option<String>,
    pub action: PowerAction,
    pub at: Instant,
}

/// Scripted protocol client: per-address queues of steps, falling back to a
/// default step once a queue is empty.
pub struct ScriptedProtocol {
    protocol: Protocol,
    default: Step,
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    latency: Duration,
    pub calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedProtocol {
    pub fn new(protocol: Protocol, default: Step) -> Self {
        Self {
            protocol,
            default,
            scripts: Mutex::new(HashMap::new()),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn script(&self, address: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(address.to_string(), steps.into_iter().collect());
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|c| c.at).collect()
    }

    fn next_step(&self, address: &str) -> Step {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(address)
            .and_then(VecDeque::pop_front)
            .unwrap_or(self.default)
    }
}

impl ProtocolClient for ScriptedProtocol {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    async fn execute(
        &self,
        address: &str,
        credential: Option<&str>,
        action: PowerAction,
        timeout: Duration,
    ) -> Result<PowerState, ProtocolError> {
        self.calls.lock().unwrap().push(Call {
            address: address.to_string(),
            credential: credential.map(str::to_string),
            action,
            at: Instant::now(),
        });
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let step = self.next_step(address);
        let result = match step {
            Step::Reply(state) => Ok(state),
            Step::Fail(kind) => Err(error_for(kind, timeout)),
            Step::Hang => {
                std::future::pending::<()>().await;
                Err(error_for(ErrorKind::Timeout, timeout))
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

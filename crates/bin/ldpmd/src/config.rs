//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `ldpm.toml` in the working directory (or the file named by
//! `LDPM_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use ldpm_adapter_rest::RestConfig;
use ldpm_adapter_simple_ip::SimpleIpConfig;
use ldpm_app::scheduler::SchedulerSettings;
use ldpm_app::settings::{ControlSettings, DEFAULT_POOL_SIZE, RetryPolicy};
use ldpm_app::status_poller::DEFAULT_POLL_INTERVAL;
use ldpm_domain::command::PowerAction;
use ldpm_domain::device::Credential;
use ldpm_domain::energy::EnergyRates;
use ldpm_domain::id::{DeviceId, GroupId, ScheduleId};

const DEFAULT_PATH: &str = "ldpm.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    /// Retry, timeout and concurrency limits for device commands.
    pub control: ControlConfig,
    pub rest: RestConfig,
    pub simple_ip: SimpleIpConfig,
    pub poller: PollerConfig,
    pub scheduler: SchedulerConfig,
    /// Consumption figures for the savings report.
    pub energy: EnergyRates,
    pub devices: Vec<DeviceEntry>,
    pub groups: Vec<GroupEntry>,
    pub schedules: Vec<ScheduleEntry>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Device command limits.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Upper bound for one protocol exchange, in seconds.
    pub attempt_timeout_secs: u64,
    /// Overall bound for one device command, in seconds. Unset means the
    /// command ends only when both protocols are exhausted.
    pub command_deadline_secs: Option<u64>,
    /// Retries per protocol after a timeout or network error.
    pub max_retries: u32,
    /// First backoff delay in milliseconds, doubled for each retry.
    pub retry_base_delay_ms: u64,
    /// Devices worked on at once by bulk commands and polls.
    pub pool_size: usize,
}

/// Status poller settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub enabled: bool,
    /// Seconds between the starts of two poll cycles.
    pub interval_secs: u64,
}

/// Scheduler settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Seconds between two rule evaluations.
    pub tick_interval_secs: u64,
    /// Evaluate cron expressions in UTC instead of host local time.
    pub utc: bool,
}

/// One display in the static inventory.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    /// Stable identifier; generated at startup when absent.
    #[serde(default)]
    pub id: Option<DeviceId>,
    pub name: String,
    /// Host name or IP address, optionally with a port.
    pub address: String,
    /// Pre-shared key for the REST protocol.
    #[serde(default)]
    pub credential: Option<Credential>,
}

/// A named set of devices, referenced by device name.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupEntry {
    #[serde(default)]
    pub id: Option<GroupId>,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// A cron rule targeting exactly one device or group by name.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleEntry {
    #[serde(default)]
    pub id: Option<ScheduleId>,
    pub name: String,
    pub cron: String,
    pub action: PowerAction,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Config {
    /// Load configuration from `ldpm.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("LDPM_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("LDPM_POOL_SIZE")
            && let Ok(size) = val.parse()
        {
            self.control.pool_size = size;
        }
        if let Some(val) = var("LDPM_POLL_INTERVAL_SECS")
            && let Ok(secs) = val.parse()
        {
            self.poller.interval_secs = secs;
        }
        if let Some(val) = var("LDPM_REST_PORT")
            && let Ok(port) = val.parse()
        {
            self.rest.port = port;
        }
        if let Some(val) = var("LDPM_SIMPLE_IP_PORT")
            && let Ok(port) = val.parse()
        {
            self.simple_ip.port = port;
        }
        if let Some(val) = var("LDPM_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));
        if self.control.pool_size == 0 {
            return invalid("control.pool_size must be at least 1");
        }
        if self.control.attempt_timeout_secs == 0 {
            return invalid("control.attempt_timeout_secs must be non-zero");
        }
        if self.control.command_deadline_secs == Some(0) {
            return invalid("control.command_deadline_secs must be non-zero");
        }
        if self.poller.interval_secs == 0 {
            return invalid("poller.interval_secs must be non-zero");
        }
        if !(1..60).contains(&self.scheduler.tick_interval_secs) {
            return invalid("scheduler.tick_interval_secs must be between 1 and 59");
        }
        if self.rest.port == 0 || self.simple_ip.port == 0 {
            return invalid("protocol ports must be non-zero");
        }
        if !self.rest.path.starts_with('/') {
            return invalid("rest.path must start with '/'");
        }
        Ok(())
    }
}

impl ControlConfig {
    /// Settings handed to the device adapter.
    #[must_use]
    pub fn settings(&self) -> ControlSettings {
        ControlSettings {
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
            command_deadline: self.command_deadline_secs.map(Duration::from_secs),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
            },
            pool_size: self.pool_size,
        }
    }
}

impl PollerConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl SchedulerConfig {
    /// Settings handed to the scheduler; scheduled commands share the
    /// control deadline.
    #[must_use]
    pub fn settings(&self, control: &ControlConfig) -> SchedulerSettings {
        SchedulerSettings {
            tick_interval: Duration::from_secs(self.tick_interval_secs),
            use_local_time: !self.utc,
            command_deadline: control.command_deadline_secs.map(Duration::from_secs),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "ldpmd=info,ldpm=info,hyper=warn,reqwest=warn".to_string(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        let settings = ControlSettings::default();
        Self {
            attempt_timeout_secs: settings.attempt_timeout.as_secs(),
            command_deadline_secs: None,
            max_retries: settings.retry.max_retries,
            retry_base_delay_ms: 1000,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_secs: 5,
            utc: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

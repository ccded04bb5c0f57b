//! Status poller: periodically queries every known device.
//!
//! A device that stays silent on both protocols after all retries is marked
//! `offline`; that is an observation, not an error. Cycles run back to back
//! on one task, so a slow cycle delays the next one instead of overlapping it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use ldpm_domain::command::{CommandContext, PowerAction};
use ldpm_domain::device::Device;
use ldpm_domain::error::LdpmError;
use ldpm_domain::id::DeviceId;

use crate::ports::{DeviceRegistry, EventPublisher};
use crate::services::bulk_dispatcher::BulkDispatcher;
use crate::services::device_adapter::CommandExecutor;
use crate::services::status_tracker::StatusTracker;

/// Default time between the starts of two poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Counts from one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollReport {
    pub polled: usize,
    pub reachable: usize,
    /// Silent on both protocols.
    pub offline: usize,
    /// Answered with an error (e.g. rejected credential).
    pub failed: usize,
}

/// Periodic status query over the whole registry.
pub struct StatusPoller<R, X, E> {
    registry: R,
    dispatcher: BulkDispatcher<X>,
    tracker: Arc<StatusTracker<R, E>>,
    interval: Duration,
}

impl<R, X, E> StatusPoller<R, X, E>
where
    R: DeviceRegistry + Send + Sync + 'static,
    X: CommandExecutor + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    /// Create a poller running every `interval`.
    pub fn new(
        registry: R,
        dispatcher: BulkDispatcher<X>,
        tracker: Arc<StatusTracker<R, E>>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            tracker,
            interval,
        }
    }

    /// Query every device once.
    ///
    /// # Errors
    ///
    /// Returns an error only if the device list cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn poll_cycle(&self) -> Result<PollReport, LdpmError> {
        let devices = self.registry.list_devices().await?;
        if devices.is_empty() {
            tracing::debug!("no devices to poll");
            return Ok(PollReport::default());
        }
        let by_id: HashMap<DeviceId, Device> =
            devices.iter().map(|d| (d.id, d.clone())).collect();

        let bulk = self
            .dispatcher
            .run_group(devices, PowerAction::Query, CommandContext::default())
            .await?;

        let mut report = PollReport {
            polled: bulk.total(),
            ..PollReport::default()
        };
        let now = ldpm_domain::time::now();
        for result in &bulk.results {
            let Some(kind) = result.error_kind() else {
                report.reachable += 1;
                continue;
            };
            if !kind.is_transient() {
                tracing::warn!(device_id = %result.device_id, error = %kind, "poll answered with error");
                report.failed += 1;
                continue;
            }
            report.offline += 1;
            let Some(device) = by_id.get(&result.device_id) else {
                continue;
            };
            if let Err(err) = self.tracker.record_unreachable(device, now).await {
                tracing::warn!(device_id = %device.id, error = %err, "failed to store offline status");
            }
        }

        tracing::info!(
            polled = report.polled,
            reachable = report.reachable,
            offline = report.offline,
            failed = report.failed,
            "poll cycle finished"
        );
        Ok(report)
    }

    /// Run poll cycles on their own task until aborted.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(err) = self.poll_cycle().await {
                    tracing::warn!(error = %err, "poll cycle failed");
                }
            }
        })
    }
}

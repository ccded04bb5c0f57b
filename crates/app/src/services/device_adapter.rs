//! Device adapter: runs one action against one device.
//!
//! The primary protocol (REST) is tried first. Transient failures are retried
//! on the same protocol with exponential backoff; failures that indicate the
//! protocol is unusable move execution to the secondary protocol (Simple IP)
//! once. An authentication rejection ends the run immediately.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use ldpm_domain::command::{CommandContext, PowerAction};
use ldpm_domain::device::{Device, PowerState};
use ldpm_domain::outcome::{CommandResult, Outcome, Protocol, ProtocolAttempt};

use crate::ports::{DeviceRegistry, EventPublisher, ProtocolClient, ProtocolError};
use crate::services::status_tracker::StatusTracker;
use crate::settings::ControlSettings;

/// Something able to run a power action against a single device.
pub trait CommandExecutor {
    /// Run `action` against `device`. Never fails: errors are part of the
    /// returned [`CommandResult`].
    fn run(
        &self,
        device: &Device,
        action: PowerAction,
        context: &CommandContext,
    ) -> impl Future<Output = CommandResult> + Send;
}

impl<T: CommandExecutor + Send + Sync> CommandExecutor for Arc<T> {
    fn run(
        &self,
        device: &Device,
        action: PowerAction,
        context: &CommandContext,
    ) -> impl Future<Output = CommandResult> + Send {
        (**self).run(device, action, context)
    }
}

/// Result of driving one protocol to completion.
struct ProtocolRun {
    attempt: ProtocolAttempt,
    result: Result<PowerState, ProtocolError>,
    /// The command deadline stopped this run.
    deadline_reached: bool,
}

/// Protocol sequencing, retry and status write-back for single devices.
pub struct DeviceAdapter<P, S, R, E> {
    primary: P,
    secondary: S,
    tracker: Arc<StatusTracker<R, E>>,
    settings: ControlSettings,
}

impl<P, S, R, E> DeviceAdapter<P, S, R, E>
where
    P: ProtocolClient + Sync,
    S: ProtocolClient + Sync,
    R: DeviceRegistry + Send + Sync,
    E: EventPublisher + Send + Sync,
{
    /// Create an adapter trying `primary` first and `secondary` on fallback.
    pub fn new(
        primary: P,
        secondary: S,
        tracker: Arc<StatusTracker<R, E>>,
        settings: ControlSettings,
    ) -> Self {
        Self {
            primary,
            secondary,
            tracker,
            settings,
        }
    }

    /// The status tracker this adapter writes to.
    #[must_use]
    pub fn tracker(&self) -> &Arc<StatusTracker<R, E>> {
        &self.tracker
    }

    /// Settings used for every run.
    #[must_use]
    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    /// Run `action` against `device`, with retry, fallback and status update.
    #[tracing::instrument(
        skip(self, device, context),
        fields(device_id = %device.id, command_id = %context.idempotency_token)
    )]
    pub async fn execute(
        &self,
        device: &Device,
        action: PowerAction,
        context: &CommandContext,
    ) -> CommandResult {
        let started = Instant::now();
        let deadline = context
            .deadline
            .or(self.settings.command_deadline)
            .map(|limit| started + limit);

        let mut attempts = Vec::with_capacity(2);
        let mut run = self.drive(&self.primary, device, action, deadline).await;
        let mut protocol = self.primary.protocol();

        if let Err(err) = &run.result
            && err.kind().triggers_fallback()
            && !run.deadline_reached
        {
            tracing::info!(
                from = %protocol,
                to = %self.secondary.protocol(),
                error = %err,
                "falling back to secondary protocol"
            );
            attempts.push(run.attempt);
            run = self.drive(&self.secondary, device, action, deadline).await;
            protocol = self.secondary.protocol();
        }
        attempts.push(run.attempt);

        let retries = attempts.iter().map(|a| a.retries).sum();
        let outcome = match run.result {
            Ok(state) => {
                if let Err(err) = self
                    .tracker
                    .record_contact(device, state, ldpm_domain::time::now())
                    .await
                {
                    tracing::warn!(error = %err, "failed to store device status");
                }
                Outcome::Succeeded { state }
            }
            Err(err) => {
                tracing::warn!(%protocol, error = %err, "command failed");
                Outcome::Failed {
                    error: err.kind(),
                    message: err.describe(),
                }
            }
        };

        CommandResult {
            command_id: context.idempotency_token,
            device_id: device.id,
            action,
            protocol,
            outcome,
            latency: started.elapsed(),
            retries,
            attempts,
        }
    }

    /// Try one protocol, retrying transient failures until the retry budget
    /// or the deadline runs out.
    async fn drive<C: ProtocolClient + Sync>(
        &self,
        client: &C,
        device: &Device,
        action: PowerAction,
        deadline: Option<Instant>,
    ) -> ProtocolRun {
        let protocol = client.protocol();
        let policy = self.settings.retry;
        let mut retries = 0;

        loop {
            let limit = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return deadline_run(protocol, retries, Duration::ZERO);
                    }
                    remaining.min(self.settings.attempt_timeout)
                }
                None => self.settings.attempt_timeout,
            };

            let exchange = client.execute(&device.address, device.credential(), action, limit);
            let result = match tokio::time::timeout(limit, exchange).await {
                Ok(result) => result,
                Err(_) => Err(ProtocolError::Timeout(limit)),
            };

            let err = match result {
                Ok(state) => {
                    tracing::debug!(%protocol, retries, ?state, "exchange succeeded");
                    return ProtocolRun {
                        attempt: ProtocolAttempt {
                            protocol,
                            retries,
                            error: None,
                        },
                        result: Ok(state),
                        deadline_reached: false,
                    };
                }
                Err(err) => err,
            };

            let kind = err.kind();
            if !kind.is_transient() || retries >= policy.max_retries {
                let deadline_reached = deadline.is_some_and(|d| Instant::now() >= d);
                return ProtocolRun {
                    attempt: ProtocolAttempt {
                        protocol,
                        retries,
                        error: Some(kind),
                    },
                    result: Err(err),
                    deadline_reached,
                };
            }

            let delay = policy.delay_for(retries);
            if let Some(deadline) = deadline
                && Instant::now() + delay >= deadline
            {
                tracing::debug!(%protocol, retries, "deadline leaves no room for another retry");
                return deadline_run(
                    protocol,
                    retries,
                    deadline.saturating_duration_since(Instant::now()),
                );
            }

            retries += 1;
            tracing::debug!(
                %protocol,
                retry = retries,
                ?delay,
                error = %err,
                "retrying after transient failure"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn deadline_run(protocol: Protocol, retries: u32, left: Duration) -> ProtocolRun {
    let err = ProtocolError::Timeout(left);
    ProtocolRun {
        attempt: ProtocolAttempt {
            protocol,
            retries,
            error: Some(err.kind()),
        },
        result: Err(err),
        deadline_reached: true,
    }
}

impl<P, S, R, E> CommandExecutor for DeviceAdapter<P, S, R, E>
where
    P: ProtocolClient + Send + Sync,
    S: ProtocolClient + Send + Sync,
    R: DeviceRegistry + Send + Sync,
    E: EventPublisher + Send + Sync,
{
    fn run(
        &self,
        device: &Device,
        action: PowerAction,
        context: &CommandContext,
    ) -> impl Future<Output = CommandResult> + Send {
        self.execute(device, action, context)
    }
}

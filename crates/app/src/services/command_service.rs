//! Command service: entry point for power commands.
//!
//! Resolves the target through the registry, fails fast on unknown devices
//! and unknown or empty groups, then runs the command and logs successful
//! power changes.

use std::future::Future;
use std::sync::Arc;

use ldpm_domain::command::{CommandContext, CommandRequest, CommandTarget, PowerAction};
use ldpm_domain::energy::PowerLogEntry;
use ldpm_domain::error::{LdpmError, NotFoundError, ValidationError};
use ldpm_domain::outcome::{BulkResult, CommandResult};

use crate::ports::{ActivityLog, DeviceRegistry};
use crate::services::bulk_dispatcher::BulkDispatcher;
use crate::services::device_adapter::CommandExecutor;

/// What a command produced, shaped by its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Single(CommandResult),
    Bulk(BulkResult),
}

impl CommandOutcome {
    /// `(succeeded, failed)` device counts.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        match self {
            Self::Single(result) if result.is_success() => (1, 0),
            Self::Single(_) => (0, 1),
            Self::Bulk(bulk) => (bulk.succeeded, bulk.failed),
        }
    }

    /// Every per-device result.
    #[must_use]
    pub fn results(&self) -> &[CommandResult] {
        match self {
            Self::Single(result) => std::slice::from_ref(result),
            Self::Bulk(bulk) => &bulk.results,
        }
    }
}

/// Anything that can carry out a [`CommandRequest`].
pub trait CommandHandler {
    /// Resolve and run `request`.
    fn handle(
        &self,
        request: CommandRequest,
    ) -> impl Future<Output = Result<CommandOutcome, LdpmError>> + Send;
}

impl<T: CommandHandler + Send + Sync> CommandHandler for Arc<T> {
    fn handle(
        &self,
        request: CommandRequest,
    ) -> impl Future<Output = Result<CommandOutcome, LdpmError>> + Send {
        (**self).handle(request)
    }
}

/// Application service for on-demand and scheduled power commands.
pub struct CommandService<R, X, L> {
    registry: R,
    dispatcher: BulkDispatcher<X>,
    activity: L,
}

impl<R, X, L> CommandService<R, X, L>
where
    R: DeviceRegistry + Sync,
    X: CommandExecutor + Send + Sync + 'static,
    L: ActivityLog + Sync,
{
    /// Create a new service.
    pub fn new(registry: R, dispatcher: BulkDispatcher<X>, activity: L) -> Self {
        Self {
            registry,
            dispatcher,
            activity,
        }
    }

    /// Resolve the request's target and run the command.
    ///
    /// # Errors
    ///
    /// Returns [`LdpmError::NotFound`] for an unknown device or group,
    /// [`ValidationError::EmptyGroup`] for a group without members, or a
    /// storage error from the registry. Device failures are not errors;
    /// they are reported inside the outcome.
    #[tracing::instrument(
        skip(self, request),
        fields(
            action = %request.action,
            source = ?request.context.source,
            command_id = %request.context.idempotency_token
        )
    )]
    pub async fn execute(&self, request: CommandRequest) -> Result<CommandOutcome, LdpmError> {
        let CommandRequest {
            target,
            action,
            context,
        } = request;

        let outcome = match target {
            CommandTarget::Device(id) => {
                let device = self.registry.get_device(id).await?.ok_or_else(|| {
                    LdpmError::from(NotFoundError {
                        entity: "Device",
                        id: id.to_string(),
                    })
                })?;
                let result = self
                    .dispatcher
                    .executor()
                    .run(&device, action, &context)
                    .await;
                CommandOutcome::Single(result)
            }
            CommandTarget::Group(id) => {
                let members = self.registry.group_members(id).await?.ok_or_else(|| {
                    LdpmError::from(NotFoundError {
                        entity: "Group",
                        id: id.to_string(),
                    })
                })?;
                if members.is_empty() {
                    return Err(ValidationError::EmptyGroup.into());
                }
                let bulk = self.dispatcher.run_group(members, action, context).await?;
                CommandOutcome::Bulk(bulk)
            }
        };

        self.log_power_changes(&outcome, action, &context).await;
        Ok(outcome)
    }

    async fn log_power_changes(
        &self,
        outcome: &CommandOutcome,
        action: PowerAction,
        context: &CommandContext,
    ) {
        if !action.is_control() {
            return;
        }
        let now = ldpm_domain::time::now();
        for result in outcome.results().iter().filter(|r| r.is_success()) {
            let entry = PowerLogEntry {
                device_id: result.device_id,
                action,
                timestamp: now,
                source: context.source,
            };
            if let Err(err) = self.activity.record_power(entry).await {
                tracing::warn!(
                    device_id = %result.device_id,
                    error = %err,
                    "failed to record power change"
                );
            }
        }
    }
}

impl<R, X, L> CommandHandler for CommandService<R, X, L>
where
    R: DeviceRegistry + Send + Sync,
    X: CommandExecutor + Send + Sync + 'static,
    L: ActivityLog + Send + Sync,
{
    fn handle(
        &self,
        request: CommandRequest,
    ) -> impl Future<Output = Result<CommandOutcome, LdpmError>> + Send {
        self.execute(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::device_adapter::DeviceAdapter;
    use crate::services::status_tracker::StatusTracker;
    use crate::settings::ControlSettings;
    use crate::testing::{
        InMemoryRegistry, RecordingActivity, RecordingPublisher, ScriptedProtocol, Step, device,
    };
    use ldpm_domain::command::CommandSource;
    use ldpm_domain::device::{Device, PowerState};
    use ldpm_domain::id::{DeviceId, GroupId};
    use ldpm_domain::outcome::{ErrorKind, Protocol};

    type Adapter = DeviceAdapter<
        Arc<ScriptedProtocol>,
        Arc<ScriptedProtocol>,
        Arc<InMemoryRegistry>,
        Arc<RecordingPublisher>,
    >;

    struct Harness {
        service: CommandService<Arc<InMemoryRegistry>, Adapter, Arc<RecordingActivity>>,
        registry: Arc<InMemoryRegistry>,
        activity: Arc<RecordingActivity>,
        rest: Arc<ScriptedProtocol>,
    }

    fn harness(devices: &[Device]) -> Harness {
        let registry = Arc::new(InMemoryRegistry::with(devices));
        let tracker = Arc::new(StatusTracker::new(
            Arc::clone(&registry),
            Arc::new(RecordingPublisher::default()),
        ));
        let rest = Arc::new(ScriptedProtocol::new(
            Protocol::Rest,
            Step::Reply(PowerState::On),
        ));
        let ip = Arc::new(ScriptedProtocol::new(
            Protocol::SimpleIp,
            Step::Reply(PowerState::On),
        ));
        let adapter = DeviceAdapter::new(
            Arc::clone(&rest),
            ip,
            tracker,
            ControlSettings::default(),
        );
        let activity = Arc::new(RecordingActivity::default());
        Harness {
            service: CommandService::new(
                Arc::clone(&registry),
                BulkDispatcher::new(Arc::new(adapter), 4),
                Arc::clone(&activity),
            ),
            registry,
            activity,
            rest,
        }
    }

    #[tokio::test]
    async fn should_run_single_device_command() {
        let lobby = device("lobby");
        let h = harness(std::slice::from_ref(&lobby));

        let outcome = h
            .service
            .execute(CommandRequest::new(
                CommandTarget::Device(lobby.id),
                PowerAction::PowerOn,
            ))
            .await
            .unwrap();

        assert!(matches!(&outcome, CommandOutcome::Single(r) if r.is_success()));
        assert_eq!(outcome.counts(), (1, 0));
        let logged = h.activity.power.lock().unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].device_id, lobby.id);
        assert_eq!(logged[0].source, CommandSource::Manual);
    }

    #[tokio::test]
    async fn should_fail_fast_when_device_unknown() {
        let h = harness(&[]);

        let result = h
            .service
            .execute(CommandRequest::new(
                CommandTarget::Device(DeviceId::new()),
                PowerAction::PowerOn,
            ))
            .await;

        assert!(matches!(result, Err(LdpmError::NotFound(e)) if e.entity == "Device"));
        assert_eq!(h.rest.call_count(), 0);
    }

    #[tokio::test]
    async fn should_fail_fast_when_group_unknown() {
        let h = harness(&[]);

        let result = h
            .service
            .execute(CommandRequest::new(
                CommandTarget::Group(GroupId::new()),
                PowerAction::PowerOff,
            ))
            .await;

        assert!(matches!(result, Err(LdpmError::NotFound(e)) if e.entity == "Group"));
    }

    #[tokio::test]
    async fn should_fail_fast_when_group_empty() {
        let h = harness(&[]);
        let group = GroupId::new();
        h.registry.add_group(group, &[]);

        let result = h
            .service
            .execute(CommandRequest::new(
                CommandTarget::Group(group),
                PowerAction::PowerOff,
            ))
            .await;

        assert!(matches!(
            result,
            Err(LdpmError::Validation(ValidationError::EmptyGroup))
        ));
        assert_eq!(h.rest.call_count(), 0);
    }

    #[tokio::test]
    async fn should_run_group_and_log_only_successful_changes() {
        let devices = vec![device("a"), device("b"), device("c")];
        let h = harness(&devices);
        let group = GroupId::new();
        h.registry
            .add_group(group, &devices.iter().map(|d| d.id).collect::<Vec<_>>());
        h.rest
            .script(&devices[2].address, [Step::Fail(ErrorKind::Auth)]);

        let outcome = h
            .service
            .execute(
                CommandRequest::new(CommandTarget::Group(group), PowerAction::PowerOff)
                    .with_context(CommandContext::new(CommandSource::Api)),
            )
            .await
            .unwrap();

        assert_eq!(outcome.counts(), (2, 1));
        let logged = h.activity.power.lock().unwrap();
        assert_eq!(logged.len(), 2);
        assert!(logged.iter().all(|e| e.source == CommandSource::Api));
        assert!(logged.iter().all(|e| e.device_id != devices[2].id));
    }

    #[tokio::test]
    async fn should_not_log_power_change_for_query() {
        let lobby = device("lobby");
        let h = harness(std::slice::from_ref(&lobby));

        h.service
            .execute(CommandRequest::new(
                CommandTarget::Device(lobby.id),
                PowerAction::Query,
            ))
            .await
            .unwrap();

        assert!(h.activity.power.lock().unwrap().is_empty());
    }
}

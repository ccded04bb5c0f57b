//! Scheduler: fires cron rules against the wall clock.
//!
//! Every tick re-reads the full rule set, so rules may appear, change or
//! disappear between ticks. A rule fires at most once per wall-clock minute:
//! the minute it last fired in is remembered per rule id. Matching rules are
//! dispatched on their own task so a slow group never delays the next tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use ldpm_domain::command::{CommandContext, CommandRequest, CommandSource};
use ldpm_domain::error::LdpmError;
use ldpm_domain::id::ScheduleId;
use ldpm_domain::schedule::{ScheduleExecution, ScheduleRule};
use ldpm_domain::time::{self, Timestamp};

use crate::ports::{ActivityLog, Clock, ScheduleRepository};
use crate::services::command_service::CommandHandler;

/// Scheduler tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Time between two rule evaluations. Must stay well under a minute.
    pub tick_interval: Duration,
    /// Evaluate cron fields in the host's local time rather than UTC.
    pub use_local_time: bool,
    /// Deadline attached to every scheduled command.
    pub command_deadline: Option<Duration>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            use_local_time: true,
            command_deadline: None,
        }
    }
}

/// What one tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Rules fired by this tick.
    pub fired: Vec<ScheduleId>,
    /// One task per fired rule; each ends after its execution is recorded.
    pub dispatches: Vec<JoinHandle<()>>,
}

/// Tick-driven cron evaluator.
pub struct Scheduler<S, H, L, C> {
    schedules: S,
    handler: Arc<H>,
    activity: Arc<L>,
    clock: C,
    settings: SchedulerSettings,
    fired: HashMap<ScheduleId, NaiveDateTime>,
}

impl<S, H, L, C> Scheduler<S, H, L, C>
where
    S: ScheduleRepository + Send + Sync,
    H: CommandHandler + Send + Sync + 'static,
    L: ActivityLog + Send + Sync + 'static,
    C: Clock + Send + Sync,
{
    /// Create a scheduler. Nothing runs until [`tick`](Self::tick) or
    /// [`start`](Self::start) is called.
    pub fn new(
        schedules: S,
        handler: Arc<H>,
        activity: Arc<L>,
        clock: C,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            schedules,
            handler,
            activity,
            clock,
            settings,
            fired: HashMap::new(),
        }
    }

    /// Evaluate all rules at the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule set cannot be read.
    pub async fn tick(&mut self) -> Result<TickReport, LdpmError> {
        let now = self.clock.now();
        self.tick_at(now).await
    }

    /// Evaluate all rules at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule set cannot be read.
    pub async fn tick_at(&mut self, now: Timestamp) -> Result<TickReport, LdpmError> {
        let wall = time::wall_clock(now, self.settings.use_local_time);
        let bucket = time::minute_of(wall);
        let rules = self.schedules.snapshot().await?;

        self.fired.retain(|_, fired_in| *fired_in == bucket);

        let mut report = TickReport::default();
        for rule in rules {
            if !rule.enabled || !rule.cron.matches(&wall) {
                continue;
            }
            if self.fired.get(&rule.id) == Some(&bucket) {
                continue;
            }
            self.fired.insert(rule.id, bucket);
            tracing::info!(rule_id = %rule.id, rule = %rule.name, cron = %rule.cron, "schedule fired");
            report.fired.push(rule.id);
            report.dispatches.push(self.dispatch(rule, now));
        }
        Ok(report)
    }

    fn dispatch(&self, rule: ScheduleRule, fired_at: Timestamp) -> JoinHandle<()> {
        let handler = Arc::clone(&self.handler);
        let activity = Arc::clone(&self.activity);
        let mut context = CommandContext::new(CommandSource::Schedule);
        context.deadline = self.settings.command_deadline;
        let request = CommandRequest::new(rule.target, rule.action).with_context(context);

        tokio::spawn(async move {
            let execution = match handler.handle(request).await {
                Ok(outcome) => {
                    let (succeeded, failed) = outcome.counts();
                    tracing::info!(rule_id = %rule.id, succeeded, failed, "schedule executed");
                    ScheduleExecution::completed(rule.id, fired_at, succeeded, failed)
                }
                Err(err) => {
                    let message = error_chain(&err);
                    tracing::warn!(rule_id = %rule.id, error = %message, "schedule could not run");
                    ScheduleExecution::rejected(rule.id, fired_at, message)
                }
            };
            if let Err(err) = activity.record_execution(execution).await {
                tracing::warn!(rule_id = %rule.id, error = %err, "failed to record execution");
            }
        })
    }

    /// Run the tick loop on its own task until aborted.
    pub fn start(mut self) -> JoinHandle<()>
    where
        S: 'static,
        C: 'static,
    {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.settings.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(err) = self.tick().await {
                    tracing::warn!(error = %error_chain(&err), "failed to read schedules");
                }
            }
        })
    }
}

fn error_chain(err: &LdpmError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

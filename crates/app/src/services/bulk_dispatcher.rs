//! Bulk dispatcher: fans one action out over many devices.
//!
//! A fixed number of worker tasks pull devices from a shared cursor, so at
//! most `pool_size` devices are worked on at once whatever the group size.
//! Each device gets the full per-device deadline. A failing device never
//! stops the others.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use ldpm_domain::command::{CommandContext, PowerAction};
use ldpm_domain::device::Device;
use ldpm_domain::error::{LdpmError, ValidationError};
use ldpm_domain::outcome::{BulkResult, CommandResult, ErrorKind, Outcome, Protocol};

use crate::services::device_adapter::CommandExecutor;

/// Bounded-concurrency fan-out over a [`CommandExecutor`].
pub struct BulkDispatcher<X> {
    executor: Arc<X>,
    pool_size: usize,
}

impl<X> Clone for BulkDispatcher<X> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            pool_size: self.pool_size,
        }
    }
}

impl<X> BulkDispatcher<X>
where
    X: CommandExecutor + Send + Sync + 'static,
{
    /// Create a dispatcher running at most `pool_size` devices at once.
    ///
    /// A pool size of zero is treated as one.
    pub fn new(executor: Arc<X>, pool_size: usize) -> Self {
        Self {
            executor,
            pool_size: pool_size.max(1),
        }
    }

    /// The executor used for each device.
    #[must_use]
    pub fn executor(&self) -> &Arc<X> {
        &self.executor
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Run `action` on every device and collect one result per device.
    ///
    /// Duplicate devices are run once. Results are ordered by device id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyGroup`] when `devices` is empty.
    #[tracing::instrument(
        skip(self, devices, context),
        fields(devices = devices.len(), command_id = %context.idempotency_token)
    )]
    pub async fn run_group(
        &self,
        devices: Vec<Device>,
        action: PowerAction,
        context: CommandContext,
    ) -> Result<BulkResult, LdpmError> {
        let devices: Vec<Device> = devices
            .into_iter()
            .map(|d| (d.id, d))
            .collect::<BTreeMap<_, _>>()
            .into_values()
            .collect();
        if devices.is_empty() {
            return Err(ValidationError::EmptyGroup.into());
        }

        let total = devices.len();
        let devices = Arc::new(devices);
        let cursor = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::channel::<(usize, CommandResult)>(total);

        for _ in 0..self.pool_size.min(total) {
            let executor = Arc::clone(&self.executor);
            let devices = Arc::clone(&devices);
            let cursor = Arc::clone(&cursor);
            let tx = tx.clone();
            tokio::spawn(async move {
                loop {
                    if tx.is_closed() {
                        break;
                    }
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(device) = devices.get(index) else {
                        break;
                    };
                    let result = executor.run(device, action, &context).await;
                    if tx.send((index, result)).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut slots: Vec<Option<CommandResult>> = vec![None; total];
        while let Some((index, result)) = rx.recv().await {
            slots[index] = Some(result);
        }

        let results: Vec<CommandResult> = slots
            .into_iter()
            .zip(devices.iter())
            .map(|(slot, device)| slot.unwrap_or_else(|| lost_result(device, action, &context)))
            .collect();
        let bulk = BulkResult::from_results(action, results);
        tracing::info!(
            %action,
            succeeded = bulk.succeeded,
            failed = bulk.failed,
            "bulk command finished"
        );
        Ok(bulk)
    }
}

/// Result for a device whose worker died before reporting.
fn lost_result(device: &Device, action: PowerAction, context: &CommandContext) -> CommandResult {
    tracing::error!(device_id = %device.id, "worker ended without a result");
    CommandResult {
        command_id: context.idempotency_token,
        device_id: device.id,
        action,
        protocol: Protocol::Rest,
        outcome: Outcome::Failed {
            error: ErrorKind::Device,
            message: "command worker ended without reporting".to_string(),
        },
        latency: Duration::ZERO,
        retries: 0,
        attempts: Vec::new(),
    }
}

//! Power activity log and the energy savings derived from it.
//!
//! Savings are counted for the time a display spent switched off: each
//! power-off opens an "off" interval which the next power-on for the same
//! device closes. An interval still open at the end of the window is closed
//! there.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::command::{CommandSource, PowerAction};
use crate::id::DeviceId;
use crate::time::Timestamp;

/// A successful power-on or power-off as recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerLogEntry {
    pub device_id: DeviceId,
    pub action: PowerAction,
    pub timestamp: Timestamp,
    pub source: CommandSource,
}

/// Consumption figures used to convert off-time into savings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyRates {
    pub on_watts: f64,
    pub standby_watts: f64,
    pub cost_per_kwh: f64,
    pub co2_kg_per_kwh: f64,
}

impl Default for EnergyRates {
    fn default() -> Self {
        Self {
            on_watts: 100.0,
            standby_watts: 0.5,
            cost_per_kwh: 0.12,
            co2_kg_per_kwh: 0.4,
        }
    }
}

/// Savings for one device, or the sum over several.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Savings {
    pub hours_off: f64,
    pub energy_kwh: f64,
    pub cost: f64,
    pub co2_kg: f64,
}

impl Savings {
    fn from_hours(hours_off: f64, rates: &EnergyRates) -> Self {
        let energy_kwh = hours_off * (rates.on_watts - rates.standby_watts) / 1000.0;
        Self {
            hours_off,
            energy_kwh,
            cost: energy_kwh * rates.cost_per_kwh,
            co2_kg: energy_kwh * rates.co2_kg_per_kwh,
        }
    }

    fn add(&mut self, other: &Self) {
        self.hours_off += other.hours_off;
        self.energy_kwh += other.energy_kwh;
        self.cost += other.cost;
        self.co2_kg += other.co2_kg;
    }
}

/// Savings per device plus the total.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyReport {
    pub total: Savings,
    /// Ordered by device id.
    pub devices: Vec<(DeviceId, Savings)>,
}

/// Compute savings from `entries` up to `window_end`.
///
/// Entries need not be sorted. Entries after `window_end` and `query`
/// entries are ignored. Only devices with at least one entry appear.
#[must_use]
pub fn compute_savings(
    entries: &[PowerLogEntry],
    window_end: Timestamp,
    rates: &EnergyRates,
) -> EnergyReport {
    let mut by_device: BTreeMap<DeviceId, Vec<&PowerLogEntry>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.timestamp <= window_end) {
        by_device.entry(entry.device_id).or_default().push(entry);
    }

    let mut report = EnergyReport::default();
    for (device_id, mut logs) in by_device {
        logs.sort_by_key(|e| e.timestamp);
        let mut hours_off = 0.0;
        let mut off_since: Option<Timestamp> = None;
        for log in logs {
            match log.action {
                PowerAction::PowerOff => {
                    off_since.get_or_insert(log.timestamp);
                }
                PowerAction::PowerOn => {
                    if let Some(start) = off_since.take() {
                        hours_off += hours_between(start, log.timestamp);
                    }
                }
                PowerAction::Query => {}
            }
        }
        if let Some(start) = off_since {
            hours_off += hours_between(start, window_end);
        }
        let savings = Savings::from_hours(hours_off, rates);
        report.total.add(&savings);
        report.devices.push((device_id, savings));
    }
    report
}

#[allow(clippy::cast_precision_loss)]
fn hours_between(start: Timestamp, end: Timestamp) -> f64 {
    (end - start).num_milliseconds().max(0) as f64 / 3_600_000.0
}

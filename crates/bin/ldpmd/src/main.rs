use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use ldpmd::config::Config;
use ldpmd::daemon::Daemon;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_logging(&config.logging.filter);

    let daemon = Daemon::build(&config)?;
    tracing::info!(
        devices = config.devices.len(),
        groups = config.groups.len(),
        schedules = config.schedules.len(),
        "inventory loaded"
    );
    let running = daemon.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    let report = running.shutdown();
    tracing::info!(
        hours_off = report.total.hours_off,
        energy_kwh = report.total.energy_kwh,
        cost = report.total.cost,
        co2_kg = report.total.co2_kg,
        "energy saved this session"
    );
    Ok(())
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use sparkgap::config::defaults::DEFAULT_CONFIG_FILENAME;
use sparkgap::{AppConfig, BreakerConfig, BreakerError, BreakerRegistry};

/// Drive circuit breakers against a simulated flaky dependency
#[derive(Debug, Parser)]
#[command(name = "sparkgap", version, about)]
struct Cli {
    /// Path to a TOML config file (defaults to ./sparkgap.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of workload ticks to run
    #[arg(long, default_value_t = 120)]
    ticks: u32,

    /// Print snapshots as JSON instead of tables
    #[arg(long)]
    json: bool,
}

/// Ticks per phase of the simulated outage schedule: (dependency down, length)
const OUTAGE_SCHEDULE: &[(bool, u32)] = &[(false, 20), (true, 20), (false, 40), (true, 20), (false, 40)];

/// Ticks between two snapshot prints
const REPORT_EVERY: u32 = 4;

fn dependency_down(tick: u32) -> bool {
    let cycle: u32 = OUTAGE_SCHEDULE.iter().map(|(_, len)| len).sum();
    let mut offset = tick % cycle;
    for (down, len) in OUTAGE_SCHEDULE {
        if offset < *len {
            return *down;
        }
        offset -= len;
    }
    false
}

async fn call_dependency(name: &str, down: bool) -> Result<String, String> {
    tokio::time::sleep(Duration::from_millis(5)).await;
    if down {
        Err(format!("{} broke", name))
    } else {
        Ok(format!("Hi {}", name))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG_FILENAME);
        default.exists().then_some(default)
    });
    let config = AppConfig::load(config_path.as_deref())?;

    // Logs go to stderr so snapshots on stdout stay machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting sparkgap workload with {} breaker(s)", config.breakers.len());

    let registry: BreakerRegistry<String> = BreakerRegistry::new();
    for settings in &config.breakers {
        registry.get_or_create(&settings.name, BreakerConfig::from(settings));
    }

    let mut interval = tokio::time::interval(config.tick());
    let mut previous_down = false;

    for tick in 0..cli.ticks {
        interval.tick().await;

        let down = dependency_down(tick);
        if down != previous_down {
            warn!(tick, "Dependency is {}", if down { "down" } else { "up" });
            previous_down = down;
        }

        for settings in &config.breakers {
            let Some(breaker) = registry.get(&settings.name) else {
                continue;
            };
            match breaker.execute_async(call_dependency(&settings.name, down)).await {
                Ok(reply) => debug!(breaker = %settings.name, %reply, "Call succeeded"),
                Err(BreakerError::Open { .. }) => {
                    debug!(breaker = %settings.name, "Call short-circuited")
                }
                Err(BreakerError::Failed(e)) => info!(breaker = %settings.name, error = %e, "Call failed"),
            }
        }

        if tick % REPORT_EVERY == 0 {
            for snapshot in registry.snapshots() {
                if cli.json {
                    println!("{}", serde_json::to_string(&snapshot)?);
                } else {
                    println!("{}\n", snapshot);
                }
            }
        }
    }

    info!("Workload finished");
    Ok(())
}

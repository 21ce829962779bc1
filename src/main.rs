use anyhow::{Context, Result};
use serde_json::json;
use std::time::Duration;
use tracing::{Level, error, info, warn};

use nexus_engine::{EngineConfig, EngineContext, run_health_check};

/// Reference signal vector used by the demo submissions and the health check
const REFERENCE_SIGNALS: [f64; 5] = [0.8, 1.2, 0.9, 1.5, 0.7];

#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Please check the NEXUS_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!(
        node = %config.node_id,
        zone = %config.admission.jurisdiction,
        "Starting Nexus admission engine"
    );

    let ctx = EngineContext::from_config(config).context("Failed to initialize engine")?;
    let probe = ctx.start_probe();

    let signals = fit_signals(ctx.pipeline.dimension());
    let payload = json!({"event": "GLOBAL_SETTLEMENT"});

    for cycle in 1..=ctx.config.demo_cycles {
        // submit blocks on the pipeline lock and the ledger fsync
        let pipeline = ctx.pipeline.clone();
        let (sig, body) = (signals.clone(), payload.clone());
        let submitted = tokio::task::spawn_blocking(move || pipeline.submit(&sig, &body, None))
            .await
            .context("Settlement task panicked")?;

        match submitted {
            Ok(outcome) => match outcome.record() {
                Some(record) => info!(cycle, epoch = %record.epoch_id, "Settlement committed"),
                None => info!(
                    cycle,
                    reason = ?outcome.reject_reason(),
                    potential = outcome.potential(),
                    "Settlement rejected"
                ),
            },
            Err(e) => error!(cycle, error = %e, "Settlement submission failed"),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let pipeline = ctx.pipeline.clone();
    let health = tokio::task::spawn_blocking(move || run_health_check(&pipeline, &signals))
        .await
        .context("Health check task panicked")?
        .context("Health check aborted")?;
    if health.is_healthy() {
        info!("Health check passed");
    } else {
        warn!(
            admission_ok = health.admission_ok,
            admissibility_ok = health.admissibility_ok,
            "Health check failed"
        );
    }

    if let Some(handle) = probe {
        let report = handle.shutdown().await.context("Probe agent panicked")?;
        info!(
            probes = report.probes,
            breaches = report.breaches,
            deflected = report.deflected,
            errors = report.errors,
            "Probe report"
        );
    }

    info!(
        committed = ctx.pipeline.ledger_len(),
        head = %ctx.pipeline.head().hash,
        "Engine shut down"
    );

    Ok(())
}

/// Repeat or truncate the reference vector to the configured dimension
fn fit_signals(dimension: usize) -> Vec<f64> {
    REFERENCE_SIGNALS.iter().copied().cycle().take(dimension).collect()
}

fn init_logging(config: &EngineConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

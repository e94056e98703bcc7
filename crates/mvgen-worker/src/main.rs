//! Music video planning worker binary.

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mvgen_worker::{Pipeline, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("mvgen=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting mvgen-worker");

    let config = WorkerConfig::from_env().context("Failed to load worker config")?;
    info!("Worker config: {:?}", config);

    let metrics = if config.write_metrics {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("Failed to install Prometheus recorder")?,
        )
    } else {
        None
    };

    // Ctrl-C stops the run between takes and blends
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        cancel_tx.send(true).ok();
    });

    let pipeline = Pipeline::new(config.clone()).with_cancel(cancel_rx);
    let outcome = match pipeline.plan().await {
        Ok(outcome) => outcome,
        Err(e) => {
            pipeline.logger().log_error(&e.to_string());
            return Err(e.into());
        }
    };

    info!(
        render_plans = outcome.render_plans.len(),
        intensities = %outcome.intensities.display(),
        reduction = ?outcome.reduction,
        finishing = ?outcome.finishing,
        "Planning complete"
    );

    if let Some(handle) = metrics {
        let path = config.temp_dir().join("metrics.prom");
        tokio::fs::write(&path, handle.render())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote metrics");
    }

    Ok(())
}

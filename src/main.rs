use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio_cron_scheduler::JobScheduler;
use tracing_subscriber::{fmt, EnvFilter};

use flower_classifier::handlers::{router, AppState};
use flower_classifier::processing::schedule_retention;
use flower_classifier::{metrics, Config, InferencePipeline};

mod cli;

use crate::cli::{print_usage, run_classify_cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load this crate's .env regardless of current working directory, and override any pre-set envs
    let _ = dotenvy::from_filename_override(concat!(env!("CARGO_MANIFEST_DIR"), "/.env"));
    // Initialize logging
    let filter = EnvFilter::from_default_env().add_directive("info".parse()?);
    fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(true)
        .init();

    let cfg = Config::from_env();
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "classify" => {
                let Some(path) = args.get(2) else {
                    print_usage();
                    anyhow::bail!("classify needs an image path");
                };
                return run_classify_cli(cfg, Path::new(path));
            }
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                print_usage();
                anyhow::bail!("unknown command: {}", other);
            }
        }
    }

    tracing::info!(
        port = cfg.port,
        model = %cfg.model_path.display(),
        backend = ?cfg.classifier_backend,
        upload_folder = %cfg.upload_folder.display(),
        processed_folder = %cfg.processed_folder.display(),
        "Loaded configuration"
    );
    metrics::mark_started();

    // Model and label table are loaded once and shared read-only
    let pipeline = Arc::new(InferencePipeline::from_config(cfg.clone())?);
    tracing::info!(labels = pipeline.labels().len(), "Inference pipeline ready");

    let scheduler = JobScheduler::new().await?;
    if cfg.retention_enabled() {
        schedule_retention(&scheduler, &cfg).await?;
        scheduler.start().await?;
    } else {
        tracing::info!("Retention sweeper disabled; stored files accumulate");
    }

    let app = router(AppState::new(pipeline)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.port).parse()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(port = cfg.port, "Port is already in use. Another flower-classifier might be running. Try changing PORT env var or stop the other process.");
            }
            return Err(e.into());
        }
    };
    tracing::info!(port = cfg.port, "Flower classifier listening");
    axum::serve(listener, app).await?;

    Ok(())
}

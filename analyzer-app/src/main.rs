use analyzer_app::{AppState, app_router};
use analyzer_common::observability::{LogConfig, init_logging};
use analyzer_config::{AnalyzerConfig, AnalyzerConfigLoader};
use analyzer_store::Repository;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "page-analyzer", version, about = "Check websites for basic SEO fields")]
struct Cli {
    /// YAML config file layered under the environment.
    #[arg(long, env = "ANALYZER_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding `bind` from config.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins over the file)
    let mut loader = AnalyzerConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let mut cfg: AnalyzerConfig = loader.load()?;
    if let Some(bind) = cli.bind {
        cfg.bind = bind;
    }

    // 2) Logging
    let log_path = init_logging(LogConfig {
        app_name: "page-analyzer",
        log_dir: cfg.log.dir.clone(),
        emit_stderr: cfg.log.stderr,
        format: cfg.log.format,
        default_filter: cfg.default_log_filter(),
    })?;
    info!(log_path=%log_path.display(), config=?cfg, "app.starting");

    // 3) Storage
    let pool = analyzer_store::connect(&cfg.database_url)
        .await
        .context("opening database")?;
    analyzer_store::migrate(&pool).await?;

    // 4) Serve
    let state = AppState::from_config(&cfg, Repository::new(pool))?;
    let listener = TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("binding {}", cfg.bind))?;
    info!(addr=%listener.local_addr()?, "app.listening");

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("app.stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("app.shutdown_requested"),
        Err(err) => warn!(error=%err, "app.ctrl_c_unavailable"),
    }
}

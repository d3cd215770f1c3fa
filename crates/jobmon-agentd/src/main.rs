use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use jobmon_agentd::{AppConfig, Cli, app, serve};
use jobmon_observe::logger_init;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Configuration
    let cli = Cli::parse();
    let cfg = AppConfig::resolve(&cli).context("loading configuration")?;

    // 2) Logger
    logger_init(&cfg.logger_config()).context("initializing logger")?;
    info!(
        target: "jobmon.agentd",
        host = %cfg.supervisor.host,
        program = %cfg.supervisor.program,
        templates = %cfg.paths.templates_dir.display(),
        "starting job monitor"
    );

    // 3) Engine + API
    let router = app(&cfg).context("building application")?;

    // 4) Serve until Ctrl+C
    let listener = TcpListener::bind(cfg.listen)
        .await
        .with_context(|| format!("binding {}", cfg.listen))?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!(target: "jobmon.agentd", "shutting down...");
                signal.cancel();
            }
            Err(e) => warn!(target: "jobmon.agentd", error = %e, "cannot listen for ctrl-c"),
        }
    });

    serve(listener, router, shutdown).await.context("serving http api")?;
    Ok(())
}

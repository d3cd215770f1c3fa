pub mod cli;
pub use cli::Cli;

pub mod config;
pub use config::{AppConfig, ConfigError};

use std::{net::SocketAddr, sync::Arc};

use jobmon_api::{EngineApiAdapter, HttpApi, axum::Router};
use jobmon_core::{JobEngine, ProcessControl};
use jobmon_exec::ZdaemonControl;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Router backed by the configured supervisor.
pub fn app(cfg: &AppConfig) -> Result<Router, ConfigError> {
    let control = Arc::new(ZdaemonControl::new(&cfg.exec_config()));
    app_with_control(cfg, control)
}

/// Router backed by an arbitrary supervisor seam.
pub fn app_with_control(
    cfg: &AppConfig,
    control: Arc<dyn ProcessControl>,
) -> Result<Router, ConfigError> {
    let engine = Arc::new(JobEngine::new(&cfg.core_config()?, control));
    let adapter = Arc::new(EngineApiAdapter::new(engine));
    Ok(HttpApi::new(adapter).router())
}

/// Serve `router` on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr: Option<SocketAddr> = listener.local_addr().ok();
    info!(target: "jobmon.agentd", ?addr, "http api listening");
    jobmon_api::axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled_owned().await })
        .await
}

use crate::cli::ServeArgs;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::routes::{with_operational_routes, AppState};
use crate::telemetry;
use crate::workflows::allocation::{AllocationService, Repositories};
use crate::workflows::ledger::{sample_snapshot, CsvLedger};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let ledger = config.ledger.data_dir.clone().map(CsvLedger::new);
    let snapshot = match &ledger {
        Some(ledger) if ledger.exists() => ledger.load()?,
        _ => {
            info!("no ledger on disk, starting from sample projects");
            sample_snapshot()
        }
    };
    let repositories = Repositories::from_snapshot(snapshot)?;
    let service = Arc::new(AllocationService::new(repositories, config.eligibility)?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_operational_routes(service.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "housing allocation service ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    readiness_flag.store(false, Ordering::Release);

    if let Some(ledger) = ledger {
        ledger.save(&service.store().snapshot()?)?;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c, shutting down");
    }
    info!("shutdown requested");
}

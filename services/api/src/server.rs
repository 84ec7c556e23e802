use crate::cli::ServeArgs;
use crate::infra::{load_stores, AppState};
use crate::routes::with_approval_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use crewmatch::config::AppConfig;
use crewmatch::error::AppError;
use crewmatch::marketplace::ApprovalService;
use crewmatch::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let stores = load_stores(config.seed_path.as_deref(), None)?;
    let approval_service = Arc::new(ApprovalService::new(
        stores,
        config.matching.approval_settings(),
    ));

    let app = with_approval_routes(approval_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        fanout_concurrency = config.matching.fanout_concurrency,
        "invitation matching service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

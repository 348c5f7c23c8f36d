use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryDocumentVault, InMemoryNotificationPublisher, InMemoryPartnerRepository,
    StaticProductCatalog,
};
use crate::routes::with_partner_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use partner_hub::config::AppConfig;
use partner_hub::error::AppError;
use partner_hub::telemetry;
use partner_hub::workflows::partners::PartnerService;
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

    let repository = Arc::new(InMemoryPartnerRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let partner_service = Arc::new(PartnerService::new(
        repository,
        notifications,
        Arc::new(StaticProductCatalog::default()),
        Arc::new(InMemoryDocumentVault::default()),
    ));

    let app = with_partner_routes(partner_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "partner lifecycle service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

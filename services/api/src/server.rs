use crate::cli::ServeArgs;
use crate::infra::{build_services, AppState};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use promolink::config::AppConfig;
use promolink::error::AppError;
use promolink::marketplace::{InMemoryMarketplaceStore, MarketplaceStore, OfferCatalog, SystemClock};
use promolink::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryMarketplaceStore::new());
    let clock = Arc::new(SystemClock);
    let services = Arc::new(build_services(&config, store.clone(), clock.clone())?);

    let sweep = OfferCatalog::new(store, clock);
    tokio::spawn(expire_offers_periodically(
        sweep,
        Duration::from_secs(config.offers.expiry_interval_minutes * 60),
    ));

    let app = with_marketplace_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "promolink marketplace ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Moves lapsed ACTIVE offers to EXPIRED on a fixed cadence. A failed sweep is retried on the
/// next tick.
async fn expire_offers_periodically<S>(catalog: OfferCatalog<S>, every: Duration)
where
    S: MarketplaceStore + 'static,
{
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if let Err(error) = catalog.expire_lapsed_offers() {
            warn!(%error, "offer expiry sweep failed");
        }
    }
}

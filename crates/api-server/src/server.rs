//! API server: REST routes plus the Prometheus exporter.

use crate::plans;
use crate::rest::{self, AppState};
use axum::routing::{get, post, put};
use axum::Router;
use planner_core::config::AppConfig;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the full REST router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Metrics engine
        .route("/v1/campaigns/recalculate", post(rest::handle_recalculate))
        .route("/v1/campaigns/kpis", post(rest::handle_kpis))
        .route("/v1/plans/summary", post(rest::handle_summary))
        .route("/v1/templates", get(rest::list_templates))
        // Plan workspace
        .route("/v1/plans", get(plans::list_plans).post(plans::create_plan))
        .route("/v1/plans/:id", get(plans::get_plan).delete(plans::delete_plan))
        .route("/v1/plans/:id/summary", get(plans::plan_summary))
        .route("/v1/plans/:id/ingest", post(plans::ingest_plan))
        .route(
            "/v1/plans/:id/months/:month/campaigns",
            post(plans::add_campaign),
        )
        .route(
            "/v1/plans/:id/months/:month/campaigns/:index",
            put(plans::update_campaign).delete(plans::remove_campaign),
        )
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Main API server.
pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = router(self.state.clone());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(
            addr = %addr,
            templates = self.state.catalog.len(),
            strict_validation = self.state.strict_validation,
            "Starting HTTP server"
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        if !self.config.metrics.enabled {
            info!("Metrics exporter disabled");
            return Ok(());
        }

        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}

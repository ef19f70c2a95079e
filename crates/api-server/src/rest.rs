//! REST handlers for the metrics engine and operational endpoints.

use crate::store::PlanStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use planner_core::error::PlannerError;
use planner_core::plan::{PlanSnapshot, RawPlanSnapshot};
use planner_core::types::{Campaign, CampaignDraft};
use planner_core::ValidationError;
use planner_metrics::{
    calculate_kpis, calculate_plan_summary, recalculate_campaign_metrics, KpiTemplateCatalog,
    KpiTemplateEntry, PlanSummary,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PlanStore>,
    pub catalog: Arc<KpiTemplateCatalog>,
    /// Reject invalid campaign input instead of coercing it to zero.
    pub strict_validation: bool,
    pub node_id: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(catalog: KpiTemplateCatalog, strict_validation: bool, node_id: String) -> Self {
        Self {
            store: Arc::new(PlanStore::new()),
            catalog: Arc::new(catalog),
            strict_validation,
            node_id,
            start_time: Instant::now(),
        }
    }

    /// Boundary check for a single draft; a no-op in lenient mode.
    pub fn check_draft(&self, draft: &CampaignDraft) -> Result<(), ApiError> {
        if self.strict_validation {
            draft.validate().map_err(reject)?;
        }
        Ok(())
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map an engine or store error onto an HTTP response.
pub fn api_error(err: PlannerError) -> ApiError {
    let (status, code) = match &err {
        PlannerError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
        PlannerError::PlanNotFound(_) => (StatusCode::NOT_FOUND, "plan_not_found"),
        PlannerError::MonthNotFound { .. } => (StatusCode::NOT_FOUND, "month_not_found"),
        PlannerError::CampaignNotFound { .. } => (StatusCode::NOT_FOUND, "campaign_not_found"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: err.to_string(),
        }),
    )
}

/// Reject a request whose input failed boundary validation.
pub fn reject(err: ValidationError) -> ApiError {
    warn!(error = %err, "Campaign input validation failed");
    metrics::counter!("planner.validation_errors").increment(1);
    api_error(PlannerError::Validation(err))
}

/// POST /v1/campaigns/recalculate: derive every metric of one campaign.
pub async fn handle_recalculate(
    State(state): State<AppState>,
    Json(draft): Json<CampaignDraft>,
) -> Result<Json<Campaign>, ApiError> {
    state.check_draft(&draft)?;
    let campaign = recalculate_campaign_metrics(&draft.into_campaign());
    metrics::counter!("planner.campaigns.recalculated").increment(1);
    Ok(Json(campaign))
}

/// POST /v1/campaigns/kpis: apply the objective template, then derive.
pub async fn handle_kpis(
    State(state): State<AppState>,
    Json(draft): Json<CampaignDraft>,
) -> Result<Json<Campaign>, ApiError> {
    state.check_draft(&draft)?;
    let campaign = calculate_kpis(draft, &state.catalog);
    metrics::counter!("planner.campaigns.recalculated").increment(1);
    Ok(Json(campaign))
}

/// POST /v1/plans/summary: summarize campaigns sent by the caller.
pub async fn handle_summary(
    Json(raw): Json<RawPlanSnapshot>,
) -> Result<Json<PlanSummary>, ApiError> {
    let snapshot = PlanSnapshot::try_from(raw).map_err(reject)?;
    metrics::counter!("planner.summaries.calculated").increment(1);
    Ok(Json(calculate_plan_summary(&snapshot.months)))
}

/// GET /v1/templates: the objective -> default metrics table.
pub async fn list_templates(State(state): State<AppState>) -> Json<Vec<KpiTemplateEntry>> {
    Json(state.catalog.entries().cloned().collect())
}

/// GET /health: Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        templates: state.catalog.len(),
    })
}

/// GET /ready: Readiness probe. Ready once a template catalog is loaded.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.catalog.is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live: Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub templates: usize,
}

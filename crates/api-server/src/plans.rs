//! Axum REST handlers for the stored plan workspace.

use crate::rest::{api_error, reject, ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use planner_core::error::PlannerError;
use planner_core::month::MonthKey;
use planner_core::plan::{MediaPlan, MonthlyCampaigns, PlanDraft};
use planner_core::types::{Campaign, CampaignDraft};
use planner_metrics::{calculate_kpis, PlanSummary};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

const UNTITLED_PLAN: &str = "Plano sem nome";

/// One row of the plan listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanListing {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    pub months: Vec<MonthKey>,
    pub campaign_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<MediaPlan> for PlanListing {
    fn from(plan: MediaPlan) -> Self {
        Self {
            id: plan.id,
            campaign_count: plan.campaign_count(),
            months: plan.months.keys().copied().collect(),
            name: plan.name,
            client: plan.client,
            updated_at: plan.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddedCampaign {
    pub index: usize,
    pub campaign: Campaign,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub added: usize,
    pub campaign_count: usize,
}

/// Validate a plan draft (or only its month keys in lenient mode) and run
/// every draft through the objective templates.
fn derive_months(state: &AppState, draft: &PlanDraft) -> Result<MonthlyCampaigns, ApiError> {
    let parsed = if state.strict_validation {
        draft.validate()
    } else {
        draft.parse_months()
    }
    .map_err(reject)?;

    let months: MonthlyCampaigns = parsed
        .into_iter()
        .map(|(month, drafts)| {
            let campaigns = drafts
                .iter()
                .cloned()
                .map(|d| calculate_kpis(d, &state.catalog))
                .collect();
            (month, campaigns)
        })
        .collect();
    let derived: usize = months.values().map(Vec::len).sum();
    metrics::counter!("planner.campaigns.recalculated").increment(derived as u64);
    Ok(months)
}

fn parse_month(raw: &str) -> Result<MonthKey, ApiError> {
    raw.parse().map_err(reject)
}

// ─── Plans ─────────────────────────────────────────────────────────────────

pub async fn list_plans(State(state): State<AppState>) -> Json<Vec<PlanListing>> {
    Json(state.store.list_plans().into_iter().map(PlanListing::from).collect())
}

pub async fn create_plan(
    State(state): State<AppState>,
    Json(draft): Json<PlanDraft>,
) -> Result<(StatusCode, Json<MediaPlan>), ApiError> {
    let months = derive_months(&state, &draft)?;
    let name = draft
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| UNTITLED_PLAN.to_string());
    let plan = state.store.create_plan(name, draft.client, months);
    metrics::counter!("planner.plans.created").increment(1);
    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MediaPlan>, ApiError> {
    state.store.get_plan(id).map(Json).map_err(api_error)
}

pub async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_plan(id) {
        metrics::counter!("planner.plans.deleted").increment(1);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(PlannerError::PlanNotFound(id)))
    }
}

pub async fn plan_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanSummary>, ApiError> {
    let summary = state.store.summary(id).map_err(api_error)?;
    metrics::counter!("planner.summaries.calculated").increment(1);
    Ok(Json(summary))
}

/// AI plan ingestion: month -> drafts, each built through its template.
pub async fn ingest_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<PlanDraft>,
) -> Result<Json<IngestResponse>, ApiError> {
    // Fail on an unknown plan before deriving anything.
    state.store.get_plan(id).map_err(api_error)?;
    let months = derive_months(&state, &draft)?;
    let added = state.store.ingest(id, months).map_err(api_error)?;
    let campaign_count = state.store.get_plan(id).map_err(api_error)?.campaign_count();
    Ok(Json(IngestResponse {
        added,
        campaign_count,
    }))
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn add_campaign(
    State(state): State<AppState>,
    Path((id, month)): Path<(Uuid, String)>,
    Json(draft): Json<CampaignDraft>,
) -> Result<(StatusCode, Json<AddedCampaign>), ApiError> {
    let month = parse_month(&month)?;
    state.check_draft(&draft)?;
    let campaign = calculate_kpis(draft, &state.catalog);
    let index = state
        .store
        .add_campaign(id, month, campaign.clone())
        .map_err(api_error)?;
    metrics::counter!("planner.campaigns.recalculated").increment(1);
    info!(plan_id = %id, month = %month, index, "Campaign added");
    Ok((StatusCode::CREATED, Json(AddedCampaign { index, campaign })))
}

pub async fn update_campaign(
    State(state): State<AppState>,
    Path((id, month, index)): Path<(Uuid, String, usize)>,
    Json(edit): Json<CampaignDraft>,
) -> Result<Json<Campaign>, ApiError> {
    let month = parse_month(&month)?;
    state.check_draft(&edit)?;
    let campaign = state
        .store
        .update_campaign(id, month, index, &edit)
        .map_err(api_error)?;
    metrics::counter!("planner.campaigns.recalculated").increment(1);
    Ok(Json(campaign))
}

pub async fn remove_campaign(
    State(state): State<AppState>,
    Path((id, month, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<Campaign>, ApiError> {
    let month = parse_month(&month)?;
    let removed = state
        .store
        .remove_campaign(id, month, index)
        .map_err(api_error)?;
    info!(plan_id = %id, month = %month, index, "Campaign removed");
    Ok(Json(removed))
}

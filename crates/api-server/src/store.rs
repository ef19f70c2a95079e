//! In-memory plan workspace backed by DashMap.
//!
//! Plans hold campaigns only. Summaries are never stored; every read
//! recomputes them from the current campaigns.

use dashmap::DashMap;
use planner_core::error::{PlannerError, PlannerResult};
use planner_core::month::MonthKey;
use planner_core::plan::{MediaPlan, MonthlyCampaigns};
use planner_core::types::{Campaign, CampaignDraft};
use planner_metrics::{recalculate_campaign_metrics, summarize_plan, PlanSummary};
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory store for media plans.
pub struct PlanStore {
    plans: DashMap<Uuid, MediaPlan>,
}

impl PlanStore {
    pub fn new() -> Self {
        info!("Plan store initialized (in-memory)");
        Self {
            plans: DashMap::new(),
        }
    }

    // ─── Plans ─────────────────────────────────────────────────────────────

    pub fn list_plans(&self) -> Vec<MediaPlan> {
        let mut plans: Vec<MediaPlan> = self.plans.iter().map(|r| r.value().clone()).collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        plans
    }

    pub fn get_plan(&self, id: Uuid) -> PlannerResult<MediaPlan> {
        self.plans
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(PlannerError::PlanNotFound(id))
    }

    pub fn create_plan(&self, name: String, client: Option<String>, months: MonthlyCampaigns) -> MediaPlan {
        let mut plan = MediaPlan::new(name, client);
        plan.months = months;
        let id = plan.id;
        info!(plan_id = %id, campaigns = plan.campaign_count(), "Plan created");
        self.plans.insert(id, plan.clone());
        plan
    }

    pub fn delete_plan(&self, id: Uuid) -> bool {
        let removed = self.plans.remove(&id).is_some();
        if removed {
            info!(plan_id = %id, "Plan deleted");
        }
        removed
    }

    pub fn summary(&self, id: Uuid) -> PlannerResult<PlanSummary> {
        self.plans
            .get(&id)
            .map(|r| summarize_plan(r.value()))
            .ok_or(PlannerError::PlanNotFound(id))
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    /// Append an already-derived campaign to a month, creating the month if
    /// needed. Returns the campaign's index within the month.
    pub fn add_campaign(&self, id: Uuid, month: MonthKey, campaign: Campaign) -> PlannerResult<usize> {
        let mut entry = self.plans.get_mut(&id).ok_or(PlannerError::PlanNotFound(id))?;
        let plan = entry.value_mut();
        let campaigns = plan.months.entry(month).or_default();
        campaigns.push(campaign);
        let index = campaigns.len() - 1;
        plan.touch();
        Ok(index)
    }

    /// Apply a field-by-field edit and recalculate the whole campaign.
    pub fn update_campaign(
        &self,
        id: Uuid,
        month: MonthKey,
        index: usize,
        edit: &CampaignDraft,
    ) -> PlannerResult<Campaign> {
        let mut entry = self.plans.get_mut(&id).ok_or(PlannerError::PlanNotFound(id))?;
        let plan = entry.value_mut();
        let campaign = plan
            .months
            .get_mut(&month)
            .ok_or_else(|| PlannerError::MonthNotFound {
                plan_id: id,
                month: month.to_string(),
            })?
            .get_mut(index)
            .ok_or_else(|| PlannerError::CampaignNotFound {
                month: month.to_string(),
                index,
            })?;

        campaign.apply_edit(edit);
        *campaign = recalculate_campaign_metrics(campaign);
        let updated = campaign.clone();
        plan.touch();
        Ok(updated)
    }

    /// Remove a campaign. The month stays in the plan even when emptied.
    pub fn remove_campaign(&self, id: Uuid, month: MonthKey, index: usize) -> PlannerResult<Campaign> {
        let mut entry = self.plans.get_mut(&id).ok_or(PlannerError::PlanNotFound(id))?;
        let plan = entry.value_mut();
        let campaigns = plan
            .months
            .get_mut(&month)
            .ok_or_else(|| PlannerError::MonthNotFound {
                plan_id: id,
                month: month.to_string(),
            })?;
        if index >= campaigns.len() {
            return Err(PlannerError::CampaignNotFound {
                month: month.to_string(),
                index,
            });
        }
        let removed = campaigns.remove(index);
        plan.touch();
        Ok(removed)
    }

    /// Append whole months of derived campaigns (AI plan ingestion).
    /// Returns the number of campaigns added.
    pub fn ingest(&self, id: Uuid, months: MonthlyCampaigns) -> PlannerResult<usize> {
        let mut entry = self.plans.get_mut(&id).ok_or(PlannerError::PlanNotFound(id))?;
        let plan = entry.value_mut();
        let mut added = 0;
        for (month, campaigns) in months {
            added += campaigns.len();
            plan.months.entry(month).or_default().extend(campaigns);
        }
        plan.touch();
        info!(plan_id = %id, added, "Campaigns ingested");
        Ok(added)
    }
}

impl Default for PlanStore {
    fn default() -> Self {
        Self::new()
    }
}

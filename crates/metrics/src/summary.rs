//! Plan and month summaries.
//!
//! Summaries are projections of the current campaigns and are rebuilt on
//! every read. Blended rates come from the aggregate sums, never from
//! averaging per-campaign rates.

use crate::derivation::DAYS_PER_MONTH;
use crate::rate::{safe_div, sanitize, Rate};
use planner_core::month::MonthKey;
use planner_core::plan::{MediaPlan, MonthlyCampaigns};
use planner_core::types::Campaign;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Budget bucket for campaigns without a channel.
pub const UNASSIGNED_CHANNEL: &str = "N/A";

/// Totals and blended rates over a set of campaigns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub campaign_count: usize,
    pub budget: f64,
    #[serde(rename = "impressoes")]
    pub impressions: u64,
    #[serde(rename = "cliques")]
    pub clicks: u64,
    #[serde(rename = "conversoes")]
    pub conversions: u64,
    #[serde(rename = "alcance")]
    pub reach: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub cpa: f64,
    #[serde(rename = "taxaConversao")]
    pub conversion_rate: f64,
    #[serde(rename = "orcamentoDiario")]
    pub daily_budget: f64,
    pub channel_budgets: BTreeMap<String, f64>,
}

impl MetricsSummary {
    /// Each channel's share of the total budget, in percent.
    pub fn channel_shares(&self) -> BTreeMap<String, f64> {
        self.channel_budgets
            .iter()
            .map(|(channel, budget)| (channel.clone(), Rate::ratio(*budget, self.budget).as_percent()))
            .collect()
    }
}

/// Plan-level summary plus one summary per month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub summary: MetricsSummary,
    pub monthly: BTreeMap<MonthKey, MetricsSummary>,
    pub number_of_months: usize,
}

/// Aggregate campaigns spread over `months` months. `months` only affects
/// the daily budget; zero months yields a zero daily budget.
pub fn summarize_campaigns<'a, I>(campaigns: I, months: usize) -> MetricsSummary
where
    I: IntoIterator<Item = &'a Campaign>,
{
    let mut summary = MetricsSummary::default();

    for campaign in campaigns {
        let budget = sanitize(campaign.budget);
        summary.campaign_count += 1;
        summary.budget += budget;
        // Counts saturate; a single derived campaign can already sit at u64::MAX.
        summary.impressions = summary.impressions.saturating_add(campaign.impressions);
        summary.clicks = summary.clicks.saturating_add(campaign.clicks);
        summary.conversions = summary.conversions.saturating_add(campaign.conversions);
        summary.reach = summary.reach.saturating_add(campaign.reach.unwrap_or(0));
        *summary
            .channel_budgets
            .entry(campaign.channel_or(UNASSIGNED_CHANNEL).to_string())
            .or_insert(0.0) += budget;
    }

    let impressions = summary.impressions as f64;
    let clicks = summary.clicks as f64;
    let conversions = summary.conversions as f64;

    summary.ctr = Rate::ratio(clicks, impressions).as_percent();
    summary.cpc = safe_div(summary.budget, clicks);
    summary.cpm = safe_div(summary.budget, impressions) * 1000.0;
    summary.cpa = safe_div(summary.budget, conversions);
    summary.conversion_rate = Rate::ratio(conversions, clicks).as_percent();
    summary.daily_budget = safe_div(summary.budget, months as f64 * DAYS_PER_MONTH);

    summary
}

/// Summaries for a plan's month -> campaigns map.
pub fn calculate_plan_summary(months: &MonthlyCampaigns) -> PlanSummary {
    let number_of_months = months.len();
    let summary = summarize_campaigns(months.values().flatten(), number_of_months);
    let monthly = months
        .iter()
        .map(|(key, campaigns)| (*key, summarize_campaigns(campaigns, 1)))
        .collect();

    debug!(
        months = number_of_months,
        campaigns = summary.campaign_count,
        budget = summary.budget,
        "Plan summary calculated"
    );

    PlanSummary {
        summary,
        monthly,
        number_of_months,
    }
}

/// Summaries for a stored plan.
pub fn summarize_plan(plan: &MediaPlan) -> PlanSummary {
    calculate_plan_summary(&plan.months)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    fn campaign(channel: Option<&str>, budget: f64, impressions: u64, clicks: u64, conversions: u64) -> Campaign {
        Campaign {
            channel: channel.map(str::to_string),
            budget,
            impressions,
            clicks,
            conversions,
            ..Default::default()
        }
    }

    #[test]
    fn test_aggregation_example() {
        let mut months = MonthlyCampaigns::new();
        months.insert(
            key("2025-Janeiro"),
            vec![
                campaign(Some("Google Ads"), 1000.0, 25_000, 500, 50),
                campaign(Some("Meta Ads"), 3000.0, 75_000, 1500, 100),
            ],
        );
        let plan = calculate_plan_summary(&months);
        assert_eq!(plan.number_of_months, 1);
        assert!((plan.summary.budget - 4000.0).abs() < f64::EPSILON);
        assert_eq!(plan.summary.clicks, 2000);
        assert!((plan.summary.cpc - 2.0).abs() < f64::EPSILON);
        assert!((plan.summary.ctr - 2.0).abs() < 1e-9);
        assert!((plan.summary.cpm - 40.0).abs() < 1e-9);
        assert!((plan.summary.cpa - 4000.0 / 150.0).abs() < 1e-9);
        assert!((plan.summary.conversion_rate - 7.5).abs() < 1e-9);
        assert!((plan.summary.daily_budget - 4000.0 / 30.4).abs() < 1e-9);
    }

    #[test]
    fn test_blended_rates_are_not_averages() {
        let campaigns = [
            campaign(None, 100.0, 10_000, 100, 0),
            campaign(None, 900.0, 10_000, 300, 0),
        ];
        let summary = summarize_campaigns(&campaigns, 1);
        // Average of per-campaign CPCs would be (1.0 + 3.0) / 2 = 2.0.
        assert!((summary.cpc - 2.5).abs() < 1e-9);
        assert!((summary.ctr - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_channel_goes_to_na_bucket() {
        let campaigns = [
            campaign(None, 250.0, 0, 0, 0),
            campaign(Some(""), 50.0, 0, 0, 0),
            campaign(Some("TikTok"), 700.0, 0, 0, 0),
        ];
        let summary = summarize_campaigns(&campaigns, 1);
        assert_eq!(summary.channel_budgets.len(), 2);
        assert!((summary.channel_budgets[UNASSIGNED_CHANNEL] - 300.0).abs() < f64::EPSILON);
        assert!((summary.channel_budgets["TikTok"] - 700.0).abs() < f64::EPSILON);

        let shares = summary.channel_shares();
        assert!((shares[UNASSIGNED_CHANNEL] - 30.0).abs() < 1e-9);
        assert!((shares["TikTok"] - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_plan_has_zero_daily_budget() {
        let plan = calculate_plan_summary(&MonthlyCampaigns::new());
        assert_eq!(plan.number_of_months, 0);
        assert_eq!(plan.summary, MetricsSummary::default());
        assert!(plan.monthly.is_empty());
    }

    #[test]
    fn test_zero_months_with_campaigns() {
        let summary = summarize_campaigns(&[campaign(None, 500.0, 0, 0, 0)], 0);
        assert_eq!(summary.daily_budget, 0.0);
        assert_eq!(summary.cpc, 0.0);
        assert_eq!(summary.cpm, 0.0);
        assert_eq!(summary.ctr, 0.0);
    }

    #[test]
    fn test_monthly_summaries_and_plan_daily_budget() {
        let mut months = MonthlyCampaigns::new();
        months.insert(
            key("2025-Fevereiro"),
            vec![campaign(Some("Google Ads"), 608.0, 10_000, 200, 10)],
        );
        months.insert(
            key("2025-Janeiro"),
            vec![
                campaign(Some("Google Ads"), 304.0, 5_000, 100, 5),
                campaign(None, 304.0, 5_000, 100, 5),
            ],
        );
        months.insert(key("2025-Março"), vec![]);

        let plan = calculate_plan_summary(&months);
        assert_eq!(plan.number_of_months, 3);
        assert_eq!(plan.summary.campaign_count, 3);
        assert!((plan.summary.daily_budget - 1216.0 / (3.0 * 30.4)).abs() < 1e-9);
        assert!((plan.summary.channel_budgets["Google Ads"] - 912.0).abs() < 1e-9);

        let keys: Vec<String> = plan.monthly.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["2025-Janeiro", "2025-Fevereiro", "2025-Março"]);

        let jan = &plan.monthly[&key("2025-Janeiro")];
        assert_eq!(jan.campaign_count, 2);
        assert!((jan.daily_budget - 20.0).abs() < 1e-9);
        assert_eq!(jan.channel_budgets.len(), 2);

        let mar = &plan.monthly[&key("2025-Março")];
        assert_eq!(mar.campaign_count, 0);
        assert_eq!(mar.daily_budget, 0.0);
    }

    #[test]
    fn test_reach_sums_when_present() {
        let mut with_reach = campaign(None, 10.0, 0, 0, 0);
        with_reach.reach = Some(1_500);
        let summary = summarize_campaigns(&[with_reach, campaign(None, 10.0, 0, 0, 0)], 1);
        assert_eq!(summary.reach, 1_500);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let mut months = MonthlyCampaigns::new();
        let mut big = campaign(None, 1.0, u64::MAX, u64::MAX, u64::MAX);
        big.reach = Some(u64::MAX);
        months.insert(
            key("2025-Junho"),
            vec![big.clone(), big, campaign(None, 1.0, 10, 10, 10)],
        );

        let plan = calculate_plan_summary(&months);
        assert_eq!(plan.summary.impressions, u64::MAX);
        assert_eq!(plan.summary.clicks, u64::MAX);
        assert_eq!(plan.summary.conversions, u64::MAX);
        assert_eq!(plan.summary.reach, u64::MAX);
        assert!(plan.summary.ctr.is_finite());
        assert!(plan.summary.cpm.is_finite());
        assert_eq!(plan.monthly[&key("2025-Junho")].impressions, u64::MAX);
    }

    #[test]
    fn test_engine_overflow_feeds_summary() {
        let derived = crate::derivation::recalculate_campaign_metrics(&Campaign {
            budget: 1e20,
            cpm: 0.001,
            ctr: 1.0,
            buying_unit: Some(planner_core::types::BuyingUnit::Cpm),
            ..Default::default()
        });
        assert_eq!(derived.impressions, u64::MAX);
        let summary = summarize_campaigns(&[derived.clone(), derived], 1);
        assert_eq!(summary.impressions, u64::MAX);
    }

    #[test]
    fn test_summary_wire_names() {
        let value = serde_json::to_value(summarize_campaigns(&[campaign(None, 1.0, 1, 1, 1)], 1)).unwrap();
        assert!(value.get("impressoes").is_some());
        assert!(value.get("orcamentoDiario").is_some());
        assert!(value.get("channelBudgets").is_some());
        assert!(value.get("campaignCount").is_some());
    }

    #[test]
    fn test_summarize_plan_matches_months() {
        let mut plan = MediaPlan::new("Plano", None);
        plan.months.insert(
            key("2025-Abril"),
            vec![campaign(Some("Display"), 100.0, 1_000, 10, 1)],
        );
        assert_eq!(summarize_plan(&plan), calculate_plan_summary(&plan.months));
    }
}

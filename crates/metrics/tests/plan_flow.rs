//! End-to-end flow: AI-style plan drafts are validated, run through the
//! objective templates, edited, and summarized.

use planner_core::plan::{MediaPlan, PlanDraft};
use planner_core::types::{BuyingUnit, CampaignDraft};
use planner_core::ValidationError;
use planner_metrics::{
    calculate_kpis, recalculate_campaign_metrics, summarize_plan, KpiTemplateCatalog,
    UNASSIGNED_CHANNEL,
};

const PLAN_JSON: &str = r#"{
    "nome": "Lançamento Q1",
    "cliente": "Acme",
    "months": {
        "2025-Fevereiro": [
            {"nome": "Leads LinkedIn", "canal": "LinkedIn", "tipoCampanha": "Geração de Leads", "budget": "1500"}
        ],
        "2025-Janeiro": [
            {"nome": "Search", "canal": "Google Ads", "tipoCampanha": "Tráfego", "budget": 1200},
            {"nome": "Display", "tipoCampanha": "Reconhecimento", "budget": 600, "alcance": 20000}
        ]
    }
}"#;

fn build_plan(draft: PlanDraft, catalog: &KpiTemplateCatalog) -> MediaPlan {
    let validated = draft.validate().expect("plan should validate");
    let mut plan = MediaPlan::new(draft.name.clone().unwrap_or_default(), draft.client.clone());
    for (month, drafts) in validated {
        let campaigns = drafts
            .iter()
            .cloned()
            .map(|d| calculate_kpis(d, catalog))
            .collect();
        plan.months.insert(month, campaigns);
    }
    plan
}

#[test]
fn test_plan_flow_from_drafts_to_summary() {
    let catalog = KpiTemplateCatalog::builtin();
    let draft: PlanDraft = serde_json::from_str(PLAN_JSON).unwrap();
    let plan = build_plan(draft, &catalog);

    assert_eq!(plan.name, "Lançamento Q1");
    assert_eq!(plan.campaign_count(), 3);

    let summary = summarize_plan(&plan);
    assert_eq!(summary.number_of_months, 2);
    assert!((summary.summary.budget - 3300.0).abs() < 1e-9);
    assert!((summary.summary.channel_budgets["Google Ads"] - 1200.0).abs() < 1e-9);
    assert!((summary.summary.channel_budgets["LinkedIn"] - 1500.0).abs() < 1e-9);
    assert!((summary.summary.channel_budgets[UNASSIGNED_CHANNEL] - 600.0).abs() < 1e-9);
    assert_eq!(summary.summary.reach, 20_000);
    assert!((summary.summary.daily_budget - 3300.0 / (2.0 * 30.4)).abs() < 1e-9);

    let months: Vec<String> = summary.monthly.keys().map(ToString::to_string).collect();
    assert_eq!(months, vec!["2025-Janeiro", "2025-Fevereiro"]);

    // Every campaign's clicks agree with impressions x CTR.
    for campaign in plan.months.values().flatten() {
        let expected = campaign.impressions as f64 * campaign.ctr / 100.0;
        assert!((campaign.clicks as f64 - expected).abs() <= 1.0);
        assert_ne!(campaign.buying_unit, None);
    }
}

#[test]
fn test_edit_triggers_full_recalculation() {
    let catalog = KpiTemplateCatalog::builtin();
    let draft: PlanDraft = serde_json::from_str(PLAN_JSON).unwrap();
    let mut plan = build_plan(draft, &catalog);

    let january = plan.months.keys().next().copied().unwrap();
    let search = &mut plan.months.get_mut(&january).unwrap()[0];
    let before = search.clone();
    search.apply_edit(&CampaignDraft {
        budget: Some(2400.0),
        ..Default::default()
    });
    *search = recalculate_campaign_metrics(search);

    assert_eq!(search.clicks, before.clicks * 2);
    assert!((search.daily_budget - before.daily_budget * 2.0).abs() < 1e-9);
    assert_eq!(search.buying_unit, Some(BuyingUnit::Cpc));

    let summary = summarize_plan(&plan);
    assert!((summary.summary.budget - 4500.0).abs() < 1e-9);
}

#[test]
fn test_generated_cpa_draft_is_rejected() {
    let draft: PlanDraft = serde_json::from_str(
        r#"{"months": {"2025-Junho": [{"tipoCampanha": "Conversão", "unidadeCompra": "CPA", "budget": 100}]}}"#,
    )
    .unwrap();
    let err = draft.validate().unwrap_err();
    assert!(matches!(err, ValidationError::InCampaign { .. }));
    assert!(err.to_string().contains("CPA"));
}

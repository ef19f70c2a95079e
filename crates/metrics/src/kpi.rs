//! Objective-driven default metrics and the campaign creation entry point.
//!
//! A new campaign (typed in by a user or drafted by the AI plan generator)
//! usually names only its objective, budget and channel. The template for
//! that objective supplies typical rates underneath whatever the caller set,
//! and the result goes through the regular derivation.

use crate::derivation::recalculate_campaign_metrics;
use planner_core::error::{PlannerError, PlannerResult};
use planner_core::month::fold_accents;
use planner_core::types::{BuyingUnit, Campaign, CampaignDraft};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Default rate fields for one campaign objective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    #[serde(
        default,
        rename = "taxaConversao",
        alias = "taxaconversao",
        alias = "conversion_rate",
        skip_serializing_if = "Option::is_none"
    )]
    pub conversion_rate: Option<f64>,
    #[serde(
        default,
        rename = "connectRate",
        alias = "connectrate",
        alias = "connect_rate",
        skip_serializing_if = "Option::is_none"
    )]
    pub connect_rate: Option<f64>,
    #[serde(
        default,
        rename = "unidadeCompra",
        alias = "unidadecompra",
        alias = "buying_unit",
        skip_serializing_if = "Option::is_none"
    )]
    pub buying_unit: Option<BuyingUnit>,
}

impl KpiTemplate {
    /// Fill the draft's absent rate fields from this template. Anything the
    /// caller set, including an explicit zero, is kept.
    pub fn apply_under(&self, mut draft: CampaignDraft) -> CampaignDraft {
        draft.ctr = draft.ctr.or(self.ctr);
        draft.cpc = draft.cpc.or(self.cpc);
        draft.cpm = draft.cpm.or(self.cpm);
        draft.conversion_rate = draft.conversion_rate.or(self.conversion_rate);
        draft.connect_rate = draft.connect_rate.or(self.connect_rate);
        let unit_missing = draft
            .buying_unit
            .as_deref()
            .map_or(true, |u| u.trim().is_empty());
        if unit_missing {
            draft.buying_unit = self.buying_unit.map(|u| u.as_str().to_string());
        }
        draft
    }
}

/// A named template as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiTemplateEntry {
    #[serde(rename = "tipoCampanha")]
    pub objective: String,
    #[serde(flatten)]
    pub template: KpiTemplate,
}

/// One entry of a template file.
#[derive(Debug, Deserialize)]
struct FileTemplate {
    #[serde(default, rename = "tipoCampanha", alias = "tipocampanha")]
    objective: Option<String>,
    #[serde(flatten)]
    template: KpiTemplate,
}

/// Lookup table: campaign objective -> default metrics. Objectives match
/// regardless of case and accents.
#[derive(Debug, Clone, Default)]
pub struct KpiTemplateCatalog {
    entries: BTreeMap<String, KpiTemplateEntry>,
}

impl KpiTemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typical rates for the objectives offered by the plan editor.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        let rows: [(&str, BuyingUnit, Option<f64>, Option<f64>, f64, f64, f64); 8] = [
            // objective, unit, cpc, cpm, ctr %, conversion %, connect %
            ("Reconhecimento", BuyingUnit::Cpm, None, Some(12.0), 0.8, 0.5, 70.0),
            ("Alcance", BuyingUnit::Cpm, None, Some(8.0), 0.5, 0.3, 70.0),
            ("Tráfego", BuyingUnit::Cpc, Some(1.2), None, 1.5, 2.0, 75.0),
            ("Engajamento", BuyingUnit::Cpm, None, Some(15.0), 1.2, 1.0, 70.0),
            ("Conversão", BuyingUnit::Cpc, Some(2.5), None, 2.0, 4.0, 80.0),
            ("Geração de Leads", BuyingUnit::Cpl, Some(3.0), None, 1.8, 8.0, 80.0),
            ("Visualizações de Vídeo", BuyingUnit::Cpv, None, Some(10.0), 0.6, 0.5, 60.0),
            ("Instalações de App", BuyingUnit::Cpc, Some(1.8), None, 1.2, 10.0, 85.0),
        ];
        for (objective, unit, cpc, cpm, ctr, conversion, connect) in rows {
            catalog.insert(
                objective,
                KpiTemplate {
                    ctr: Some(ctr),
                    cpc,
                    cpm,
                    conversion_rate: Some(conversion),
                    connect_rate: Some(connect),
                    buying_unit: Some(unit),
                },
            );
        }
        catalog
    }

    /// Load a catalog from a TOML, JSON or YAML file whose top-level keys
    /// are objectives. A template using the `CPA` buying unit is rejected.
    ///
    /// The `config` crate lowercases keys, so an entry can carry its
    /// display name in `tipoCampanha`; without one the listed objective is
    /// the lowercased key. Lookup ignores case either way.
    pub fn from_file(path: &str) -> PlannerResult<Self> {
        let raw: HashMap<String, FileTemplate> = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| PlannerError::Template(format!("{path}: {e}")))?;

        let mut catalog = Self::new();
        for (key, entry) in raw {
            let objective = entry
                .objective
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(key);
            catalog.insert(&objective, entry.template);
        }
        info!(path, templates = catalog.len(), "KPI template catalog loaded");
        Ok(catalog)
    }

    pub fn insert(&mut self, objective: &str, template: KpiTemplate) {
        self.entries.insert(
            catalog_key(objective),
            KpiTemplateEntry {
                objective: objective.trim().to_string(),
                template,
            },
        );
    }

    pub fn get(&self, objective: &str) -> Option<&KpiTemplate> {
        self.entries.get(&catalog_key(objective)).map(|e| &e.template)
    }

    pub fn entries(&self) -> impl Iterator<Item = &KpiTemplateEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn catalog_key(objective: &str) -> String {
    fold_accents(objective.trim())
}

/// Build a fully derived campaign from a draft: apply the objective's
/// default metrics underneath the caller's fields, normalize, recalculate.
pub fn calculate_kpis(draft: CampaignDraft, catalog: &KpiTemplateCatalog) -> Campaign {
    let template = draft
        .campaign_type
        .as_deref()
        .and_then(|objective| catalog.get(objective));

    let merged = match template {
        Some(template) => {
            debug!(objective = ?draft.campaign_type, "Applying KPI template");
            template.apply_under(draft)
        }
        None => draft,
    };

    recalculate_campaign_metrics(&merged.into_campaign())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn draft(objective: &str, budget: f64) -> CampaignDraft {
        CampaignDraft {
            campaign_type: Some(objective.to_string()),
            budget: Some(budget),
            ..Default::default()
        }
    }

    #[test]
    fn test_builtin_catalog_lookup_ignores_case_and_accents() {
        let catalog = KpiTemplateCatalog::builtin();
        assert_eq!(catalog.len(), 8);
        let exact = catalog.get("Tráfego").unwrap();
        assert_eq!(catalog.get("trafego"), Some(exact));
        assert_eq!(catalog.get("  TRÁFEGO "), Some(exact));
        assert!(catalog.get("Desconhecido").is_none());
    }

    #[test]
    fn test_builtin_never_uses_cpa() {
        let catalog = KpiTemplateCatalog::builtin();
        for entry in catalog.entries() {
            assert!(entry.template.buying_unit.is_some());
            assert!(entry.template.ctr.unwrap() > 0.0);
        }
    }

    #[test]
    fn test_template_applied_under_draft() {
        let catalog = KpiTemplateCatalog::builtin();
        let campaign = calculate_kpis(draft("Tráfego", 1200.0), &catalog);
        // cpc 1.2, ctr 1.5% from the template
        assert_eq!(campaign.buying_unit, Some(BuyingUnit::Cpc));
        assert_eq!(campaign.clicks, 1000);
        assert_eq!(campaign.impressions, 66_667);
        assert_eq!(campaign.conversions, 20);
        assert_eq!(campaign.visits, 750);
        assert!((campaign.cpa - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_caller_fields_win_over_template() {
        let catalog = KpiTemplateCatalog::builtin();
        let mut input = draft("Tráfego", 1000.0);
        input.cpc = Some(2.0);
        input.ctr = Some(2.0);
        input.conversion_rate = Some(0.0);
        let campaign = calculate_kpis(input, &catalog);
        assert_eq!(campaign.clicks, 500);
        assert_eq!(campaign.impressions, 25_000);
        assert_eq!(campaign.conversion_rate, 0.0);
        assert_eq!(campaign.conversions, 0);
        // connect rate still comes from the template
        assert_eq!(campaign.connect_rate, 75.0);
    }

    #[test]
    fn test_caller_buying_unit_wins() {
        let catalog = KpiTemplateCatalog::builtin();
        let mut input = draft("Tráfego", 1000.0);
        input.buying_unit = Some("CPM".into());
        input.cpm = Some(20.0);
        let campaign = calculate_kpis(input, &catalog);
        assert_eq!(campaign.buying_unit, Some(BuyingUnit::Cpm));
        assert_eq!(campaign.impressions, 50_000);
    }

    #[test]
    fn test_blank_buying_unit_takes_template() {
        let catalog = KpiTemplateCatalog::builtin();
        let mut input = draft("Alcance", 800.0);
        input.buying_unit = Some(" ".into());
        let campaign = calculate_kpis(input, &catalog);
        assert_eq!(campaign.buying_unit, Some(BuyingUnit::Cpm));
        assert_eq!(campaign.impressions, 100_000);
    }

    #[test]
    fn test_unknown_objective_delegates_as_is() {
        let catalog = KpiTemplateCatalog::builtin();
        let mut input = draft("Outro", 1000.0);
        input.cpm = Some(20.0);
        input.ctr = Some(2.0);
        input.buying_unit = Some("CPM".into());
        let campaign = calculate_kpis(input, &catalog);
        assert_eq!(campaign.impressions, 50_000);
        assert_eq!(campaign.clicks, 1_000);
        assert_eq!(campaign.connect_rate, 0.0);
    }

    #[test]
    fn test_no_objective_and_empty_catalog() {
        let catalog = KpiTemplateCatalog::new();
        assert!(catalog.is_empty());
        let campaign = calculate_kpis(CampaignDraft::default(), &catalog);
        assert_eq!(campaign, recalculate_campaign_metrics(&Campaign::default()));
    }

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_catalog_from_json_file() {
        let path = write_temp(
            "templates.json",
            r#"{
                "Awareness": {"cpm": 9.5, "ctr": 0.4, "unidadeCompra": "CPM"},
                "Search": {"cpc": 1.1, "ctr": 3.0, "taxaConversao": 5, "unidadeCompra": "cpc"}
            }"#,
        );
        let catalog = KpiTemplateCatalog::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(catalog.len(), 2);
        let search = catalog.get("search").unwrap();
        assert_eq!(search.buying_unit, Some(BuyingUnit::Cpc));
        assert_eq!(search.conversion_rate, Some(5.0));
        // Keys come back lowercased from the config crate.
        let names: Vec<&str> = catalog.entries().map(|e| e.objective.as_str()).collect();
        assert_eq!(names, vec!["awareness", "search"]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_catalog_file_keeps_display_name() {
        let path = write_temp(
            "templates-named.json",
            r#"{
                "leads": {"tipoCampanha": "Geração de Leads", "cpc": 3.0, "ctr": 1.8, "unidadeCompra": "CPL"}
            }"#,
        );
        let catalog = KpiTemplateCatalog::from_file(path.to_str().unwrap()).unwrap();
        let entry = catalog.entries().next().unwrap();
        assert_eq!(entry.objective, "Geração de Leads");
        assert_eq!(entry.template.buying_unit, Some(BuyingUnit::Cpl));
        assert!(catalog.get("geracao de leads").is_some());

        let listed = serde_json::to_value(entry).unwrap();
        assert_eq!(listed["tipoCampanha"], "Geração de Leads");
        assert_eq!(listed["cpc"], 3.0);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_catalog_rejects_cpa_template() {
        let path = write_temp(
            "templates-cpa.json",
            r#"{"Leads": {"cpc": 3.0, "ctr": 1.0, "unidadeCompra": "CPA"}}"#,
        );
        let result = KpiTemplateCatalog::from_file(path.to_str().unwrap());
        assert!(matches!(result, Err(PlannerError::Template(_))));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_catalog_missing_file() {
        let result = KpiTemplateCatalog::from_file("/nonexistent/templates.toml");
        assert!(matches!(result, Err(PlannerError::Template(_))));
    }
}

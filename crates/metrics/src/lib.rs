//! Campaign metrics engine: derives missing advertising metrics from a
//! campaign's driving fields, applies objective defaults, and aggregates
//! campaigns into plan and month summaries.
//!
//! The engine functions are pure and synchronous. Only template catalog
//! loading touches the filesystem.

pub mod derivation;
pub mod kpi;
pub mod rate;
pub mod summary;

pub use derivation::{
    derive_campaign_metrics, recalculate_campaign_metrics, Derivation, DerivationPath,
    DAYS_PER_MONTH,
};
pub use kpi::{calculate_kpis, KpiTemplate, KpiTemplateCatalog, KpiTemplateEntry};
pub use rate::Rate;
pub use summary::{
    calculate_plan_summary, summarize_campaigns, summarize_plan, MetricsSummary, PlanSummary,
    UNASSIGNED_CHANNEL,
};

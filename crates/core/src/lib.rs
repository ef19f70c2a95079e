//! Shared data model, boundary validation, errors and configuration for the
//! media planner.

pub mod config;
pub mod error;
pub mod month;
pub mod plan;
pub mod types;
pub mod validation;

pub use config::AppConfig;
pub use error::{PlannerError, PlannerResult};
pub use month::MonthKey;
pub use plan::{MediaPlan, MonthlyCampaigns, PlanDraft, PlanSnapshot, RawPlanSnapshot};
pub use types::{BuyingUnit, Campaign, CampaignDraft};
pub use validation::ValidationError;

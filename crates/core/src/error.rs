use thiserror::Error;

use crate::validation::ValidationError;

pub type PlannerResult<T> = Result<T, PlannerError>;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Plan not found: {0}")]
    PlanNotFound(uuid::Uuid),

    #[error("Month {month} not found in plan {plan_id}")]
    MonthNotFound { plan_id: uuid::Uuid, month: String },

    #[error("Campaign {index} not found in month {month}")]
    CampaignNotFound { month: String, index: usize },

    #[error("Template catalog error: {0}")]
    Template(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for PlannerError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

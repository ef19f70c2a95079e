//! Boundary validation for campaign input.
//!
//! The metrics engine itself never fails: it coerces anything unusable to
//! zero. Callers that accept data from the outside world (REST handlers, the
//! CLI, AI-generated drafts) run these checks first so bad input is rejected
//! with a precise reason instead of silently becoming zero.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("field '{field}' is not a finite number")]
    NotFinite { field: &'static str },

    #[error("field '{field}' must be non-negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("field '{field}' is a percentage and must be within 0-100 (got {value})")]
    PercentageOutOfRange { field: &'static str, value: f64 },

    #[error("unknown buying unit '{0}' (expected CPM, CPC, CPV or CPL)")]
    UnknownBuyingUnit(String),

    #[error("buying unit 'CPA' is not supported; use CPL for lead-priced campaigns")]
    LegacyBuyingUnit,

    #[error("invalid month key '{0}' (expected '<year>-<MonthName>', e.g. '2025-Janeiro')")]
    InvalidMonthKey(String),

    #[error("month '{0}' appears more than once")]
    DuplicateMonth(String),

    #[error("campaign {index} in month '{month}': {source}")]
    InCampaign {
        month: String,
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attach the campaign's position inside a plan to the error.
    pub fn in_campaign(self, month: impl Into<String>, index: usize) -> Self {
        Self::InCampaign {
            month: month.into(),
            index,
            source: Box::new(self),
        }
    }
}

/// Check a monetary or count field.
pub fn check_amount(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        None => Ok(()),
        Some(v) if !v.is_finite() => Err(ValidationError::NotFinite { field }),
        Some(v) if v < 0.0 => Err(ValidationError::Negative { field, value: v }),
        Some(_) => Ok(()),
    }
}

/// Check a field stored in 0-100 percentage form.
pub fn check_percentage(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    check_amount(field, value)?;
    match value {
        Some(v) if v > 100.0 => Err(ValidationError::PercentageOutOfRange { field, value: v }),
        _ => Ok(()),
    }
}

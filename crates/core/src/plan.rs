use crate::month::MonthKey;
use crate::types::{Campaign, CampaignDraft};
use crate::validation::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Campaigns of a plan, bucketed by month in calendar order.
pub type MonthlyCampaigns = BTreeMap<MonthKey, Vec<Campaign>>;

/// A media plan: a client's campaigns partitioned by month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPlan {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default)]
    pub months: MonthlyCampaigns,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaPlan {
    pub fn new(name: impl Into<String>, client: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            client,
            months: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn campaign_count(&self) -> usize {
        self.months.values().map(Vec::len).sum()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Plan input: raw month keys mapped to campaign drafts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanDraft {
    #[serde(default, rename = "nome", alias = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "cliente", alias = "client", skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default)]
    pub months: BTreeMap<String, Vec<CampaignDraft>>,
}

impl PlanDraft {
    /// Parse the month keys only, leaving the drafts unchecked.
    pub fn parse_months(&self) -> Result<BTreeMap<MonthKey, &[CampaignDraft]>, ValidationError> {
        parse_month_keys(
            self.months
                .iter()
                .map(|(raw_key, drafts)| (raw_key, drafts.as_slice())),
        )
    }

    /// Parse month keys and validate every draft, reporting the first
    /// problem with its month and position.
    pub fn validate(&self) -> Result<BTreeMap<MonthKey, &[CampaignDraft]>, ValidationError> {
        for (raw_key, drafts) in &self.months {
            for (index, draft) in drafts.iter().enumerate() {
                draft
                    .validate()
                    .map_err(|e| e.in_campaign(raw_key.clone(), index))?;
            }
        }
        self.parse_months()
    }
}

/// Parse raw month keys, rejecting any two that name the same month.
fn parse_month_keys<K, V, I>(entries: I) -> Result<BTreeMap<MonthKey, V>, ValidationError>
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, V)>,
{
    let mut parsed = BTreeMap::new();
    for (raw_key, value) in entries {
        let key: MonthKey = raw_key.as_ref().parse()?;
        if parsed.insert(key, value).is_some() {
            return Err(ValidationError::DuplicateMonth(key.to_string()));
        }
    }
    Ok(parsed)
}

/// Already-derived campaigns bucketed by month, as read back from a saved
/// plan or sent by a dashboard for summarizing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawPlanSnapshot")]
pub struct PlanSnapshot {
    #[serde(default)]
    pub months: MonthlyCampaigns,
}

/// A snapshot with its month keys still unparsed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlanSnapshot {
    #[serde(default)]
    pub months: BTreeMap<String, Vec<Campaign>>,
}

impl TryFrom<RawPlanSnapshot> for PlanSnapshot {
    type Error = ValidationError;

    fn try_from(raw: RawPlanSnapshot) -> Result<Self, Self::Error> {
        Ok(Self {
            months: parse_month_keys(raw.months)?,
        })
    }
}

use crate::validation::{check_amount, check_percentage, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Pricing model the advertiser is billed under. Decides which rate is
/// authoritative when metrics are derived from a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum BuyingUnit {
    /// Cost per thousand impressions.
    Cpm,
    /// Cost per click.
    Cpc,
    /// Cost per view.
    Cpv,
    /// Cost per lead.
    Cpl,
}

impl BuyingUnit {
    pub const ALL: [BuyingUnit; 4] = [Self::Cpm, Self::Cpc, Self::Cpv, Self::Cpl];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpm => "CPM",
            Self::Cpc => "CPC",
            Self::Cpv => "CPV",
            Self::Cpl => "CPL",
        }
    }
}

impl fmt::Display for BuyingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuyingUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CPM" => Ok(Self::Cpm),
            "CPC" => Ok(Self::Cpc),
            "CPV" => Ok(Self::Cpv),
            "CPL" => Ok(Self::Cpl),
            "CPA" => Err(ValidationError::LegacyBuyingUnit),
            _ => Err(ValidationError::UnknownBuyingUnit(s.to_string())),
        }
    }
}

impl TryFrom<String> for BuyingUnit {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A fully-populated advertising campaign, as produced by the metrics engine.
///
/// Percentages (`ctr`, `conversion_rate`, `connect_rate`) are kept in 0-100
/// form. Counts are whole numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "canal", skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(rename = "formato", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "tipoCampanha", skip_serializing_if = "Option::is_none")]
    pub campaign_type: Option<String>,
    #[serde(rename = "unidadeCompra", skip_serializing_if = "Option::is_none")]
    pub buying_unit: Option<BuyingUnit>,
    pub budget: f64,
    #[serde(rename = "impressoes")]
    pub impressions: u64,
    #[serde(rename = "cliques")]
    pub clicks: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    #[serde(rename = "taxaConversao")]
    pub conversion_rate: f64,
    #[serde(rename = "connectRate")]
    pub connect_rate: f64,
    #[serde(rename = "conversoes")]
    pub conversions: u64,
    #[serde(rename = "visitas")]
    pub visits: u64,
    pub cpa: f64,
    #[serde(rename = "orcamentoDiario")]
    pub daily_budget: f64,
    #[serde(rename = "alcance", skip_serializing_if = "Option::is_none")]
    pub reach: Option<u64>,
}

impl Campaign {
    /// Channel bucket used by aggregations; blank channels count as unassigned.
    pub fn channel_or<'a>(&'a self, unassigned: &'a str) -> &'a str {
        match self.channel.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => unassigned,
        }
    }

    /// Overlay the fields present in `edit` onto this campaign. Derived
    /// fields are left alone; the caller recalculates afterwards.
    pub fn apply_edit(&mut self, edit: &CampaignDraft) {
        if let Some(id) = &edit.id {
            self.id = Some(id.clone());
        }
        if let Some(name) = &edit.name {
            self.name = name.clone();
        }
        if edit.channel.is_some() {
            self.channel = edit.channel.clone();
        }
        if edit.format.is_some() {
            self.format = edit.format.clone();
        }
        if edit.campaign_type.is_some() {
            self.campaign_type = edit.campaign_type.clone();
        }
        if let Some(raw) = &edit.buying_unit {
            self.buying_unit = parse_buying_unit_lenient(raw);
        }
        if edit.budget.is_some() {
            self.budget = coerce_amount(edit.budget);
        }
        if edit.impressions.is_some() {
            self.impressions = coerce_count(edit.impressions);
        }
        if edit.clicks.is_some() {
            self.clicks = coerce_count(edit.clicks);
        }
        if edit.ctr.is_some() {
            self.ctr = coerce_amount(edit.ctr);
        }
        if edit.cpc.is_some() {
            self.cpc = coerce_amount(edit.cpc);
        }
        if edit.cpm.is_some() {
            self.cpm = coerce_amount(edit.cpm);
        }
        if edit.conversion_rate.is_some() {
            self.conversion_rate = coerce_amount(edit.conversion_rate);
        }
        if edit.connect_rate.is_some() {
            self.connect_rate = coerce_amount(edit.connect_rate);
        }
        if edit.reach.is_some() {
            self.reach = Some(coerce_count(edit.reach));
        }
    }
}

/// Campaign input as it arrives from an editor form, a JSON file, or an
/// AI-generated plan draft. Every field may be absent.
///
/// Numeric fields accept JSON numbers, numeric strings (`"12.5"`, `"2,5"`),
/// `null` and `""`. A string that is not a number is kept as NaN so that
/// [`CampaignDraft::validate`] can report it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "canal", skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(rename = "formato", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "tipoCampanha", skip_serializing_if = "Option::is_none")]
    pub campaign_type: Option<String>,
    #[serde(rename = "unidadeCompra", skip_serializing_if = "Option::is_none")]
    pub buying_unit: Option<String>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(rename = "impressoes", deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub impressions: Option<f64>,
    #[serde(rename = "cliques", deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub clicks: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub ctr: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub cpc: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    #[serde(rename = "taxaConversao", deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub conversion_rate: Option<f64>,
    #[serde(rename = "connectRate", deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub connect_rate: Option<f64>,
    #[serde(rename = "alcance", deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub reach: Option<f64>,
}

impl CampaignDraft {
    /// Strict boundary checks. Absent fields are always accepted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_amount("budget", self.budget)?;
        check_amount("impressoes", self.impressions)?;
        check_amount("cliques", self.clicks)?;
        check_amount("cpc", self.cpc)?;
        check_amount("cpm", self.cpm)?;
        check_amount("alcance", self.reach)?;
        check_percentage("ctr", self.ctr)?;
        check_percentage("taxaConversao", self.conversion_rate)?;
        check_percentage("connectRate", self.connect_rate)?;
        if let Some(raw) = self.buying_unit.as_deref() {
            if !raw.trim().is_empty() {
                raw.parse::<BuyingUnit>()?;
            }
        }
        Ok(())
    }

    /// Apply explicit defaults: absent, non-finite and negative numbers
    /// become zero, counts are rounded, and a buying-unit tag that does not
    /// parse is dropped so derivation falls back to whichever rate is set.
    pub fn into_campaign(self) -> Campaign {
        Campaign {
            id: self.id,
            name: self.name.unwrap_or_default(),
            channel: self.channel,
            format: self.format,
            campaign_type: self.campaign_type,
            buying_unit: self.buying_unit.as_deref().and_then(parse_buying_unit_lenient),
            budget: coerce_amount(self.budget),
            impressions: coerce_count(self.impressions),
            clicks: coerce_count(self.clicks),
            ctr: coerce_amount(self.ctr),
            cpc: coerce_amount(self.cpc),
            cpm: coerce_amount(self.cpm),
            conversion_rate: coerce_amount(self.conversion_rate),
            connect_rate: coerce_amount(self.connect_rate),
            reach: self.reach.map(|r| coerce_count(Some(r))),
            ..Campaign::default()
        }
    }
}

impl From<&Campaign> for CampaignDraft {
    /// The driving fields of an existing campaign. Derived outputs are left
    /// out so re-running the engine starts from the same inputs.
    fn from(c: &Campaign) -> Self {
        Self {
            id: c.id.clone(),
            name: Some(c.name.clone()),
            channel: c.channel.clone(),
            format: c.format.clone(),
            campaign_type: c.campaign_type.clone(),
            buying_unit: c.buying_unit.map(|u| u.as_str().to_string()),
            budget: Some(c.budget),
            impressions: Some(c.impressions as f64),
            clicks: Some(c.clicks as f64),
            ctr: Some(c.ctr),
            cpc: Some(c.cpc),
            cpm: Some(c.cpm),
            conversion_rate: Some(c.conversion_rate),
            connect_rate: Some(c.connect_rate),
            reach: c.reach.map(|r| r as f64),
        }
    }
}

fn parse_buying_unit_lenient(raw: &str) -> Option<BuyingUnit> {
    if raw.trim().is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(unit) => Some(unit),
        Err(e) => {
            debug!(buying_unit = raw, error = %e, "Ignoring unusable buying unit");
            None
        }
    }
}

/// Zero for anything that is absent, non-finite or negative.
pub fn coerce_amount(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn coerce_count(value: Option<f64>) -> u64 {
    coerce_amount(value).round() as u64
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<NumberOrText> = Option::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
                    trimmed.replace(',', ".")
                } else {
                    trimmed.to_string()
                };
                Some(normalized.parse::<f64>().unwrap_or(f64::NAN))
            }
        }
    })
}

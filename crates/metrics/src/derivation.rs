//! Campaign metric derivation: fills in impressions, clicks, funnel counts
//! and costs from whatever subset of driving fields a campaign carries.

use crate::rate::{finite_or_zero, safe_div, sanitize, Rate};
use planner_core::types::{BuyingUnit, Campaign};
use serde::Serialize;
use tracing::debug;

/// Average number of days in a month, used for daily budgets.
pub const DAYS_PER_MONTH: f64 = 30.4;

/// Which derivation chain produced a campaign's numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationPath {
    /// Impressions from budget and CPM, then clicks from impressions x CTR.
    BudgetViaCpm,
    /// Clicks from budget and CPC, then impressions from clicks / CTR.
    BudgetViaCpc,
    /// A budget with neither CPM nor CPC to price it.
    BudgetOnly,
    /// No budget; clicks and budget derived from given impressions.
    FromImpressions,
    /// No budget or impressions; derived from given clicks.
    FromClicks,
    /// Nothing to derive from.
    Empty,
}

/// A recalculated campaign together with the chain that was applied.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub campaign: Campaign,
    pub path: DerivationPath,
}

/// Unrounded working values, rates as fractions.
#[derive(Debug, Clone, Copy)]
struct Working {
    budget: f64,
    impressions: f64,
    clicks: f64,
    ctr: Rate,
    cpc: f64,
    cpm: f64,
    conversion: Rate,
    connect: Rate,
}

impl Working {
    fn from_campaign(c: &Campaign) -> Self {
        Self {
            budget: sanitize(c.budget),
            impressions: c.impressions as f64,
            clicks: c.clicks as f64,
            ctr: Rate::from_percent(c.ctr),
            cpc: sanitize(c.cpc),
            cpm: sanitize(c.cpm),
            conversion: Rate::from_percent(c.conversion_rate),
            connect: Rate::from_percent(c.connect_rate),
        }
    }

    /// Fill whichever of CPC/CPM is missing from the other one via CTR.
    fn cross_derive_rates(&mut self) {
        if !self.ctr.is_positive() {
            return;
        }
        if self.cpc > 0.0 && self.cpm <= 0.0 {
            self.cpm = self.cpc * self.ctr.fraction() * 1000.0;
        } else if self.cpm > 0.0 && self.cpc <= 0.0 {
            self.cpc = safe_div(self.cpm, self.ctr.fraction() * 1000.0);
        }
    }

    fn priced_by(&self, unit: Option<BuyingUnit>) -> Option<BuyingUnit> {
        match unit {
            Some(BuyingUnit::Cpm) if self.cpm > 0.0 => Some(BuyingUnit::Cpm),
            Some(BuyingUnit::Cpc) if self.cpc > 0.0 => Some(BuyingUnit::Cpc),
            _ if self.cpm > 0.0 => Some(BuyingUnit::Cpm),
            _ if self.cpc > 0.0 => Some(BuyingUnit::Cpc),
            _ => None,
        }
    }

    fn budget_via_cpm(&mut self) {
        self.impressions = safe_div(self.budget, self.cpm) * 1000.0;
        self.clicks = self.ctr.of(self.impressions);
        if self.clicks > 0.0 {
            self.cpc = safe_div(self.budget, self.clicks);
        }
    }

    fn budget_via_cpc(&mut self) {
        self.clicks = safe_div(self.budget, self.cpc);
        if self.ctr.is_positive() {
            self.impressions = safe_div(self.clicks, self.ctr.fraction());
            self.cpm = safe_div(self.budget, self.impressions) * 1000.0;
        }
    }

    fn from_impressions(&mut self) {
        self.clicks = self.ctr.of(self.impressions);
        if self.cpm > 0.0 {
            self.budget = self.impressions / 1000.0 * self.cpm;
        } else if self.cpc > 0.0 {
            self.budget = self.clicks * self.cpc;
        }
    }

    fn from_clicks(&mut self) {
        let derived_impressions = self.ctr.is_positive();
        if derived_impressions {
            self.impressions = safe_div(self.clicks, self.ctr.fraction());
        }
        if self.cpc > 0.0 {
            self.budget = self.clicks * self.cpc;
        } else if self.cpm > 0.0 && derived_impressions {
            self.budget = self.impressions / 1000.0 * self.cpm;
        }
    }

    fn primary(&mut self, unit: Option<BuyingUnit>) -> DerivationPath {
        if self.budget > 0.0 {
            match self.priced_by(unit) {
                Some(BuyingUnit::Cpm) => {
                    self.budget_via_cpm();
                    DerivationPath::BudgetViaCpm
                }
                Some(_) => {
                    self.budget_via_cpc();
                    DerivationPath::BudgetViaCpc
                }
                None => DerivationPath::BudgetOnly,
            }
        } else if self.impressions > 0.0 {
            self.from_impressions();
            DerivationPath::FromImpressions
        } else if self.clicks > 0.0 {
            self.from_clicks();
            DerivationPath::FromClicks
        } else {
            DerivationPath::Empty
        }
    }
}

/// Recalculate every derived field of `input`, reporting the chain used.
pub fn derive_campaign_metrics(input: &Campaign) -> Derivation {
    let mut w = Working::from_campaign(input);
    w.cross_derive_rates();
    let path = w.primary(input.buying_unit);

    let conversions = w.conversion.of(w.clicks);
    let visits = w.connect.of(w.clicks);
    let cpa = if conversions > 0.0 {
        safe_div(w.budget, conversions)
    } else {
        0.0
    };

    let campaign = Campaign {
        budget: finite_or_zero(w.budget),
        impressions: to_count(w.impressions),
        clicks: to_count(w.clicks),
        ctr: percent_output(w.ctr, input.ctr),
        cpc: finite_or_zero(w.cpc),
        cpm: finite_or_zero(w.cpm),
        conversion_rate: percent_output(w.conversion, input.conversion_rate),
        connect_rate: percent_output(w.connect, input.connect_rate),
        conversions: to_count(conversions),
        visits: to_count(visits),
        cpa,
        daily_budget: safe_div(w.budget, DAYS_PER_MONTH),
        ..input.clone()
    };

    debug!(
        path = ?path,
        budget = campaign.budget,
        impressions = campaign.impressions,
        clicks = campaign.clicks,
        "Campaign metrics recalculated"
    );

    Derivation { campaign, path }
}

/// Recalculate every derived field of a campaign.
///
/// Never fails: non-finite or negative inputs count as zero and every
/// division by zero yields zero.
pub fn recalculate_campaign_metrics(input: &Campaign) -> Campaign {
    derive_campaign_metrics(input).campaign
}

fn to_count(value: f64) -> u64 {
    sanitize(value).round() as u64
}

/// The caller's own percentage when it was usable, so the value is not
/// disturbed by a divide/multiply round trip.
fn percent_output(rate: Rate, original: f64) -> f64 {
    if sanitize(original) == original {
        original
    } else {
        rate.as_percent()
    }
}

//! Month keys that partition a media plan, e.g. `"2025-Janeiro"`.

use crate::validation::ValidationError;
use chrono::Month;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PT_MONTHS: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// A `"<year>-<MonthName>"` plan bucket. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: Month,
}

impl MonthKey {
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    /// Portuguese month name used in the canonical key form.
    pub fn month_name(&self) -> &'static str {
        PT_MONTHS[self.month.number_from_month() as usize - 1]
    }
}

impl Ord for MonthKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.year, self.month.number_from_month())
            .cmp(&(other.year, other.month.number_from_month()))
    }
}

impl PartialOrd for MonthKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{}", self.year, self.month_name())
    }
}

impl FromStr for MonthKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidMonthKey(s.to_string());
        let (year, name) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month = parse_month_name(name).ok_or_else(invalid)?;
        Ok(Self { year, month })
    }
}

impl TryFrom<String> for MonthKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// Portuguese (accents optional) or English month name, any case.
fn parse_month_name(name: &str) -> Option<Month> {
    let folded = fold_accents(name.trim());
    if let Some(idx) = PT_MONTHS
        .iter()
        .position(|pt| fold_accents(pt) == folded)
    {
        return Month::try_from(idx as u8 + 1).ok();
    }
    folded.parse::<Month>().ok()
}

/// Lowercase and strip the Portuguese diacritics that appear in month and
/// objective names.
pub fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'Á' | 'À' | 'Â' | 'Ã' => 'a',
            'é' | 'ê' | 'É' | 'Ê' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' | 'Õ' => 'o',
            'ú' | 'ü' | 'Ú' | 'Ü' => 'u',
            'ç' | 'Ç' => 'c',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

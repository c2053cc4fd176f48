//! Calendar month vocabulary used by month records.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One of the twelve calendar months, serialized with its stored label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MonthLabel {
    #[serde(rename = "Janeiro")]
    January,
    #[serde(rename = "Fevereiro")]
    February,
    #[serde(rename = "Março")]
    March,
    #[serde(rename = "Abril")]
    April,
    #[serde(rename = "Maio")]
    May,
    #[serde(rename = "Junho")]
    June,
    #[serde(rename = "Julho")]
    July,
    #[serde(rename = "Agosto")]
    August,
    #[serde(rename = "Setembro")]
    September,
    #[serde(rename = "Outubro")]
    October,
    #[serde(rename = "Novembro")]
    November,
    #[serde(rename = "Dezembro")]
    December,
}

impl MonthLabel {
    pub const ALL: [MonthLabel; 12] = [
        MonthLabel::January,
        MonthLabel::February,
        MonthLabel::March,
        MonthLabel::April,
        MonthLabel::May,
        MonthLabel::June,
        MonthLabel::July,
        MonthLabel::August,
        MonthLabel::September,
        MonthLabel::October,
        MonthLabel::November,
        MonthLabel::December,
    ];

    /// Calendar number, 1 for January through 12 for December.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_number(number: u32) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index as usize))
            .copied()
    }

    /// Label as stored in the ledger record.
    pub fn label(self) -> &'static str {
        match self {
            MonthLabel::January => "Janeiro",
            MonthLabel::February => "Fevereiro",
            MonthLabel::March => "Março",
            MonthLabel::April => "Abril",
            MonthLabel::May => "Maio",
            MonthLabel::June => "Junho",
            MonthLabel::July => "Julho",
            MonthLabel::August => "Agosto",
            MonthLabel::September => "Setembro",
            MonthLabel::October => "Outubro",
            MonthLabel::November => "Novembro",
            MonthLabel::December => "Dezembro",
        }
    }

    fn english(self) -> &'static str {
        match self {
            MonthLabel::January => "january",
            MonthLabel::February => "february",
            MonthLabel::March => "march",
            MonthLabel::April => "april",
            MonthLabel::May => "may",
            MonthLabel::June => "june",
            MonthLabel::July => "july",
            MonthLabel::August => "august",
            MonthLabel::September => "september",
            MonthLabel::October => "october",
            MonthLabel::November => "november",
            MonthLabel::December => "december",
        }
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the stored label, the English name (both case-insensitive) or `1`-`12`.
impl FromStr for MonthLabel {
    type Err = UnknownMonth;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(number) = trimmed.parse::<u32>() {
            return Self::from_number(number).ok_or_else(|| UnknownMonth(trimmed.to_string()));
        }
        let lowered = trimmed.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|month| month.label().to_lowercase() == lowered || month.english() == lowered)
            .ok_or_else(|| UnknownMonth(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMonth(pub String);

impl fmt::Display for UnknownMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown month `{}`", self.0)
    }
}

impl std::error::Error for UnknownMonth {}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BillingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Canonical storage key, e.g. "March".
    pub fn name(&self) -> &'static str {
        match self {
            Self::January => "January",
            Self::February => "February",
            Self::March => "March",
            Self::April => "April",
            Self::May => "May",
            Self::June => "June",
            Self::July => "July",
            Self::August => "August",
            Self::September => "September",
            Self::October => "October",
            Self::November => "November",
            Self::December => "December",
        }
    }

    pub fn short(&self) -> &'static str {
        &self.name()[..3]
    }

    /// 1-based calendar number.
    pub fn number(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn from_number(n: u32) -> Option<Month> {
        Self::ALL.get(n.checked_sub(1)? as usize).copied()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts full names, three-letter abbreviations and 1-12, case-insensitive.
impl FromStr for Month {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(BillingError::validation("Month is required"));
        }
        if let Ok(n) = raw.parse::<u32>() {
            return Month::from_number(n)
                .ok_or_else(|| BillingError::validation(format!("Unknown month: {raw}")));
        }
        let lower = raw.to_lowercase();
        Month::ALL
            .iter()
            .find(|m| {
                let name = m.name().to_lowercase();
                name == lower || (lower.len() == 3 && name.starts_with(&lower))
            })
            .copied()
            .ok_or_else(|| BillingError::validation(format!("Unknown month: {raw}")))
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a comma-separated month list such as "jan,mar,12".
pub fn parse_month_list(raw: &str) -> Result<Vec<Month>, BillingError> {
    let mut months = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let m: Month = part.parse()?;
        if !months.contains(&m) {
            months.push(m);
        }
    }
    Ok(months)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_calendar_order() {
        let numbers: Vec<u32> = Month::ALL.iter().map(|m| m.number()).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
        assert_eq!(Month::ALL[0].name(), "January");
        assert_eq!(Month::ALL[11].name(), "December");
    }

    #[test]
    fn test_parse_accepts_names_abbreviations_and_numbers() {
        assert_eq!("March".parse::<Month>().unwrap(), Month::March);
        assert_eq!("march".parse::<Month>().unwrap(), Month::March);
        assert_eq!(" SEP ".parse::<Month>().unwrap(), Month::September);
        assert_eq!("12".parse::<Month>().unwrap(), Month::December);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("Marhc".parse::<Month>().is_err());
        assert!("13".parse::<Month>().is_err());
        assert!("0".parse::<Month>().is_err());
        assert!("ma".parse::<Month>().is_err());
        let err = "".parse::<Month>().unwrap_err().to_string();
        assert_eq!(err, "Month is required");
    }


    #[test]
    fn test_serializes_as_canonical_name() {
        let json = serde_json::to_string(&Month::October).unwrap();
        assert_eq!(json, "\"October\"");
        let back: Month = serde_json::from_str("\"oct\"").unwrap();
        assert_eq!(back, Month::October);
    }

    #[test]
    fn test_parse_month_list_dedupes() {
        let months = parse_month_list("jan, March,1,,dec").unwrap();
        assert_eq!(months, vec![Month::January, Month::March, Month::December]);
        assert!(parse_month_list("jan,foo").is_err());
        assert!(parse_month_list("").unwrap().is_empty());
    }
}

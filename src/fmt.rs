use chrono::{DateTime, Datelike, NaiveDate};

use crate::month::Month;

/// Format an amount with thousands separators: $1,234.56
pub fn money(val: f64, symbol: &str) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{symbol}{with_commas}.{dec_part}")
    } else {
        format!("{symbol}{with_commas}.{dec_part}")
    }
}

/// "2 / March / 2025" for an RFC 3339 timestamp or a plain date. Unparseable
/// input is returned unchanged.
pub fn payment_date(raw: &str) -> String {
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d"));
    match date {
        Ok(d) => {
            let month = Month::from_number(d.month()).map(|m| m.name()).unwrap_or("?");
            format!("{} / {} / {}", d.day(), month, d.year())
        }
        Err(_) => raw.to_string(),
    }
}

pub fn paid_mark(is_paid: bool) -> &'static str {
    if is_paid {
        "\u{2714}"
    } else {
        "\u{2718}"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56, "$"), "$1,234.56");
        assert_eq!(money(-500.00, "$"), "-$500.00");
        assert_eq!(money(0.0, "$"), "$0.00");
        assert_eq!(money(1000000.99, "$"), "$1,000,000.99");
        assert_eq!(money(42.10, "\u{20b9}"), "\u{20b9}42.10");
    }

    #[test]
    fn test_payment_date() {
        assert_eq!(payment_date("2025-03-02T10:15:00.000Z"), "2 / March / 2025");
        assert_eq!(payment_date("2024-12-31"), "31 / December / 2024");
        assert_eq!(payment_date("2024-12-31T08:00:00"), "31 / December / 2024");
        assert_eq!(payment_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_paid_mark() {
        assert_eq!(paid_mark(true), "\u{2714}");
        assert_eq!(paid_mark(false), "\u{2718}");
    }
}

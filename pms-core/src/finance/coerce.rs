//! Lenient conversion of user-entered values.
//!
//! Form fields arrive as JSON numbers, numeric strings, empty strings or
//! `null`. Anything that does not parse as a number counts as zero rather
//! than failing the request.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses a textual amount, falling back to zero.
pub fn coerce_decimal(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

fn value_to_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => coerce_decimal(&n.to_string()),
        Value::String(s) => coerce_decimal(s),
        _ => Decimal::ZERO,
    }
}

/// `deserialize_with` helper for amount fields.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(value_to_decimal).unwrap_or(Decimal::ZERO))
}

/// `deserialize_with` helper for optional percentages.
///
/// Missing and `null` stay `None` so the caller can keep its current split;
/// present but unparsable values become zero. Fractions round to the nearest
/// whole percent.
pub fn lenient_percent<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| {
        crate::finance::round_whole(value_to_decimal(&v))
            .to_i64()
            .unwrap_or(0)
    }))
}

/// `deserialize_with` helper for optional dates; blank strings mean "no date".
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "lenient_decimal")]
        amount: Decimal,
        #[serde(default, deserialize_with = "lenient_percent")]
        split: Option<i64>,
        #[serde(default, deserialize_with = "lenient_date")]
        date: Option<NaiveDate>,
    }

    #[test]
    fn test_coerce_decimal() {
        assert_eq!(coerce_decimal("1200"), Decimal::from(1200));
        assert_eq!(coerce_decimal(" 12.5 "), Decimal::new(125, 1));
        assert_eq!(coerce_decimal("1e3"), Decimal::from(1000));
        assert_eq!(coerce_decimal(""), Decimal::ZERO);
        assert_eq!(coerce_decimal("twelve"), Decimal::ZERO);
    }

    #[test]
    fn test_lenient_fields() {
        let form: Form =
            serde_json::from_str(r#"{"amount":"abc","split":"45","date":""}"#).unwrap();
        assert_eq!(form.amount, Decimal::ZERO);
        assert_eq!(form.split, Some(45));
        assert_eq!(form.date, None);

        let form: Form = serde_json::from_str(r#"{"amount":2500.5,"date":"2025-03-01"}"#).unwrap();
        assert_eq!(form.amount, Decimal::new(25005, 1));
        assert_eq!(form.split, None);
        assert_eq!(form.date, NaiveDate::from_ymd_opt(2025, 3, 1));

        let form: Form = serde_json::from_str(r#"{"amount":null,"split":null}"#).unwrap();
        assert_eq!(form.amount, Decimal::ZERO);
        assert_eq!(form.split, None);
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::model::DEFAULT_CURRENCY;
use crate::{CoreError, CoreResult};

/// Coerces a provider date field to a canonical UTC date. Accepts UNIX epoch
/// seconds (JSON number), `YYYY-MM-DD` strings, and RFC 3339 timestamps.
pub fn date_field(value: Option<&Value>, field: &str, record_id: &str) -> CoreResult<NaiveDate> {
    let Some(raw) = value else {
        return Err(CoreError::validation_error(
            field,
            record_id,
            "date must be present",
        ));
    };

    match raw {
        Value::Number(number) => {
            let Some(seconds) = number.as_i64() else {
                return Err(CoreError::parse_error(
                    field,
                    record_id,
                    "epoch timestamp must be an integer number of seconds",
                ));
            };
            epoch_to_date(seconds).ok_or_else(|| {
                CoreError::parse_error(field, record_id, "epoch timestamp is out of range")
            })
        }
        Value::String(text) => parse_date_text(text)
            .ok_or_else(|| CoreError::parse_error(field, record_id, "expected YYYY-MM-DD")),
        _ => Err(CoreError::parse_error(
            field,
            record_id,
            "expected epoch seconds or an ISO date string",
        )),
    }
}

pub fn optional_date_field(
    value: Option<&Value>,
    field: &str,
    record_id: &str,
) -> CoreResult<Option<NaiveDate>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(_) => date_field(value, field, record_id).map(Some),
    }
}

/// Coerces a provider amount to an exact decimal. Decimal strings parse
/// directly; JSON numbers parse from their literal representation so no
/// binary floating point enters the pipeline. Sign is preserved.
pub fn amount_field(value: Option<&Value>, field: &str, record_id: &str) -> CoreResult<Decimal> {
    let Some(raw) = value else {
        return Err(CoreError::validation_error(
            field,
            record_id,
            "amount must be present",
        ));
    };

    let literal = match raw {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => {
            return Err(CoreError::parse_error(
                field,
                record_id,
                "expected a decimal string or number",
            ));
        }
    };

    if literal.is_empty() {
        return Err(CoreError::validation_error(
            field,
            record_id,
            "amount must be non-empty",
        ));
    }

    literal.parse::<Decimal>().map_err(|_| {
        CoreError::parse_error(
            field,
            record_id,
            &format!("`{literal}` is not a valid decimal amount"),
        )
    })
}

pub fn optional_amount_field(
    value: Option<&Value>,
    field: &str,
    record_id: &str,
) -> CoreResult<Option<Decimal>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(_) => amount_field(value, field, record_id).map(Some),
    }
}

/// Missing or blank currency codes default to "USD"; present codes are
/// trimmed and uppercased.
pub fn currency_or_default(value: Option<&Value>) -> String {
    match optional_text(value) {
        Some(code) => code.to_uppercase(),
        None => DEFAULT_CURRENCY.to_string(),
    }
}

pub fn optional_text(value: Option<&Value>) -> Option<String> {
    let raw = value?;

    if raw.is_null() {
        return None;
    }

    let text = match raw {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn required_text(value: Option<&Value>, field: &str, record_id: &str) -> CoreResult<String> {
    optional_text(value).ok_or_else(|| {
        CoreError::validation_error(field, record_id, "must be present and non-empty")
    })
}

/// Provider pending flags are loosely typed; anything other than an explicit
/// true is treated as settled.
pub fn is_pending(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

fn epoch_to_date(seconds: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(seconds, 0).map(|instant| instant.date_naive())
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|instant| instant.with_timezone(&Utc).date_naive())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{
        amount_field, currency_or_default, date_field, is_pending, optional_text, required_text,
    };

    #[test]
    fn amounts_parse_exactly_from_strings_and_numbers() {
        let from_string = amount_field(Some(&json!("-42.15")), "amount", "t1");
        assert_eq!(from_string.ok(), "-42.15".parse::<Decimal>().ok());

        let from_number = amount_field(Some(&json!(4.33)), "amount", "t1");
        assert_eq!(from_number.ok(), "4.33".parse::<Decimal>().ok());

        let negative_number = amount_field(Some(&json!(-1200.5)), "amount", "t1");
        assert_eq!(negative_number.ok(), "-1200.50".parse::<Decimal>().ok());
    }

    #[test]
    fn malformed_amount_names_field_and_record() {
        let result = amount_field(Some(&json!("12,00")), "amount", "txn_9");
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "parse_error");
            assert!(error.message.contains("amount"));
            assert!(error.message.contains("txn_9"));
        }
    }

    #[test]
    fn dates_accept_epoch_seconds_and_iso_strings() {
        let from_epoch = date_field(Some(&json!(1704067200)), "posted", "t1");
        assert_eq!(
            from_epoch.ok().map(|date| date.to_string()),
            Some("2024-01-01".to_string())
        );

        let from_iso = date_field(Some(&json!("2024-06-30")), "date", "t1");
        assert_eq!(
            from_iso.ok().map(|date| date.to_string()),
            Some("2024-06-30".to_string())
        );

        let from_rfc3339 = date_field(Some(&json!("2024-06-30T23:15:00Z")), "date", "t1");
        assert_eq!(
            from_rfc3339.ok().map(|date| date.to_string()),
            Some("2024-06-30".to_string())
        );
    }

    #[test]
    fn missing_currency_defaults_to_usd() {
        assert_eq!(currency_or_default(None), "USD");
        assert_eq!(currency_or_default(Some(&json!(""))), "USD");
        assert_eq!(currency_or_default(Some(&json!("cad"))), "CAD");
    }

    #[test]
    fn pending_flag_requires_explicit_true() {
        assert!(is_pending(Some(&json!(true))));
        assert!(!is_pending(Some(&json!(false))));
        assert!(!is_pending(Some(&json!("true"))));
        assert!(!is_pending(None));
    }

    #[test]
    fn text_helpers_trim_and_reject_blank() {
        assert_eq!(optional_text(Some(&json!("  hi "))), Some("hi".to_string()));
        assert_eq!(optional_text(Some(&json!("   "))), None);

        let missing = required_text(None, "id", "(unknown)");
        assert!(missing.is_err());
        if let Err(error) = missing {
            assert_eq!(error.code, "validation_error");
        }
    }
}

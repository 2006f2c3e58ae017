//! Conversion between DATEV's textual field encodings and typed values.
//!
//! Every semantic type has one `decode_*` and one `encode_*` function. Decoding
//! accepts only the canonical form that encoding produces, so a decoded value
//! always re-encodes to the exact input text.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DatevError;
use super::schema::{DateLayout, FieldKind, FieldSpec};
use crate::text::encoding;

/// A decoded, non-empty field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Text, account numbers and enumeration literals.
    Text(String),
    /// Amounts and numbers.
    Number(Decimal),
    /// Calendar dates.
    Date(NaiveDate),
    /// Timestamps with millisecond precision.
    Timestamp(NaiveDateTime),
}

impl FieldValue {
    /// The text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The decimal, if this is a number.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(d) => Some(*d),
            _ => None,
        }
    }

    /// The date, if this is a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// The timestamp, if this is a timestamp.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

/// Decode the raw text of one column. Empty text is an absent value.
pub fn decode(spec: &FieldSpec, raw: &str) -> Result<Option<FieldValue>, DatevError> {
    let field = spec.label;
    if raw.is_empty() {
        return if spec.required {
            Err(DatevError::MissingField { field })
        } else {
            Ok(None)
        };
    }
    let value = match spec.kind {
        FieldKind::Amount { digits, scale } | FieldKind::Number { digits, scale } => {
            FieldValue::Number(decode_decimal(field, raw, digits, scale)?)
        }
        FieldKind::Account { digits } => FieldValue::Text(decode_account(field, raw, digits)?),
        FieldKind::Text { max } => FieldValue::Text(decode_text(field, raw, max)?),
        FieldKind::Choice(allowed) => FieldValue::Text(decode_choice(field, raw, allowed)?),
        FieldKind::Date(layout) => FieldValue::Date(decode_date(field, raw, layout)?),
        FieldKind::Timestamp => FieldValue::Timestamp(decode_timestamp(field, raw)?),
    };
    Ok(Some(value))
}

/// Encode one column, validating the value against the field's bounds.
pub fn encode(spec: &FieldSpec, value: Option<&FieldValue>) -> Result<String, DatevError> {
    let field = spec.label;
    let encoded = match (spec.kind, value) {
        (_, None) => String::new(),
        (
            FieldKind::Amount { digits, scale } | FieldKind::Number { digits, scale },
            Some(FieldValue::Number(d)),
        ) => encode_decimal(field, d, digits, scale)?,
        (FieldKind::Account { digits }, Some(FieldValue::Text(s))) => {
            encode_account(field, s, digits)?
        }
        (FieldKind::Text { max }, Some(FieldValue::Text(s))) => encode_text(field, s, max)?,
        (FieldKind::Choice(allowed), Some(FieldValue::Text(s))) => {
            encode_choice(field, s, allowed)?
        }
        (FieldKind::Date(layout), Some(FieldValue::Date(d))) => encode_date(field, *d, layout)?,
        (FieldKind::Timestamp, Some(FieldValue::Timestamp(t))) => encode_timestamp(field, *t)?,
        (kind, Some(other)) => {
            return Err(DatevError::SchemaMismatch(format!(
                "field '{field}' of kind {kind:?} cannot hold {other:?}"
            )));
        }
    };
    if encoded.is_empty() && spec.required {
        return Err(DatevError::MissingField { field });
    }
    Ok(encoded)
}

/// Decode a comma-decimal such as `1234,50`.
///
/// The fraction must have exactly `scale` digits (none and no comma for
/// `scale == 0`); grouping separators, signs and leading zeros are rejected.
pub fn decode_decimal(
    field: &'static str,
    raw: &str,
    digits: u8,
    scale: u8,
) -> Result<Decimal, DatevError> {
    let invalid = |message: String| DatevError::InvalidNumber {
        field,
        value: raw.to_string(),
        message,
    };
    let (int_part, frac_part) = match raw.split_once(',') {
        Some((i, f)) => (i, Some(f)),
        None => (raw, None),
    };
    if int_part.is_empty() || !is_digits(int_part) {
        return Err(invalid("expected digits before the decimal comma".into()));
    }
    if int_part.len() > 1 && int_part.starts_with('0') {
        return Err(invalid("leading zeros are not allowed".into()));
    }
    let frac = match (scale, frac_part) {
        (0, None) => "",
        (0, Some(_)) => return Err(invalid("no decimal places allowed".into())),
        (s, Some(f)) if f.len() == usize::from(s) && is_digits(f) => f,
        (s, _) => return Err(invalid(format!("expected exactly {s} decimal places"))),
    };
    if int_part.len() > usize::from(digits) {
        return Err(DatevError::FieldTooLong {
            field,
            value: raw.to_string(),
            max: usize::from(digits),
        });
    }
    let mantissa: i64 = format!("{int_part}{frac}")
        .parse()
        .map_err(|_| invalid("number out of range".into()))?;
    Ok(Decimal::new(mantissa, u32::from(scale)))
}

/// Encode a non-negative decimal with exactly `scale` decimal places.
pub fn encode_decimal(
    field: &'static str,
    value: &Decimal,
    digits: u8,
    scale: u8,
) -> Result<String, DatevError> {
    let invalid = |message: String| DatevError::InvalidNumber {
        field,
        value: value.to_string(),
        message,
    };
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid("must not be negative".into()));
    }
    if value.round_dp(u32::from(scale)) != *value {
        return Err(invalid(format!("more than {scale} decimal places")));
    }
    let text = format!("{:.*}", usize::from(scale), value.abs());
    let int_len = text.split('.').next().map_or(0, str::len);
    if int_len > usize::from(digits) {
        return Err(DatevError::FieldTooLong {
            field,
            value: text,
            max: usize::from(digits),
        });
    }
    Ok(text.replace('.', ","))
}

/// Decode an 8-digit date in the given layout.
pub fn decode_date(
    field: &'static str,
    raw: &str,
    layout: DateLayout,
) -> Result<NaiveDate, DatevError> {
    let invalid = || DatevError::InvalidDate {
        field,
        value: raw.to_string(),
    };
    if raw.len() != 8 || !is_digits(raw) {
        return Err(invalid());
    }
    let (day, month, year) = match layout {
        DateLayout::DayMonthYear => (&raw[0..2], &raw[2..4], &raw[4..8]),
        DateLayout::YearMonthDay => (&raw[6..8], &raw[4..6], &raw[0..4]),
    };
    let parsed = (year.parse(), month.parse(), day.parse());
    match parsed {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Encode a date as 8 digits in the given layout.
pub fn encode_date(
    field: &'static str,
    date: NaiveDate,
    layout: DateLayout,
) -> Result<String, DatevError> {
    if !(0..=9999).contains(&date.year()) {
        return Err(DatevError::InvalidDate {
            field,
            value: date.to_string(),
        });
    }
    Ok(match layout {
        DateLayout::DayMonthYear => {
            format!("{:02}{:02}{:04}", date.day(), date.month(), date.year())
        }
        DateLayout::YearMonthDay => {
            format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
        }
    })
}

/// Decode a `JJJJMMTTHHMMSSFFF` timestamp.
pub fn decode_timestamp(field: &'static str, raw: &str) -> Result<NaiveDateTime, DatevError> {
    let invalid = || DatevError::InvalidDate {
        field,
        value: raw.to_string(),
    };
    if raw.len() != 17 || !is_digits(raw) {
        return Err(invalid());
    }
    let num = |range: std::ops::Range<usize>| raw[range].parse::<u32>().map_err(|_| invalid());
    let year = raw[0..4].parse::<i32>().map_err(|_| invalid())?;
    let (month, day) = (num(4..6)?, num(6..8)?);
    let (hour, minute, second, milli) = (num(8..10)?, num(10..12)?, num(12..14)?, num(14..17)?);
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_milli_opt(hour, minute, second, milli))
        .ok_or_else(invalid)
}

/// Encode a timestamp as `JJJJMMTTHHMMSSFFF`; sub-millisecond precision is rejected.
pub fn encode_timestamp(field: &'static str, value: NaiveDateTime) -> Result<String, DatevError> {
    let nanos = value.nanosecond();
    if !(0..=9999).contains(&value.year()) || nanos >= 1_000_000_000 || nanos % 1_000_000 != 0 {
        return Err(DatevError::InvalidDate {
            field,
            value: value.to_string(),
        });
    }
    Ok(format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}{:03}",
        value.year(),
        value.month(),
        value.day(),
        value.hour(),
        value.minute(),
        value.second(),
        nanos / 1_000_000
    ))
}

/// Decode one of the allowed literals, case-sensitively.
pub fn decode_choice(
    field: &'static str,
    raw: &str,
    allowed: &'static [&'static str],
) -> Result<String, DatevError> {
    if allowed.contains(&raw) {
        Ok(raw.to_string())
    } else {
        Err(DatevError::InvalidEnum {
            field,
            value: raw.to_string(),
            allowed,
        })
    }
}

/// Encode one of the allowed literals.
pub fn encode_choice(
    field: &'static str,
    value: &str,
    allowed: &'static [&'static str],
) -> Result<String, DatevError> {
    decode_choice(field, value, allowed)
}

/// Decode an account number: digits only, at most `digits` of them.
pub fn decode_account(field: &'static str, raw: &str, digits: u8) -> Result<String, DatevError> {
    if !is_digits(raw) {
        return Err(DatevError::InvalidNumber {
            field,
            value: raw.to_string(),
            message: "account numbers consist of digits only".into(),
        });
    }
    if raw.len() > usize::from(digits) {
        return Err(DatevError::FieldTooLong {
            field,
            value: raw.to_string(),
            max: usize::from(digits),
        });
    }
    Ok(raw.to_string())
}

/// Encode an account number; empty stays empty.
pub fn encode_account(field: &'static str, value: &str, digits: u8) -> Result<String, DatevError> {
    if value.is_empty() {
        return Ok(String::new());
    }
    decode_account(field, value, digits)
}

/// Decode free text of at most `max` characters.
pub fn decode_text(field: &'static str, raw: &str, max: u16) -> Result<String, DatevError> {
    if raw.chars().count() > usize::from(max) {
        return Err(DatevError::FieldTooLong {
            field,
            value: raw.to_string(),
            max: usize::from(max),
        });
    }
    Ok(raw.to_string())
}

/// Encode free text; it must fit the bound and the file encoding.
pub fn encode_text(field: &'static str, value: &str, max: u16) -> Result<String, DatevError> {
    let text = decode_text(field, value, max)?;
    encoding::ensure_encodable(field, &text)?;
    Ok(text)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

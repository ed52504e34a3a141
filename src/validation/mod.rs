//! Structural checks over request payloads.
//!
//! Every reader returns the first violated rule as a [`ValidationError`]; callers
//! chain them with `?` so the first failing check is the one reported.
//! Referential checks (does the branch/student/payment exist within the scope)
//! need the database and live in `services::references`.

pub mod branch;
pub mod class;
pub mod course;
pub mod enrollment;
pub mod invoice;
pub mod payment;
pub mod report;
pub mod student;
pub mod user;

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { field: None, message: message.into() }
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self { field: Some(field.to_string()), message: message.into() }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Read-only view over a JSON object body with typed field readers
pub struct Payload<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Payload<'a> {
    pub fn new(body: &'a Value) -> ValidationResult<Self> {
        match body {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ValidationError::new("Request body must be a JSON object")),
        }
    }

    /// Raw value, treating JSON null as absent
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).map(|v| !is_blank(v)).unwrap_or(false)
    }

    /// Fails naming every listed field that is absent, null or blank
    pub fn require(&self, names: &[&str]) -> ValidationResult<()> {
        let missing: Vec<&str> = names.iter().copied().filter(|n| !self.has(n)).collect();
        match missing.len() {
            0 => Ok(()),
            1 => Err(ValidationError::field(missing[0], format!("Required field: {}", missing[0]))),
            _ => Err(ValidationError::field(missing[0], format!("Required fields: {}", missing.join(", ")))),
        }
    }

    /// Trimmed string; empty strings read as `None`
    pub fn text(&self, name: &str) -> ValidationResult<Option<String>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                Ok(if trimmed.is_empty() { None } else { Some(trimmed.to_string()) })
            }
            Some(_) => Err(ValidationError::field(name, format!("{} must be a string", name))),
        }
    }

    pub fn required_text(&self, name: &str) -> ValidationResult<String> {
        self.text(name)?
            .ok_or_else(|| ValidationError::field(name, format!("{} must be a non-empty string", name)))
    }

    pub fn id(&self, name: &str) -> ValidationResult<Option<i64>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => parse_positive_id(name, s).map(Some),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(id) if id > 0 => Ok(Some(id)),
                _ => Err(positive_id_error(name)),
            },
            Some(_) => Err(positive_id_error(name)),
        }
    }

    pub fn required_id(&self, name: &str) -> ValidationResult<i64> {
        self.id(name)?.ok_or_else(|| positive_id_error(name))
    }

    pub fn date(&self, name: &str) -> ValidationResult<Option<NaiveDate>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => parse_iso_date(name, s).map(Some),
            Some(_) => Err(iso_date_error(name)),
        }
    }

    pub fn required_date(&self, name: &str) -> ValidationResult<NaiveDate> {
        self.date(name)?.ok_or_else(|| iso_date_error(name))
    }

    /// Accepts JSON numbers and numeric strings that fit a NUMERIC(12,2) column
    pub fn decimal(&self, name: &str) -> ValidationResult<Option<Decimal>> {
        let value = match self.get(name) {
            None => return Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => parse_decimal(name, s)?,
            Some(Value::Number(n)) => parse_decimal(name, &n.to_string())?,
            Some(_) => return Err(ValidationError::field(name, format!("{} must be a number", name))),
        };
        check_money(name, value).map(Some)
    }

    pub fn required_decimal(&self, name: &str) -> ValidationResult<Decimal> {
        self.decimal(name)?
            .ok_or_else(|| ValidationError::field(name, format!("{} must be a number", name)))
    }

    /// Member of a closed string set; `message` is reported on any mismatch
    pub fn choice<T: FromStr>(&self, name: &str, message: &str) -> ValidationResult<Option<T>> {
        match self.text(name) {
            Ok(None) => Ok(None),
            Ok(Some(s)) => s.parse().map(Some).map_err(|_| ValidationError::field(name, message)),
            Err(_) => Err(ValidationError::field(name, message)),
        }
    }

    pub fn flag(&self, name: &str) -> ValidationResult<Option<bool>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => parse_flag(name, s).map(Some),
            Some(_) => Err(ValidationError::field(name, format!("{} must be true or false", name))),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn positive_id_error(name: &str) -> ValidationError {
    ValidationError::field(name, format!("{} must be a positive integer", name))
}

fn iso_date_error(name: &str) -> ValidationError {
    ValidationError::field(name, format!("{} must be in YYYY-MM-DD format", name))
}

pub fn parse_positive_id(name: &str, raw: &str) -> ValidationResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(positive_id_error(name)),
    }
}

/// Strict `YYYY-MM-DD`; `2024-2-1` and timestamps are rejected
pub fn parse_iso_date(name: &str, raw: &str) -> ValidationResult<NaiveDate> {
    let raw = raw.trim();
    let shaped = raw.len() == 10
        && raw.char_indices().all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !shaped {
        return Err(iso_date_error(name));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| iso_date_error(name))
}

pub fn parse_decimal(name: &str, raw: &str) -> ValidationResult<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ValidationError::field(name, format!("{} must be a number", name)))
}

/// Largest amount a NUMERIC(12,2) column holds
pub const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// At most two decimal places and no more than [`MAX_MONEY`] in magnitude.
/// Trailing zeros do not count as decimal places.
pub fn check_money(name: &str, value: Decimal) -> ValidationResult<Decimal> {
    if value.abs() > MAX_MONEY || value.normalize().scale() > 2 {
        return Err(ValidationError::field(
            name,
            format!("{} must be at most {} with no more than 2 decimal places", name, MAX_MONEY),
        ));
    }
    Ok(value)
}

pub fn parse_flag(name: &str, raw: &str) -> ValidationResult<bool> {
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ValidationError::field(name, format!("{} must be true or false", name))),
    }
}

/// `issue <= due`; equal dates are allowed
pub fn check_date_order(issue: NaiveDate, due: NaiveDate) -> ValidationResult<()> {
    if issue > due {
        return Err(ValidationError::field("due_date", "due_date must be after issue_date"));
    }
    Ok(())
}

pub fn check_positive_price(price: Decimal) -> ValidationResult<()> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::field("price", "Price must be greater than 0"));
    }
    Ok(())
}

//! Loan form schema.
//!
//! Every numeric and date field arrives as text, the way HTML forms send it.
//! Validation keeps the text as-is; turning it into typed values is the job
//! of [`crate::serialization::loan`].

use chrono::{DateTime, NaiveDate};
use garde::Validate;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::{AppError, FieldErrors, Result};
use crate::models::loan::LoanStatus;

/// Longest term accepted, in months.
pub const MAX_TERM_MONTHS: i32 = 480;
/// Highest interest rate accepted, in percent.
pub const MAX_INTEREST_RATE: f64 = 100.0;

/// A candidate loan payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct LoanForm {
    #[serde(default, deserialize_with = "text")]
    #[garde(custom(validate_amount))]
    pub amount: String,
    #[serde(default, deserialize_with = "text")]
    #[garde(custom(validate_interest_rate))]
    pub interest_rate: String,
    #[serde(default, deserialize_with = "text")]
    #[garde(custom(validate_term_months))]
    pub term_months: String,
    #[serde(default, deserialize_with = "optional_text")]
    #[garde(skip)]
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[garde(custom(validate_status))]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[garde(custom(validate_monthly_payment))]
    pub monthly_payment: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[garde(custom(validate_total_interest))]
    pub total_interest: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[garde(custom(validate_total_amount))]
    pub total_amount: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[garde(custom(validate_start_date))]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[garde(custom(validate_end_date))]
    pub end_date: Option<String>,
}

/// A form that passed [`validate_loan_form`]. Only this module can build one.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidLoanForm(LoanForm);

impl ValidLoanForm {
    pub fn as_form(&self) -> &LoanForm {
        &self.0
    }

    pub fn into_form(self) -> LoanForm {
        self.0
    }
}

/// Checks every field rule and reports all failures at once.
pub fn validate_loan_form(form: LoanForm) -> Result<ValidLoanForm> {
    match form.validate() {
        Ok(()) => Ok(ValidLoanForm(form)),
        Err(report) => Err(AppError::Validation(FieldErrors::from(report))),
    }
}

/// The text of an optional field, or `None` when it is missing or blank.
pub fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// Parses a finite decimal number, ignoring surrounding whitespace.
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Parses a whole number, ignoring surrounding whitespace.
pub fn parse_whole(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

/// Parses `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
}

/// Accepts a JSON string or number as field text. `null` reads as absent.
struct TextVisitor;

impl<'de> de::Visitor<'de> for TextVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or a number")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<Self::Value, E> {
        Ok(Some(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Self::Value, D::Error> {
        deserializer.deserialize_any(TextVisitor)
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(deserializer
        .deserialize_any(TextVisitor)?
        .unwrap_or_default())
}

fn optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    deserializer.deserialize_any(TextVisitor)
}

fn required_number(
    value: &str,
    missing: &'static str,
    invalid: &'static str,
    accept: impl Fn(f64) -> bool,
) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new(missing));
    }
    match parse_number(value) {
        Some(number) if accept(number) => Ok(()),
        _ => Err(garde::Error::new(invalid)),
    }
}

fn optional_number(
    value: &Option<String>,
    invalid: &'static str,
    accept: impl Fn(f64) -> bool,
) -> garde::Result {
    match present(value) {
        None => Ok(()),
        Some(text) => match parse_number(text) {
            Some(number) if accept(number) => Ok(()),
            _ => Err(garde::Error::new(invalid)),
        },
    }
}

fn optional_date(value: &Option<String>, invalid: &'static str) -> garde::Result {
    match present(value) {
        Some(text) if parse_date(text).is_none() => Err(garde::Error::new(invalid)),
        _ => Ok(()),
    }
}

fn validate_amount(value: &str, _: &()) -> garde::Result {
    required_number(
        value,
        "Amount is required",
        "Amount must be a positive number",
        |amount| amount > 0.0,
    )
}

fn validate_interest_rate(value: &str, _: &()) -> garde::Result {
    required_number(
        value,
        "Interest rate is required",
        "Interest rate must be between 0 and 100",
        |rate| rate > 0.0 && rate <= MAX_INTEREST_RATE,
    )
}

fn validate_term_months(value: &str, _: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("Term is required"));
    }
    match parse_whole(value) {
        Some(months) if (1..=MAX_TERM_MONTHS).contains(&months) => Ok(()),
        _ => Err(garde::Error::new("Term must be between 1 and 480 months")),
    }
}

fn validate_status(value: &Option<String>, _: &()) -> garde::Result {
    match present(value) {
        Some(text) if text.parse::<LoanStatus>().is_err() => Err(garde::Error::new(
            "Status must be one of PENDING, APPROVED, REJECTED, ACTIVE, COMPLETED, DEFAULTED",
        )),
        _ => Ok(()),
    }
}

fn validate_monthly_payment(value: &Option<String>, _: &()) -> garde::Result {
    optional_number(value, "Monthly payment must be a positive number", |payment| {
        payment > 0.0
    })
}

fn validate_total_interest(value: &Option<String>, _: &()) -> garde::Result {
    optional_number(
        value,
        "Total interest must be zero or a positive number",
        |interest| interest >= 0.0,
    )
}

fn validate_total_amount(value: &Option<String>, _: &()) -> garde::Result {
    optional_number(value, "Total amount must be a positive number", |total| {
        total > 0.0
    })
}

fn validate_start_date(value: &Option<String>, _: &()) -> garde::Result {
    optional_date(value, "Start date must be a valid date")
}

fn validate_end_date(value: &Option<String>, _: &()) -> garde::Result {
    optional_date(value, "End date must be a valid date")
}

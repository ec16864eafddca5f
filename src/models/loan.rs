use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::AppError;

/// Lifecycle status of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSql, FromSql)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[postgres(name = "loan_status")]
pub enum LoanStatus {
    #[default]
    #[postgres(name = "PENDING")]
    Pending,
    #[postgres(name = "APPROVED")]
    Approved,
    #[postgres(name = "REJECTED")]
    Rejected,
    #[postgres(name = "ACTIVE")]
    Active,
    #[postgres(name = "COMPLETED")]
    Completed,
    #[postgres(name = "DEFAULTED")]
    Defaulted,
}

/// Visual tone of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Warning,
    Info,
    Danger,
    Success,
    Neutral,
}

impl LoanStatus {
    /// Every status, in declaration order.
    pub const ALL: [LoanStatus; 6] = [
        LoanStatus::Pending,
        LoanStatus::Approved,
        LoanStatus::Rejected,
        LoanStatus::Active,
        LoanStatus::Completed,
        LoanStatus::Defaulted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Completed => "COMPLETED",
            LoanStatus::Defaulted => "DEFAULTED",
        }
    }

    pub fn badge_tone(&self) -> BadgeTone {
        match self {
            LoanStatus::Pending => BadgeTone::Warning,
            LoanStatus::Approved => BadgeTone::Info,
            LoanStatus::Rejected | LoanStatus::Defaulted => BadgeTone::Danger,
            LoanStatus::Active => BadgeTone::Success,
            LoanStatus::Completed => BadgeTone::Neutral,
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status literal is not one of the six known values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLoanStatus(pub String);

impl fmt::Display for UnknownLoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown loan status '{}'", self.0)
    }
}

impl std::error::Error for UnknownLoanStatus {}

impl FromStr for LoanStatus {
    type Err = UnknownLoanStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LoanStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownLoanStatus(value.to_string()))
    }
}

/// A persisted loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// The unique identifier for the loan.
    pub id: Uuid,
    /// The ID of the user who owns the loan.
    pub user_id: Uuid,
    /// Principal amount.
    pub amount: f64,
    /// Annual interest rate in percent.
    pub interest_rate: f64,
    /// Term in months.
    pub term_months: i32,
    pub purpose: Option<String>,
    pub status: LoanStatus,
    pub monthly_payment: Option<f64>,
    pub total_interest: Option<f64>,
    pub total_amount: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// The timestamp when the loan was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the loan was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Loan {
    type Error = AppError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            amount: row.try_get("amount")?,
            interest_rate: row.try_get("interest_rate")?,
            term_months: row.try_get("term_months")?,
            purpose: row.try_get("purpose")?,
            status: row.try_get("status")?,
            monthly_payment: row.try_get("monthly_payment")?,
            total_interest: row.try_get("total_interest")?,
            total_amount: row.try_get("total_amount")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// The mutable, storage-ready fields of a loan.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRecord {
    pub amount: f64,
    pub interest_rate: f64,
    pub term_months: i32,
    pub purpose: Option<String>,
    pub status: LoanStatus,
    pub monthly_payment: Option<f64>,
    pub total_interest: Option<f64>,
    pub total_amount: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Loan {
    /// Builds a loan from a record, used by stores that don't stamp rows themselves.
    pub fn from_record(id: Uuid, user_id: Uuid, record: LoanRecord, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            amount: record.amount,
            interest_rate: record.interest_rate,
            term_months: record.term_months,
            purpose: record.purpose,
            status: record.status,
            monthly_payment: record.monthly_payment,
            total_interest: record.total_interest,
            total_amount: record.total_amount,
            start_date: record.start_date,
            end_date: record.end_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces every mutable field and bumps `updated_at`.
    pub fn apply(&mut self, record: LoanRecord, now: DateTime<Utc>) {
        self.amount = record.amount;
        self.interest_rate = record.interest_rate;
        self.term_months = record.term_months;
        self.purpose = record.purpose;
        self.status = record.status;
        self.monthly_payment = record.monthly_payment;
        self.total_interest = record.total_interest;
        self.total_amount = record.total_amount;
        self.start_date = record.start_date;
        self.end_date = record.end_date;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_round_trips_for_every_variant() {
        for status in LoanStatus::ALL {
            assert_eq!(status.as_str().parse::<LoanStatus>(), Ok(status));
        }
    }

    #[test]
    fn status_parsing_is_exact() {
        assert!("pending".parse::<LoanStatus>().is_err());
        assert!("CLOSED".parse::<LoanStatus>().is_err());
        assert!(" PENDING".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn status_defaults_to_pending() {
        assert_eq!(LoanStatus::default(), LoanStatus::Pending);
    }

    #[test]
    fn status_serializes_as_screaming_literal() {
        let json = sonic_rs::to_string(&LoanStatus::Defaulted).unwrap();
        assert_eq!(json, "\"DEFAULTED\"");
    }

    #[test]
    fn badge_tones_group_failure_states() {
        assert_eq!(LoanStatus::Rejected.badge_tone(), BadgeTone::Danger);
        assert_eq!(LoanStatus::Defaulted.badge_tone(), BadgeTone::Danger);
        assert_eq!(LoanStatus::Pending.badge_tone(), BadgeTone::Warning);
    }
}

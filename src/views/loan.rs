//! Display-ready renderings of loans for the dashboard and detail pages.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::models::loan::{BadgeTone, Loan, LoanStatus};

const NOT_CALCULATED: &str = "Not calculated";
const NOT_SET: &str = "Not set";

/// Status plus the badge tone it is shown with.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBadge {
    pub status: LoanStatus,
    pub tone: BadgeTone,
}

impl From<LoanStatus> for StatusBadge {
    fn from(status: LoanStatus) -> Self {
        Self {
            status,
            tone: status.badge_tone(),
        }
    }
}

/// The detail page rendering of one loan.
#[derive(Debug, Clone, Serialize)]
pub struct LoanView {
    pub id: Uuid,
    pub short_id: String,
    pub amount: String,
    pub interest_rate: String,
    pub term: String,
    pub status: StatusBadge,
    pub purpose: String,
    pub monthly_payment: String,
    pub total_interest: String,
    pub total_amount: String,
    pub created: String,
    pub updated: String,
    pub start_date: String,
    pub end_date: String,
}

impl From<&Loan> for LoanView {
    fn from(loan: &Loan) -> Self {
        Self {
            id: loan.id,
            short_id: short_id(&loan.id),
            amount: format_currency(loan.amount),
            interest_rate: format_rate(loan.interest_rate),
            term: format_term(loan.term_months),
            status: StatusBadge::from(loan.status),
            purpose: loan
                .purpose
                .clone()
                .unwrap_or_else(|| "Not specified".to_string()),
            monthly_payment: optional_currency(loan.monthly_payment, NOT_CALCULATED),
            total_interest: optional_currency(loan.total_interest, NOT_CALCULATED),
            total_amount: optional_currency(loan.total_amount, NOT_CALCULATED),
            created: format_timestamp(&loan.created_at),
            updated: format_timestamp(&loan.updated_at),
            start_date: optional_date(loan.start_date),
            end_date: optional_date(loan.end_date),
        }
    }
}

/// One row of the dashboard table.
#[derive(Debug, Clone, Serialize)]
pub struct LoanRow {
    pub id: Uuid,
    pub short_id: String,
    pub amount: String,
    pub interest_rate: String,
    pub term: String,
    pub status: StatusBadge,
    pub purpose: String,
    pub monthly_payment: String,
    pub created: String,
}

impl From<&Loan> for LoanRow {
    fn from(loan: &Loan) -> Self {
        Self {
            id: loan.id,
            short_id: short_id(&loan.id),
            amount: format_currency(loan.amount),
            interest_rate: format_rate(loan.interest_rate),
            term: format_term(loan.term_months),
            status: StatusBadge::from(loan.status),
            purpose: loan.purpose.clone().unwrap_or_else(|| "-".to_string()),
            monthly_payment: optional_currency(loan.monthly_payment, "-"),
            created: format_timestamp(&loan.created_at),
        }
    }
}

/// Last eight characters of the id.
pub fn short_id(id: &Uuid) -> String {
    let text = id.to_string();
    text[text.len() - 8..].to_string()
}

/// `$` amount with thousands separators and at most two fraction digits.
pub fn format_currency(value: f64) -> String {
    let rounded = match Decimal::from_f64_retain(value) {
        Some(amount) => amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
            .to_string(),
        // Beyond Decimal's range; every such value is a whole number.
        None => format!("{:.0}", value),
    };

    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", rounded.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let sign = if whole.trim_start_matches('0').is_empty() && fraction.is_empty() {
        ""
    } else {
        sign
    };

    if fraction.is_empty() {
        format!("{}${}", sign, group_thousands(whole))
    } else {
        format!("{}${}.{}", sign, group_thousands(whole), fraction)
    }
}

pub fn format_rate(rate: f64) -> String {
    format!("{:.2}%", rate)
}

pub fn format_term(months: i32) -> String {
    format!("{} months", months)
}

/// `dd-MM-yyyy`.
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    format_date(&timestamp.date_naive())
}

fn optional_currency(value: Option<f64>, fallback: &str) -> String {
    value
        .map(format_currency)
        .unwrap_or_else(|| fallback.to_string())
}

fn optional_date(value: Option<NaiveDate>) -> String {
    value
        .as_ref()
        .map(format_date)
        .unwrap_or_else(|| NOT_SET.to_string())
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loan::LoanRecord;
    use chrono::TimeZone;

    fn sample_loan() -> Loan {
        let record = LoanRecord {
            amount: 25000.0,
            interest_rate: 7.5,
            term_months: 60,
            purpose: None,
            status: LoanStatus::Approved,
            monthly_payment: Some(500.95),
            total_interest: None,
            total_amount: None,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            end_date: None,
        };
        let created = Utc.with_ymd_and_hms(2025, 2, 14, 9, 30, 0).unwrap();
        let id = Uuid::parse_str("6f1c2a9e-1111-4b2b-9c3d-0123abcd4567").unwrap();
        Loan::from_record(id, Uuid::new_v4(), record, created)
    }

    #[test]
    fn currency_groups_thousands_and_trims_fractions() {
        assert_eq!(format_currency(25000.0), "$25,000");
        assert_eq!(format_currency(1234.5), "$1,234.5");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(0.05), "$0.05");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(0.125), "$0.13");
        assert_eq!(format_currency(-1500.5), "-$1,500.5");
        assert_eq!(format_currency(-0.001), "$0");
    }

    #[test]
    fn currency_keeps_every_digit_of_large_amounts() {
        assert_eq!(format_currency(1e20), "$100,000,000,000,000,000,000");
        assert_eq!(format_currency(123456789012345678.0), "$123,456,789,012,345,680");

        let huge = format_currency(1e300);
        assert!(huge.starts_with("$1,000,000,"));
        assert_eq!(huge.chars().filter(|c| c.is_ascii_digit()).count(), 301);
    }

    #[test]
    fn rate_and_term_use_fixed_shapes() {
        assert_eq!(format_rate(7.5), "7.50%");
        assert_eq!(format_rate(100.0), "100.00%");
        assert_eq!(format_term(1), "1 months");
    }

    #[test]
    fn detail_view_fills_placeholders() {
        let view = LoanView::from(&sample_loan());
        assert_eq!(view.short_id, "abcd4567");
        assert_eq!(view.amount, "$25,000");
        assert_eq!(view.interest_rate, "7.50%");
        assert_eq!(view.term, "60 months");
        assert_eq!(view.purpose, "Not specified");
        assert_eq!(view.monthly_payment, "$500.95");
        assert_eq!(view.total_interest, "Not calculated");
        assert_eq!(view.created, "14-02-2025");
        assert_eq!(view.start_date, "01-03-2025");
        assert_eq!(view.end_date, "Not set");
        assert_eq!(view.status.tone, BadgeTone::Info);
    }

    #[test]
    fn dashboard_row_uses_dashes_for_missing_values() {
        let row = LoanRow::from(&sample_loan());
        assert_eq!(row.purpose, "-");
        assert_eq!(row.monthly_payment, "$500.95");
        assert_eq!(row.created, "14-02-2025");
    }
}

//! Translation between validated form text and the stored loan representation.

use crate::error::{AppError, FieldErrors, Result};
use crate::models::loan::{Loan, LoanRecord, LoanStatus};
use crate::validation::loan::{
    LoanForm, ValidLoanForm, parse_date, parse_number, parse_whole, present,
};

/// Converts a validated form into a storage-ready record.
///
/// Never fails for a form produced by `validate_loan_form`; the error arm only
/// guards the parse calls and names the offending field.
pub fn to_record(form: ValidLoanForm) -> Result<LoanRecord> {
    let form = form.into_form();

    let amount = required(&form.amount, "amount", parse_number)?;
    let interest_rate = required(&form.interest_rate, "interest_rate", parse_number)?;
    let term_months = required(&form.term_months, "term_months", parse_whole)?;

    let status = match present(&form.status) {
        Some(text) => text
            .parse::<LoanStatus>()
            .map_err(|e| AppError::Validation(FieldErrors::single("status", e.to_string())))?,
        None => LoanStatus::default(),
    };

    Ok(LoanRecord {
        amount,
        interest_rate,
        term_months,
        purpose: present(&form.purpose).map(str::to_string),
        status,
        monthly_payment: optional(&form.monthly_payment, "monthly_payment", parse_number)?,
        total_interest: optional(&form.total_interest, "total_interest", parse_number)?,
        total_amount: optional(&form.total_amount, "total_amount", parse_number)?,
        start_date: optional(&form.start_date, "start_date", parse_date)?,
        end_date: optional(&form.end_date, "end_date", parse_date)?,
    })
}

fn required<T>(value: &str, field: &'static str, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
    parse(value).ok_or_else(|| unparsable(field))
}

fn optional<T>(
    value: &Option<String>,
    field: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>> {
    present(value)
        .map(|text| parse(text).ok_or_else(|| unparsable(field)))
        .transpose()
}

fn unparsable(field: &'static str) -> AppError {
    AppError::Validation(FieldErrors::single(field, "Value could not be parsed"))
}

/// Initial values for the edit form: a stored loan rendered back into form text.
impl From<&Loan> for LoanForm {
    fn from(loan: &Loan) -> Self {
        Self {
            amount: loan.amount.to_string(),
            interest_rate: loan.interest_rate.to_string(),
            term_months: loan.term_months.to_string(),
            purpose: Some(loan.purpose.clone().unwrap_or_default()),
            status: Some(loan.status.as_str().to_string()),
            monthly_payment: Some(number_text(loan.monthly_payment)),
            total_interest: Some(number_text(loan.total_interest)),
            total_amount: Some(number_text(loan.total_amount)),
            start_date: Some(
                loan.start_date
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            end_date: Some(
                loan.end_date
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
        }
    }
}

fn number_text(value: Option<f64>) -> String {
    value.map(|number| number.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::loan::validate_loan_form;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn valid(form: LoanForm) -> ValidLoanForm {
        validate_loan_form(form).expect("form should be valid")
    }

    fn reference_form() -> LoanForm {
        LoanForm {
            amount: "25000".to_string(),
            interest_rate: "7.5".to_string(),
            term_months: "60".to_string(),
            status: Some("PENDING".to_string()),
            ..LoanForm::default()
        }
    }

    #[test]
    fn converts_required_fields_to_numbers() {
        let record = to_record(valid(reference_form())).unwrap();
        assert_eq!(record.amount, 25000.0);
        assert_eq!(record.interest_rate, 7.5);
        assert_eq!(record.term_months, 60);
        assert_eq!(record.status, LoanStatus::Pending);
    }

    #[test]
    fn blank_optionals_become_absent() {
        let mut form = reference_form();
        form.purpose = Some("   ".to_string());
        form.status = Some(String::new());
        form.monthly_payment = Some(String::new());
        form.start_date = Some(String::new());

        let record = to_record(valid(form)).unwrap();
        assert_eq!(record.purpose, None);
        assert_eq!(record.status, LoanStatus::Pending);
        assert_eq!(record.monthly_payment, None);
        assert_eq!(record.total_interest, None);
        assert_eq!(record.start_date, None);
    }

    #[test]
    fn present_optionals_are_typed() {
        let mut form = reference_form();
        form.purpose = Some("Home renovation".to_string());
        form.status = Some("ACTIVE".to_string());
        form.monthly_payment = Some("500.95".to_string());
        form.total_interest = Some("0".to_string());
        form.total_amount = Some("30057".to_string());
        form.start_date = Some("2025-01-15".to_string());
        form.end_date = Some("2029-12-15T10:00:00+02:00".to_string());

        let record = to_record(valid(form)).unwrap();
        assert_eq!(record.purpose.as_deref(), Some("Home renovation"));
        assert_eq!(record.status, LoanStatus::Active);
        assert_eq!(record.monthly_payment, Some(500.95));
        assert_eq!(record.total_interest, Some(0.0));
        assert_eq!(record.total_amount, Some(30057.0));
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(record.end_date, NaiveDate::from_ymd_opt(2029, 12, 15));
    }

    #[test]
    fn edit_form_reproduces_a_valid_payload() {
        let mut form = reference_form();
        form.monthly_payment = Some("500.95".to_string());
        form.start_date = Some("2025-01-15".to_string());
        let record = to_record(valid(form)).unwrap();
        let loan = Loan::from_record(Uuid::new_v4(), Uuid::new_v4(), record.clone(), Utc::now());

        let initial = LoanForm::from(&loan);
        assert_eq!(initial.amount, "25000");
        assert_eq!(initial.interest_rate, "7.5");
        assert_eq!(initial.purpose.as_deref(), Some(""));
        assert_eq!(initial.total_amount.as_deref(), Some(""));
        assert_eq!(initial.start_date.as_deref(), Some("2025-01-15"));
        assert_eq!(initial.end_date.as_deref(), Some(""));

        assert_eq!(to_record(valid(initial)).unwrap(), record);
    }
}

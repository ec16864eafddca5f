use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::loan::{Loan, LoanRecord},
};

/// Owner-scoped loan persistence. Every lookup filters on both id and owner.
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Inserts a new loan owned by `user_id`.
    async fn insert(&self, id: Uuid, user_id: Uuid, record: &LoanRecord) -> Result<Loan>;

    /// Finds a loan by id, if it belongs to `user_id`.
    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<Loan>>;

    /// Lists the loans of `user_id`, newest first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Loan>>;

    /// Replaces every mutable field. `None` when no matching loan exists.
    async fn update(&self, id: Uuid, user_id: Uuid, record: &LoanRecord) -> Result<Option<Loan>>;

    /// Deletes a loan. `false` when no matching loan exists.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
}

const LOAN_COLUMNS: &str = "id, user_id, amount, interest_rate, term_months, purpose, status, \
     monthly_payment, total_interest, total_amount, start_date, end_date, created_at, updated_at";

/// PostgreSQL implementation of `LoanStore`.
#[derive(Clone)]
pub struct PgLoanStore {
    pool: Pool,
}

impl PgLoanStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStore for PgLoanStore {
    async fn insert(&self, id: Uuid, user_id: Uuid, record: &LoanRecord) -> Result<Loan> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                &format!(
                    r#"
                    INSERT INTO loans (
                        id, user_id, amount, interest_rate, term_months, purpose, status,
                        monthly_payment, total_interest, total_amount, start_date, end_date
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    RETURNING {}
                    "#,
                    LOAN_COLUMNS
                ),
                &[
                    &id,
                    &user_id,
                    &record.amount,
                    &record.interest_rate,
                    &record.term_months,
                    &record.purpose,
                    &record.status,
                    &record.monthly_payment,
                    &record.total_interest,
                    &record.total_amount,
                    &record.start_date,
                    &record.end_date,
                ],
            )
            .await?;
        Loan::try_from(&row)
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<Loan>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!(
                    "SELECT {} FROM loans WHERE id = $1 AND user_id = $2",
                    LOAN_COLUMNS
                ),
                &[&id, &user_id],
            )
            .await?;
        row.map(|r| Loan::try_from(&r)).transpose()
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Loan>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!(
                    "SELECT {} FROM loans WHERE user_id = $1 ORDER BY created_at DESC",
                    LOAN_COLUMNS
                ),
                &[&user_id],
            )
            .await?;
        rows.iter().map(Loan::try_from).collect()
    }

    async fn update(&self, id: Uuid, user_id: Uuid, record: &LoanRecord) -> Result<Option<Loan>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!(
                    r#"
                    UPDATE loans
                    SET
                        amount = $3,
                        interest_rate = $4,
                        term_months = $5,
                        purpose = $6,
                        status = $7,
                        monthly_payment = $8,
                        total_interest = $9,
                        total_amount = $10,
                        start_date = $11,
                        end_date = $12,
                        updated_at = NOW()
                    WHERE id = $1 AND user_id = $2
                    RETURNING {}
                    "#,
                    LOAN_COLUMNS
                ),
                &[
                    &id,
                    &user_id,
                    &record.amount,
                    &record.interest_rate,
                    &record.term_months,
                    &record.purpose,
                    &record.status,
                    &record.monthly_payment,
                    &record.total_interest,
                    &record.total_amount,
                    &record.start_date,
                    &record.end_date,
                ],
            )
            .await?;
        row.map(|r| Loan::try_from(&r)).transpose()
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute(
                "DELETE FROM loans WHERE id = $1 AND user_id = $2",
                &[&id, &user_id],
            )
            .await?;
        Ok(deleted > 0)
    }
}

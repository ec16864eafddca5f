//! Owner-scoped loan operations.
//!
//! Every operation resolves the caller first. Loans that do not exist and
//! loans owned by someone else are reported the same way, as `NotFound`.

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware_layer::auth::IdentityResolver;
use crate::models::loan::Loan;
use crate::repositories::loan::LoanStore;
use crate::serialization::loan::to_record;
use crate::validation::loan::{LoanForm, validate_loan_form};

/// Ids arrive as text; anything that is not a UUID cannot name a loan.
fn parse_loan_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| {
        tracing::debug!("Rejecting malformed loan id: {}", id);
        AppError::NotFound
    })
}

/// Creates a loan for the current user and returns its id.
pub async fn create_loan(
    store: &dyn LoanStore,
    identity: &dyn IdentityResolver,
    form: LoanForm,
) -> Result<Uuid> {
    let user_id = identity.current_user().await?;
    let record = to_record(validate_loan_form(form)?)?;

    let id = Uuid::new_v4();
    store.insert(id, user_id, &record).await?;

    tracing::info!("✅ Loan {} created for user {}", id, user_id);
    Ok(id)
}

/// Fetches one of the current user's loans.
pub async fn get_loan(
    store: &dyn LoanStore,
    identity: &dyn IdentityResolver,
    id: &str,
) -> Result<Loan> {
    let user_id = identity.current_user().await?;
    let id = parse_loan_id(id)?;

    store.find(id, user_id).await?.ok_or(AppError::NotFound)
}

/// The current user's loans, newest first.
pub async fn list_loans(
    store: &dyn LoanStore,
    identity: &dyn IdentityResolver,
) -> Result<Vec<Loan>> {
    let user_id = identity.current_user().await?;
    store.list(user_id).await
}

/// Replaces every mutable field of one of the current user's loans.
///
/// Ownership is checked before the payload is validated.
pub async fn update_loan(
    store: &dyn LoanStore,
    identity: &dyn IdentityResolver,
    id: &str,
    form: LoanForm,
) -> Result<Loan> {
    let user_id = identity.current_user().await?;
    let id = parse_loan_id(id)?;

    if store.find(id, user_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let record = to_record(validate_loan_form(form)?)?;
    let loan = store
        .update(id, user_id, &record)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!("✅ Loan {} updated by user {}", id, user_id);
    Ok(loan)
}

/// Deletes one of the current user's loans.
pub async fn delete_loan(
    store: &dyn LoanStore,
    identity: &dyn IdentityResolver,
    id: &str,
) -> Result<()> {
    let user_id = identity.current_user().await?;
    let id = parse_loan_id(id)?;

    if !store.delete(id, user_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("🗑️ Loan {} deleted by user {}", id, user_id);
    Ok(())
}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::Result,
    handlers::extract::AppJson,
    middleware_layer::auth::SessionIdentity,
    models::loan::Loan,
    services::loans as loan_service,
    state::AppState,
    validation::loan::LoanForm,
    views::loan::{LoanRow, LoanView},
};

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
    pub message: String,
}

/// A loan together with its display rendering.
#[derive(Serialize)]
pub struct LoanResponse {
    pub loan: Loan,
    pub view: LoanView,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        let view = LoanView::from(&loan);
        Self { loan, view }
    }
}

#[derive(Serialize)]
pub struct ListResponse {
    pub loans: Vec<LoanRow>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Lists the caller's loans as dashboard rows.
pub async fn list_loans(
    State(state): State<AppState>,
    identity: SessionIdentity,
) -> Result<Json<ListResponse>> {
    let loans = loan_service::list_loans(state.loans.as_ref(), &identity).await?;
    Ok(Json(ListResponse {
        loans: loans.iter().map(LoanRow::from).collect(),
    }))
}

pub async fn create_loan(
    State(state): State<AppState>,
    identity: SessionIdentity,
    AppJson(form): AppJson<LoanForm>,
) -> Result<Response> {
    let id = loan_service::create_loan(state.loans.as_ref(), &identity, form).await?;
    let response = CreatedResponse {
        id,
        message: "Loan created successfully".to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

pub async fn get_loan(
    State(state): State<AppState>,
    identity: SessionIdentity,
    Path(id): Path<String>,
) -> Result<Json<LoanResponse>> {
    let loan = loan_service::get_loan(state.loans.as_ref(), &identity, &id).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// Initial values for the edit form.
pub async fn edit_form(
    State(state): State<AppState>,
    identity: SessionIdentity,
    Path(id): Path<String>,
) -> Result<Json<LoanForm>> {
    let loan = loan_service::get_loan(state.loans.as_ref(), &identity, &id).await?;
    Ok(Json(LoanForm::from(&loan)))
}

pub async fn update_loan(
    State(state): State<AppState>,
    identity: SessionIdentity,
    Path(id): Path<String>,
    AppJson(form): AppJson<LoanForm>,
) -> Result<Json<LoanResponse>> {
    let loan = loan_service::update_loan(state.loans.as_ref(), &identity, &id, form).await?;
    Ok(Json(LoanResponse::from(loan)))
}

pub async fn delete_loan(
    State(state): State<AppState>,
    identity: SessionIdentity,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    loan_service::delete_loan(state.loans.as_ref(), &identity, &id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Loan deleted successfully".to_string(),
    }))
}

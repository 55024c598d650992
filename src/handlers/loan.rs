//! Loan API handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::loan::{CreateLoanRequest, Loan, LoanPatch, LoanService};

/// List all loans, newest first
pub async fn list_loans(State(service): State<Arc<LoanService>>) -> ApiResult<Json<Vec<Loan>>> {
    let loans = service.list_loans().await?;
    Ok(Json(loans))
}

/// Get a single loan with its special payments
pub async fn get_loan(
    State(service): State<Arc<LoanService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Loan>> {
    let loan = service.get_loan(&id).await?;
    Ok(Json(loan))
}

/// Create a new loan
pub async fn create_loan(
    State(service): State<Arc<LoanService>>,
    payload: Result<Json<CreateLoanRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Loan>)> {
    let Json(request) = payload?;

    let loan = request.into_loan(Uuid::new_v4().to_string())?;
    let created = service.create_loan(loan).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Partially update a loan. Fields missing from the body keep their value.
pub async fn update_loan(
    State(service): State<Arc<LoanService>>,
    Path(id): Path<String>,
    payload: Result<Json<LoanPatch>, JsonRejection>,
) -> ApiResult<Json<Loan>> {
    // Unknown loans are reported before the body is looked at
    let existing = service.get_loan(&id).await?;
    let Json(patch) = payload?;

    if patch.is_empty() {
        return Ok(Json(existing));
    }

    let merged = patch.merge_into(existing)?;
    let updated = service.update_loan(merged).await?;

    Ok(Json(updated))
}

/// Delete a loan and its special payments
pub async fn delete_loan(
    State(service): State<Arc<LoanService>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    service.delete_loan(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Special payment API handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::loan::{CreateSpecialPaymentRequest, LoanService, SpecialPayment};

/// List the special payments of a loan, ascending by date
pub async fn list_special_payments(
    State(service): State<Arc<LoanService>>,
    Path(loan_id): Path<String>,
) -> ApiResult<Json<Vec<SpecialPayment>>> {
    if !service.loan_exists(&loan_id).await? {
        return Err(ApiError::NotFound("loan not found".to_string()));
    }

    let payments = service.list_special_payments(&loan_id).await?;
    Ok(Json(payments))
}

/// Record a special payment for a loan
pub async fn create_special_payment(
    State(service): State<Arc<LoanService>>,
    Path(loan_id): Path<String>,
    payload: Result<Json<CreateSpecialPaymentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SpecialPayment>)> {
    let Json(request) = payload?;

    let payment = request.into_payment(Uuid::new_v4().to_string(), loan_id)?;
    let mut created = service.create_special_payment(payment).await?;

    // The client addressed the loan in the path already
    created.loan_id.clear();

    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete a special payment of a loan
pub async fn delete_special_payment(
    State(service): State<Arc<LoanService>>,
    Path((loan_id, payment_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    service.delete_special_payment(&loan_id, &payment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

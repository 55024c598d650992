//! Loan route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/loans", get(list_loans).post(create_loan))
        .route(
            "/loans/:id",
            get(get_loan).put(update_loan).delete(delete_loan),
        )
}

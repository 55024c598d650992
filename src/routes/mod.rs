//! Route definitions for the Baufi API

mod loan;
mod special_payment;

use axum::{routing::get, Router};

use crate::handlers::{api_not_found, health_check};
use crate::state::AppState;

pub use loan::loan_routes;
pub use special_payment::special_payment_routes;

/// Every route under `/api`. Unknown API paths get a JSON 404 instead of
/// falling through to the static UI.
pub fn api_routes() -> Router<AppState> {
    let api = Router::new()
        .merge(loan_routes())
        .merge(special_payment_routes())
        .fallback(api_not_found);

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_check))
}

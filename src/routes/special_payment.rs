//! Special payment route definitions

use axum::{
    routing::{delete, get},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn special_payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/loans/:id/special-payments",
            get(list_special_payments).post(create_special_payment),
        )
        .route(
            "/loans/:id/special-payments/:payment_id",
            delete(delete_special_payment),
        )
}

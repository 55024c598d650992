//! Application state shared across handlers

use std::sync::Arc;

use crate::db::Database;
use crate::loan::LoanService;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub loan_service: Arc<LoanService>,
    pub database: Database,
}

impl AppState {
    pub fn new(database: Database) -> Self {
        Self {
            loan_service: Arc::new(LoanService::new(database.clone())),
            database,
        }
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.database.clone()
    }
}

//! Loan domain module
//!
//! Contains models, validation rules, and the service that persists loans
//! and their special payments.

mod model;
mod service;
pub mod validation;

pub use model::*;
pub use service::LoanService;

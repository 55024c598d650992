//! API handlers for the Baufi server

pub mod health;
pub mod loan;
pub mod special_payment;

pub use health::{api_not_found, health_check};
pub use loan::*;
pub use special_payment::*;

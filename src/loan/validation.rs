//! Field rules for loans and special payments
//!
//! Pure functions: nothing in here touches the database. Two loan modes exist.
//! Strict mode (create) checks every field. Lenient mode (update) checks only
//! the fields present in a [`LoanPatch`]; each present field gets the same
//! rule as in strict mode.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::loan::model::{CreateLoanRequest, Loan, LoanPatch, RepaymentType, SpecialPayment};

pub const MIN_INTEREST_RATE: f64 = 0.0;
pub const MAX_INTEREST_RATE: f64 = 20.0;
pub const MIN_FIXED_INTEREST_YEARS: i32 = 1;
pub const MAX_FIXED_INTEREST_YEARS: i32 = 50;

fn fail<T>(message: &str) -> Result<T, ValidationError> {
    Err(ValidationError::new(message))
}

/// True for `YYYY-MM-DD` strings naming a real calendar day
pub fn is_valid_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });

    shape_ok && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

pub fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return fail("name is required");
    }
    Ok(())
}

pub fn check_amount(amount: f64) -> Result<(), ValidationError> {
    if !is_positive(amount) {
        return fail("amount must be > 0");
    }
    Ok(())
}

pub fn check_interest_rate(rate: f64) -> Result<(), ValidationError> {
    if !(MIN_INTEREST_RATE..=MAX_INTEREST_RATE).contains(&rate) {
        return fail("interestRate must be between 0 and 20");
    }
    Ok(())
}

pub fn check_start_date(date: &str) -> Result<(), ValidationError> {
    if !is_valid_date(date) {
        return fail("startDate must be in YYYY-MM-DD format");
    }
    Ok(())
}

pub fn check_fixed_interest_years(years: i32) -> Result<(), ValidationError> {
    if !(MIN_FIXED_INTEREST_YEARS..=MAX_FIXED_INTEREST_YEARS).contains(&years) {
        return fail("fixedInterestYears must be between 1 and 50");
    }
    Ok(())
}

pub fn check_repayment_value(value: f64) -> Result<(), ValidationError> {
    if !is_positive(value) {
        return fail("repaymentValue must be > 0");
    }
    Ok(())
}

pub fn check_payment_date(date: &str) -> Result<(), ValidationError> {
    if date.is_empty() {
        return fail("date is required");
    }
    if !is_valid_date(date) {
        return fail("date must be in YYYY-MM-DD format");
    }
    Ok(())
}

pub fn check_payment_amount(amount: f64) -> Result<(), ValidationError> {
    check_amount(amount)
}

/// Strict check of a create request. Returns the parsed repayment type.
pub fn validate_create(request: &CreateLoanRequest) -> Result<RepaymentType, ValidationError> {
    check_name(&request.name)?;
    check_amount(request.amount)?;
    check_interest_rate(request.interest_rate)?;
    check_start_date(&request.start_date)?;
    check_fixed_interest_years(request.fixed_interest_years)?;
    let repayment_type = request.repayment_type.parse::<RepaymentType>()?;
    check_repayment_value(request.repayment_value)?;
    Ok(repayment_type)
}

/// Strict check of a fully built loan, run by the service before any write
pub fn validate_loan(loan: &Loan) -> Result<(), ValidationError> {
    check_name(&loan.name)?;
    check_amount(loan.amount)?;
    check_interest_rate(loan.interest_rate)?;
    check_start_date(&loan.start_date)?;
    check_fixed_interest_years(loan.fixed_interest_years)?;
    check_repayment_value(loan.repayment_value)?;
    Ok(())
}

/// Check of a special payment before insert
pub fn validate_special_payment(payment: &SpecialPayment) -> Result<(), ValidationError> {
    check_payment_date(&payment.date)?;
    check_payment_amount(payment.amount)
}

/// Lenient check of a partial update. Returns the parsed repayment type if
/// one was supplied.
pub fn validate_patch(patch: &LoanPatch) -> Result<Option<RepaymentType>, ValidationError> {
    if let Some(name) = &patch.name {
        check_name(name)?;
    }
    if let Some(amount) = patch.amount {
        check_amount(amount)?;
    }
    if let Some(rate) = patch.interest_rate {
        check_interest_rate(rate)?;
    }
    if let Some(date) = &patch.start_date {
        check_start_date(date)?;
    }
    if let Some(years) = patch.fixed_interest_years {
        check_fixed_interest_years(years)?;
    }
    let repayment_type = patch
        .repayment_type
        .as_deref()
        .map(str::parse::<RepaymentType>)
        .transpose()?;
    if let Some(value) = patch.repayment_value {
        check_repayment_value(value)?;
    }
    Ok(repayment_type)
}

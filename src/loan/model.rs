//! Loan and special payment models

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::loan::validation;

/// How the regular repayment value is interpreted
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum RepaymentType {
    /// Initial repayment rate in percent per year
    Percentage,
    /// Fixed monthly installment
    Absolute,
}

impl FromStr for RepaymentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERCENTAGE" => Ok(RepaymentType::Percentage),
            "ABSOLUTE" => Ok(RepaymentType::Absolute),
            _ => Err(ValidationError::new(
                "repaymentType must be PERCENTAGE or ABSOLUTE",
            )),
        }
    }
}

/// Mortgage loan with its special payments
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub interest_rate: f64, // percent
    pub start_date: String, // YYYY-MM-DD
    pub fixed_interest_years: i32,
    pub repayment_type: RepaymentType,
    pub repayment_value: f64,
    /// Loaded from `special_payments`, ascending by date
    #[sqlx(skip)]
    #[serde(default)]
    pub special_payments: Vec<SpecialPayment>,
    pub created_at: String,
    pub updated_at: String,
}

/// Extra out-of-schedule payment (Sondertilgung) against a loan
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpecialPayment {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub loan_id: String,
    pub date: String, // YYYY-MM-DD
    pub amount: f64,
    /// Stored as NULL when absent, never as an empty string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request to create a new loan
///
/// Missing fields deserialize to their zero value and are then rejected by
/// validation with a field-specific message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateLoanRequest {
    pub name: String,
    pub amount: f64,
    pub interest_rate: f64,
    pub start_date: String,
    pub fixed_interest_years: i32,
    pub repayment_type: String,
    pub repayment_value: f64,
}

impl CreateLoanRequest {
    /// Validate every field and build the loan to insert under `id`
    pub fn into_loan(self, id: String) -> Result<Loan, ValidationError> {
        let repayment_type = validation::validate_create(&self)?;

        Ok(Loan {
            id,
            name: self.name,
            amount: self.amount,
            interest_rate: self.interest_rate,
            start_date: self.start_date,
            fixed_interest_years: self.fixed_interest_years,
            repayment_type,
            repayment_value: self.repayment_value,
            special_payments: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        })
    }
}

/// Partial update of a loan: absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanPatch {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub interest_rate: Option<f64>,
    pub start_date: Option<String>,
    pub fixed_interest_years: Option<i32>,
    pub repayment_type: Option<String>,
    pub repayment_value: Option<f64>,
}

impl LoanPatch {
    /// Validate the supplied fields and apply them on top of `existing`
    pub fn merge_into(self, existing: Loan) -> Result<Loan, ValidationError> {
        let repayment_type = validation::validate_patch(&self)?;

        Ok(Loan {
            name: self.name.unwrap_or(existing.name),
            amount: self.amount.unwrap_or(existing.amount),
            interest_rate: self.interest_rate.unwrap_or(existing.interest_rate),
            start_date: self.start_date.unwrap_or(existing.start_date),
            fixed_interest_years: self
                .fixed_interest_years
                .unwrap_or(existing.fixed_interest_years),
            repayment_type: repayment_type.unwrap_or(existing.repayment_type),
            repayment_value: self.repayment_value.unwrap_or(existing.repayment_value),
            ..existing
        })
    }

    /// Whether the patch carries no field at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.amount.is_none()
            && self.interest_rate.is_none()
            && self.start_date.is_none()
            && self.fixed_interest_years.is_none()
            && self.repayment_type.is_none()
            && self.repayment_value.is_none()
    }
}

/// Request to record a special payment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSpecialPaymentRequest {
    pub date: String,
    pub amount: f64,
    pub note: Option<String>,
}

impl CreateSpecialPaymentRequest {
    /// Validate and build the payment to insert under `loan_id`
    pub fn into_payment(self, id: String, loan_id: String) -> Result<SpecialPayment, ValidationError> {
        let payment = SpecialPayment {
            id,
            loan_id,
            date: self.date,
            amount: self.amount,
            note: self.note.filter(|note| !note.is_empty()),
            created_at: String::new(),
            updated_at: String::new(),
        };
        validation::validate_special_payment(&payment)?;
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_loan() -> Loan {
        Loan {
            id: "loan-1".to_string(),
            name: "Haus".to_string(),
            amount: 300_000.0,
            interest_rate: 3.5,
            start_date: "2024-01-01".to_string(),
            fixed_interest_years: 10,
            repayment_type: RepaymentType::Percentage,
            repayment_value: 2.0,
            special_payments: Vec::new(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_loan_wire_format() {
        let value = serde_json::to_value(sample_loan()).unwrap();
        assert_eq!(value["interestRate"], json!(3.5));
        assert_eq!(value["startDate"], json!("2024-01-01"));
        assert_eq!(value["fixedInterestYears"], json!(10));
        assert_eq!(value["repaymentType"], json!("PERCENTAGE"));
        assert_eq!(value["specialPayments"], json!([]));
        assert_eq!(value["createdAt"], json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_payment_omits_empty_loan_id_and_note() {
        let payment = SpecialPayment {
            id: "p1".to_string(),
            loan_id: String::new(),
            date: "2024-06-01".to_string(),
            amount: 5000.0,
            note: None,
            created_at: "t".to_string(),
            updated_at: "t".to_string(),
        };
        let value = serde_json::to_value(&payment).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("loanId"));
        assert!(!object.contains_key("note"));

        let with_parent = SpecialPayment {
            loan_id: "loan-1".to_string(),
            note: Some("Bonus".to_string()),
            ..payment
        };
        let value = serde_json::to_value(&with_parent).unwrap();
        assert_eq!(value["loanId"], json!("loan-1"));
        assert_eq!(value["note"], json!("Bonus"));
    }

    #[test]
    fn test_repayment_type_parsing() {
        assert_eq!("PERCENTAGE".parse::<RepaymentType>().unwrap(), RepaymentType::Percentage);
        assert_eq!("ABSOLUTE".parse::<RepaymentType>().unwrap(), RepaymentType::Absolute);
        assert!("percentage".parse::<RepaymentType>().is_err());
        assert!("FOO".parse::<RepaymentType>().is_err());
    }

    #[test]
    fn test_create_request_missing_fields_fail_validation() {
        let request: CreateLoanRequest = serde_json::from_value(json!({"name": "Haus"})).unwrap();
        let err = request.into_loan("id".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "amount must be > 0");
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let patch: LoanPatch = serde_json::from_value(json!({"name": "Wohnung"})).unwrap();
        let merged = patch.merge_into(sample_loan()).unwrap();
        assert_eq!(merged.name, "Wohnung");
        assert_eq!(merged.amount, 300_000.0);
        assert_eq!(merged.repayment_type, RepaymentType::Percentage);
        assert_eq!(merged.created_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_patch_can_reset_interest_rate_to_zero() {
        let patch: LoanPatch = serde_json::from_value(json!({"interestRate": 0})).unwrap();
        let merged = patch.merge_into(sample_loan()).unwrap();
        assert_eq!(merged.interest_rate, 0.0);
    }

    #[test]
    fn test_patch_rejects_explicit_zero_amount() {
        let patch: LoanPatch = serde_json::from_value(json!({"amount": 0})).unwrap();
        let err = patch.merge_into(sample_loan()).unwrap_err();
        assert_eq!(err.to_string(), "amount must be > 0");
    }

    #[test]
    fn test_patch_changes_repayment_type() {
        let patch: LoanPatch =
            serde_json::from_value(json!({"repaymentType": "ABSOLUTE", "repaymentValue": 1200}))
                .unwrap();
        let merged = patch.merge_into(sample_loan()).unwrap();
        assert_eq!(merged.repayment_type, RepaymentType::Absolute);
        assert_eq!(merged.repayment_value, 1200.0);
    }

    #[test]
    fn test_payment_request_empty_note_becomes_none() {
        let request = CreateSpecialPaymentRequest {
            date: "2024-06-01".to_string(),
            amount: 5000.0,
            note: Some(String::new()),
        };
        let payment = request
            .into_payment("p1".to_string(), "loan-1".to_string())
            .unwrap();
        assert_eq!(payment.note, None);
        assert_eq!(payment.loan_id, "loan-1");
    }
}

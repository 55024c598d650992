//! Loan service layer - persistence of loans and special payments
//!
//! Every successful mutation is committed and then checkpointed before the
//! call returns. Every write is the first statement of its transaction, so
//! concurrent writers queue on the busy timeout instead of failing.

use chrono::{SecondsFormat, Utc};
use sqlx::error::DatabaseError as _;
use sqlx::SqliteConnection;

use crate::db::Database;
use crate::error::{StoreError, StoreResult, ValidationError};
use crate::loan::model::{Loan, SpecialPayment};
use crate::loan::validation;

const SELECT_LOANS: &str = r#"
    SELECT id, name, amount, interest_rate, start_date, fixed_interest_years,
           repayment_type, repayment_value, created_at, updated_at
    FROM loans
    ORDER BY created_at DESC, rowid DESC
"#;

const SELECT_LOAN: &str = r#"
    SELECT id, name, amount, interest_rate, start_date, fixed_interest_years,
           repayment_type, repayment_value, created_at, updated_at
    FROM loans
    WHERE id = ?
"#;

const SELECT_LOAN_EXISTS: &str = "SELECT 1 FROM loans WHERE id = ?";

const SELECT_PAYMENTS: &str = r#"
    SELECT id, loan_id, date, amount, note, created_at, updated_at
    FROM special_payments
    WHERE loan_id = ?
    ORDER BY date ASC, created_at ASC, rowid ASC
"#;

const INSERT_LOAN: &str = r#"
    INSERT INTO loans (id, name, amount, interest_rate, start_date, fixed_interest_years,
                       repayment_type, repayment_value, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

// updated_at never drops below created_at, even if the clock went backwards
const UPDATE_LOAN: &str = r#"
    UPDATE loans
    SET name = ?, amount = ?, interest_rate = ?, start_date = ?,
        fixed_interest_years = ?, repayment_type = ?, repayment_value = ?,
        updated_at = MAX(?, created_at)
    WHERE id = ?
"#;

const DELETE_LOAN_PAYMENTS: &str = "DELETE FROM special_payments WHERE loan_id = ?";

const DELETE_LOAN: &str = "DELETE FROM loans WHERE id = ?";

// Writes first: a deferred read-then-write transaction cannot wait for the
// write lock in WAL mode and fails with SQLITE_BUSY under concurrent writers.
const INSERT_PAYMENT: &str = r#"
    INSERT INTO special_payments (id, loan_id, date, amount, note, created_at, updated_at)
    SELECT ?, ?, ?, ?, ?, ?, ?
    WHERE EXISTS (SELECT 1 FROM loans WHERE id = ?)
"#;

const DELETE_PAYMENT: &str = "DELETE FROM special_payments WHERE id = ? AND loan_id = ?";

/// Current time in the fixed, sortable format used for `created_at`/`updated_at`
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Loan service for managing loans and their special payments
#[derive(Clone)]
pub struct LoanService {
    db: Database,
}

impl LoanService {
    /// Create a new loan service on top of an initialized database
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// All loans, newest first, each with its special payments
    pub async fn list_loans(&self) -> StoreResult<Vec<Loan>> {
        const OP: &str = "list_loans";

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(StoreError::database(OP, "*"))?;

        self.db.log_query(SELECT_LOANS, &[]);
        let mut loans = sqlx::query_as::<_, Loan>(SELECT_LOANS)
            .fetch_all(&mut *tx)
            .await
            .map_err(StoreError::database(OP, "*"))?;

        for loan in &mut loans {
            loan.special_payments = self
                .fetch_payments(&mut tx, &loan.id)
                .await
                .map_err(StoreError::database(OP, loan.id.as_str()))?;
        }

        tx.commit().await.map_err(StoreError::database(OP, "*"))?;

        Ok(loans)
    }

    /// Get loan by ID, with its special payments
    pub async fn get_loan(&self, id: &str) -> StoreResult<Loan> {
        const OP: &str = "get_loan";

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(StoreError::database(OP, id))?;

        let loan = self
            .fetch_loan(&mut tx, id)
            .await
            .map_err(StoreError::database(OP, id))?
            .ok_or_else(|| StoreError::NotFound {
                loan_id: id.to_string(),
            })?;

        tx.commit().await.map_err(StoreError::database(OP, id))?;

        Ok(loan)
    }

    /// Whether a loan with this ID exists
    pub async fn loan_exists(&self, id: &str) -> StoreResult<bool> {
        self.db.log_query(SELECT_LOAN_EXISTS, &[&id]);
        let found = sqlx::query_scalar::<_, i64>(SELECT_LOAN_EXISTS)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(StoreError::database("loan_exists", id))?;

        Ok(found.is_some())
    }

    /// Insert a new loan. The caller assigns the ID; timestamps are set here.
    pub async fn create_loan(&self, mut loan: Loan) -> StoreResult<Loan> {
        const OP: &str = "create_loan";

        if loan.id.is_empty() {
            return Err(ValidationError::new("id is required").into());
        }
        validation::validate_loan(&loan)?;

        let now = timestamp_now();

        self.db.log_query(
            INSERT_LOAN,
            &[
                &loan.id,
                &loan.name,
                &loan.amount,
                &loan.interest_rate,
                &loan.start_date,
                &loan.fixed_interest_years,
                &loan.repayment_type,
                &loan.repayment_value,
                &now,
                &now,
            ],
        );
        sqlx::query(INSERT_LOAN)
            .bind(&loan.id)
            .bind(&loan.name)
            .bind(loan.amount)
            .bind(loan.interest_rate)
            .bind(&loan.start_date)
            .bind(loan.fixed_interest_years)
            .bind(loan.repayment_type)
            .bind(loan.repayment_value)
            .bind(&now)
            .bind(&now)
            .execute(self.db.pool())
            .await
            .map_err(StoreError::database(OP, loan.id.as_str()))?;

        self.checkpoint(OP, &loan.id).await?;

        loan.created_at = now.clone();
        loan.updated_at = now;
        loan.special_payments = Vec::new();

        tracing::info!(loan_id = %loan.id, "Loan created");
        Ok(loan)
    }

    /// Replace every mutable field of an existing loan.
    ///
    /// Partial updates are merged by the caller (see `LoanPatch`) before this
    /// is called. Returns the stored loan with its special payments.
    pub async fn update_loan(&self, loan: Loan) -> StoreResult<Loan> {
        const OP: &str = "update_loan";
        let id = loan.id.as_str();

        validation::validate_loan(&loan)?;

        let now = timestamp_now();

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(StoreError::database(OP, id))?;

        self.db.log_query(
            UPDATE_LOAN,
            &[
                &loan.name,
                &loan.amount,
                &loan.interest_rate,
                &loan.start_date,
                &loan.fixed_interest_years,
                &loan.repayment_type,
                &loan.repayment_value,
                &now,
                &id,
            ],
        );
        let result = sqlx::query(UPDATE_LOAN)
            .bind(&loan.name)
            .bind(loan.amount)
            .bind(loan.interest_rate)
            .bind(&loan.start_date)
            .bind(loan.fixed_interest_years)
            .bind(loan.repayment_type)
            .bind(loan.repayment_value)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database(OP, id))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                loan_id: id.to_string(),
            });
        }

        let updated = self
            .fetch_loan(&mut tx, id)
            .await
            .map_err(StoreError::database(OP, id))?
            .ok_or_else(|| StoreError::NotFound {
                loan_id: id.to_string(),
            })?;

        tx.commit().await.map_err(StoreError::database(OP, id))?;

        self.checkpoint(OP, id).await?;

        tracing::info!(loan_id = %id, "Loan updated");
        Ok(updated)
    }

    /// Delete a loan together with all of its special payments
    pub async fn delete_loan(&self, id: &str) -> StoreResult<()> {
        const OP: &str = "delete_loan";

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(StoreError::database(OP, id))?;

        // Children first; the schema cascades as well but this does not rely on it
        self.db.log_query(DELETE_LOAN_PAYMENTS, &[&id]);
        let payments = sqlx::query(DELETE_LOAN_PAYMENTS)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database(OP, id))?;

        self.db.log_query(DELETE_LOAN, &[&id]);
        let result = sqlx::query(DELETE_LOAN)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database(OP, id))?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the child delete
            return Err(StoreError::NotFound {
                loan_id: id.to_string(),
            });
        }

        tx.commit().await.map_err(StoreError::database(OP, id))?;

        self.checkpoint(OP, id).await?;

        tracing::info!(
            loan_id = %id,
            special_payments = payments.rows_affected(),
            "Loan deleted"
        );
        Ok(())
    }

    /// Special payments of a loan, ascending by date. Empty for unknown loans.
    pub async fn list_special_payments(&self, loan_id: &str) -> StoreResult<Vec<SpecialPayment>> {
        let mut conn = self
            .db
            .pool()
            .acquire()
            .await
            .map_err(StoreError::database("list_special_payments", loan_id))?;

        self.fetch_payments(&mut conn, loan_id)
            .await
            .map_err(StoreError::database("list_special_payments", loan_id))
    }

    /// Record a special payment against an existing loan
    pub async fn create_special_payment(
        &self,
        mut payment: SpecialPayment,
    ) -> StoreResult<SpecialPayment> {
        const OP: &str = "create_special_payment";

        if payment.id.is_empty() {
            return Err(ValidationError::new("id is required").into());
        }
        validation::validate_special_payment(&payment)?;

        // NULL, not '', when there is no note
        payment.note = payment.note.filter(|note| !note.is_empty());

        let loan_id = payment.loan_id.clone();
        let now = timestamp_now();

        self.db.log_query(
            INSERT_PAYMENT,
            &[
                &payment.id,
                &loan_id,
                &payment.date,
                &payment.amount,
                &payment.note,
                &now,
                &now,
                &loan_id,
            ],
        );
        let inserted = sqlx::query(INSERT_PAYMENT)
            .bind(&payment.id)
            .bind(&loan_id)
            .bind(&payment.date)
            .bind(payment.amount)
            .bind(payment.note.as_deref())
            .bind(&now)
            .bind(&now)
            .bind(&loan_id)
            .execute(self.db.pool())
            .await;

        match inserted {
            Ok(result) if result.rows_affected() == 0 => {
                return Err(StoreError::LoanNotFound { loan_id });
            }
            Ok(_) => {}
            // Parent deleted while the insert was running
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                return Err(StoreError::LoanNotFound { loan_id });
            }
            Err(e) => return Err(StoreError::database(OP, payment.id.as_str())(e)),
        }

        self.checkpoint(OP, &payment.id).await?;

        payment.created_at = now.clone();
        payment.updated_at = now;

        tracing::info!(loan_id = %loan_id, payment_id = %payment.id, "Special payment created");
        Ok(payment)
    }

    /// Delete a special payment, scoped to the loan it belongs to
    pub async fn delete_special_payment(&self, loan_id: &str, payment_id: &str) -> StoreResult<()> {
        const OP: &str = "delete_special_payment";

        self.db.log_query(DELETE_PAYMENT, &[&payment_id, &loan_id]);
        let result = sqlx::query(DELETE_PAYMENT)
            .bind(payment_id)
            .bind(loan_id)
            .execute(self.db.pool())
            .await
            .map_err(StoreError::database(OP, payment_id))?;

        if result.rows_affected() == 0 {
            // Nothing was deleted; tell a missing loan apart from a missing payment
            return if self.loan_exists(loan_id).await? {
                Err(StoreError::PaymentNotFound {
                    loan_id: loan_id.to_string(),
                    payment_id: payment_id.to_string(),
                })
            } else {
                Err(StoreError::LoanNotFound {
                    loan_id: loan_id.to_string(),
                })
            };
        }

        self.checkpoint(OP, payment_id).await?;

        tracing::info!(loan_id = %loan_id, payment_id = %payment_id, "Special payment deleted");
        Ok(())
    }

    async fn fetch_loan(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<Option<Loan>, sqlx::Error> {
        self.db.log_query(SELECT_LOAN, &[&id]);
        let loan = sqlx::query_as::<_, Loan>(SELECT_LOAN)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match loan {
            Some(mut loan) => {
                loan.special_payments = self.fetch_payments(conn, id).await?;
                Ok(Some(loan))
            }
            None => Ok(None),
        }
    }

    async fn fetch_payments(
        &self,
        conn: &mut SqliteConnection,
        loan_id: &str,
    ) -> Result<Vec<SpecialPayment>, sqlx::Error> {
        self.db.log_query(SELECT_PAYMENTS, &[&loan_id]);
        sqlx::query_as::<_, SpecialPayment>(SELECT_PAYMENTS)
            .bind(loan_id)
            .fetch_all(&mut *conn)
            .await
    }

    async fn checkpoint(&self, operation: &'static str, entity_id: &str) -> StoreResult<()> {
        self.db
            .checkpoint()
            .await
            .map_err(|source| StoreError::Checkpoint {
                operation,
                entity_id: entity_id.to_string(),
                source,
            })
    }
}

//! Table and index definitions

const CREATE_LOANS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS loans (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        amount REAL NOT NULL,
        interest_rate REAL NOT NULL,
        start_date TEXT NOT NULL,
        fixed_interest_years INTEGER NOT NULL,
        repayment_type TEXT NOT NULL,
        repayment_value REAL NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const CREATE_SPECIAL_PAYMENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS special_payments (
        id TEXT PRIMARY KEY,
        loan_id TEXT NOT NULL,
        date TEXT NOT NULL,
        amount REAL NOT NULL,
        note TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (loan_id) REFERENCES loans(id) ON DELETE CASCADE
    )
"#;

const CREATE_SPECIAL_PAYMENTS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_special_payments_loan_id ON special_payments(loan_id)";

/// Statements run in order when the database is opened. All are idempotent.
pub const SCHEMA_STATEMENTS: [&str; 3] = [
    CREATE_LOANS_TABLE,
    CREATE_SPECIAL_PAYMENTS_TABLE,
    CREATE_SPECIAL_PAYMENTS_INDEX,
];

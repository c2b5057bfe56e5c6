//! Error types for loan validation and data loading

use thiserror::Error;

/// Structurally invalid loan input.
///
/// This is the only error the amortization engine raises. Numeric edge cases
/// such as a zero interest rate or an overpaid loan are not errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidLoanError {
    #[error("principal must be positive, got {0}")]
    NonPositivePrincipal(f64),

    #[error("term must be at least one month")]
    NonPositiveTerm,

    #[error("interest rate must be between 0% and {max}%, got {rate}")]
    InterestRateOutOfRange { rate: f64, max: f64 },

    #[error("term of {0} months runs past the last representable date")]
    TermOutOfRange(u32),

    #[error("unknown repayment frequency: {0:?}")]
    UnknownFrequency(String),

    #[error("loan {0} has no start date")]
    MissingStartDate(String),
}

/// Errors raised while reading loans and repayments from CSV
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: invalid date {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: loan {loan_id}: {source}")]
    InvalidLoan {
        row: usize,
        loan_id: String,
        #[source]
        source: InvalidLoanError,
    },

    #[error("row {row}: repayment {repayment_id} amount must be positive, got {amount}")]
    NonPositiveRepayment {
        row: usize,
        repayment_id: String,
        amount: f64,
    },

    #[error("row {row}: repayment {repayment_id} references unknown loan {loan_id}")]
    UnknownLoan {
        row: usize,
        repayment_id: String,
        loan_id: String,
    },
}

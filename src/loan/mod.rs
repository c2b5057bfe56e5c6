//! Loan and repayment records and CSV loading

mod data;
pub mod loader;

pub use data::{Loan, LoanRole, Frequency, Repayment, MAX_INTEREST_RATE, sort_for_display, repayments_for_loan};
pub use loader::{load_loans, load_loans_from_reader, load_repayments, load_repayments_from_reader};

//! Loan Amortization - schedules and repayment progress for household loans
//!
//! This library provides:
//! - Level-payment amortization schedules for monthly, bi-monthly, quarterly and yearly loans
//! - Reconciliation of recorded repayments against the schedule
//! - Effective annual rate of a schedule
//! - Parallel batch evaluation of a whole household portfolio

pub mod error;
pub mod loan;
pub mod amortization;
pub mod portfolio;

// Re-export commonly used types
pub use error::{InvalidLoanError, LoadError};
pub use loan::{Loan, LoanRole, Frequency, Repayment};
pub use amortization::{
    generate_schedule, derive_progress, AmortizationSchedule, ScheduleEntry, ProgressSummary, LoanStatus,
};
pub use portfolio::{PortfolioRunner, PortfolioResult, LoanReport};

//! Amortization engine: schedule generation and repayment progress

mod state;
mod engine;
mod progress;
mod rate;

pub use engine::{generate_schedule, AmortizationSchedule, ScheduleEntry};
pub use progress::{derive_progress, derive_progress_with, LoanStatus, ProgressConfig, ProgressSummary};
pub use rate::effective_annual_rate;

//! Effective annual rate of a loan

use crate::loan::Loan;

/// Effective annual rate as a decimal (0.035567 for 3.5% compounded monthly).
///
/// Interest accrues on the outstanding balance once per installment, so the
/// nominal rate compounds `periods_per_year` times a year.
pub fn effective_annual_rate(loan: &Loan) -> f64 {
    let periods_per_year = loan.frequency.periods_per_year();
    (1.0 + loan.rate_per_period()).powi(periods_per_year as i32) - 1.0
}

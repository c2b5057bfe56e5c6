//! Schedule generation for level-payment loans

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::state::AmortizationState;
use crate::error::InvalidLoanError;
use crate::loan::Loan;

/// One installment of the theoretical amortization table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Installment number (1-indexed)
    pub period: u32,
    pub due_date: NaiveDate,
    /// Total installment (interest + principal)
    pub payment: f64,
    pub interest: f64,
    /// Portion of the installment reducing the balance
    pub principal: f64,
    /// Balance after this installment
    pub remaining: f64,
}

/// Generate the full payment schedule for a loan.
///
/// The schedule has exactly `loan.total_periods()` entries and its final
/// balance is exactly zero: the last installment absorbs whatever residue
/// the level payment leaves behind.
pub fn generate_schedule(loan: &Loan) -> Result<Vec<ScheduleEntry>, InvalidLoanError> {
    loan.validate()?;

    let mut state = AmortizationState::from_loan(loan);
    let mut entries = Vec::with_capacity(state.total_periods as usize);

    while !state.is_final_period() {
        state.advance_period();
        entries.push(calculate_period(loan, &mut state)?);
    }

    log::debug!(
        "loan {}: {} periods, level payment {:.2}",
        loan.id,
        entries.len(),
        state.level_payment
    );

    Ok(entries)
}

/// Split one installment into interest and principal and roll the balance forward
fn calculate_period(loan: &Loan, state: &mut AmortizationState) -> Result<ScheduleEntry, InvalidLoanError> {
    let due_date = loan
        .due_date(state.period)
        .ok_or(InvalidLoanError::TermOutOfRange(loan.term_months))?;
    let interest = state.remaining * state.rate_per_period;

    let (payment, principal) = if state.is_final_period() {
        // Pay off exactly what is left
        (state.remaining + interest, state.remaining)
    } else {
        (state.level_payment, state.level_payment - interest)
    };

    state.remaining = (state.remaining - principal).max(0.0);

    Ok(ScheduleEntry {
        period: state.period,
        due_date,
        payment,
        interest,
        principal,
        remaining: state.remaining,
    })
}

/// A generated schedule with its headline totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub loan_id: String,

    /// Installment rows in due order
    pub entries: Vec<ScheduleEntry>,

    /// Sum of interest over the whole term
    pub total_interest: f64,

    /// Sum of all installments
    pub planned_total: f64,

    /// Level installment (first period)
    pub level_payment: f64,

    /// Due date of the final installment
    pub payoff_date: NaiveDate,
}

impl AmortizationSchedule {
    /// Generate the schedule for a loan and compute its totals
    pub fn for_loan(loan: &Loan) -> Result<Self, InvalidLoanError> {
        let entries = generate_schedule(loan)?;
        Ok(Self::from_entries(loan, entries))
    }

    fn from_entries(loan: &Loan, entries: Vec<ScheduleEntry>) -> Self {
        let total_interest: f64 = entries.iter().map(|e| e.interest).sum();
        let planned_total: f64 = entries.iter().map(|e| e.payment).sum();
        let level_payment = entries.first().map(|e| e.payment).unwrap_or(0.0);
        let payoff_date = entries.last().map(|e| e.due_date).unwrap_or(loan.start_date);

        Self {
            loan_id: loan.id.clone(),
            entries,
            total_interest,
            planned_total,
            level_payment,
            payoff_date,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Running balance carried through schedule generation

use crate::loan::Loan;

/// State of a loan at a point in time during schedule generation
#[derive(Debug, Clone)]
pub struct AmortizationState {
    /// Current period (1-indexed, 0 before the first installment)
    pub period: u32,

    /// Number of installments in the schedule
    pub total_periods: u32,

    /// Outstanding balance before this period's installment
    pub remaining: f64,

    /// Interest rate per period as a decimal
    pub rate_per_period: f64,

    /// Level installment from the annuity formula
    pub level_payment: f64,
}

impl AmortizationState {
    /// Initialize state from a loan at origination
    pub fn from_loan(loan: &Loan) -> Self {
        let total_periods = loan.total_periods();
        let rate_per_period = loan.rate_per_period();

        Self {
            period: 0,
            total_periods,
            remaining: loan.principal,
            rate_per_period,
            level_payment: level_payment(loan.principal, rate_per_period, total_periods),
        }
    }

    /// Advance to next period
    pub fn advance_period(&mut self) {
        self.period += 1;
    }

    pub fn is_final_period(&self) -> bool {
        self.period >= self.total_periods
    }
}

/// Level payment that fully amortizes `principal` over `periods` installments.
///
/// Straight-line when the rate is zero, annuity formula otherwise.
pub fn level_payment(principal: f64, rate_per_period: f64, periods: u32) -> f64 {
    let n = periods.max(1) as f64;
    if rate_per_period == 0.0 {
        principal / n
    } else {
        principal * rate_per_period / (1.0 - (1.0 + rate_per_period).powf(-n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_level_payment_annuity() {
        let payment = level_payment(10_000.0, 0.035 / 12.0, 36);
        assert_abs_diff_eq!(payment, 293.0208, epsilon = 1e-3);
    }

    #[test]
    fn test_level_payment_interest_free() {
        assert_abs_diff_eq!(level_payment(1200.0, 0.0, 12), 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_state_advances() {
        let loan = Loan::new(
            "a",
            1200.0,
            0.0,
            2,
            crate::loan::Frequency::Monthly,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let mut state = AmortizationState::from_loan(&loan);
        assert_eq!(state.period, 0);
        assert!(!state.is_final_period());

        state.advance_period();
        assert!(!state.is_final_period());
        state.advance_period();
        assert!(state.is_final_period());
    }
}

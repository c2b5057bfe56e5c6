//! Reconcile recorded repayments against the theoretical schedule

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::engine::ScheduleEntry;
use crate::loan::{Loan, Repayment};

/// Configuration for progress derivation
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Installments due this many days before `today` still count as upcoming
    pub due_grace_days: i64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { due_grace_days: 1 }
    }
}

/// Whether a loan has been repaid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Done,
}

/// Progress metrics for one loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub loan_id: String,

    /// Interest over the full schedule
    pub total_interest: f64,

    /// Sum of all scheduled installments
    pub planned_total: f64,

    /// Sum of recorded repayments, any date
    pub total_repayments: f64,

    /// Fraction of principal repaid, in [0, 1]
    pub principal_progress: f64,

    pub outstanding_principal: f64,

    /// Principal plus scheduled interest not yet covered by repayments
    pub outstanding_planned: f64,

    /// First upcoming installment with a balance left after it
    pub next_installment: Option<ScheduleEntry>,

    /// Amount to propose for the next repayment
    pub suggested_amount: f64,

    pub status: LoanStatus,
}

/// Derive progress metrics with the default one-day grace window.
///
/// Every repayment passed in counts towards the loan; callers holding a
/// mixed list select the loan's own repayments first.
pub fn derive_progress(
    loan: &Loan,
    schedule: &[ScheduleEntry],
    repayments: &[Repayment],
    today: NaiveDate,
) -> ProgressSummary {
    derive_progress_with(loan, schedule, repayments, today, &ProgressConfig::default())
}

/// Derive progress metrics for a loan from its schedule and repayments
pub fn derive_progress_with(
    loan: &Loan,
    schedule: &[ScheduleEntry],
    repayments: &[Repayment],
    today: NaiveDate,
    config: &ProgressConfig,
) -> ProgressSummary {
    let principal = loan.principal;

    let total_interest: f64 = schedule.iter().map(|e| e.interest).sum();
    let planned_total: f64 = schedule.iter().map(|e| e.payment).sum();
    let total_repayments: f64 = repayments.iter().map(|r| r.amount).sum();

    let principal_progress = if principal > 0.0 {
        (total_repayments / principal).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let outstanding_principal = (principal - total_repayments).max(0.0);
    let outstanding_planned = (principal + total_interest - total_repayments).max(0.0);

    // A grace window wider than the calendar reaches back to its start
    let cutoff = Duration::try_days(config.due_grace_days)
        .and_then(|grace| today.checked_sub_signed(grace))
        .unwrap_or(NaiveDate::MIN);
    let next_installment = schedule
        .iter()
        .find(|e| e.due_date >= cutoff && e.remaining > 0.0)
        .cloned();

    let suggested_amount = next_installment
        .as_ref()
        .map(|e| e.payment)
        .unwrap_or(outstanding_principal);

    let status = if total_repayments >= principal {
        LoanStatus::Done
    } else {
        LoanStatus::Active
    };

    ProgressSummary {
        loan_id: loan.id.clone(),
        total_interest,
        planned_total,
        total_repayments,
        principal_progress,
        outstanding_principal,
        outstanding_planned,
        next_installment,
        suggested_amount,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::generate_schedule;
    use crate::loan::Frequency;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn car_loan() -> Loan {
        Loan::new("car", 10_000.0, 3.5, 36, Frequency::Monthly, date(2024, 1, 1))
    }

    fn repay(id: &str, amount: f64, on: NaiveDate) -> Repayment {
        Repayment::new(id, "car", amount, on)
    }

    #[test]
    fn test_no_repayments() {
        let loan = car_loan();
        let schedule = generate_schedule(&loan).unwrap();
        let progress = derive_progress(&loan, &schedule, &[], date(2023, 12, 1));

        assert_eq!(progress.principal_progress, 0.0);
        assert_eq!(progress.status, LoanStatus::Active);
        assert_eq!(progress.outstanding_principal, 10_000.0);
        assert_abs_diff_eq!(progress.outstanding_planned, 10_000.0 + progress.total_interest, epsilon = 1e-9);

        let next = progress.next_installment.expect("first installment is upcoming");
        assert_eq!(next.period, 1);
        assert_eq!(progress.suggested_amount, next.payment);
    }

    #[test]
    fn test_partial_repayment() {
        let loan = car_loan();
        let schedule = generate_schedule(&loan).unwrap();
        let repayments = vec![
            repay("r1", 2_000.0, date(2024, 1, 1)),
            repay("r2", 500.0, date(2024, 2, 1)),
        ];
        let progress = derive_progress(&loan, &schedule, &repayments, date(2024, 2, 10));

        assert_abs_diff_eq!(progress.total_repayments, 2_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(progress.principal_progress, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(progress.outstanding_principal, 7_500.0, epsilon = 1e-9);
        assert_eq!(progress.status, LoanStatus::Active);
        assert_eq!(progress.next_installment.unwrap().due_date, date(2024, 3, 1));
    }

    #[test]
    fn test_fully_repaid() {
        let loan = car_loan();
        let schedule = generate_schedule(&loan).unwrap();
        let repayments = vec![repay("r1", 12_000.0, date(2024, 1, 1))];
        let progress = derive_progress(&loan, &schedule, &repayments, date(2024, 1, 15));

        assert_eq!(progress.status, LoanStatus::Done);
        assert_eq!(progress.outstanding_principal, 0.0);
        assert_eq!(progress.outstanding_planned, 0.0);
        assert_eq!(progress.principal_progress, 1.0);
    }

    #[test]
    fn test_exactly_repaid_is_done() {
        let loan = car_loan();
        let schedule = generate_schedule(&loan).unwrap();
        let repayments = vec![repay("r1", 10_000.0, date(2024, 1, 1))];
        let progress = derive_progress(&loan, &schedule, &repayments, date(2024, 1, 15));

        assert_eq!(progress.status, LoanStatus::Done);
        assert_eq!(progress.outstanding_principal, 0.0);
    }

    #[test]
    fn test_grace_day_boundary() {
        let loan = car_loan();
        let schedule = generate_schedule(&loan).unwrap();

        // Due yesterday still counts as upcoming
        let progress = derive_progress(&loan, &schedule, &[], date(2024, 3, 2));
        assert_eq!(progress.next_installment.unwrap().due_date, date(2024, 3, 1));

        // Two days late moves on to the following installment
        let progress = derive_progress(&loan, &schedule, &[], date(2024, 3, 3));
        assert_eq!(progress.next_installment.unwrap().due_date, date(2024, 4, 1));

        // A zero grace window excludes yesterday
        let strict = ProgressConfig { due_grace_days: 0 };
        let progress = derive_progress_with(&loan, &schedule, &[], date(2024, 3, 2), &strict);
        assert_eq!(progress.next_installment.unwrap().due_date, date(2024, 4, 1));
    }

    #[test]
    fn test_schedule_in_the_past() {
        let loan = car_loan();
        let schedule = generate_schedule(&loan).unwrap();
        let repayments = vec![repay("r1", 4_000.0, date(2024, 6, 1))];
        let progress = derive_progress(&loan, &schedule, &repayments, date(2030, 1, 1));

        assert!(progress.next_installment.is_none());
        assert_abs_diff_eq!(progress.suggested_amount, 6_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_final_installment_not_selected() {
        let loan = car_loan();
        let schedule = generate_schedule(&loan).unwrap();

        // Only the last installment (remaining == 0) is still ahead
        let progress = derive_progress(&loan, &schedule, &[], date(2026, 11, 15));
        assert!(progress.next_installment.is_none());
        assert_eq!(progress.suggested_amount, 10_000.0);
    }

    #[test]
    fn test_every_repayment_counts() {
        let loan = car_loan();
        let schedule = generate_schedule(&loan).unwrap();
        let repayments = vec![
            repay("r1", 1_000.0, date(2024, 1, 1)),
            Repayment::new("r2", "CAR ", 9_000.0, date(2024, 1, 1)),
        ];
        let progress = derive_progress(&loan, &schedule, &repayments, date(2024, 1, 1));
        assert_abs_diff_eq!(progress.total_repayments, 10_000.0, epsilon = 1e-9);
        assert_eq!(progress.status, LoanStatus::Done);
    }

    #[test]
    fn test_huge_grace_window() {
        let loan = car_loan();
        let schedule = generate_schedule(&loan).unwrap();

        for grace in [i64::MAX / 1000, i64::MAX, i64::MIN] {
            let config = ProgressConfig { due_grace_days: grace };
            let progress = derive_progress_with(&loan, &schedule, &[], date(2024, 3, 1), &config);
            assert_eq!(progress.next_installment.unwrap().period, 1);
        }
    }

    #[test]
    fn test_interest_free_progress() {
        let loan = Loan::new("car", 1200.0, 0.0, 12, Frequency::Monthly, date(2024, 1, 1));
        let schedule = generate_schedule(&loan).unwrap();
        let repayments = vec![repay("r1", 300.0, date(2024, 3, 1))];
        let progress = derive_progress(&loan, &schedule, &repayments, date(2024, 3, 20));

        assert_eq!(progress.total_interest, 0.0);
        assert_abs_diff_eq!(progress.outstanding_planned, 900.0, epsilon = 1e-9);
        assert_abs_diff_eq!(progress.suggested_amount, 100.0, epsilon = 1e-9);
    }
}

//! Batch evaluation of a household's loans
//!
//! Generates schedules and progress for many loans at once. Loans are
//! independent, so the batch fans out across threads with rayon.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::amortization::{
    derive_progress_with, effective_annual_rate, AmortizationSchedule, LoanStatus, ProgressConfig,
    ProgressSummary,
};
use crate::error::InvalidLoanError;
use crate::loan::{repayments_for_loan, Loan, LoanRole, Repayment};

/// Schedule and progress for one loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanReport {
    pub loan_id: String,
    pub name: String,
    pub role: LoanRole,
    pub principal: f64,
    pub schedule: AmortizationSchedule,
    pub progress: ProgressSummary,
    /// Effective annual rate as a decimal
    pub effective_annual_rate: f64,
}

/// A loan left out of the batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedLoan {
    pub loan_id: String,
    pub reason: String,
}

/// Totals across all evaluated loans
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub loan_count: usize,
    pub active_count: usize,
    pub done_count: usize,
    pub rejected_count: usize,
    pub borrowed_principal: f64,
    pub lent_principal: f64,
    pub outstanding_borrowed: f64,
    pub outstanding_lent: f64,
    pub total_repaid: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub as_of: NaiveDate,
    pub reports: Vec<LoanReport>,
    pub rejected: Vec<RejectedLoan>,
    pub summary: PortfolioSummary,
}

/// Evaluates loans against a fixed valuation date
///
/// # Example
/// ```ignore
/// let runner = PortfolioRunner::new(today);
/// let result = runner.run(&loans, &repayments);
/// println!("outstanding: {:.2}", result.summary.outstanding_borrowed);
/// ```
#[derive(Debug, Clone)]
pub struct PortfolioRunner {
    as_of: NaiveDate,
    config: ProgressConfig,
}

impl PortfolioRunner {
    /// Create runner with the default progress configuration
    pub fn new(as_of: NaiveDate) -> Self {
        Self::with_config(as_of, ProgressConfig::default())
    }

    pub fn with_config(as_of: NaiveDate, config: ProgressConfig) -> Self {
        Self { as_of, config }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Evaluate a single loan. Repayments for other loans are ignored.
    pub fn run_loan(&self, loan: &Loan, repayments: &[Repayment]) -> Result<LoanReport, InvalidLoanError> {
        let own: Vec<Repayment> = repayments_for_loan(repayments, &loan.id).into_iter().cloned().collect();
        self.evaluate(loan, &own)
    }

    /// Evaluate a loan against repayments already selected for it
    fn evaluate(&self, loan: &Loan, own: &[Repayment]) -> Result<LoanReport, InvalidLoanError> {
        let schedule = AmortizationSchedule::for_loan(loan)?;
        let progress = derive_progress_with(loan, &schedule.entries, own, self.as_of, &self.config);

        Ok(LoanReport {
            loan_id: loan.id.clone(),
            name: loan.display_name().to_string(),
            role: loan.role,
            principal: loan.principal,
            schedule,
            progress,
            effective_annual_rate: effective_annual_rate(loan),
        })
    }

    /// Evaluate every loan in parallel. Invalid loans are collected in
    /// `rejected` instead of failing the batch.
    pub fn run(&self, loans: &[Loan], repayments: &[Repayment]) -> PortfolioResult {
        let mut by_loan: HashMap<&str, Vec<Repayment>> = HashMap::new();
        for repayment in repayments {
            by_loan
                .entry(repayment.loan_id.as_str())
                .or_default()
                .push(repayment.clone());
        }

        let outcomes: Vec<Result<LoanReport, RejectedLoan>> = loans
            .par_iter()
            .map(|loan| {
                let own = by_loan.get(loan.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                self.evaluate(loan, own).map_err(|e| {
                    log::warn!("skipping loan {}: {}", loan.id, e);
                    RejectedLoan {
                        loan_id: loan.id.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect();

        let mut reports = Vec::with_capacity(outcomes.len());
        let mut rejected = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(report) => reports.push(report),
                Err(r) => rejected.push(r),
            }
        }

        let summary = summarize(&reports, rejected.len());
        log::info!(
            "evaluated {} loans as of {} ({} rejected)",
            reports.len(),
            self.as_of,
            rejected.len()
        );

        PortfolioResult {
            as_of: self.as_of,
            reports,
            rejected,
            summary,
        }
    }
}

fn summarize(reports: &[LoanReport], rejected_count: usize) -> PortfolioSummary {
    let mut summary = PortfolioSummary {
        loan_count: reports.len(),
        rejected_count,
        ..Default::default()
    };

    for report in reports {
        match report.progress.status {
            LoanStatus::Active => summary.active_count += 1,
            LoanStatus::Done => summary.done_count += 1,
        }
        summary.total_repaid += report.progress.total_repayments;

        match report.role {
            LoanRole::Borrower => {
                summary.borrowed_principal += report.principal;
                summary.outstanding_borrowed += report.progress.outstanding_principal;
            }
            LoanRole::Lender => {
                summary.lent_principal += report.principal;
                summary.outstanding_lent += report.progress.outstanding_principal;
            }
        }
    }

    summary
}

//! Load loans and repayments from CSV exports

use super::{Frequency, Loan, LoanRole, Repayment};
use crate::error::{InvalidLoanError, LoadError};
use chrono::NaiveDate;
use csv::Reader;
use std::collections::HashSet;
use std::path::Path;

/// Raw CSV row matching the loans export columns
#[derive(Debug, serde::Deserialize)]
struct LoanRow {
    id: String,
    #[serde(default)]
    name: Option<String>,
    principal: f64,
    interest_rate: f64,
    term_months: u32,
    frequency: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

impl LoanRow {
    fn to_loan(self, row: usize) -> Result<Loan, LoadError> {
        let invalid = |id: &str, source: InvalidLoanError| LoadError::InvalidLoan {
            row,
            loan_id: id.to_string(),
            source,
        };

        let frequency: Frequency = self.frequency.parse().map_err(|e| invalid(&self.id, e))?;

        let start_date = match self.start_date.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => parse_date(s, row)?,
            _ => return Err(invalid(&self.id, InvalidLoanError::MissingStartDate(self.id.clone()))),
        };

        // Unrecognised roles fall back to borrower; the role never affects the schedule
        let role = match self.role.as_deref() {
            Some(s) if !s.trim().is_empty() => s.parse::<LoanRole>().unwrap_or_else(|e| {
                log::warn!("row {}: {}; treating as borrower", row, e);
                LoanRole::Borrower
            }),
            _ => LoanRole::Borrower,
        };

        let loan = Loan {
            id: self.id,
            name: self.name.filter(|n| !n.trim().is_empty()),
            principal: self.principal,
            interest_rate: self.interest_rate,
            term_months: self.term_months,
            frequency,
            start_date,
            role,
        };
        loan.validate().map_err(|e| invalid(&loan.id, e))?;

        Ok(loan)
    }
}

/// Raw CSV row matching the repayments export columns
#[derive(Debug, serde::Deserialize)]
struct RepaymentRow {
    id: String,
    loan_id: String,
    amount: f64,
    date: String,
    #[serde(default)]
    note: Option<String>,
}

impl RepaymentRow {
    fn to_repayment(self, row: usize) -> Result<Repayment, LoadError> {
        if !(self.amount > 0.0) {
            return Err(LoadError::NonPositiveRepayment {
                row,
                repayment_id: self.id,
                amount: self.amount,
            });
        }

        Ok(Repayment {
            date: parse_date(self.date.trim(), row)?,
            id: self.id,
            loan_id: self.loan_id,
            amount: self.amount,
            note: self.note.filter(|n| !n.trim().is_empty()),
        })
    }
}

fn parse_date(value: &str, row: usize) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| LoadError::InvalidDate {
        row,
        value: value.to_string(),
    })
}

/// Load all loans from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P) -> Result<Vec<Loan>, LoadError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    load_loans_from_reader(file)
}

/// Load loans from any reader (e.g., string buffer, request body)
pub fn load_loans_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Loan>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut loans = Vec::new();

    // Row numbers are 1-based data rows, header excluded
    for (i, result) in csv_reader.deserialize().enumerate() {
        let row: LoanRow = result?;
        loans.push(row.to_loan(i + 1)?);
    }

    log::debug!("loaded {} loans", loans.len());
    Ok(loans)
}

/// Load all repayments from a CSV file, checking each references a known loan
pub fn load_repayments<P: AsRef<Path>>(path: P, loans: &[Loan]) -> Result<Vec<Repayment>, LoadError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    load_repayments_from_reader(file, loans)
}

/// Load repayments from any reader, checking each references a known loan
pub fn load_repayments_from_reader<R: std::io::Read>(
    reader: R,
    loans: &[Loan],
) -> Result<Vec<Repayment>, LoadError> {
    let known: HashSet<&str> = loans.iter().map(|l| l.id.as_str()).collect();
    let mut csv_reader = Reader::from_reader(reader);
    let mut repayments = Vec::new();

    for (i, result) in csv_reader.deserialize().enumerate() {
        let row: RepaymentRow = result?;
        let repayment = row.to_repayment(i + 1)?;
        if !known.contains(repayment.loan_id.as_str()) {
            return Err(LoadError::UnknownLoan {
                row: i + 1,
                repayment_id: repayment.id,
                loan_id: repayment.loan_id,
            });
        }
        repayments.push(repayment);
    }

    log::debug!("loaded {} repayments", repayments.len());
    Ok(repayments)
}

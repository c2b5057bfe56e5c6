//! Loan and repayment records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InvalidLoanError;

/// How often installments fall due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    /// Every month (12 periods per year)
    Monthly,
    /// Every two months (6 periods per year)
    BiMonthly,
    /// Every three months (4 periods per year)
    Quarterly,
    /// Once a year
    Yearly,
}

impl Frequency {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Monthly => 12,
            Frequency::BiMonthly => 6,
            Frequency::Quarterly => 4,
            Frequency::Yearly => 1,
        }
    }

    pub fn months_per_period(&self) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::BiMonthly => 2,
            Frequency::Quarterly => 3,
            Frequency::Yearly => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::BiMonthly => "bi-monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl FromStr for Frequency {
    type Err = InvalidLoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Frequency::Monthly),
            "bi-monthly" | "bimonthly" => Ok(Frequency::BiMonthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" | "annual" => Ok(Frequency::Yearly),
            _ => Err(InvalidLoanError::UnknownFrequency(s.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the agreement the owner is on. Does not affect the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanRole {
    #[default]
    Borrower,
    Lender,
}

impl FromStr for LoanRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "borrower" => Ok(LoanRole::Borrower),
            "lender" => Ok(LoanRole::Lender),
            other => Err(format!("Unknown loan role: {}", other)),
        }
    }
}

/// Highest accepted annual rate, in percent
pub const MAX_INTEREST_RATE: f64 = 1000.0;

/// A single borrowing or lending agreement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Opaque identifier
    pub id: String,

    /// Display label
    #[serde(default)]
    pub name: Option<String>,

    /// Original borrowed sum
    pub principal: f64,

    /// Annual nominal rate in percent (3.5 means 3.5%)
    pub interest_rate: f64,

    /// Total loan duration in months
    pub term_months: u32,

    pub frequency: Frequency,

    /// Due date of period 1
    pub start_date: NaiveDate,

    #[serde(default)]
    pub role: LoanRole,
}

impl Loan {
    /// Create a borrower-side loan with no display name
    pub fn new(
        id: impl Into<String>,
        principal: f64,
        interest_rate: f64,
        term_months: u32,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            principal,
            interest_rate,
            term_months,
            frequency,
            start_date,
            role: LoanRole::Borrower,
        }
    }

    pub fn with_role(mut self, role: LoanRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reject structurally invalid loans
    pub fn validate(&self) -> Result<(), InvalidLoanError> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(InvalidLoanError::NonPositivePrincipal(self.principal));
        }
        if self.term_months == 0 {
            return Err(InvalidLoanError::NonPositiveTerm);
        }
        if !(0.0..=MAX_INTEREST_RATE).contains(&self.interest_rate) {
            return Err(InvalidLoanError::InterestRateOutOfRange {
                rate: self.interest_rate,
                max: MAX_INTEREST_RATE,
            });
        }
        if self.due_date(self.total_periods()).is_none() {
            return Err(InvalidLoanError::TermOutOfRange(self.term_months));
        }
        Ok(())
    }

    /// Number of installments: round(term / 12 * periods per year), at least 1
    pub fn total_periods(&self) -> u32 {
        let periods = (self.term_months as f64 / 12.0 * self.frequency.periods_per_year() as f64).round();
        (periods as u32).max(1)
    }

    /// Interest rate per period as a decimal (0 for interest-free loans)
    pub fn rate_per_period(&self) -> f64 {
        if self.interest_rate > 0.0 {
            self.interest_rate / 100.0 / self.frequency.periods_per_year() as f64
        } else {
            0.0
        }
    }

    /// Due date of a 1-based period. Clamps to the last day of shorter months.
    ///
    /// None when the date falls past the calendar chrono can represent.
    pub fn due_date(&self, period: u32) -> Option<NaiveDate> {
        let months = period.saturating_sub(1).checked_mul(self.frequency.months_per_period())?;
        self.start_date.checked_add_months(chrono::Months::new(months))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A recorded payment against a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repayment {
    pub id: String,
    pub loan_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

impl Repayment {
    pub fn new(id: impl Into<String>, loan_id: impl Into<String>, amount: f64, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            loan_id: loan_id.into(),
            amount,
            date,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Sort repayments newest first, ties broken by id
pub fn sort_for_display(repayments: &mut [Repayment]) {
    repayments.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
}

/// Repayments belonging to one loan, in their original order
pub fn repayments_for_loan<'a>(repayments: &'a [Repayment], loan_id: &str) -> Vec<&'a Repayment> {
    repayments.iter().filter(|r| r.loan_id == loan_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_frequency_periods_cover_a_year() {
        for freq in [Frequency::Monthly, Frequency::BiMonthly, Frequency::Quarterly, Frequency::Yearly] {
            assert_eq!(freq.periods_per_year() * freq.months_per_period(), 12);
        }
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!("Bi-Monthly".parse::<Frequency>().unwrap(), Frequency::BiMonthly);
        assert_eq!(" quarterly ".parse::<Frequency>().unwrap(), Frequency::Quarterly);
        assert_eq!("yearly".parse::<Frequency>().unwrap(), Frequency::Yearly);
        assert_eq!(
            "weekly".parse::<Frequency>(),
            Err(InvalidLoanError::UnknownFrequency("weekly".to_string()))
        );
    }

    #[test]
    fn test_total_periods() {
        let loan = Loan::new("a", 1000.0, 5.0, 36, Frequency::Monthly, date(2024, 1, 1));
        assert_eq!(loan.total_periods(), 36);

        let quarterly = Loan { frequency: Frequency::Quarterly, ..loan.clone() };
        assert_eq!(quarterly.total_periods(), 12);

        // 1 month yearly rounds to 0, floored at 1
        let short = Loan { term_months: 1, frequency: Frequency::Yearly, ..loan.clone() };
        assert_eq!(short.total_periods(), 1);

        // 18 months yearly = 1.5 periods, rounds half up
        let odd = Loan { term_months: 18, frequency: Frequency::Yearly, ..loan };
        assert_eq!(odd.total_periods(), 2);
    }

    #[test]
    fn test_validate() {
        let loan = Loan::new("a", 1000.0, 5.0, 12, Frequency::Monthly, date(2024, 1, 1));
        assert!(loan.validate().is_ok());

        let zero = Loan { principal: 0.0, ..loan.clone() };
        assert_eq!(zero.validate(), Err(InvalidLoanError::NonPositivePrincipal(0.0)));

        let no_term = Loan { term_months: 0, ..loan.clone() };
        assert_eq!(no_term.validate(), Err(InvalidLoanError::NonPositiveTerm));

        let negative = Loan { interest_rate: -1.0, ..loan.clone() };
        assert_eq!(
            negative.validate(),
            Err(InvalidLoanError::InterestRateOutOfRange { rate: -1.0, max: MAX_INTEREST_RATE })
        );

        let usurious = Loan { interest_rate: 1e300, ..loan.clone() };
        assert!(matches!(
            usurious.validate(),
            Err(InvalidLoanError::InterestRateOutOfRange { .. })
        ));

        let nan = Loan { interest_rate: f64::NAN, ..loan.clone() };
        assert!(nan.validate().is_err());

        let infinite = Loan { interest_rate: f64::INFINITY, ..loan.clone() };
        assert!(infinite.validate().is_err());

        let free = Loan { interest_rate: 0.0, ..loan };
        assert!(free.validate().is_ok());
    }

    #[test]
    fn test_due_date_clamps_to_month_end() {
        let loan = Loan::new("a", 1000.0, 5.0, 12, Frequency::Monthly, date(2024, 1, 31));
        assert_eq!(loan.due_date(1), Some(date(2024, 1, 31)));
        assert_eq!(loan.due_date(2), Some(date(2024, 2, 29)));
        assert_eq!(loan.due_date(3), Some(date(2024, 3, 31)));

        let quarterly = Loan { frequency: Frequency::Quarterly, ..loan };
        assert_eq!(quarterly.due_date(2), Some(date(2024, 4, 30)));
    }

    #[test]
    fn test_term_past_calendar_end_rejected() {
        let loan = Loan::new("a", 10_000.0, 3.5, 4_000_000, Frequency::Yearly, date(2024, 1, 1));
        assert_eq!(loan.due_date(loan.total_periods()), None);
        assert_eq!(loan.validate(), Err(InvalidLoanError::TermOutOfRange(4_000_000)));

        let longest = Loan { term_months: u32::MAX, frequency: Frequency::Monthly, ..loan };
        assert_eq!(longest.validate(), Err(InvalidLoanError::TermOutOfRange(u32::MAX)));
    }

    #[test]
    fn test_long_term_within_calendar_accepted() {
        let loan = Loan::new("a", 10_000.0, 3.5, 1200, Frequency::Monthly, date(2024, 1, 1));
        assert!(loan.validate().is_ok());
        assert_eq!(loan.due_date(1200), Some(date(2123, 12, 1)));
    }

    #[test]
    fn test_sort_for_display() {
        let mut repayments = vec![
            Repayment::new("r1", "a", 10.0, date(2024, 1, 5)),
            Repayment::new("r3", "a", 10.0, date(2024, 3, 5)),
            Repayment::new("r2", "a", 10.0, date(2024, 3, 5)),
        ];
        sort_for_display(&mut repayments);
        let ids: Vec<_> = repayments.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r3", "r1"]);
    }

    #[test]
    fn test_repayments_for_loan() {
        let repayments = vec![
            Repayment::new("r1", "a", 10.0, date(2024, 1, 5)),
            Repayment::new("r2", "b", 20.0, date(2024, 1, 5)),
            Repayment::new("r3", "a", 30.0, date(2024, 2, 5)),
        ];
        let for_a = repayments_for_loan(&repayments, "a");
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[1].id, "r3");
    }
}

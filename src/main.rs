//! Loan amortization CLI
//!
//! Prints amortization schedules and repayment progress for household loans

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use loan_amortization::{
    amortization::{effective_annual_rate, ProgressConfig},
    loan::{load_loans, load_repayments},
    AmortizationSchedule, Frequency, Loan, LoanStatus, PortfolioRunner,
};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "amortize", version, about = "Loan amortization schedules and repayment progress")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the payment schedule for a single loan
    Schedule {
        /// Amount borrowed
        #[arg(long)]
        principal: f64,

        /// Annual nominal interest rate in percent
        #[arg(long, default_value_t = 0.0)]
        rate: f64,

        /// Loan duration in months
        #[arg(long)]
        term_months: u32,

        /// monthly, bi-monthly, quarterly or yearly
        #[arg(long, default_value = "monthly")]
        frequency: String,

        /// Due date of the first installment (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Write the full schedule to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Reconcile recorded repayments against every loan's schedule
    Progress {
        /// Loans CSV (id,name,principal,interest_rate,term_months,frequency,start_date,role)
        #[arg(long)]
        loans: PathBuf,

        /// Repayments CSV (id,loan_id,amount,date,note)
        #[arg(long)]
        repayments: Option<PathBuf>,

        /// Valuation date (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Installments overdue by at most this many days still count as upcoming
        #[arg(long, env = "AMORTIZE_GRACE_DAYS", default_value_t = 1)]
        grace_days: i64,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Schedule { principal, rate, term_months, frequency, start, csv, json } => {
            let frequency: Frequency = frequency.parse()?;
            let loan = Loan::new("cli", principal, rate, term_months, frequency, start);
            run_schedule(&loan, csv, json)
        }
        Command::Progress { loans, repayments, as_of, grace_days, json } => {
            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            run_progress(loans, repayments, as_of, grace_days, json)
        }
    }
}

fn run_schedule(loan: &Loan, csv: Option<PathBuf>, json: bool) -> Result<()> {
    let schedule = AmortizationSchedule::for_loan(loan)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        println!("Loan: {:.2} at {} over {} months ({})",
            loan.principal, format_pct(loan.interest_rate / 100.0), loan.term_months, loan.frequency);
        println!();
        println!("{:>6} {:>12} {:>12} {:>12} {:>12} {:>14}",
            "Period", "Due", "Payment", "Interest", "Principal", "Remaining");
        println!("{}", "-".repeat(73));

        for entry in &schedule.entries {
            println!("{:>6} {:>12} {:>12.2} {:>12.2} {:>12.2} {:>14.2}",
                entry.period,
                entry.due_date.to_string(),
                entry.payment,
                entry.interest,
                entry.principal,
                entry.remaining,
            );
        }

        println!("\nSummary:");
        println!("  Installments: {}", schedule.len());
        println!("  Level payment: {:.2}", schedule.level_payment);
        println!("  Total interest: {:.2}", schedule.total_interest);
        println!("  Total paid: {:.2}", schedule.planned_total);
        println!("  Payoff date: {}", schedule.payoff_date);
        println!("  Effective annual rate: {}", format_pct(effective_annual_rate(loan)));
    }

    if let Some(path) = csv {
        write_schedule_csv(&path, &schedule)
            .with_context(|| format!("writing schedule to {}", path.display()))?;
        eprintln!("Full schedule written to: {}", path.display());
    }

    Ok(())
}

fn write_schedule_csv(path: &PathBuf, schedule: &AmortizationSchedule) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in &schedule.entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

fn run_progress(
    loans_path: PathBuf,
    repayments_path: Option<PathBuf>,
    as_of: NaiveDate,
    grace_days: i64,
    json: bool,
) -> Result<()> {
    let loans = load_loans(&loans_path)
        .with_context(|| format!("loading loans from {}", loans_path.display()))?;
    let repayments = match repayments_path {
        Some(path) => load_repayments(&path, &loans)
            .with_context(|| format!("loading repayments from {}", path.display()))?,
        None => Vec::new(),
    };

    let runner = PortfolioRunner::with_config(as_of, ProgressConfig { due_grace_days: grace_days });
    let result = runner.run(&loans, &repayments);

    if json {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &result)?;
        writeln!(stdout)?;
        return Ok(());
    }

    println!("Progress as of {}", result.as_of);
    println!("{:<20} {:>9} {:>12} {:>12} {:>8} {:>12} {:>12} {:>7}",
        "Loan", "Role", "Principal", "Repaid", "Done", "Outstanding", "Next due", "Status");
    println!("{}", "-".repeat(100));

    for report in &result.reports {
        let progress = &report.progress;
        let next_due = progress
            .next_installment
            .as_ref()
            .map(|e| e.due_date.to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = match progress.status {
            LoanStatus::Active => "active",
            LoanStatus::Done => "done",
        };

        println!("{:<20} {:>9} {:>12.2} {:>12.2} {:>8} {:>12.2} {:>12} {:>7}",
            report.name,
            format!("{:?}", report.role).to_lowercase(),
            report.principal,
            progress.total_repayments,
            format_pct(progress.principal_progress),
            progress.outstanding_principal,
            next_due,
            status,
        );
    }

    for rejected in &result.rejected {
        println!("{:<20} rejected: {}", rejected.loan_id, rejected.reason);
    }

    let summary = &result.summary;
    println!("\nSummary:");
    println!("  Loans: {} ({} active, {} done, {} rejected)",
        summary.loan_count, summary.active_count, summary.done_count, summary.rejected_count);
    println!("  Borrowed: {:.2} (outstanding {:.2})", summary.borrowed_principal, summary.outstanding_borrowed);
    println!("  Lent: {:.2} (outstanding {:.2})", summary.lent_principal, summary.outstanding_lent);
    println!("  Total repaid: {:.2}", summary.total_repaid);

    Ok(())
}

fn format_pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

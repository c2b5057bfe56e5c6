//! AWS Lambda handler for loan schedules
//!
//! Accepts a loan and its repayments as JSON via API Gateway and returns the
//! amortization schedule, progress metrics and effective annual rate.

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::encodings::Body;
use chrono::NaiveDate;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use loan_amortization::{
    amortization::{derive_progress_with, effective_annual_rate, ProgressConfig},
    AmortizationSchedule, InvalidLoanError, Loan, ProgressSummary, Repayment,
};
use serde::{Deserialize, Serialize};

/// Input for a schedule request
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub loan: Loan,

    /// Recorded repayments; every entry must carry the loan's id
    #[serde(default)]
    pub repayments: Vec<Repayment>,

    /// Valuation date for the next installment (default: today, UTC)
    #[serde(default)]
    pub as_of: Option<NaiveDate>,

    /// Grace window in days for overdue installments (default: 1)
    #[serde(default = "default_grace_days")]
    pub grace_days: i64,
}

fn default_grace_days() -> i64 { ProgressConfig::default().due_grace_days }

/// Output for a schedule request
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub as_of: NaiveDate,
    pub schedule: AmortizationSchedule,
    pub progress: ProgressSummary,
    pub effective_annual_rate_pct: f64,
    pub execution_time_ms: u64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn response(status: i64, body: String) -> ApiGatewayProxyResponse {
    ApiGatewayProxyResponse {
        status_code: status,
        body: Some(Body::Text(body)),
        ..Default::default()
    }
}

fn error_response(status: i64, message: String) -> Result<ApiGatewayProxyResponse, Error> {
    log::warn!("request rejected ({}): {}", status, message);
    Ok(response(status, serde_json::to_string(&ErrorBody { error: message })?))
}

/// Why a parsed request cannot be evaluated
#[derive(Debug, thiserror::Error)]
enum RequestError {
    #[error("Invalid loan: {0}")]
    InvalidLoan(#[from] InvalidLoanError),

    #[error("repayment {repayment_id} belongs to loan {found:?}, not {expected:?}")]
    ForeignRepayment {
        repayment_id: String,
        expected: String,
        found: String,
    },
}

/// Compute the schedule and progress for a parsed request
fn evaluate(request: &ScheduleRequest, today: NaiveDate) -> Result<ScheduleResponse, RequestError> {
    let start = std::time::Instant::now();
    let loan = &request.loan;

    if let Some(foreign) = request.repayments.iter().find(|r| r.loan_id != loan.id) {
        return Err(RequestError::ForeignRepayment {
            repayment_id: foreign.id.clone(),
            expected: loan.id.clone(),
            found: foreign.loan_id.clone(),
        });
    }

    let as_of = request.as_of.unwrap_or(today);
    let config = ProgressConfig { due_grace_days: request.grace_days };

    let schedule = AmortizationSchedule::for_loan(loan)?;
    let progress = derive_progress_with(loan, &schedule.entries, &request.repayments, as_of, &config);

    Ok(ScheduleResponse {
        as_of,
        schedule,
        progress,
        effective_annual_rate_pct: effective_annual_rate(loan) * 100.0,
        execution_time_ms: start.elapsed().as_millis() as u64,
    })
}

/// Lambda handler function
async fn handler(event: LambdaEvent<ApiGatewayProxyRequest>) -> Result<ApiGatewayProxyResponse, Error> {
    let body = event.payload.body.unwrap_or_default();

    let request: ScheduleRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(e) => return error_response(400, format!("Invalid JSON: {}", e)),
    };

    let today = chrono::Utc::now().date_naive();
    match evaluate(&request, today) {
        Ok(result) => Ok(response(200, serde_json::to_string(&result)?)),
        Err(e) => error_response(400, e.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    FilingStatus, LoanOverview, LoanRecord, LoanTerms, MAX_AMORTIZATION_MONTHS, NetPay,
    PayFrequency, PayoffAnchor, ProjectionInputs, ProjectionSummary, RecurringBill, TaxTable,
    after_tax_bonus, biweekly_dates_in_month, compute_effective_rate, compute_progressive_tax,
    estimate_net_pay, loan_overview, parse_payment_date, project_month,
};
use crate::error::{CliError, InputError};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliFilingStatus {
    Single,
    Married,
    Head,
}

impl From<CliFilingStatus> for FilingStatus {
    fn from(value: CliFilingStatus) -> Self {
        match value {
            CliFilingStatus::Single => FilingStatus::Single,
            CliFilingStatus::Married => FilingStatus::Married,
            CliFilingStatus::Head => FilingStatus::Head,
        }
    }
}

impl From<FilingStatus> for CliFilingStatus {
    fn from(value: FilingStatus) -> Self {
        match value {
            FilingStatus::Single => CliFilingStatus::Single,
            FilingStatus::Married => CliFilingStatus::Married,
            FilingStatus::Head => CliFilingStatus::Head,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliPayoffAnchor {
    Today,
    ElapsedPayments,
}

impl From<CliPayoffAnchor> for PayoffAnchor {
    fn from(value: CliPayoffAnchor) -> Self {
        match value {
            CliPayoffAnchor::Today => PayoffAnchor::Today,
            CliPayoffAnchor::ElapsedPayments => PayoffAnchor::ElapsedPayments,
        }
    }
}

impl From<PayoffAnchor> for CliPayoffAnchor {
    fn from(value: PayoffAnchor) -> Self {
        match value {
            PayoffAnchor::Today => CliPayoffAnchor::Today,
            PayoffAnchor::ElapsedPayments => CliPayoffAnchor::ElapsedPayments,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "payplan",
    about = "Household finance projections: tax, loan payoff, paycheck calendar and monthly surplus"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "JSON tax table replacing the built-in federal schedules"
    )]
    pub tax_table: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Built-in federal tax year (2024 or 2025); ignored with --tax-table"
    )]
    pub tax_year: Option<i32>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Federal, payroll and take-home figures for a salary
    Tax(TaxArgs),
    /// Payment, payoff timeline and amortization series for a loan
    Loan(LoanArgs),
    /// Biweekly paydays falling in a calendar month
    Paychecks(PaycheckArgs),
    /// Per-paycheck, monthly and annual surplus from a JSON household file
    Project {
        #[arg(long)]
        input: PathBuf,
    },
    /// Serve the JSON API over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TaxArgs {
    #[arg(long, help = "Gross annual income")]
    pub income: f64,
    #[arg(long, value_enum, default_value_t = CliFilingStatus::Single)]
    pub filing_status: CliFilingStatus,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Annual pre-tax deductions such as retirement contributions"
    )]
    pub pre_tax_deductions: f64,
    #[arg(long, default_value_t = 26, help = "Paychecks per year")]
    pub periods_per_year: u32,
    #[arg(long, default_value_t = 0.0, help = "Gross annual bonus")]
    pub bonus: f64,
}

#[derive(Args, Debug, Clone)]
pub struct LoanArgs {
    #[arg(long, help = "Original loan amount")]
    pub principal: f64,
    #[arg(long, help = "Annual interest rate in percent, e.g. 6.5")]
    pub rate: f64,
    #[arg(long, help = "Loan term in months; omit for a 1% minimum payment")]
    pub term_months: Option<u32>,
    #[arg(long, help = "Current balance, defaults to principal")]
    pub balance: Option<f64>,
    #[arg(long, default_value_t = 0.0, help = "Extra principal paid every month")]
    pub extra_principal: f64,
    #[arg(long, help = "First payment date (YYYY-MM-DD)")]
    pub first_payment_date: Option<String>,
    #[arg(long, value_enum, default_value_t = CliPayoffAnchor::Today)]
    pub payoff_anchor: CliPayoffAnchor,
    #[arg(long, help = "Reference date for payoff projections (YYYY-MM-DD), defaults to today")]
    pub as_of: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PaycheckArgs {
    #[arg(long, help = "Any known biweekly payday (YYYY-MM-DD)")]
    pub anchor: String,
    #[arg(long, help = "Target year, defaults to the current year")]
    pub year: Option<i32>,
    #[arg(long, help = "Target month 1-12, defaults to the current month")]
    pub month: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TaxPayload {
    income: Option<f64>,
    filing_status: Option<String>,
    pre_tax_deductions: Option<f64>,
    periods_per_year: Option<u32>,
    bonus: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LoanPayload {
    principal: Option<f64>,
    rate: Option<f64>,
    term_months: Option<u32>,
    balance: Option<f64>,
    extra_principal: Option<f64>,
    first_payment_date: Option<String>,
    payoff_anchor: Option<PayoffAnchor>,
    as_of: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PaycheckPayload {
    anchor: Option<String>,
    year: Option<i32>,
    month: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SalaryPayload {
    gross_annual: Option<f64>,
    filing_status: Option<String>,
    pre_tax_deductions: Option<f64>,
    bonus: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum FrequencyKind {
    #[serde(alias = "semiMonthly", alias = "semi_monthly")]
    SemiMonthly,
    Biweekly,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrequencyPayload {
    kind: FrequencyKind,
    #[serde(default)]
    anchor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionPayload {
    #[serde(default)]
    per_paycheck_net: Option<f64>,
    #[serde(default)]
    salary: Option<SalaryPayload>,
    #[serde(default)]
    after_tax_bonus: Option<f64>,
    frequency: FrequencyPayload,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    month: Option<u32>,
    #[serde(default)]
    bills: Vec<RecurringBill>,
    #[serde(default)]
    loans: Vec<LoanRecord>,
}

#[derive(Debug)]
struct TaxRequest {
    income: f64,
    status: FilingStatus,
    pre_tax_deductions: f64,
    periods_per_year: u32,
    bonus: f64,
}

#[derive(Debug)]
struct LoanRequest {
    terms: LoanTerms,
    balance: f64,
    extra_principal: f64,
    first_payment_date: Option<NaiveDate>,
    anchor: PayoffAnchor,
    as_of: NaiveDate,
}

#[derive(Debug)]
struct PaycheckRequest {
    anchor: NaiveDate,
    year: i32,
    month: u32,
}

#[derive(Debug)]
struct ProjectionRequest {
    inputs: ProjectionInputs,
    net_pay: Option<NetPay>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxResponse {
    tax_year: i32,
    filing_status: FilingStatus,
    income: f64,
    bracket_tax: f64,
    effective_rate_percent: Option<f64>,
    net_pay: NetPay,
    after_tax_bonus: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoanResponse {
    terms: LoanTerms,
    current_balance: f64,
    extra_principal: f64,
    first_payment_date: Option<NaiveDate>,
    payoff_anchor: PayoffAnchor,
    as_of: NaiveDate,
    never_pays_off: bool,
    #[serde(flatten)]
    overview: LoanOverview,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaycheckResponse {
    anchor: NaiveDate,
    year: i32,
    month: u32,
    paydays: Vec<NaiveDate>,
    three_paycheck_month: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    frequency: PayFrequency,
    year: i32,
    month: u32,
    net_pay: Option<NetPay>,
    #[serde(flatten)]
    summary: ProjectionSummary,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    tax_year: i32,
}

#[derive(Clone)]
struct AppState {
    table: Arc<TaxTable>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_required_date(raw: &str, flag: &str) -> Result<NaiveDate, InputError> {
    parse_payment_date(raw)
        .ok_or_else(|| InputError::invalid(format!("{flag} must be a date in YYYY-MM-DD form")))
}

fn ensure_non_negative(value: f64, flag: &str) -> Result<(), InputError> {
    if !value.is_finite() || value < 0.0 {
        return Err(InputError::invalid(format!("{flag} must be >= 0")));
    }
    Ok(())
}

fn ensure_month(month: u32, flag: &str) -> Result<(), InputError> {
    if !(1..=12).contains(&month) {
        return Err(InputError::invalid(format!("{flag} must be between 1 and 12")));
    }
    Ok(())
}

fn build_tax_request(args: TaxArgs) -> Result<TaxRequest, InputError> {
    ensure_non_negative(args.income, "--income")?;
    ensure_non_negative(args.pre_tax_deductions, "--pre-tax-deductions")?;
    ensure_non_negative(args.bonus, "--bonus")?;
    if args.pre_tax_deductions > args.income {
        return Err(InputError::invalid(
            "--pre-tax-deductions cannot exceed --income",
        ));
    }
    if args.periods_per_year == 0 {
        return Err(InputError::invalid("--periods-per-year must be > 0"));
    }

    Ok(TaxRequest {
        income: args.income,
        status: args.filing_status.into(),
        pre_tax_deductions: args.pre_tax_deductions,
        periods_per_year: args.periods_per_year,
        bonus: args.bonus,
    })
}

fn build_loan_request(args: LoanArgs) -> Result<LoanRequest, InputError> {
    if !args.principal.is_finite() || args.principal <= 0.0 {
        return Err(InputError::invalid("--principal must be > 0"));
    }
    ensure_non_negative(args.rate, "--rate")?;
    ensure_non_negative(args.extra_principal, "--extra-principal")?;
    let balance = args.balance.unwrap_or(args.principal);
    ensure_non_negative(balance, "--balance")?;

    let as_of = match args.as_of.as_deref() {
        Some(raw) => parse_required_date(raw, "--as-of")?,
        None => today(),
    };

    Ok(LoanRequest {
        terms: LoanTerms {
            principal: args.principal,
            annual_rate_percent: args.rate,
            term_months: args.term_months,
        },
        balance,
        extra_principal: args.extra_principal,
        // An unreadable first payment date leaves the payoff date unknown.
        first_payment_date: args.first_payment_date.as_deref().and_then(parse_payment_date),
        anchor: args.payoff_anchor.into(),
        as_of,
    })
}

fn build_paycheck_request(args: PaycheckArgs) -> Result<PaycheckRequest, InputError> {
    let anchor = parse_required_date(&args.anchor, "--anchor")?;
    let now = today();
    let month = args.month.unwrap_or(now.month());
    ensure_month(month, "--month")?;
    Ok(PaycheckRequest {
        anchor,
        year: args.year.unwrap_or(now.year()),
        month,
    })
}

fn build_projection_request(
    payload: ProjectionPayload,
    table: &TaxTable,
) -> Result<ProjectionRequest, InputError> {
    let frequency = match payload.frequency.kind {
        FrequencyKind::SemiMonthly => PayFrequency::SemiMonthly,
        FrequencyKind::Biweekly => {
            let raw = payload.frequency.anchor.as_deref().ok_or_else(|| {
                InputError::invalid("frequency.anchor is required for biweekly pay")
            })?;
            PayFrequency::Biweekly {
                anchor: parse_required_date(raw, "frequency.anchor")?,
            }
        }
    };

    let now = today();
    let month = payload.month.unwrap_or(now.month());
    ensure_month(month, "month")?;

    for bill in &payload.bills {
        ensure_non_negative(bill.amount, &format!("bill '{}' amount", bill.name))?;
        if !(1..=31).contains(&bill.due_day) {
            return Err(InputError::invalid(format!(
                "bill '{}' dueDay must be between 1 and 31",
                bill.name
            )));
        }
    }
    for loan in &payload.loans {
        if !loan.terms.principal.is_finite() || loan.terms.principal <= 0.0 {
            return Err(InputError::invalid(format!(
                "loan '{}' principal must be > 0",
                loan.name
            )));
        }
        ensure_non_negative(loan.terms.annual_rate_percent, &format!("loan '{}' rate", loan.name))?;
        ensure_non_negative(loan.extra_principal, &format!("loan '{}' extraPrincipal", loan.name))?;
        if !(1..=31).contains(&loan.due_day) {
            return Err(InputError::invalid(format!(
                "loan '{}' dueDay must be between 1 and 31",
                loan.name
            )));
        }
    }

    let (per_paycheck_net, net_pay, salary_bonus) = match (payload.per_paycheck_net, payload.salary)
    {
        (Some(net), salary) => {
            if !net.is_finite() {
                return Err(InputError::invalid("perPaycheckNet must be a number"));
            }
            let bonus = match salary {
                Some(salary) => salary_bonus_after_tax(&salary, table)?,
                None => 0.0,
            };
            (net, None, bonus)
        }
        (None, Some(salary)) => {
            let gross = salary
                .gross_annual
                .ok_or_else(|| InputError::invalid("salary.grossAnnual is required"))?;
            ensure_non_negative(gross, "salary.grossAnnual")?;
            let pre_tax = salary.pre_tax_deductions.unwrap_or(0.0);
            ensure_non_negative(pre_tax, "salary.preTaxDeductions")?;
            let status = salary
                .filing_status
                .as_deref()
                .map(FilingStatus::from_label)
                .unwrap_or_default();
            let pay = estimate_net_pay(gross, pre_tax, status, frequency.periods_per_year(), table);
            let bonus = salary_bonus_after_tax(&salary, table)?;
            (pay.per_paycheck_net, Some(pay), bonus)
        }
        (None, None) => {
            return Err(InputError::invalid(
                "either perPaycheckNet or salary.grossAnnual is required",
            ));
        }
    };

    let after_tax_bonus = match payload.after_tax_bonus {
        Some(bonus) => {
            ensure_non_negative(bonus, "afterTaxBonus")?;
            bonus
        }
        None => salary_bonus,
    };

    Ok(ProjectionRequest {
        inputs: ProjectionInputs {
            per_paycheck_net,
            frequency,
            year: payload.year.unwrap_or(now.year()),
            month,
            bills: payload.bills,
            loans: payload.loans,
            after_tax_bonus,
        },
        net_pay,
    })
}

fn salary_bonus_after_tax(salary: &SalaryPayload, table: &TaxTable) -> Result<f64, InputError> {
    let Some(bonus) = salary.bonus else {
        return Ok(0.0);
    };
    ensure_non_negative(bonus, "salary.bonus")?;
    let status = salary
        .filing_status
        .as_deref()
        .map(FilingStatus::from_label)
        .unwrap_or_default();
    Ok(after_tax_bonus(
        bonus,
        salary.gross_annual.unwrap_or(0.0).max(0.0),
        salary.pre_tax_deductions.unwrap_or(0.0).max(0.0),
        status,
        table,
    ))
}

fn tax_response(request: &TaxRequest, table: &TaxTable) -> TaxResponse {
    let brackets = table.brackets_for(request.status);
    let effective_rate_percent = if request.income > 0.0 {
        compute_effective_rate(request.income, brackets).ok()
    } else {
        None
    };
    TaxResponse {
        tax_year: table.year,
        filing_status: request.status,
        income: request.income,
        bracket_tax: compute_progressive_tax(request.income, brackets),
        effective_rate_percent,
        net_pay: estimate_net_pay(
            request.income,
            request.pre_tax_deductions,
            request.status,
            request.periods_per_year,
            table,
        ),
        after_tax_bonus: after_tax_bonus(
            request.bonus,
            request.income,
            request.pre_tax_deductions,
            request.status,
            table,
        ),
    }
}

fn loan_response(request: &LoanRequest) -> LoanResponse {
    let overview = loan_overview(
        &request.terms,
        request.balance,
        request.extra_principal,
        request.first_payment_date,
        request.as_of,
        request.anchor,
    );
    LoanResponse {
        terms: request.terms,
        current_balance: request.balance,
        extra_principal: request.extra_principal,
        first_payment_date: request.first_payment_date,
        payoff_anchor: request.anchor,
        as_of: request.as_of,
        never_pays_off: overview.regular.months >= MAX_AMORTIZATION_MONTHS,
        overview,
    }
}

fn paycheck_response(request: &PaycheckRequest) -> PaycheckResponse {
    let paydays = biweekly_dates_in_month(request.anchor, request.year, request.month);
    PaycheckResponse {
        anchor: request.anchor,
        year: request.year,
        month: request.month,
        three_paycheck_month: paydays.len() == 3,
        paydays,
    }
}

fn projection_response(request: ProjectionRequest) -> ProjectionResponse {
    ProjectionResponse {
        summary: project_month(&request.inputs),
        frequency: request.inputs.frequency,
        year: request.inputs.year,
        month: request.inputs.month,
        net_pay: request.net_pay,
    }
}

fn default_tax_args() -> TaxArgs {
    TaxArgs {
        income: 60_000.0,
        filing_status: CliFilingStatus::Single,
        pre_tax_deductions: 0.0,
        periods_per_year: 26,
        bonus: 0.0,
    }
}

fn default_loan_args() -> LoanArgs {
    LoanArgs {
        principal: 10_000.0,
        rate: 12.0,
        term_months: Some(12),
        balance: None,
        extra_principal: 0.0,
        first_payment_date: None,
        payoff_anchor: CliPayoffAnchor::Today,
        as_of: None,
    }
}

fn api_tax_request_from_payload(payload: TaxPayload) -> Result<TaxRequest, InputError> {
    let mut args = default_tax_args();
    if let Some(v) = payload.income {
        args.income = v;
    }
    if let Some(v) = payload.filing_status {
        args.filing_status = FilingStatus::from_label(&v).into();
    }
    if let Some(v) = payload.pre_tax_deductions {
        args.pre_tax_deductions = v;
    }
    if let Some(v) = payload.periods_per_year {
        args.periods_per_year = v;
    }
    if let Some(v) = payload.bonus {
        args.bonus = v;
    }
    build_tax_request(args)
}

fn api_loan_request_from_payload(payload: LoanPayload) -> Result<LoanRequest, InputError> {
    let mut args = default_loan_args();
    if let Some(v) = payload.principal {
        args.principal = v;
    }
    if let Some(v) = payload.rate {
        args.rate = v;
    }
    if payload.term_months.is_some() {
        args.term_months = payload.term_months;
    }
    if payload.balance.is_some() {
        args.balance = payload.balance;
    }
    if let Some(v) = payload.extra_principal {
        args.extra_principal = v;
    }
    if payload.first_payment_date.is_some() {
        args.first_payment_date = payload.first_payment_date;
    }
    if let Some(v) = payload.payoff_anchor {
        args.payoff_anchor = v.into();
    }
    if payload.as_of.is_some() {
        args.as_of = payload.as_of;
    }
    build_loan_request(args)
}

fn api_paycheck_request_from_payload(
    payload: PaycheckPayload,
) -> Result<PaycheckRequest, InputError> {
    let anchor = payload
        .anchor
        .ok_or_else(|| InputError::invalid("anchor is required"))?;
    build_paycheck_request(PaycheckArgs {
        anchor,
        year: payload.year,
        month: payload.month,
    })
}

fn api_projection_request_from_json(
    json: &str,
    table: &TaxTable,
) -> Result<ProjectionRequest, InputError> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)?;
    build_projection_request(payload, table)
}

pub fn load_tax_table(path: Option<&Path>, year: Option<i32>) -> Result<TaxTable, CliError> {
    if let Some(path) = path {
        return Ok(TaxTable::load(path)?);
    }
    match year {
        Some(year) => TaxTable::federal(year).ok_or_else(|| {
            CliError::from(InputError::invalid(format!(
                "--tax-year must be one of {:?}",
                TaxTable::BUILT_IN_YEARS
            )))
        }),
        None => Ok(TaxTable::default()),
    }
}

pub async fn run_cli(cli: Cli) -> Result<(), CliError> {
    let table = load_tax_table(cli.tax_table.as_deref(), cli.tax_year)?;
    let output = match cli.command {
        Command::Tax(args) => {
            let request = build_tax_request(args)?;
            serde_json::to_string_pretty(&tax_response(&request, &table))?
        }
        Command::Loan(args) => {
            let request = build_loan_request(args)?;
            serde_json::to_string_pretty(&loan_response(&request))?
        }
        Command::Paychecks(args) => {
            let request = build_paycheck_request(args)?;
            serde_json::to_string_pretty(&paycheck_response(&request))?
        }
        Command::Project { input } => {
            let raw = fs::read_to_string(&input).map_err(|source| InputError::Io {
                path: input.clone(),
                source,
            })?;
            let request = api_projection_request_from_json(&raw, &table)?;
            serde_json::to_string_pretty(&projection_response(request))?
        }
        Command::Serve { port } => {
            run_http_server(port, table).await?;
            return Ok(());
        }
    };
    println!("{output}");
    Ok(())
}

pub fn router(table: Arc<TaxTable>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/tax", get(tax_get_handler).post(tax_post_handler))
        .route("/api/loan", get(loan_get_handler).post(loan_post_handler))
        .route(
            "/api/paychecks",
            get(paychecks_get_handler).post(paychecks_post_handler),
        )
        .route("/api/projection", post(projection_handler))
        .fallback(not_found_handler)
        .with_state(AppState { table })
}

pub async fn run_http_server(port: u16, table: TaxTable) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(Arc::new(table));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "payplan HTTP API listening");

    axum::serve(listener, app).await
}

async fn health_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            tax_year: state.table.year,
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn tax_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<TaxPayload>,
) -> Response {
    tax_handler_impl(&state, payload)
}

async fn tax_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<TaxPayload>,
) -> Response {
    tax_handler_impl(&state, payload)
}

fn tax_handler_impl(state: &AppState, payload: TaxPayload) -> Response {
    match api_tax_request_from_payload(payload) {
        Ok(request) => {
            tracing::debug!(income = request.income, status = ?request.status, "tax request");
            json_response(StatusCode::OK, tax_response(&request, &state.table))
        }
        Err(err) => bad_request(err),
    }
}

async fn loan_get_handler(Query(payload): Query<LoanPayload>) -> Response {
    loan_handler_impl(payload)
}

async fn loan_post_handler(Json(payload): Json<LoanPayload>) -> Response {
    loan_handler_impl(payload)
}

fn loan_handler_impl(payload: LoanPayload) -> Response {
    match api_loan_request_from_payload(payload) {
        Ok(request) => {
            tracing::debug!(
                principal = request.terms.principal,
                rate = request.terms.annual_rate_percent,
                "loan request"
            );
            json_response(StatusCode::OK, loan_response(&request))
        }
        Err(err) => bad_request(err),
    }
}

async fn paychecks_get_handler(Query(payload): Query<PaycheckPayload>) -> Response {
    paychecks_handler_impl(payload)
}

async fn paychecks_post_handler(Json(payload): Json<PaycheckPayload>) -> Response {
    paychecks_handler_impl(payload)
}

fn paychecks_handler_impl(payload: PaycheckPayload) -> Response {
    match api_paycheck_request_from_payload(payload) {
        Ok(request) => {
            tracing::debug!(anchor = %request.anchor, year = request.year, month = request.month, "paycheck request");
            json_response(StatusCode::OK, paycheck_response(&request))
        }
        Err(err) => bad_request(err),
    }
}

async fn projection_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProjectionPayload>,
) -> Response {
    match build_projection_request(payload, &state.table) {
        Ok(request) => {
            tracing::debug!(
                bills = request.inputs.bills.len(),
                loans = request.inputs.loans.len(),
                "projection request"
            );
            json_response(StatusCode::OK, projection_response(request))
        }
        Err(err) => bad_request(err),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn bad_request(err: InputError) -> Response {
    tracing::debug!(error = %err, "rejected request");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

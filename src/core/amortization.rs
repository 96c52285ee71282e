use chrono::{Datelike, Local, NaiveDate};

use super::calendar::days_in_month;
use super::types::{AmortizationStep, LoanOverview, LoanTerms, PayoffAnchor, PayoffSimulation};

/// Hard ceiling on simulated months (100 years). A simulation that reaches
/// it means the payment never catches up with the interest.
pub const MAX_AMORTIZATION_MONTHS: u32 = 1200;

/// Balances at or below half a cent count as paid off.
pub const PAID_OFF_THRESHOLD: f64 = 0.005;

/// Share of principal charged monthly when a loan has no term.
const MINIMUM_PAYMENT_RATE: f64 = 0.01;

fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

fn settled(balance: f64) -> f64 {
    if balance > PAID_OFF_THRESHOLD {
        balance
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy)]
struct MonthStep {
    interest: f64,
    principal_paid: f64,
    extra_paid: f64,
}

impl MonthStep {
    fn reduction(self) -> f64 {
        self.principal_paid + self.extra_paid
    }
}

fn amortize_month(balance: f64, rate: f64, payment: f64, extra_principal: f64) -> MonthStep {
    let interest = balance * rate;
    let principal_paid = (payment - interest).min(balance);
    let extra_paid = extra_principal.min(balance - principal_paid);
    MonthStep {
        interest,
        principal_paid,
        extra_paid,
    }
}

/// Fixed monthly payment that retires `principal` over `term_months`.
///
/// Loans without a term fall back to a 1% minimum payment. A zero rate is
/// paid off straight-line.
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, term_months: Option<u32>) -> f64 {
    let n = match term_months {
        Some(n) if n > 0 => n,
        _ => return principal * MINIMUM_PAYMENT_RATE,
    };
    let rate = monthly_rate(annual_rate_percent);
    if rate == 0.0 {
        return principal / n as f64;
    }
    // Same annuity as P*r*(1+r)^n / ((1+r)^n - 1), without overflowing for long terms.
    principal * rate / (1.0 - (1.0 + rate).powf(-(n as f64)))
}

/// Month-by-month payoff of `balance` with a constant extra principal
/// payment on top of `regular_payment`.
pub fn simulate_payoff(
    balance: f64,
    annual_rate_percent: f64,
    regular_payment: f64,
    extra_principal: f64,
) -> PayoffSimulation {
    if regular_payment <= 0.0 {
        return PayoffSimulation {
            months: 0,
            total_interest: 0.0,
        };
    }

    let extra = extra_principal.max(0.0);
    let rate = monthly_rate(annual_rate_percent);
    if rate == 0.0 {
        let months = (balance.max(0.0) / (regular_payment + extra)).ceil();
        return PayoffSimulation {
            months: months as u32,
            total_interest: 0.0,
        };
    }

    let mut remaining = balance;
    let mut total_interest = 0.0;
    let mut months = 0;
    while remaining > PAID_OFF_THRESHOLD && months < MAX_AMORTIZATION_MONTHS {
        let step = amortize_month(remaining, rate, regular_payment, extra);
        total_interest += step.interest;
        remaining -= step.reduction();
        months += 1;
    }

    if months == MAX_AMORTIZATION_MONTHS {
        tracing::debug!(
            balance,
            annual_rate_percent,
            regular_payment,
            extra,
            remaining,
            "payoff simulation reached the iteration ceiling"
        );
    }

    PayoffSimulation {
        months,
        total_interest,
    }
}

pub fn remaining_payments(
    balance: f64,
    annual_rate_percent: f64,
    regular_payment: f64,
    extra_principal: f64,
) -> u32 {
    simulate_payoff(balance, annual_rate_percent, regular_payment, extra_principal).months
}

pub fn total_interest_paid(
    balance: f64,
    annual_rate_percent: f64,
    regular_payment: f64,
    extra_principal: f64,
) -> f64 {
    simulate_payoff(balance, annual_rate_percent, regular_payment, extra_principal).total_interest
}

pub fn parse_payment_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Projected payoff date counted from today, landing on the first
/// payment's day of month.
pub fn payoff_date(first_payment_date: Option<NaiveDate>, remaining_months: u32) -> Option<NaiveDate> {
    payoff_date_with(
        first_payment_date,
        remaining_months,
        Local::now().date_naive(),
        PayoffAnchor::Today,
    )
}

pub fn payoff_date_with(
    first_payment_date: Option<NaiveDate>,
    remaining_months: u32,
    today: NaiveDate,
    anchor: PayoffAnchor,
) -> Option<NaiveDate> {
    let first = first_payment_date?;
    if remaining_months == 0 {
        return None;
    }
    match anchor {
        PayoffAnchor::Today => shift_months_to_day(today, remaining_months, first.day()),
        PayoffAnchor::ElapsedPayments => {
            let made = payments_made(first, today);
            shift_months_to_day(
                first,
                made.saturating_add(remaining_months - 1),
                first.day(),
            )
        }
    }
}

/// Moves `from` forward by whole months and pins the day of month, clamped
/// to the length of the target month.
fn shift_months_to_day(from: NaiveDate, months: u32, day: u32) -> Option<NaiveDate> {
    let total = i64::from(from.year()) * 12 + i64::from(from.month0()) + i64::from(months);
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;
    let day = day.min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Scheduled payments dated on or before `today`.
fn payments_made(first: NaiveDate, today: NaiveDate) -> u32 {
    if today < first {
        return 0;
    }
    let months_between = (today.year() - first.year()) * 12 + today.month() as i32
        - first.month() as i32;
    let months_between = months_between.max(0) as u32;
    match shift_months_to_day(first, months_between, first.day()) {
        Some(latest) if latest <= today => months_between + 1,
        _ => months_between,
    }
}

/// Balance curves with and without extra principal for charting.
///
/// Every month is recorded while either balance is open, and the month
/// both clear (or the term ends) is always the final point, so the
/// `term / 12` display interval never has to add points of its own.
/// Loans without a term or without interest have no schedule to chart and
/// yield an empty series.
pub fn build_amortization_series(
    principal: f64,
    annual_rate_percent: f64,
    term_months: Option<u32>,
    extra_principal: f64,
) -> Vec<AmortizationStep> {
    let Some(term) = term_months.filter(|n| *n > 0) else {
        return Vec::new();
    };
    let rate = monthly_rate(annual_rate_percent);
    if rate == 0.0 {
        return Vec::new();
    }

    let payment = monthly_payment(principal, annual_rate_percent, Some(term));
    let extra = extra_principal.max(0.0);

    let mut series = Vec::with_capacity(term.min(MAX_AMORTIZATION_MONTHS) as usize + 1);
    series.push(AmortizationStep {
        month_index: 0,
        balance_regular: principal,
        balance_with_extra: principal,
    });

    let mut regular = principal;
    let mut with_extra = principal;
    for month in 1..=term {
        if regular > PAID_OFF_THRESHOLD {
            regular -= amortize_month(regular, rate, payment, 0.0).reduction();
        }
        if with_extra > PAID_OFF_THRESHOLD {
            with_extra -= amortize_month(with_extra, rate, payment, extra).reduction();
        }

        series.push(AmortizationStep {
            month_index: month,
            balance_regular: settled(regular),
            balance_with_extra: settled(with_extra),
        });

        if regular <= PAID_OFF_THRESHOLD && with_extra <= PAID_OFF_THRESHOLD {
            break;
        }
    }

    series
}

/// Every figure a loan card shows, computed from one simulation per scenario.
///
/// The scheduled payment comes from the original terms while the
/// simulations run on the current balance.
pub fn loan_overview(
    terms: &LoanTerms,
    current_balance: f64,
    extra_principal: f64,
    first_payment_date: Option<NaiveDate>,
    today: NaiveDate,
    anchor: PayoffAnchor,
) -> LoanOverview {
    let payment = monthly_payment(terms.principal, terms.annual_rate_percent, terms.term_months);
    let regular = simulate_payoff(current_balance, terms.annual_rate_percent, payment, 0.0);
    let with_extra = simulate_payoff(
        current_balance,
        terms.annual_rate_percent,
        payment,
        extra_principal,
    );

    LoanOverview {
        monthly_payment: payment,
        regular,
        with_extra,
        interest_saved: (regular.total_interest - with_extra.total_interest).max(0.0),
        months_saved: regular.months.saturating_sub(with_extra.months),
        payoff_date: payoff_date_with(first_payment_date, regular.months, today, anchor),
        payoff_date_with_extra: payoff_date_with(
            first_payment_date,
            with_extra.months,
            today,
            anchor,
        ),
        series: build_amortization_series(
            current_balance,
            terms.annual_rate_percent,
            terms.term_months,
            extra_principal,
        ),
    }
}

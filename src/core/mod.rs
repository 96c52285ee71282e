mod amortization;
mod calendar;
mod projection;
mod tables;
mod tax;
mod types;

pub use amortization::{
    MAX_AMORTIZATION_MONTHS, PAID_OFF_THRESHOLD, build_amortization_series, loan_overview,
    monthly_payment, parse_payment_date, payoff_date, payoff_date_with, remaining_payments,
    simulate_payoff, total_interest_paid,
};
pub use calendar::{biweekly_dates_in_month, pay_anchor_from, semi_monthly_dates_in_month};
pub use projection::{paydays_in_month, project_month};
pub use tables::{ByStatus, PayrollRates, TaxTable};
pub use tax::{
    TaxError, after_tax_bonus, compute_effective_rate, compute_progressive_tax, estimate_net_pay,
    medicare_tax, social_security_tax,
};
pub use types::{
    AmortizationStep, FilingStatus, LoanOverview, LoanRecord, LoanTerms, NetPay, PayFrequency,
    PaycheckBucket, PaymentAccountKind, PayoffAnchor, PayoffSimulation, ProjectionInputs,
    ProjectionSummary, RecurringBill, TaxBracket,
};

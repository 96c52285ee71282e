use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingStatus {
    #[default]
    Single,
    #[serde(alias = "married-joint", alias = "marriedJoint")]
    Married,
    #[serde(alias = "head-of-household", alias = "headOfHousehold")]
    Head,
}

impl FilingStatus {
    /// Resolves a free-form label; anything unrecognised is taxed as `Single`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "married" | "married-joint" | "married_joint" | "marriedjoint" | "mfj" => {
                FilingStatus::Married
            }
            "head" | "head-of-household" | "head_of_household" | "headofhousehold" | "hoh" => {
                FilingStatus::Head
            }
            _ => FilingStatus::Single,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::Married => "married",
            FilingStatus::Head => "head",
        }
    }
}

/// One marginal band. `max: None` marks the open-ended top bracket.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
    /// Percent, 0-100.
    pub rate: f64,
}

impl TaxBracket {
    pub const fn new(min: f64, max: Option<f64>, rate: f64) -> Self {
        Self { min, max, rate }
    }

    pub fn upper(&self) -> f64 {
        self.max.unwrap_or(f64::INFINITY)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_rate_percent: f64,
    #[serde(default)]
    pub term_months: Option<u32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationStep {
    pub month_index: u32,
    pub balance_regular: f64,
    pub balance_with_extra: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffSimulation {
    pub months: u32,
    pub total_interest: f64,
}

/// Which date a payoff projection counts remaining months from.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoffAnchor {
    #[default]
    #[serde(alias = "today")]
    Today,
    #[serde(alias = "elapsedPayments", alias = "elapsed")]
    ElapsedPayments,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentAccountKind {
    #[default]
    #[serde(alias = "checking", alias = "bank")]
    Cash,
    #[serde(alias = "creditCard", alias = "credit")]
    CreditCard,
}

impl PaymentAccountKind {
    pub fn is_revolving_credit(self) -> bool {
        matches!(self, PaymentAccountKind::CreditCard)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringBill {
    pub name: String,
    pub amount: f64,
    pub due_day: u32,
    #[serde(default)]
    pub paid_with: PaymentAccountKind,
    /// Loan whose scheduled payment this bill stands for.
    #[serde(default)]
    pub source_loan_id: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    pub id: u64,
    pub name: String,
    pub terms: LoanTerms,
    #[serde(default)]
    pub extra_principal: f64,
    pub due_day: u32,
    #[serde(default)]
    pub paid_with: PaymentAccountKind,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum PayFrequency {
    SemiMonthly,
    Biweekly { anchor: NaiveDate },
}

impl PayFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PayFrequency::SemiMonthly => 24,
            PayFrequency::Biweekly { .. } => 26,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionInputs {
    pub per_paycheck_net: f64,
    pub frequency: PayFrequency,
    pub year: i32,
    pub month: u32,
    pub bills: Vec<RecurringBill>,
    pub loans: Vec<LoanRecord>,
    pub after_tax_bonus: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaycheckBucket {
    pub pay_date: NaiveDate,
    pub bills_total: f64,
    pub surplus: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub per_paycheck_net: f64,
    pub paycheck_count: usize,
    pub bills_by_paycheck: Vec<PaycheckBucket>,
    pub monthly_income: f64,
    pub monthly_bills: f64,
    pub monthly_surplus: f64,
    pub annual_surplus: f64,
    pub annual_surplus_with_bonus: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetPay {
    pub gross_annual: f64,
    pub taxable_income: f64,
    pub federal_tax: f64,
    pub social_security_tax: f64,
    pub medicare_tax: f64,
    pub net_annual: f64,
    pub periods_per_year: u32,
    pub per_paycheck_net: f64,
    pub effective_rate_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOverview {
    pub monthly_payment: f64,
    pub regular: PayoffSimulation,
    pub with_extra: PayoffSimulation,
    pub interest_saved: f64,
    pub months_saved: u32,
    pub payoff_date: Option<NaiveDate>,
    pub payoff_date_with_extra: Option<NaiveDate>,
    pub series: Vec<AmortizationStep>,
}

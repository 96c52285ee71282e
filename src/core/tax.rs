use thiserror::Error;

use super::tables::{PayrollRates, TaxTable};
use super::types::{FilingStatus, NetPay, TaxBracket};

#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum TaxError {
    #[error("effective rate is undefined for zero income")]
    DivisionByZero,
}

/// Progressive tax over `brackets`, which must be sorted ascending by `min`.
///
/// Each bracket taxes the slice of income between its `min` and
/// `min(income, max)`. Iteration stops at the first bracket whose ceiling
/// covers the income, so higher brackets never accrue anything.
pub fn compute_progressive_tax(annual_income: f64, brackets: &[TaxBracket]) -> f64 {
    let mut tax = 0.0;
    for bracket in brackets {
        if annual_income > bracket.min {
            let taxable = annual_income.min(bracket.upper()) - bracket.min;
            tax += taxable * bracket.rate / 100.0;
        }
        if annual_income <= bracket.upper() {
            break;
        }
    }
    tax.max(0.0)
}

/// Tax as a percentage of income. Callers are expected to guard
/// non-positive incomes; exactly zero is reported rather than producing NaN.
pub fn compute_effective_rate(annual_income: f64, brackets: &[TaxBracket]) -> Result<f64, TaxError> {
    if annual_income == 0.0 {
        return Err(TaxError::DivisionByZero);
    }
    Ok(compute_progressive_tax(annual_income, brackets) / annual_income * 100.0)
}

pub fn social_security_tax(wages: f64, rates: &PayrollRates) -> f64 {
    let base = wages.max(0.0).min(rates.social_security_wage_cap.max(0.0));
    base * rates.social_security_rate_percent / 100.0
}

pub fn medicare_tax(wages: f64, status: FilingStatus, rates: &PayrollRates) -> f64 {
    let wages = wages.max(0.0);
    let threshold = *rates.medicare_surcharge_threshold.get(status);
    let surcharge_base = (wages - threshold).max(0.0);
    wages * rates.medicare_rate_percent / 100.0
        + surcharge_base * rates.medicare_surcharge_rate_percent / 100.0
}

#[derive(Copy, Clone, Debug)]
struct TaxBreakdown {
    taxable_income: f64,
    federal: f64,
    social_security: f64,
    medicare: f64,
}

impl TaxBreakdown {
    fn total(self) -> f64 {
        self.federal + self.social_security + self.medicare
    }
}

fn tax_breakdown(
    gross_annual: f64,
    pre_tax_deductions: f64,
    status: FilingStatus,
    table: &TaxTable,
) -> TaxBreakdown {
    let wages = (gross_annual - pre_tax_deductions.max(0.0)).max(0.0);
    let taxable_income = (wages - table.standard_deduction_for(status)).max(0.0);
    TaxBreakdown {
        taxable_income,
        federal: compute_progressive_tax(taxable_income, table.brackets_for(status)),
        social_security: social_security_tax(wages, &table.payroll),
        medicare: medicare_tax(wages, status, &table.payroll),
    }
}

/// Annual and per-paycheck take-home pay for a salaried earner.
pub fn estimate_net_pay(
    gross_annual: f64,
    pre_tax_deductions: f64,
    status: FilingStatus,
    periods_per_year: u32,
    table: &TaxTable,
) -> NetPay {
    let gross = gross_annual.max(0.0);
    let pre_tax = pre_tax_deductions.max(0.0).min(gross);
    let taxes = tax_breakdown(gross, pre_tax, status, table);
    let net_annual = gross - pre_tax - taxes.total();
    let periods = periods_per_year.max(1);

    let effective_rate_percent = if gross > 0.0 {
        taxes.total() / gross * 100.0
    } else {
        0.0
    };

    NetPay {
        gross_annual: gross,
        taxable_income: taxes.taxable_income,
        federal_tax: taxes.federal,
        social_security_tax: taxes.social_security,
        medicare_tax: taxes.medicare,
        net_annual,
        periods_per_year: periods,
        per_paycheck_net: net_annual / periods as f64,
        effective_rate_percent,
    }
}

/// What a bonus leaves after the extra federal and payroll tax it triggers
/// on top of the regular salary.
pub fn after_tax_bonus(
    bonus: f64,
    gross_annual: f64,
    pre_tax_deductions: f64,
    status: FilingStatus,
    table: &TaxTable,
) -> f64 {
    let bonus = bonus.max(0.0);
    if bonus == 0.0 {
        return 0.0;
    }
    let gross = gross_annual.max(0.0);
    let base = tax_breakdown(gross, pre_tax_deductions, status, table);
    let with_bonus = tax_breakdown(gross + bonus, pre_tax_deductions, status, table);
    bonus - (with_bonus.total() - base.total())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn single_brackets() -> Vec<TaxBracket> {
        TaxTable::federal_2024().brackets.single
    }

    #[test]
    fn sixty_thousand_single_matches_hand_calculation() {
        let tax = compute_progressive_tax(60_000.0, &single_brackets());
        let expected = 0.10 * 11_600.0 + 0.12 * (47_150.0 - 11_600.0) + 0.22 * (60_000.0 - 47_150.0);
        assert_approx(tax, expected);
        assert_approx(tax, 8_253.0);
    }

    #[test]
    fn later_year_schedule_changes_the_same_salary() {
        let table = TaxTable::federal_2025();
        let pay = estimate_net_pay(75_000.0, 0.0, FilingStatus::Single, 24, &table);
        assert_approx(pay.taxable_income, 60_000.0);
        assert_approx(
            pay.federal_tax,
            0.10 * 11_925.0 + 0.12 * (48_475.0 - 11_925.0) + 0.22 * (60_000.0 - 48_475.0),
        );
        assert_approx(pay.federal_tax, 8_114.0);
        assert_approx(
            social_security_tax(200_000.0, &table.payroll),
            176_100.0 * 0.062,
        );
    }

    #[test]
    fn income_inside_first_bracket_only_pays_first_rate() {
        assert_approx(compute_progressive_tax(5_000.0, &single_brackets()), 500.0);
    }

    #[test]
    fn zero_and_negative_income_owe_nothing() {
        assert_approx(compute_progressive_tax(0.0, &single_brackets()), 0.0);
        assert_approx(compute_progressive_tax(-2_500.0, &single_brackets()), 0.0);
    }

    #[test]
    fn income_on_bracket_edge_stops_at_that_bracket() {
        let tax = compute_progressive_tax(47_150.0, &single_brackets());
        assert_approx(tax, 1_160.0 + 4_266.0);
    }

    #[test]
    fn empty_schedule_owes_nothing() {
        assert_approx(compute_progressive_tax(90_000.0, &[]), 0.0);
    }

    #[test]
    fn effective_rate_divides_by_income() {
        let rate = compute_effective_rate(60_000.0, &single_brackets()).expect("non-zero income");
        assert_approx(rate, 8_253.0 / 60_000.0 * 100.0);
    }

    #[test]
    fn effective_rate_reports_division_by_zero() {
        assert_eq!(
            compute_effective_rate(0.0, &single_brackets()),
            Err(TaxError::DivisionByZero)
        );
    }

    #[test]
    fn unknown_status_label_uses_single_schedule() {
        let table = TaxTable::federal_2024();
        let status = FilingStatus::from_label("widowed");
        assert_eq!(status, FilingStatus::Single);
        assert_eq!(table.brackets_for(status), table.brackets_for(FilingStatus::Single));
        assert_eq!(FilingStatus::from_label(" MFJ "), FilingStatus::Married);
        assert_eq!(FilingStatus::from_label("head-of-household"), FilingStatus::Head);
    }

    #[test]
    fn social_security_stops_at_wage_cap() {
        let rates = TaxTable::federal_2024().payroll;
        assert_approx(social_security_tax(100_000.0, &rates), 6_200.0);
        assert_approx(social_security_tax(300_000.0, &rates), 168_600.0 * 0.062);
    }

    #[test]
    fn medicare_adds_surcharge_above_threshold() {
        let rates = TaxTable::federal_2024().payroll;
        assert_approx(medicare_tax(100_000.0, FilingStatus::Single, &rates), 1_450.0);
        assert_approx(
            medicare_tax(300_000.0, FilingStatus::Single, &rates),
            300_000.0 * 0.0145 + 100_000.0 * 0.009,
        );
        assert_approx(
            medicare_tax(300_000.0, FilingStatus::Married, &rates),
            300_000.0 * 0.0145 + 50_000.0 * 0.009,
        );
    }

    #[test]
    fn net_pay_subtracts_all_taxes_and_splits_per_period() {
        let table = TaxTable::federal_2024();
        let pay = estimate_net_pay(74_600.0, 0.0, FilingStatus::Single, 26, &table);
        assert_approx(pay.taxable_income, 60_000.0);
        assert_approx(pay.federal_tax, 8_253.0);
        assert_approx(pay.social_security_tax, 74_600.0 * 0.062);
        assert_approx(pay.medicare_tax, 74_600.0 * 0.0145);
        let expected_net = 74_600.0 - 8_253.0 - 74_600.0 * 0.0765;
        assert_approx(pay.net_annual, expected_net);
        assert_approx(pay.per_paycheck_net, expected_net / 26.0);
        assert_approx(
            pay.effective_rate_percent,
            (74_600.0 - expected_net) / 74_600.0 * 100.0,
        );
    }

    #[test]
    fn net_pay_treats_pre_tax_deductions_as_untaxed() {
        let table = TaxTable::federal_2024();
        let pay = estimate_net_pay(80_000.0, 5_400.0, FilingStatus::Single, 24, &table);
        assert_approx(pay.taxable_income, 60_000.0);
        let expected_net = 80_000.0 - 5_400.0 - 8_253.0 - 74_600.0 * 0.0765;
        assert_approx(pay.net_annual, expected_net);
    }

    #[test]
    fn net_pay_for_zero_salary_is_zero() {
        let pay = estimate_net_pay(0.0, 0.0, FilingStatus::Head, 26, &TaxTable::default());
        assert_approx(pay.net_annual, 0.0);
        assert_approx(pay.per_paycheck_net, 0.0);
        assert_approx(pay.effective_rate_percent, 0.0);
    }

    #[test]
    fn bonus_is_taxed_at_the_marginal_rates() {
        let table = TaxTable::federal_2024();
        let net = after_tax_bonus(5_000.0, 74_600.0, 0.0, FilingStatus::Single, &table);
        assert_approx(net, 5_000.0 * (1.0 - 0.22 - 0.0765));
        assert_approx(after_tax_bonus(0.0, 74_600.0, 0.0, FilingStatus::Single, &table), 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_tax_is_non_decreasing_and_marginal_rate_is_bounded(
            income_cents in 0u64..100_000_000,
            bump_cents in 1u64..100_000,
            status_idx in 0usize..3
        ) {
            let table = TaxTable::federal_2024();
            let status = [FilingStatus::Single, FilingStatus::Married, FilingStatus::Head][status_idx];
            let brackets = table.brackets_for(status);
            let income = income_cents as f64 / 100.0;
            let bump = bump_cents as f64 / 100.0;

            let low = compute_progressive_tax(income, brackets);
            let high = compute_progressive_tax(income + bump, brackets);
            prop_assert!(low >= 0.0);
            prop_assert!(high + 1e-9 >= low);
            prop_assert!(high - low <= bump * 0.37 + 1e-6);
        }

        #[test]
        fn prop_tax_is_continuous_across_bracket_edges(
            edge_idx in 0usize..6,
            status_idx in 0usize..3
        ) {
            let table = TaxTable::federal_2024();
            let status = [FilingStatus::Single, FilingStatus::Married, FilingStatus::Head][status_idx];
            let brackets = table.brackets_for(status);
            let edge = brackets[edge_idx].upper();
            let below = compute_progressive_tax(edge - 0.001, brackets);
            let above = compute_progressive_tax(edge + 0.001, brackets);
            prop_assert!((above - below).abs() < 0.01);
        }
    }
}

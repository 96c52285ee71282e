use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

use super::amortization::monthly_payment;
use super::calendar::{biweekly_dates_in_month, semi_monthly_dates_in_month};
use super::types::{
    LoanRecord, PayFrequency, PaycheckBucket, ProjectionInputs, ProjectionSummary, RecurringBill,
};

/// Last due day covered by the first semi-monthly paycheck.
const SEMI_MONTHLY_SPLIT_DAY: f64 = 15.0;

#[derive(Debug, Clone, Copy)]
struct Outflow {
    amount: f64,
    due_day: u32,
}

pub fn paydays_in_month(frequency: PayFrequency, year: i32, month: u32) -> Vec<NaiveDate> {
    match frequency {
        PayFrequency::SemiMonthly => semi_monthly_dates_in_month(year, month),
        PayFrequency::Biweekly { anchor } => biweekly_dates_in_month(anchor, year, month),
    }
}

/// Monthly cash leaving the paychecks. Card-paid items are excluded, and a
/// loan only contributes its own scheduled payment when no bill already
/// stands for it.
fn cash_outflows(bills: &[RecurringBill], loans: &[LoanRecord]) -> Vec<Outflow> {
    let linked: HashSet<u64> = bills.iter().filter_map(|bill| bill.source_loan_id).collect();

    let bill_outflows = bills
        .iter()
        .filter(|bill| !bill.paid_with.is_revolving_credit())
        .map(|bill| Outflow {
            amount: bill.amount,
            due_day: bill.due_day,
        });

    let loan_outflows = loans
        .iter()
        .filter(|loan| !loan.paid_with.is_revolving_credit() && !linked.contains(&loan.id))
        .map(|loan| Outflow {
            amount: monthly_payment(
                loan.terms.principal,
                loan.terms.annual_rate_percent,
                loan.terms.term_months,
            ) + loan.extra_principal.max(0.0),
            due_day: loan.due_day,
        });

    bill_outflows.chain(loan_outflows).collect()
}

/// Inclusive due-day ceilings for every bucket but the last.
fn bucket_boundaries(frequency: PayFrequency, paydays: &[NaiveDate]) -> Vec<f64> {
    match frequency {
        PayFrequency::SemiMonthly => vec![SEMI_MONTHLY_SPLIT_DAY],
        PayFrequency::Biweekly { .. } => paydays
            .windows(2)
            .map(|pair| f64::from(pair[0].day() + pair[1].day()) / 2.0)
            .collect(),
    }
}

fn bucket_index(due_day: u32, boundaries: &[f64], bucket_count: usize) -> usize {
    let due_day = f64::from(due_day);
    boundaries
        .iter()
        .position(|boundary| due_day <= *boundary)
        .unwrap_or(boundaries.len())
        .min(bucket_count.saturating_sub(1))
}

/// Splits a month's bills across its paychecks and derives the surplus
/// left per paycheck, per month and per year. Surpluses go negative when
/// bills exceed pay.
pub fn project_month(inputs: &ProjectionInputs) -> ProjectionSummary {
    let paydays = paydays_in_month(inputs.frequency, inputs.year, inputs.month);
    let boundaries = bucket_boundaries(inputs.frequency, &paydays);
    let outflows = cash_outflows(&inputs.bills, &inputs.loans);

    let mut totals = vec![0.0; paydays.len()];
    if !totals.is_empty() {
        for outflow in &outflows {
            let idx = bucket_index(outflow.due_day, &boundaries, totals.len());
            totals[idx] += outflow.amount;
        }
    }

    let per_paycheck_net = inputs.per_paycheck_net;
    let bills_by_paycheck: Vec<PaycheckBucket> = paydays
        .iter()
        .zip(&totals)
        .map(|(pay_date, bills_total)| PaycheckBucket {
            pay_date: *pay_date,
            bills_total: *bills_total,
            surplus: per_paycheck_net - bills_total,
        })
        .collect();

    let monthly_bills: f64 = outflows.iter().map(|outflow| outflow.amount).sum();
    let monthly_income = per_paycheck_net * paydays.len() as f64;
    let annual_surplus =
        per_paycheck_net * f64::from(inputs.frequency.periods_per_year()) - monthly_bills * 12.0;

    tracing::debug!(
        year = inputs.year,
        month = inputs.month,
        paychecks = paydays.len(),
        outflows = outflows.len(),
        "projected month"
    );

    ProjectionSummary {
        per_paycheck_net,
        paycheck_count: paydays.len(),
        bills_by_paycheck,
        monthly_income,
        monthly_bills,
        monthly_surplus: monthly_income - monthly_bills,
        annual_surplus,
        annual_surplus_with_bonus: annual_surplus + inputs.after_tax_bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{LoanTerms, PaymentAccountKind};
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn bill(name: &str, amount: f64, due_day: u32) -> RecurringBill {
        RecurringBill {
            name: name.to_string(),
            amount,
            due_day,
            paid_with: PaymentAccountKind::Cash,
            source_loan_id: None,
        }
    }

    fn loan(id: u64, principal: f64, term: u32, extra: f64, due_day: u32) -> LoanRecord {
        LoanRecord {
            id,
            name: format!("loan-{id}"),
            terms: LoanTerms {
                principal,
                annual_rate_percent: 0.0,
                term_months: Some(term),
            },
            extra_principal: extra,
            due_day,
            paid_with: PaymentAccountKind::Cash,
        }
    }

    fn household() -> ProjectionInputs {
        let mut streaming = bill("Streaming", 15.0, 5);
        streaming.paid_with = PaymentAccountKind::CreditCard;
        let mut car_payment = bill("Car Payment", 350.0, 10);
        car_payment.source_loan_id = Some(7);
        let mut card_loan = loan(11, 2_400.0, 24, 0.0, 3);
        card_loan.paid_with = PaymentAccountKind::CreditCard;

        ProjectionInputs {
            per_paycheck_net: 2_000.0,
            frequency: PayFrequency::SemiMonthly,
            year: 2025,
            month: 3,
            bills: vec![
                bill("Rent", 1_200.0, 1),
                bill("Phone", 80.0, 20),
                streaming,
                car_payment,
            ],
            loans: vec![
                loan(7, 18_000.0, 60, 0.0, 10),
                loan(9, 12_000.0, 120, 50.0, 25),
                card_loan,
            ],
            after_tax_bonus: 3_000.0,
        }
    }

    #[test]
    fn semi_monthly_splits_on_the_fifteenth() {
        let summary = project_month(&household());
        assert_eq!(summary.paycheck_count, 2);
        assert_eq!(summary.bills_by_paycheck[0].pay_date, date(2025, 3, 1));
        assert_eq!(summary.bills_by_paycheck[1].pay_date, date(2025, 3, 15));

        assert_approx(summary.bills_by_paycheck[0].bills_total, 1_550.0);
        assert_approx(summary.bills_by_paycheck[0].surplus, 450.0);
        assert_approx(summary.bills_by_paycheck[1].bills_total, 230.0);
        assert_approx(summary.bills_by_paycheck[1].surplus, 1_770.0);

        assert_approx(summary.monthly_income, 4_000.0);
        assert_approx(summary.monthly_bills, 1_780.0);
        assert_approx(summary.monthly_surplus, 2_220.0);
        assert_approx(summary.annual_surplus, 26_640.0);
        assert_approx(summary.annual_surplus_with_bonus, 29_640.0);
    }

    #[test]
    fn linked_loan_is_not_counted_twice() {
        let mut inputs = household();
        inputs.bills.retain(|bill| bill.source_loan_id.is_none());
        let summary = project_month(&inputs);
        // Without the linking bill the car loan contributes its own 300/month.
        assert_approx(summary.monthly_bills, 1_780.0 - 350.0 + 300.0);
    }

    #[test]
    fn credit_card_items_never_reduce_surplus() {
        let mut inputs = household();
        let baseline = project_month(&inputs);
        let mut big_card_bill = bill("Electronics", 5_000.0, 12);
        big_card_bill.paid_with = PaymentAccountKind::CreditCard;
        inputs.bills.push(big_card_bill);
        let with_card = project_month(&inputs);
        assert_eq!(with_card, baseline);
    }

    #[test]
    fn biweekly_two_paycheck_month_splits_at_midpoint() {
        let mut inputs = household();
        inputs.frequency = PayFrequency::Biweekly {
            anchor: date(2025, 1, 3),
        };
        inputs.bills = vec![bill("A", 100.0, 1), bill("B", 200.0, 21), bill("C", 400.0, 22)];
        inputs.loans.clear();

        let summary = project_month(&inputs);
        assert_eq!(summary.paycheck_count, 2);
        assert_eq!(summary.bills_by_paycheck[0].pay_date, date(2025, 3, 14));
        assert_approx(summary.bills_by_paycheck[0].bills_total, 300.0);
        assert_approx(summary.bills_by_paycheck[1].bills_total, 400.0);
        assert_approx(summary.annual_surplus, 2_000.0 * 26.0 - 700.0 * 12.0);
    }

    #[test]
    fn biweekly_three_paycheck_month_splits_three_ways() {
        let mut inputs = household();
        inputs.frequency = PayFrequency::Biweekly {
            anchor: date(2025, 1, 3),
        };
        inputs.month = 8;
        inputs.bills = vec![
            bill("A", 10.0, 5),
            bill("B", 20.0, 8),
            bill("C", 40.0, 10),
            bill("D", 80.0, 25),
            bill("E", 160.0, 31),
        ];
        inputs.loans.clear();

        let summary = project_month(&inputs);
        assert_eq!(summary.paycheck_count, 3);
        let totals: Vec<f64> = summary
            .bills_by_paycheck
            .iter()
            .map(|bucket| bucket.bills_total)
            .collect();
        assert_eq!(totals, vec![30.0, 40.0, 240.0]);
        assert_approx(summary.monthly_income, 6_000.0);
        assert_approx(summary.monthly_surplus, 6_000.0 - 310.0);
    }

    #[test]
    fn deficits_stay_negative() {
        let mut inputs = household();
        inputs.per_paycheck_net = 500.0;
        inputs.after_tax_bonus = 0.0;
        let summary = project_month(&inputs);
        assert_approx(summary.bills_by_paycheck[0].surplus, -1_050.0);
        assert!(summary.monthly_surplus < 0.0);
        assert_approx(summary.annual_surplus, 500.0 * 24.0 - 1_780.0 * 12.0);
        assert_approx(summary.annual_surplus_with_bonus, summary.annual_surplus);
    }

    #[test]
    fn invalid_month_has_no_paychecks() {
        let mut inputs = household();
        inputs.month = 13;
        let summary = project_month(&inputs);
        assert_eq!(summary.paycheck_count, 0);
        assert!(summary.bills_by_paycheck.is_empty());
        assert_approx(summary.monthly_income, 0.0);
        assert_approx(summary.monthly_bills, 1_780.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_buckets_account_for_every_cash_bill(
            amounts in proptest::collection::vec(0u32..5_000, 0..12),
            due_days in proptest::collection::vec(1u32..32, 12),
            month in 1u32..13,
            anchor_offset in 0i64..14
        ) {
            let bills: Vec<RecurringBill> = amounts
                .iter()
                .zip(&due_days)
                .map(|(amount, due)| bill("bill", f64::from(*amount), *due))
                .collect();
            for frequency in [
                PayFrequency::SemiMonthly,
                PayFrequency::Biweekly { anchor: date(2025, 1, 3) + chrono::Duration::days(anchor_offset) },
            ] {
                let inputs = ProjectionInputs {
                    per_paycheck_net: 1_500.0,
                    frequency,
                    year: 2025,
                    month,
                    bills: bills.clone(),
                    loans: Vec::new(),
                    after_tax_bonus: 0.0,
                };
                let summary = project_month(&inputs);
                let bucketed: f64 = summary.bills_by_paycheck.iter().map(|b| b.bills_total).sum();
                prop_assert!((bucketed - summary.monthly_bills).abs() < 1e-6);
                prop_assert!((summary.monthly_surplus
                    - summary.bills_by_paycheck.iter().map(|b| b.surplus).sum::<f64>()).abs() < 1e-6);
            }
        }
    }
}

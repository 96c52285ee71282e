use chrono::{DateTime, Duration, Months, NaiveDate, TimeZone};

const PAY_CYCLE_DAYS: i64 = 14;
const SEMI_MONTHLY_PAYDAYS: [u32; 2] = [1, 15];

pub(crate) fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    u32::try_from((next - first).num_days()).ok()
}

/// Local calendar date of a zoned timestamp, used as a biweekly anchor.
///
/// The offset is dropped here, once. Everything downstream works on
/// `NaiveDate`, which has no clock, so daylight-saving changes cannot move
/// a payday.
pub fn pay_anchor_from<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.date_naive()
}

/// Every biweekly payday inside `year`/`month`, given any one known payday.
///
/// Months hold two paydays, occasionally three. An invalid month yields
/// nothing.
pub fn biweekly_dates_in_month(anchor: NaiveDate, year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(last_day) = days_in_month(year, month) else {
        return Vec::new();
    };
    let (Some(month_start), Some(month_end)) = (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(year, month, last_day),
    ) else {
        return Vec::new();
    };

    let cycle = Duration::days(PAY_CYCLE_DAYS);

    // Last cycle date on or before the first of the month.
    let steps_back = (month_start - anchor).num_days().div_euclid(PAY_CYCLE_DAYS);
    let Some(mut current) = anchor.checked_add_signed(Duration::days(steps_back * PAY_CYCLE_DAYS))
    else {
        return Vec::new();
    };

    let mut dates = Vec::with_capacity(3);
    while current <= month_end {
        if current >= month_start {
            dates.push(current);
        }
        match current.checked_add_signed(cycle) {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

pub fn semi_monthly_dates_in_month(year: i32, month: u32) -> Vec<NaiveDate> {
    SEMI_MONTHLY_PAYDAYS
        .iter()
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, *day))
        .collect()
}

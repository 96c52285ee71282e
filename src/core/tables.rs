use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{FilingStatus, TaxBracket};
use crate::error::ConfigError;

const CONTIGUITY_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ByStatus<T> {
    pub single: T,
    pub married: T,
    pub head: T,
}

impl<T> ByStatus<T> {
    pub fn get(&self, status: FilingStatus) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::Married => &self.married,
            FilingStatus::Head => &self.head,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (FilingStatus, &T)> {
        [
            (FilingStatus::Single, &self.single),
            (FilingStatus::Married, &self.married),
            (FilingStatus::Head, &self.head),
        ]
        .into_iter()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRates {
    pub social_security_rate_percent: f64,
    pub social_security_wage_cap: f64,
    pub medicare_rate_percent: f64,
    pub medicare_surcharge_rate_percent: f64,
    pub medicare_surcharge_threshold: ByStatus<f64>,
}

/// Bracket schedules, deductions and payroll rates for one tax year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxTable {
    pub year: i32,
    pub brackets: ByStatus<Vec<TaxBracket>>,
    pub standard_deduction: ByStatus<f64>,
    pub payroll: PayrollRates,
}

impl Default for TaxTable {
    fn default() -> Self {
        Self::federal_2024()
    }
}

impl TaxTable {
    /// Years with a built-in federal schedule.
    pub const BUILT_IN_YEARS: [i32; 2] = [2024, 2025];

    /// Built-in federal schedule for `year`, if one ships with the crate.
    pub fn federal(year: i32) -> Option<Self> {
        match year {
            2024 => Some(Self::federal_2024()),
            2025 => Some(Self::federal_2025()),
            _ => None,
        }
    }

    /// US federal schedules for tax year 2024.
    pub fn federal_2024() -> Self {
        Self {
            year: 2024,
            brackets: ByStatus {
                single: schedule(&[11_600.0, 47_150.0, 100_525.0, 191_950.0, 243_725.0, 609_350.0]),
                married: schedule(&[
                    23_200.0, 94_300.0, 201_050.0, 383_900.0, 487_450.0, 731_200.0,
                ]),
                head: schedule(&[16_550.0, 63_100.0, 100_500.0, 191_950.0, 243_700.0, 609_350.0]),
            },
            standard_deduction: ByStatus {
                single: 14_600.0,
                married: 29_200.0,
                head: 21_900.0,
            },
            payroll: federal_payroll(168_600.0),
        }
    }

    /// US federal schedules for tax year 2025.
    pub fn federal_2025() -> Self {
        Self {
            year: 2025,
            brackets: ByStatus {
                single: schedule(&[11_925.0, 48_475.0, 103_350.0, 197_300.0, 250_525.0, 626_350.0]),
                married: schedule(&[
                    23_850.0, 96_950.0, 206_700.0, 394_600.0, 501_050.0, 751_600.0,
                ]),
                head: schedule(&[17_000.0, 64_850.0, 103_350.0, 197_300.0, 250_500.0, 626_350.0]),
            },
            standard_deduction: ByStatus {
                single: 15_000.0,
                married: 30_000.0,
                head: 22_500.0,
            },
            payroll: federal_payroll(176_100.0),
        }
    }

    pub fn brackets_for(&self, status: FilingStatus) -> &[TaxBracket] {
        self.brackets.get(status)
    }

    pub fn standard_deduction_for(&self, status: FilingStatus) -> f64 {
        *self.standard_deduction.get(status)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let table: TaxTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json_str(&raw)?;
        tracing::info!(path = %path.display(), year = table.year, "loaded tax table");
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (status, brackets) in self.brackets.iter() {
            validate_schedule(status, brackets)?;
        }
        for (status, deduction) in self.standard_deduction.iter() {
            if !deduction.is_finite() || *deduction < 0.0 {
                return Err(invalid(format!(
                    "{} standard deduction must be >= 0",
                    status.label()
                )));
            }
        }

        let payroll = &self.payroll;
        for (name, rate) in [
            ("social security rate", payroll.social_security_rate_percent),
            ("medicare rate", payroll.medicare_rate_percent),
            ("medicare surcharge rate", payroll.medicare_surcharge_rate_percent),
        ] {
            if !(0.0..=100.0).contains(&rate) {
                return Err(invalid(format!("{name} must be between 0 and 100")));
            }
        }
        if !payroll.social_security_wage_cap.is_finite() || payroll.social_security_wage_cap < 0.0
        {
            return Err(invalid("social security wage cap must be >= 0"));
        }
        for (status, threshold) in payroll.medicare_surcharge_threshold.iter() {
            if !threshold.is_finite() || *threshold < 0.0 {
                return Err(invalid(format!(
                    "{} medicare surcharge threshold must be >= 0",
                    status.label()
                )));
            }
        }
        Ok(())
    }
}

/// Social security and medicare; only the wage cap moves between years.
fn federal_payroll(social_security_wage_cap: f64) -> PayrollRates {
    PayrollRates {
        social_security_rate_percent: 6.2,
        social_security_wage_cap,
        medicare_rate_percent: 1.45,
        medicare_surcharge_rate_percent: 0.9,
        medicare_surcharge_threshold: ByStatus {
            single: 200_000.0,
            married: 250_000.0,
            head: 200_000.0,
        },
    }
}

const SCHEDULE_RATES: [f64; 7] = [10.0, 12.0, 22.0, 24.0, 32.0, 35.0, 37.0];

fn schedule(thresholds: &[f64; 6]) -> Vec<TaxBracket> {
    let mut brackets = Vec::with_capacity(SCHEDULE_RATES.len());
    let mut lower = 0.0;
    for (idx, rate) in SCHEDULE_RATES.iter().enumerate() {
        let upper = thresholds.get(idx).copied();
        brackets.push(TaxBracket::new(lower, upper, *rate));
        if let Some(upper) = upper {
            lower = upper;
        }
    }
    brackets
}

fn validate_schedule(status: FilingStatus, brackets: &[TaxBracket]) -> Result<(), ConfigError> {
    let label = status.label();
    let Some(first) = brackets.first() else {
        return Err(invalid(format!("{label} brackets must not be empty")));
    };
    if !first.min.is_finite() || first.min < 0.0 {
        return Err(invalid(format!("{label} brackets must start at a min >= 0")));
    }

    let last_idx = brackets.len() - 1;
    for (idx, bracket) in brackets.iter().enumerate() {
        if !(0.0..=100.0).contains(&bracket.rate) {
            return Err(invalid(format!(
                "{label} bracket {idx} rate must be between 0 and 100"
            )));
        }
        match bracket.max {
            Some(max) if idx == last_idx => {
                return Err(invalid(format!(
                    "{label} top bracket must be unbounded, found max {max}"
                )));
            }
            None if idx != last_idx => {
                return Err(invalid(format!(
                    "{label} bracket {idx} is unbounded but is not the top bracket"
                )));
            }
            Some(max) if !max.is_finite() || max <= bracket.min => {
                return Err(invalid(format!(
                    "{label} bracket {idx} max must be greater than its min"
                )));
            }
            _ => {}
        }
        if idx > 0 {
            let prev_upper = brackets[idx - 1].upper();
            if (bracket.min - prev_upper).abs() > CONTIGUITY_TOLERANCE {
                return Err(invalid(format!(
                    "{label} bracket {idx} must start where bracket {} ends",
                    idx - 1
                )));
            }
        }
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::InvalidTable(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_passes_validation() {
        let table = TaxTable::default();
        assert_eq!(table.year, 2024);
        table.validate().expect("built-in table is valid");
    }

    #[test]
    fn default_schedules_are_contiguous_and_open_ended() {
        let table = TaxTable::federal_2024();
        for status in [FilingStatus::Single, FilingStatus::Married, FilingStatus::Head] {
            let brackets = table.brackets_for(status);
            assert_eq!(brackets.len(), 7);
            assert_eq!(brackets[0].min, 0.0);
            assert!(brackets[6].max.is_none());
            for pair in brackets.windows(2) {
                assert_eq!(pair[0].max, Some(pair[1].min));
            }
        }
        assert_eq!(table.brackets_for(FilingStatus::Single)[1].min, 11_600.0);
        assert_eq!(table.standard_deduction_for(FilingStatus::Married), 29_200.0);
    }

    #[test]
    fn federal_2025_schedule_is_valid_and_indexed() {
        let table = TaxTable::federal_2025();
        assert_eq!(table.year, 2025);
        table.validate().expect("2025 table is valid");
        assert_eq!(table.brackets_for(FilingStatus::Single)[1].min, 11_925.0);
        assert_eq!(table.brackets_for(FilingStatus::Married)[6].min, 751_600.0);
        assert_eq!(table.brackets_for(FilingStatus::Head)[2].min, 64_850.0);
        assert_eq!(table.standard_deduction_for(FilingStatus::Single), 15_000.0);
        assert_eq!(table.standard_deduction_for(FilingStatus::Married), 30_000.0);
        assert_eq!(table.standard_deduction_for(FilingStatus::Head), 22_500.0);
        assert_eq!(table.payroll.social_security_wage_cap, 176_100.0);
        assert_eq!(table.payroll.medicare_surcharge_threshold.married, 250_000.0);
    }

    #[test]
    fn built_in_years_resolve_to_their_tables() {
        for year in TaxTable::BUILT_IN_YEARS {
            let table = TaxTable::federal(year).expect("built-in year");
            assert_eq!(table.year, year);
        }
        assert_eq!(TaxTable::federal(2025), Some(TaxTable::federal_2025()));
        assert!(TaxTable::federal(2019).is_none());
    }

    #[test]
    fn json_round_trip_preserves_table() {
        let table = TaxTable::federal_2024();
        let json = serde_json::to_string(&table).expect("serializes");
        assert!(json.contains("\"standardDeduction\""));
        let parsed = TaxTable::from_json_str(&json).expect("parses");
        assert_eq!(parsed, table);
    }

    #[test]
    fn rejects_gap_between_brackets() {
        let mut table = TaxTable::federal_2024();
        table.brackets.single[2].min += 10.0;
        let err = table.validate().expect_err("gap must be rejected");
        assert!(err.to_string().contains("single bracket 2 must start"));
    }

    #[test]
    fn rejects_bounded_top_bracket() {
        let mut table = TaxTable::federal_2024();
        table.brackets.head[6].max = Some(1_000_000.0);
        let err = table.validate().expect_err("bounded top must be rejected");
        assert!(err.to_string().contains("head top bracket must be unbounded"));
    }

    #[test]
    fn rejects_unbounded_middle_bracket() {
        let mut table = TaxTable::federal_2024();
        table.brackets.married[3].max = None;
        let err = table.validate().expect_err("open middle bracket must be rejected");
        assert!(err.to_string().contains("married bracket 3 is unbounded"));
    }

    #[test]
    fn rejects_out_of_range_rate() {
        let mut table = TaxTable::federal_2024();
        table.brackets.single[0].rate = 120.0;
        assert!(table.validate().is_err());

        let mut table = TaxTable::federal_2024();
        table.payroll.medicare_rate_percent = -1.0;
        assert!(table.validate().is_err());
    }

    #[test]
    fn rejects_empty_schedule_from_json() {
        let mut table = TaxTable::federal_2024();
        table.brackets.married.clear();
        let json = serde_json::to_string(&table).expect("serializes");
        let err = TaxTable::from_json_str(&json).expect_err("empty schedule rejected");
        assert!(matches!(err, ConfigError::InvalidTable(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = TaxTable::from_json_str("{ not json").expect_err("must fail");
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = TaxTable::load(Path::new("/nonexistent/payplan-table.json"))
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

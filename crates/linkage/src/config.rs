use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Deserialize;

use crate::error::LinkError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    pub name: String,
    #[serde(default)]
    pub tie_break: TieBreakPolicy,
    pub profile: ProfileConfig,
    pub payroll: PayrollConfig,
    /// Payroll job titles that never enter the candidate pool.
    #[serde(default)]
    pub civilian_titles: BTreeSet<String>,
    /// tax_id → borough overrides for collisions the cascade cannot resolve.
    #[serde(default)]
    pub manual_matches: BTreeMap<String, String>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What the resolver does when several candidates survive the
/// appointment-date stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// Pick the highest regular pay; pay ties go to the first candidate.
    #[default]
    HighestPay,
    /// Abort the run and report the ambiguous candidate set.
    Strict,
}

impl std::fmt::Display for TieBreakPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighestPay => write!(f, "highest_pay"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub file: String,
    #[serde(default)]
    pub columns: ProfileColumns,
}

/// Zero-based column positions in the profile CSV.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileColumns {
    pub tax_id: usize,
    pub last_name: usize,
    pub first_name: usize,
    pub middle_initial: usize,
    pub appointment_date: usize,
}

impl Default for ProfileColumns {
    fn default() -> Self {
        Self {
            tax_id: 0,
            last_name: 1,
            first_name: 2,
            middle_initial: 3,
            appointment_date: 4,
        }
    }
}

impl ProfileColumns {
    fn positions(&self) -> [(&'static str, usize); 5] {
        [
            ("tax_id", self.tax_id),
            ("last_name", self.last_name),
            ("first_name", self.first_name),
            ("middle_initial", self.middle_initial),
            ("appointment_date", self.appointment_date),
        ]
    }
}

// ---------------------------------------------------------------------------
// Payroll dataset
// ---------------------------------------------------------------------------

/// Column names of the citywide payroll export, used on output when the
/// payroll file has no header row of its own.
pub const DEFAULT_PAYROLL_HEADERS: [&str; 16] = [
    "Fiscal Year",
    "Agency Name",
    "Last Name",
    "First Name",
    "Mid Init",
    "Agency Start Date",
    "Work Location Borough",
    "Title Description",
    "Leave Status as of June 30",
    "Base Salary",
    "Pay Basis",
    "Regular Hours",
    "Regular Gross Paid",
    "OT Hours",
    "Total OT Paid",
    "Total Other Pay",
];

fn default_payroll_headers() -> Vec<String> {
    DEFAULT_PAYROLL_HEADERS.iter().map(|h| h.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayrollConfig {
    pub file: String,
    /// `None` means detect from the first row.
    #[serde(default)]
    pub has_headers: Option<bool>,
    /// Header row substituted on output when the file has none.
    #[serde(default = "default_payroll_headers")]
    pub headers: Vec<String>,
    #[serde(default)]
    pub columns: PayrollColumns,
}

/// Zero-based column positions in the payroll CSV.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayrollColumns {
    pub year: usize,
    pub last_name: usize,
    pub first_name: usize,
    pub middle_initial: usize,
    pub appointment_date: usize,
    pub borough: usize,
    pub title: usize,
    pub regular_pay: usize,
}

impl Default for PayrollColumns {
    fn default() -> Self {
        Self {
            year: 0,
            last_name: 2,
            first_name: 3,
            middle_initial: 4,
            appointment_date: 5,
            borough: 6,
            title: 7,
            regular_pay: 12,
        }
    }
}

impl PayrollColumns {
    fn positions(&self) -> [(&'static str, usize); 8] {
        [
            ("year", self.year),
            ("last_name", self.last_name),
            ("first_name", self.first_name),
            ("middle_initial", self.middle_initial),
            ("appointment_date", self.appointment_date),
            ("borough", self.borough),
            ("title", self.title),
            ("regular_pay", self.regular_pay),
        ]
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Merged CSV path. With several fiscal years the year is spliced in
    /// before the extension.
    #[serde(default = "default_output_file")]
    pub file: String,
    #[serde(default)]
    pub json: Option<String>,
}

fn default_output_file() -> String {
    "merged.csv".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: default_output_file(),
            json: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl LinkConfig {
    pub fn from_toml(input: &str) -> Result<Self, LinkError> {
        let mut config: LinkConfig =
            toml::from_str(input).map_err(|e| LinkError::ConfigParse(e.to_string()))?;
        config.civilian_titles = config
            .civilian_titles
            .iter()
            .map(|t| t.trim().to_uppercase())
            .collect();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LinkError> {
        if self.name.trim().is_empty() {
            return Err(LinkError::ConfigValidation("name must not be empty".into()));
        }

        check_distinct("profile", &self.profile.columns.positions())?;
        check_distinct("payroll", &self.payroll.columns.positions())?;

        for (tax_id, borough) in &self.manual_matches {
            if tax_id.trim().is_empty() {
                return Err(LinkError::ConfigValidation(
                    "manual_matches: empty tax id".into(),
                ));
            }
            if borough.trim().is_empty() {
                return Err(LinkError::ConfigValidation(format!(
                    "manual_matches: tax id '{tax_id}' maps to an empty borough"
                )));
            }
        }

        if self.civilian_titles.iter().any(|t| t.trim().is_empty()) {
            return Err(LinkError::ConfigValidation(
                "civilian_titles: empty title".into(),
            ));
        }

        if self.output.file.trim().is_empty() {
            return Err(LinkError::ConfigValidation(
                "output.file must not be empty".into(),
            ));
        }

        Ok(())
    }
}

fn check_distinct(dataset: &str, positions: &[(&'static str, usize)]) -> Result<(), LinkError> {
    let mut seen: HashSet<usize> = HashSet::new();
    for (field, column) in positions {
        if !seen.insert(*column) {
            return Err(LinkError::ConfigValidation(format!(
                "{dataset}.columns: '{field}' reuses column {column}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

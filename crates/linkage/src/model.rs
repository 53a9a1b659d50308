use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One employee from the profile roster. Names are used as given.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub tax_id: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_initial: String,
    pub appointment_date: NaiveDate,
    /// Original CSV fields, written back out unchanged.
    pub raw: Vec<String>,
}

/// One payroll record. Names are normalized at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct Payroll {
    /// Position among the loaded payroll records. Identity within a run.
    pub row: usize,
    pub year: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_initial: String,
    pub title: String,
    pub borough: String,
    pub appointment_date: NaiveDate,
    pub regular_pay: Decimal,
    pub raw: Vec<String>,
}

impl Payroll {
    /// Short human-readable label used in ambiguity reports and logs.
    pub fn describe(&self) -> String {
        format!(
            "row {}: {}, {} {} ({}, {}, start {}, pay {})",
            self.row,
            self.last_name,
            self.first_name,
            self.middle_initial,
            self.borough,
            self.title,
            self.appointment_date,
            self.regular_pay,
        )
    }
}

// ---------------------------------------------------------------------------
// Matching vocabulary
// ---------------------------------------------------------------------------

/// Last-name lookup rule of one matching round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    ExactLastName,
    ExactLastNameRepeat,
    LastNamePrefix,
}

impl Round {
    pub const ALL: [Round; 3] = [
        Round::ExactLastName,
        Round::ExactLastNameRepeat,
        Round::LastNamePrefix,
    ];
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactLastName => write!(f, "exact_last_name"),
            Self::ExactLastNameRepeat => write!(f, "exact_last_name_repeat"),
            Self::LastNamePrefix => write!(f, "last_name_prefix"),
        }
    }
}

/// Resolver stage that decided a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    ManualOverride,
    ExactFirstName,
    PrefixFirstName,
    MiddleInitial,
    AppointmentDate,
    PayTieBreak,
}

impl std::fmt::Display for MatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManualOverride => write!(f, "manual_override"),
            Self::ExactFirstName => write!(f, "exact_first_name"),
            Self::PrefixFirstName => write!(f, "prefix_first_name"),
            Self::MiddleInitial => write!(f, "middle_initial"),
            Self::AppointmentDate => write!(f, "appointment_date"),
            Self::PayTieBreak => write!(f, "pay_tie_break"),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A profile permanently paired with the payroll it consumed.
#[derive(Debug, Clone)]
pub struct MergedRecord<'a> {
    pub profile: &'a Profile,
    pub payroll: Payroll,
    pub round: Round,
    pub stage: MatchStage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    pub round: Round,
    /// Profiles pending when the round started.
    pub attempted: usize,
    pub matched: usize,
    pub pending_after: usize,
}

/// Payroll rows kept out of the candidate pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexExclusions {
    pub civilian_title: usize,
    pub nameless: usize,
}

/// Linkage of the full profile pool against one fiscal year of payroll.
#[derive(Debug, Clone)]
pub struct YearLinkage<'a> {
    pub year: String,
    pub merged: Vec<MergedRecord<'a>>,
    /// Input order.
    pub unmatched_profiles: Vec<&'a Profile>,
    /// Input order.
    pub unmatched_payrolls: Vec<Payroll>,
    pub indexed: usize,
    pub excluded: IndexExclusions,
    pub rounds: Vec<RoundSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkMeta {
    pub config_name: String,
    pub tie_break: crate::config::TieBreakPolicy,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone)]
pub struct LinkResult<'a> {
    pub meta: LinkMeta,
    /// Sorted by fiscal year.
    pub years: Vec<YearLinkage<'a>>,
}

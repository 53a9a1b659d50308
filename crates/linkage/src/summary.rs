use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{IndexExclusions, LinkMeta, LinkResult, RoundSummary, YearLinkage};

/// Serializable digest of a run, for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct LinkSummary {
    pub meta: LinkMeta,
    pub inputs: InputSummary,
    pub years: Vec<YearSummary>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct InputSummary {
    pub profiles: usize,
    pub payrolls: usize,
    pub skipped_profile_rows: usize,
    pub skipped_payroll_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearSummary {
    pub year: String,
    pub indexed: usize,
    pub excluded: IndexExclusions,
    pub matched: usize,
    pub unmatched_profiles: usize,
    pub unmatched_payrolls: usize,
    pub rounds: Vec<RoundSummary>,
    /// Matches per deciding resolver stage.
    pub stage_counts: BTreeMap<String, usize>,
}

impl YearSummary {
    pub fn from_linkage(linkage: &YearLinkage<'_>) -> Self {
        let mut stage_counts: BTreeMap<String, usize> = BTreeMap::new();
        for m in &linkage.merged {
            *stage_counts.entry(m.stage.to_string()).or_insert(0) += 1;
        }

        Self {
            year: linkage.year.clone(),
            indexed: linkage.indexed,
            excluded: linkage.excluded,
            matched: linkage.merged.len(),
            unmatched_profiles: linkage.unmatched_profiles.len(),
            unmatched_payrolls: linkage.unmatched_payrolls.len(),
            rounds: linkage.rounds.clone(),
            stage_counts,
        }
    }
}

/// Compute summary statistics from a linkage result.
pub fn compute_summary(result: &LinkResult<'_>, inputs: InputSummary) -> LinkSummary {
    LinkSummary {
        meta: result.meta.clone(),
        inputs,
        years: result.years.iter().map(YearSummary::from_linkage).collect(),
    }
}

use std::collections::BTreeMap;

use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::index::CandidateIndex;
use crate::model::{LinkMeta, LinkResult, Payroll, Profile, YearLinkage};
use crate::resolver::Resolver;
use crate::rounds::run_rounds;

/// Link `profiles` against `payrolls` per config.
///
/// Payroll is partitioned by fiscal year; every year is linked independently
/// against the full profile pool. With no payroll at all a single linkage
/// with an empty year label is returned, holding every profile as unmatched.
pub fn run<'a>(
    config: &LinkConfig,
    profiles: &'a [Profile],
    payrolls: Vec<Payroll>,
) -> Result<LinkResult<'a>, LinkError> {
    let mut by_year = partition_by_year(payrolls);
    if by_year.len() > 1 {
        tracing::info!(years = by_year.len(), "payroll spans several fiscal years");
    }
    if by_year.is_empty() {
        tracing::warn!("no usable payroll rows; every profile will be unmatched");
        by_year.insert(String::new(), Vec::new());
    }

    let resolver = Resolver::new(&config.manual_matches, config.tie_break);
    let mut years = Vec::with_capacity(by_year.len());
    for (year, payrolls) in by_year {
        years.push(link_year(year, profiles, payrolls, config, &resolver)?);
    }

    Ok(LinkResult {
        meta: LinkMeta {
            config_name: config.name.clone(),
            tie_break: config.tie_break,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        years,
    })
}

/// Group payroll records by fiscal year, keeping input order within a year.
pub fn partition_by_year(payrolls: Vec<Payroll>) -> BTreeMap<String, Vec<Payroll>> {
    let mut by_year: BTreeMap<String, Vec<Payroll>> = BTreeMap::new();
    for payroll in payrolls {
        by_year.entry(payroll.year.clone()).or_default().push(payroll);
    }
    by_year
}

/// Build one year's candidate index and run the rounds against it.
pub fn link_year<'a>(
    year: String,
    profiles: &'a [Profile],
    payrolls: Vec<Payroll>,
    config: &LinkConfig,
    resolver: &Resolver<'_>,
) -> Result<YearLinkage<'a>, LinkError> {
    let span = tracing::info_span!("year", %year);
    let _guard = span.enter();

    let (mut index, excluded) = CandidateIndex::build(payrolls, &config.civilian_titles);
    let indexed = index.len();
    tracing::info!(
        indexed,
        civilian = excluded.civilian_title,
        nameless = excluded.nameless,
        "candidate index built"
    );

    let outcome = run_rounds(profiles, &mut index, resolver)?;
    let unmatched_payrolls = index.into_remaining();

    tracing::info!(
        matched = outcome.merged.len(),
        unmatched_profiles = outcome.pending.len(),
        unmatched_payrolls = unmatched_payrolls.len(),
        "year linked"
    );

    Ok(YearLinkage {
        year,
        merged: outcome.merged,
        unmatched_profiles: outcome.pending,
        unmatched_payrolls,
        indexed,
        excluded,
        rounds: outcome.rounds,
    })
}

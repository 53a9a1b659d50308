//! Disambiguation cascade: one profile against one candidate list.
//!
//! Each stage takes the current candidate set and either decides, gives up,
//! or hands a (possibly narrowed) set to the next stage.

use std::collections::BTreeMap;

use crate::config::TieBreakPolicy;
use crate::error::LinkError;
use crate::model::{MatchStage, Payroll, Profile};

/// Outcome of one disambiguation stage.
#[derive(Debug, PartialEq)]
pub enum Narrowing<'a> {
    Resolved(&'a Payroll),
    Continue(Vec<&'a Payroll>),
    NoMatch,
}

/// A successful resolution: which payroll, and which stage decided it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    pub payroll: &'a Payroll,
    pub stage: MatchStage,
}

/// Immutable inputs shared by every resolution in a run.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'c> {
    manual_matches: &'c BTreeMap<String, String>,
    tie_break: TieBreakPolicy,
}

impl<'c> Resolver<'c> {
    pub fn new(manual_matches: &'c BTreeMap<String, String>, tie_break: TieBreakPolicy) -> Self {
        Self {
            manual_matches,
            tie_break,
        }
    }

    /// Pick the payroll in `candidates` that represents `profile`, if any.
    ///
    /// The caller guarantees last names already agree under the round's rule.
    /// Errors only under [`TieBreakPolicy::Strict`] when candidates remain
    /// tied after the appointment-date stage.
    pub fn resolve<'a>(
        &self,
        profile: &Profile,
        candidates: &[&'a Payroll],
    ) -> Result<Option<Resolution<'a>>, LinkError> {
        if candidates.is_empty() {
            return Ok(None);
        }

        if let Some(payroll) = manual_override(profile, candidates, self.manual_matches) {
            return Ok(Some(Resolution {
                payroll,
                stage: MatchStage::ManualOverride,
            }));
        }

        let (named, name_stage) = match exact_first_name(profile, candidates) {
            Narrowing::Resolved(p) => return Ok(Some(resolved(p, MatchStage::ExactFirstName))),
            Narrowing::Continue(set) => (set, MatchStage::ExactFirstName),
            Narrowing::NoMatch => match prefix_first_name(profile, candidates) {
                Narrowing::Resolved(p) => {
                    return Ok(Some(resolved(p, MatchStage::PrefixFirstName)))
                }
                Narrowing::Continue(set) => (set, MatchStage::PrefixFirstName),
                Narrowing::NoMatch => return Ok(None),
            },
        };
        tracing::trace!(
            tax_id = %profile.tax_id,
            stage = %name_stage,
            remaining = named.len(),
            "first-name stage left several candidates"
        );

        let by_initial = match middle_initial(profile, named) {
            Narrowing::Resolved(p) => return Ok(Some(resolved(p, MatchStage::MiddleInitial))),
            Narrowing::Continue(set) => set,
            Narrowing::NoMatch => return Ok(None),
        };

        let by_date = match appointment_date(profile, by_initial) {
            Narrowing::Resolved(p) => return Ok(Some(resolved(p, MatchStage::AppointmentDate))),
            Narrowing::Continue(set) => set,
            Narrowing::NoMatch => return Ok(None),
        };

        match self.tie_break {
            TieBreakPolicy::HighestPay => {
                Ok(highest_pay(&by_date).map(|p| resolved(p, MatchStage::PayTieBreak)))
            }
            TieBreakPolicy::Strict => Err(LinkError::AmbiguousMatch {
                tax_id: profile.tax_id.clone(),
                candidates: by_date.iter().map(|p| p.describe()).collect(),
            }),
        }
    }
}

fn resolved(payroll: &Payroll, stage: MatchStage) -> Resolution<'_> {
    Resolution { payroll, stage }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// First candidate in the profile's overridden borough, if the profile has an
/// override. An override with no borough hit falls through to the cascade.
pub fn manual_override<'a>(
    profile: &Profile,
    candidates: &[&'a Payroll],
    manual_matches: &BTreeMap<String, String>,
) -> Option<&'a Payroll> {
    let borough = manual_matches.get(&profile.tax_id)?;
    candidates.iter().copied().find(|p| &p.borough == borough)
}

/// Candidates whose first name equals the profile's.
/// `NoMatch` here means "try prefixes", not "give up".
pub fn exact_first_name<'a>(profile: &Profile, candidates: &[&'a Payroll]) -> Narrowing<'a> {
    settle(
        candidates
            .iter()
            .copied()
            .filter(|p| p.first_name == profile.first_name)
            .collect(),
    )
}

/// Candidates where one first name is a non-empty prefix of the other.
pub fn prefix_first_name<'a>(profile: &Profile, candidates: &[&'a Payroll]) -> Narrowing<'a> {
    settle(
        candidates
            .iter()
            .copied()
            .filter(|p| is_prefix_either_way(&profile.first_name, &p.first_name))
            .collect(),
    )
}

/// Narrow by middle initial. If nobody shares it, the initial is treated as
/// missing on one side and the full set goes on.
pub fn middle_initial<'a>(profile: &Profile, candidates: Vec<&'a Payroll>) -> Narrowing<'a> {
    let narrowed: Vec<&Payroll> = candidates
        .iter()
        .copied()
        .filter(|p| p.middle_initial == profile.middle_initial)
        .collect();
    match narrowed.len() {
        0 => Narrowing::Continue(candidates),
        _ => settle(narrowed),
    }
}

/// Candidates appointed on exactly the profile's appointment date.
pub fn appointment_date<'a>(profile: &Profile, candidates: Vec<&'a Payroll>) -> Narrowing<'a> {
    settle(
        candidates
            .into_iter()
            .filter(|p| p.appointment_date == profile.appointment_date)
            .collect(),
    )
}

/// Highest regular pay; among equal pay the earliest candidate wins.
pub fn highest_pay<'a>(candidates: &[&'a Payroll]) -> Option<&'a Payroll> {
    candidates.iter().copied().fold(None, |best, p| match best {
        Some(b) if b.regular_pay >= p.regular_pay => Some(b),
        _ => Some(p),
    })
}

fn settle(set: Vec<&Payroll>) -> Narrowing<'_> {
    match set.len() {
        0 => Narrowing::NoMatch,
        1 => Narrowing::Resolved(set[0]),
        _ => Narrowing::Continue(set),
    }
}

fn is_prefix_either_way(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.starts_with(b) || b.starts_with(a)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn profile(tax_id: &str, first: &str, last: &str, mi: &str, appt: NaiveDate) -> Profile {
        Profile {
            tax_id: tax_id.into(),
            first_name: first.into(),
            last_name: last.into(),
            middle_initial: mi.into(),
            appointment_date: appt,
            raw: Vec::new(),
        }
    }

    struct P {
        row: usize,
        first: &'static str,
        mi: &'static str,
        borough: &'static str,
        appt: NaiveDate,
        pay: i64,
    }

    impl P {
        fn new(row: usize, first: &'static str, mi: &'static str) -> Self {
            Self {
                row,
                first,
                mi,
                borough: "BRONX",
                appt: date(2015, 3, 1),
                pay: 50_000,
            }
        }

        fn borough(mut self, b: &'static str) -> Self {
            self.borough = b;
            self
        }

        fn appt(mut self, d: NaiveDate) -> Self {
            self.appt = d;
            self
        }

        fn pay(mut self, pay: i64) -> Self {
            self.pay = pay;
            self
        }

        fn build(self) -> Payroll {
            Payroll {
                row: self.row,
                year: "2020".into(),
                first_name: self.first.into(),
                last_name: "SMITH".into(),
                middle_initial: self.mi.into(),
                title: "POLICE OFFICER".into(),
                borough: self.borough.into(),
                appointment_date: self.appt,
                regular_pay: Decimal::from(self.pay),
                raw: Vec::new(),
            }
        }
    }

    fn resolve_with(
        table: &BTreeMap<String, String>,
        policy: TieBreakPolicy,
        profile: &Profile,
        payrolls: &[Payroll],
    ) -> Result<Option<(usize, MatchStage)>, LinkError> {
        let candidates: Vec<&Payroll> = payrolls.iter().collect();
        let resolver = Resolver::new(table, policy);
        Ok(resolver
            .resolve(profile, &candidates)?
            .map(|r| (r.payroll.row, r.stage)))
    }

    fn resolve(profile: &Profile, payrolls: &[Payroll]) -> Option<(usize, MatchStage)> {
        resolve_with(&BTreeMap::new(), TieBreakPolicy::HighestPay, profile, payrolls).unwrap()
    }

    #[test]
    fn empty_candidates_never_match() {
        let p = profile("1", "JOHN", "SMITH", "A", date(2015, 3, 1));
        assert_eq!(resolve(&p, &[]), None);
    }

    #[test]
    fn manual_override_beats_more_specific_candidates() {
        let table = BTreeMap::from([("939647".to_string(), "MANHATTAN".to_string())]);
        let p = profile("939647", "JOHN", "SMITH", "A", date(2015, 3, 1));
        let payrolls = vec![
            P::new(0, "JOHN", "A").borough("BRONX").build(),
            P::new(1, "JOHN", "A").borough("MANHATTAN").appt(date(1999, 1, 1)).build(),
        ];
        let got = resolve_with(&table, TieBreakPolicy::HighestPay, &p, &payrolls).unwrap();
        assert_eq!(got, Some((1, MatchStage::ManualOverride)));
    }

    #[test]
    fn manual_override_without_borough_hit_falls_through() {
        let table = BTreeMap::from([("939647".to_string(), "QUEENS".to_string())]);
        let p = profile("939647", "JOHN", "SMITH", "A", date(2015, 3, 1));
        let payrolls = vec![
            P::new(0, "JOHN", "B").build(),
            P::new(1, "JOHN", "A").build(),
        ];
        let got = resolve_with(&table, TieBreakPolicy::HighestPay, &p, &payrolls).unwrap();
        assert_eq!(got, Some((1, MatchStage::MiddleInitial)));
    }

    #[test]
    fn single_exact_first_name_wins() {
        let p = profile("1", "JOHN", "SMITH", "A", date(2015, 3, 1));
        let payrolls = vec![P::new(0, "JON", "A").build(), P::new(1, "JOHN", "Z").build()];
        assert_eq!(resolve(&p, &payrolls), Some((1, MatchStage::ExactFirstName)));
    }

    #[test]
    fn prefix_first_name_runs_on_original_set() {
        let p = profile("1", "CHRIS", "SMITH", "", date(2015, 3, 1));
        let payrolls = vec![
            P::new(0, "MARY", "").build(),
            P::new(1, "CHRISTOPHER", "").build(),
        ];
        assert_eq!(resolve(&p, &payrolls), Some((1, MatchStage::PrefixFirstName)));

        // Either direction.
        let p = profile("1", "CHRISTOPHER", "SMITH", "", date(2015, 3, 1));
        let payrolls = vec![P::new(0, "CHRIS", "").build()];
        assert_eq!(resolve(&p, &payrolls), Some((0, MatchStage::PrefixFirstName)));
    }

    #[test]
    fn no_first_name_relation_means_no_match() {
        let p = profile("1", "JOHN", "SMITH", "A", date(2015, 3, 1));
        let payrolls = vec![P::new(0, "MARY", "A").build(), P::new(1, "", "A").build()];
        assert_eq!(resolve(&p, &payrolls), None);
    }

    #[test]
    fn empty_first_names_are_not_prefixes() {
        let p = profile("1", "", "SMITH", "A", date(2015, 3, 1));
        let payrolls = vec![P::new(0, "MARY", "A").build()];
        assert_eq!(resolve(&p, &payrolls), None);
    }

    #[test]
    fn middle_initial_widens_back_when_nobody_shares_it() {
        let p = profile("1", "VICTOR", "TORRES", "J", date(2015, 3, 1));
        let payrolls = vec![
            P::new(0, "VICTOR", "").appt(date(2012, 6, 30)).build(),
            P::new(1, "VICTOR", "M").appt(date(2015, 3, 1)).build(),
        ];
        assert_eq!(resolve(&p, &payrolls), Some((1, MatchStage::AppointmentDate)));
    }

    #[test]
    fn differing_dates_after_widening_mean_no_match() {
        let p = profile("1", "VICTOR", "TORRES", "J", date(2015, 3, 1));
        let payrolls = vec![
            P::new(0, "VICTOR", "").appt(date(2012, 6, 30)).build(),
            P::new(1, "VICTOR", "M").appt(date(2016, 1, 5)).build(),
        ];
        assert_eq!(resolve(&p, &payrolls), None);
    }

    #[test]
    fn date_narrows_within_middle_initial_ties() {
        let p = profile("1", "JOHN", "SMITH", "A", date(2015, 3, 1));
        let payrolls = vec![
            P::new(0, "JOHN", "A").appt(date(2001, 1, 1)).build(),
            P::new(1, "JOHN", "A").build(),
            P::new(2, "JOHN", "B").build(),
        ];
        assert_eq!(resolve(&p, &payrolls), Some((1, MatchStage::AppointmentDate)));
    }

    #[test]
    fn tie_break_prefers_strictly_higher_pay() {
        let p = profile("1", "JOHN", "SMITH", "A", date(2015, 3, 1));
        let payrolls = vec![
            P::new(0, "JOHN", "A").pay(61_000).build(),
            P::new(1, "JOHN", "A").pay(92_500).build(),
        ];
        assert_eq!(resolve(&p, &payrolls), Some((1, MatchStage::PayTieBreak)));
    }

    #[test]
    fn tie_break_on_equal_pay_keeps_candidate_order() {
        let p = profile("1", "JOHN", "SMITH", "A", date(2015, 3, 1));
        let payrolls = vec![
            P::new(7, "JOHN", "A").pay(70_000).build(),
            P::new(3, "JOHN", "A").pay(70_000).build(),
        ];
        assert_eq!(resolve(&p, &payrolls), Some((7, MatchStage::PayTieBreak)));
    }

    #[test]
    fn strict_policy_reports_the_tied_set() {
        let p = profile("42", "JOHN", "SMITH", "A", date(2015, 3, 1));
        let payrolls = vec![
            P::new(0, "JOHN", "A").build(),
            P::new(1, "JOHN", "A").build(),
            P::new(2, "JOHN", "A").appt(date(2000, 1, 1)).build(),
        ];
        let err = resolve_with(&BTreeMap::new(), TieBreakPolicy::Strict, &p, &payrolls)
            .unwrap_err();
        match err {
            LinkError::AmbiguousMatch { tax_id, candidates } => {
                assert_eq!(tax_id, "42");
                assert_eq!(candidates.len(), 2);
                assert!(candidates[0].starts_with("row 0"));
                assert!(candidates[1].starts_with("row 1"));
            }
            other => panic!("expected AmbiguousMatch, got {other:?}"),
        }
    }

    #[test]
    fn strict_policy_still_resolves_unique_matches() {
        let p = profile("42", "JOHN", "SMITH", "A", date(2015, 3, 1));
        let payrolls = vec![P::new(0, "JOHN", "A").build(), P::new(1, "JOHN", "B").build()];
        let got = resolve_with(&BTreeMap::new(), TieBreakPolicy::Strict, &p, &payrolls).unwrap();
        assert_eq!(got, Some((0, MatchStage::MiddleInitial)));
    }

    #[test]
    fn stage_contracts() {
        let p = profile("1", "JOHN", "SMITH", "A", date(2015, 3, 1));
        let a = P::new(0, "JOHN", "B").build();
        let b = P::new(1, "JOHN", "C").build();
        let set = vec![&a, &b];

        // Widen on empty: same set comes back.
        assert_eq!(middle_initial(&p, set.clone()), Narrowing::Continue(set.clone()));
        // Date filter keeps both (same date).
        assert_eq!(appointment_date(&p, set.clone()), Narrowing::Continue(set.clone()));
        assert_eq!(highest_pay(&set).map(|p| p.row), Some(0));
        assert_eq!(highest_pay(&[]), None);
    }
}

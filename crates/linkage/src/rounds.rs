use crate::error::LinkError;
use crate::index::CandidateIndex;
use crate::model::{MergedRecord, Profile, Round, RoundSummary};
use crate::resolver::Resolver;

/// Output of the round sequence for one candidate index.
#[derive(Debug)]
pub struct RoundsOutcome<'a> {
    pub merged: Vec<MergedRecord<'a>>,
    /// Input order.
    pub pending: Vec<&'a Profile>,
    pub rounds: Vec<RoundSummary>,
}

/// Run every round in sequence against `index`, consuming matched payrolls.
///
/// Each round reads the pending list left by the previous one and produces a
/// fresh one; nothing is removed from a list while it is being walked.
pub fn run_rounds<'a>(
    profiles: &'a [Profile],
    index: &mut CandidateIndex,
    resolver: &Resolver<'_>,
) -> Result<RoundsOutcome<'a>, LinkError> {
    let mut pending: Vec<&'a Profile> = profiles.iter().collect();
    let mut merged = Vec::new();
    let mut rounds = Vec::with_capacity(Round::ALL.len());

    for round in Round::ALL {
        let attempted = pending.len();
        let before = merged.len();
        pending = run_round(round, pending, index, resolver, &mut merged)?;

        let summary = RoundSummary {
            round,
            attempted,
            matched: merged.len() - before,
            pending_after: pending.len(),
        };
        tracing::info!(
            round = %round,
            attempted = summary.attempted,
            matched = summary.matched,
            pending = summary.pending_after,
            "round complete"
        );
        rounds.push(summary);
    }

    Ok(RoundsOutcome {
        merged,
        pending,
        rounds,
    })
}

/// One pass over `pending`. Returns the profiles still unmatched.
pub fn run_round<'a>(
    round: Round,
    pending: Vec<&'a Profile>,
    index: &mut CandidateIndex,
    resolver: &Resolver<'_>,
    merged: &mut Vec<MergedRecord<'a>>,
) -> Result<Vec<&'a Profile>, LinkError> {
    let mut still_pending = Vec::with_capacity(pending.len());

    for profile in pending {
        let decision = {
            let candidates = match round {
                Round::ExactLastName | Round::ExactLastNameRepeat => {
                    index.exact(&profile.last_name)
                }
                Round::LastNamePrefix => index.prefixed(&profile.last_name),
            };
            resolver
                .resolve(profile, &candidates)?
                .map(|r| (r.payroll.last_name.clone(), r.payroll.row, r.stage))
        };

        let Some((bucket, row, stage)) = decision else {
            still_pending.push(profile);
            continue;
        };

        let payroll = index.remove(&bucket, row).inspect_err(|e| {
            tracing::error!(tax_id = %profile.tax_id, error = %e, "candidate index out of sync");
        })?;
        tracing::debug!(
            tax_id = %profile.tax_id,
            payroll_row = row,
            round = %round,
            stage = %stage,
            "matched"
        );
        merged.push(MergedRecord {
            profile,
            payroll,
            round,
            stage,
        });
    }

    Ok(still_pending)
}

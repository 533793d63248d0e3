use serde::Serialize;
use tracing::debug;

use crate::average::WeightedMean;
use crate::cohort::{cohort_totals, CohortTotals, Scope};
use crate::error::RecordResult;
use crate::models::CarrierId;
use crate::snapshot::Snapshot;

/// Running totals carried from one term to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CumulativeSnapshot {
    pub credits_taken: i32,
    pub credits_passed: i32,
    pub credits_considered: i32,
    pub average: Option<f64>,
}

impl CumulativeSnapshot {
    /// State after the first term: that term's figures, undefined average included.
    pub fn start(term: &CohortTotals) -> Self {
        CumulativeSnapshot {
            credits_taken: term.credits_taken,
            credits_passed: term.credits_passed,
            credits_considered: term.credits_considered,
            average: term.average,
        }
    }

    /// Folds a later term in. Either side's undefined average weighs
    /// nothing, so the result is undefined only when both are.
    pub fn merge(&self, term: &CohortTotals) -> Self {
        let previous = WeightedMean::from_average(self.average, self.credits_considered);
        let current = WeightedMean::from_average(term.average, term.credits_considered);

        CumulativeSnapshot {
            credits_taken: self.credits_taken + term.credits_taken,
            credits_passed: self.credits_passed + term.credits_passed,
            credits_considered: self.credits_considered + term.credits_considered,
            average: previous.merge(current).value(),
        }
    }
}

/// One line of the career record: the term's own figures and the running
/// totals after merging it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeRecordRow {
    pub term_title: String,
    pub total_credits_taken: i32,
    pub total_credits_passed: i32,
    pub average: Option<f64>,
    pub credits_considered_in_average: i32,
    pub total_credits_taken_till_now: i32,
    pub total_credits_passed_till_now: i32,
    pub credits_considered_in_average_till_now: i32,
    pub average_till_now: Option<f64>,
}

impl CumulativeRecordRow {
    fn new(term_title: String, term: &CohortTotals, running: &CumulativeSnapshot) -> Self {
        CumulativeRecordRow {
            term_title,
            total_credits_taken: term.credits_taken,
            total_credits_passed: term.credits_passed,
            average: term.average,
            credits_considered_in_average: term.credits_considered,
            total_credits_taken_till_now: running.credits_taken,
            total_credits_passed_till_now: running.credits_passed,
            credits_considered_in_average_till_now: running.credits_considered,
            average_till_now: running.average,
        }
    }
}

/// Folds per-term totals, oldest first, into running snapshots.
pub fn accumulate<'a>(
    terms: impl IntoIterator<Item = &'a CohortTotals>,
) -> Vec<CumulativeSnapshot> {
    let mut running: Option<CumulativeSnapshot> = None;
    let mut history = Vec::new();
    for term in terms {
        let next = match running {
            None => CumulativeSnapshot::start(term),
            Some(previous) => previous.merge(term),
        };
        history.push(next);
        running = Some(next);
    }
    history
}

/// Term-by-term career record of one carrier in chronological order.
#[tracing::instrument(skip(snapshot))]
pub fn cumulative_records(
    snapshot: &Snapshot,
    carrier_id: CarrierId,
) -> RecordResult<Vec<CumulativeRecordRow>> {
    snapshot.carrier(carrier_id)?;
    let terms = snapshot.carrier_terms(carrier_id)?;

    let mut per_term = Vec::with_capacity(terms.len());
    for term in &terms {
        per_term.push(cohort_totals(snapshot, carrier_id, term.id, Scope::Carrier)?);
    }

    let running = accumulate(&per_term);
    let rows: Vec<_> = terms
        .iter()
        .zip(per_term.iter().zip(running.iter()))
        .map(|(term, (totals, cumulative))| {
            debug!(
                term_id = term.id,
                average = ?totals.average,
                average_till_now = ?cumulative.average,
                "Merged term into career record"
            );
            CumulativeRecordRow::new(term.title(), totals, cumulative)
        })
        .collect();

    Ok(rows)
}

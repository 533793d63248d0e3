use serde::Serialize;
use tracing::debug;

use crate::cohort::{cohort_totals, Scope};
use crate::error::RecordResult;
use crate::models::{CarrierId, TermId};
use crate::snapshot::Snapshot;

/// One term of a carrier's record next to the averages of its peers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TermSummary {
    pub credits_taken: i32,
    pub credits_passed: i32,
    pub credits_considered: i32,
    pub carrier_average: Option<f64>,
    pub field_average: Option<f64>,
    pub department_average: Option<f64>,
    pub college_average: Option<f64>,
}

#[tracing::instrument(skip(snapshot))]
pub fn term_summary(
    snapshot: &Snapshot,
    carrier_id: CarrierId,
    term_id: TermId,
) -> RecordResult<TermSummary> {
    snapshot.valid_term(term_id)?;
    let own = cohort_totals(snapshot, carrier_id, term_id, Scope::Carrier)?;
    let field = cohort_totals(snapshot, carrier_id, term_id, Scope::Field)?;
    let department = cohort_totals(snapshot, carrier_id, term_id, Scope::Department)?;
    let college = cohort_totals(snapshot, carrier_id, term_id, Scope::College)?;
    debug!(
        credits_taken = own.credits_taken,
        credits_considered = own.credits_considered,
        "Term summary built"
    );

    Ok(TermSummary {
        credits_taken: own.credits_taken,
        credits_passed: own.credits_passed,
        credits_considered: own.credits_considered,
        carrier_average: own.average,
        field_average: field.average,
        department_average: department.average,
        college_average: college.average,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::models::GradesStatus;
    use crate::snapshot::fixtures::*;

    #[test]
    fn summary_combines_four_scopes() {
        let mut fixture = Fixture::new();
        let term = fixture.term((2023, 9, 1), (2024, 1, 31));
        let calculus = fixture.approved_offering(4, term);
        let physics = fixture.approved_offering(2, term);
        fixture.graded(SELF, calculus, 17.0);
        fixture.graded(SELF, physics, 9.0);
        fixture.graded(FIELD_PEER, calculus, 11.0);
        fixture.graded(DEPARTMENT_PEER, calculus, 13.0);
        fixture.graded(COLLEGE_PEER, physics, 5.0);
        let snapshot = fixture.build();

        let summary = term_summary(&snapshot, SELF, term).unwrap();
        assert_eq!(summary.credits_taken, 6);
        assert_eq!(summary.credits_passed, 4);
        assert_eq!(summary.credits_considered, 6);
        // (17*4 + 9*2) / 6
        assert_eq!(summary.carrier_average, Some(14.33));
        // (17*4 + 9*2 + 11*4) / 10
        assert_eq!(summary.field_average, Some(13.0));
        // (17*4 + 9*2 + 11*4 + 13*4) / 14
        assert_eq!(summary.department_average, Some(13.0));
        // (17*4 + 9*2 + 11*4 + 13*4 + 5*2) / 16
        assert_eq!(summary.college_average, Some(12.0));
    }

    #[test]
    fn ungraded_term_serializes_nulls() {
        let mut fixture = Fixture::new();
        let term = fixture.term((2023, 9, 1), (2024, 1, 31));
        let course = fixture.course(1, 2);
        let offering = fixture.offering(course, term, GradesStatus::NotSent);
        fixture.enroll(SELF, offering);
        let snapshot = fixture.build();

        let summary = term_summary(&snapshot, SELF, term).unwrap();
        assert_eq!(summary.credits_taken, 3);
        let json = serde_json::to_value(summary).unwrap();
        assert!(json["carrier_average"].is_null());
        assert!(json["college_average"].is_null());
        assert_eq!(json["credits_passed"], 0);
    }

    #[test]
    fn inverted_term_is_invalid_input() {
        let mut fixture = Fixture::new();
        let term = fixture.term((2024, 6, 30), (2024, 2, 1));
        let offering = fixture.approved_offering(3, term);
        fixture.graded(SELF, offering, 15.0);
        let snapshot = fixture.build();

        assert!(matches!(
            term_summary(&snapshot, SELF, term),
            Err(RecordError::InvalidTermInterval { term_id, .. }) if term_id == term
        ));
    }

    #[test]
    fn unknown_term_is_reported() {
        let snapshot = Fixture::new().build();
        assert_eq!(
            term_summary(&snapshot, SELF, 77),
            Err(RecordError::missing("term", 77))
        );
    }
}

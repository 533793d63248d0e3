use serde::Serialize;

use crate::average::WeightedMean;
use crate::error::RecordResult;
use crate::grade::{enrollment_grade, grade_state};
use crate::models::{CarrierId, Enrollment, GradeState, TermId};
use crate::snapshot::{Lineage, Snapshot};

/// Which peers of a target carrier form the cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Carrier,
    Field,
    Department,
    College,
}

impl Scope {
    /// Hierarchy node a peer must share with the target. The carrier scope
    /// has none: it admits the target alone.
    fn group_of(self, lineage: &Lineage) -> Option<i64> {
        match self {
            Scope::Carrier => None,
            Scope::Field => Some(lineage.field_id),
            Scope::Department => Some(lineage.department_id),
            Scope::College => Some(lineage.college_id),
        }
    }
}

/// Credit-weighted totals over a set of enrollments.
///
/// `credits_taken` counts every enrollment the carrier kept, graded or not;
/// the other figures only count enrollments with a defined grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CohortTotals {
    pub credits_taken: i32,
    pub credits_considered: i32,
    pub credits_passed: i32,
    pub average: Option<f64>,
}

/// Totals for the enrollments of `term` that `scope` selects relative to
/// the target carrier.
pub fn cohort_totals(
    snapshot: &Snapshot,
    carrier_id: CarrierId,
    term_id: TermId,
    scope: Scope,
) -> RecordResult<CohortTotals> {
    snapshot.carrier(carrier_id)?;
    let target_group = match scope {
        Scope::Carrier => None,
        _ => scope.group_of(&snapshot.lineage(carrier_id)?),
    };

    let mut members = Vec::new();
    for enrollment in snapshot.enrollments_in_term(term_id) {
        let admitted = match target_group {
            None => enrollment.carrier_id == carrier_id,
            Some(group) => {
                scope.group_of(&snapshot.lineage(enrollment.carrier_id)?) == Some(group)
            }
        };
        if admitted {
            members.push(enrollment);
        }
    }

    tally(snapshot, members)
}

/// Career-long totals of one carrier across every term.
pub fn career_totals(snapshot: &Snapshot, carrier_id: CarrierId) -> RecordResult<CohortTotals> {
    snapshot.carrier(carrier_id)?;
    tally(snapshot, snapshot.enrollments_of_carrier(carrier_id))
}

pub fn tally<'a>(
    snapshot: &Snapshot,
    enrollments: impl IntoIterator<Item = &'a Enrollment>,
) -> RecordResult<CohortTotals> {
    let mut totals = CohortTotals::default();
    let mut average = WeightedMean::default();

    for enrollment in enrollments {
        let offering = snapshot.offering(enrollment.offering_id)?;
        let credit = snapshot.offering_credit(offering)?;

        if !enrollment.removed_by_carrier {
            totals.credits_taken += credit;
        }

        let Some(grade) = enrollment_grade(snapshot, enrollment)? else {
            continue;
        };
        average.add(grade, credit);
        if grade_state(Some(grade)) == Some(GradeState::Passed) {
            totals.credits_passed += credit;
        }
    }

    totals.credits_considered = average.weight();
    totals.average = average.value();
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::models::GradesStatus;
    use crate::snapshot::fixtures::*;

    /// One autumn term where every fixture carrier takes a 3-credit course
    /// and the target also has an ungraded 2-credit course.
    fn populated() -> (Fixture, TermId) {
        let mut fixture = Fixture::new();
        let term = fixture.term((2023, 9, 1), (2024, 1, 31));
        let offering = fixture.approved_offering(3, term);
        fixture.graded(SELF, offering, 16.0);
        fixture.graded(FIELD_PEER, offering, 12.0);
        fixture.graded(DEPARTMENT_PEER, offering, 8.0);
        fixture.graded(COLLEGE_PEER, offering, 4.0);
        fixture.graded(OUTSIDER, offering, 20.0);

        let course = fixture.course(1, 1);
        let pending = fixture.offering(course, term, GradesStatus::NotSent);
        fixture.graded(SELF, pending, 19.0);
        (fixture, term)
    }

    #[test]
    fn tied_average_rounds_to_even() {
        let mut fixture = Fixture::new();
        let term = fixture.term((2023, 9, 1), (2024, 1, 31));
        let first = fixture.approved_offering(1, term);
        let second = fixture.approved_offering(1, term);
        fixture.graded(SELF, first, 16.25);
        fixture.graded(SELF, second, 16.0);
        fixture.graded(FIELD_PEER, first, 16.0);
        let snapshot = fixture.build();

        let own = cohort_totals(&snapshot, SELF, term, Scope::Carrier).unwrap();
        assert_eq!(own.average, Some(16.12));
        assert_eq!(
            crate::course_stats::course_statistics(&snapshot, first).unwrap().average,
            Some(16.12)
        );
    }

    #[test]
    fn scopes_widen_the_cohort() {
        let (fixture, term) = populated();
        let snapshot = fixture.build();

        let own = cohort_totals(&snapshot, SELF, term, Scope::Carrier).unwrap();
        assert_eq!(own.average, Some(16.0));
        let field = cohort_totals(&snapshot, SELF, term, Scope::Field).unwrap();
        assert_eq!(field.average, Some(14.0));
        let department = cohort_totals(&snapshot, SELF, term, Scope::Department).unwrap();
        assert_eq!(department.average, Some(12.0));
        let college = cohort_totals(&snapshot, SELF, term, Scope::College).unwrap();
        assert_eq!(college.average, Some(10.0));
    }

    #[test]
    fn credits_taken_do_not_wait_for_grades() {
        let (fixture, term) = populated();
        let snapshot = fixture.build();

        let own = cohort_totals(&snapshot, SELF, term, Scope::Carrier).unwrap();
        assert_eq!(own.credits_taken, 5);
        assert_eq!(own.credits_considered, 3);
        assert_eq!(own.credits_passed, 3);
    }

    #[test]
    fn passed_within_considered_within_taken() {
        let (mut fixture, term) = populated();
        let offering = fixture.approved_offering(4, term);
        fixture.graded(SELF, offering, 6.0);
        let removed_offering = fixture.approved_offering(2, term);
        let removed = fixture.graded(SELF, removed_offering, 18.0);
        fixture.remove(removed);
        let snapshot = fixture.build();

        for scope in [Scope::Carrier, Scope::Field, Scope::Department, Scope::College] {
            let totals = cohort_totals(&snapshot, SELF, term, scope).unwrap();
            assert!(totals.credits_passed <= totals.credits_considered);
            assert!(totals.credits_considered <= totals.credits_taken);
        }

        let own = cohort_totals(&snapshot, SELF, term, Scope::Carrier).unwrap();
        assert_eq!(own.credits_taken, 9);
        assert_eq!(own.credits_considered, 7);
        assert_eq!(own.credits_passed, 3);
        assert_eq!(own.average, Some(10.29));
    }

    #[test]
    fn nothing_graded_means_undefined_average() {
        let mut fixture = Fixture::new();
        let term = fixture.term((2023, 9, 1), (2024, 1, 31));
        let course = fixture.course(2, 1);
        let offering = fixture.offering(course, term, GradesStatus::Sent);
        fixture.graded(SELF, offering, 15.0);
        let snapshot = fixture.build();

        let own = cohort_totals(&snapshot, SELF, term, Scope::Carrier).unwrap();
        assert_eq!(own.credits_taken, 3);
        assert_eq!(own.credits_considered, 0);
        assert_eq!(own.average, None);
    }

    #[test]
    fn zero_credit_courses_leave_average_undefined() {
        let mut fixture = Fixture::new();
        let term = fixture.term((2023, 9, 1), (2024, 1, 31));
        let offering = fixture.approved_offering(0, term);
        fixture.graded(SELF, offering, 15.0);
        let snapshot = fixture.build();

        let own = cohort_totals(&snapshot, SELF, term, Scope::Carrier).unwrap();
        assert_eq!(own.average, None);
    }

    #[test]
    fn other_terms_are_ignored() {
        let (mut fixture, term) = populated();
        let spring = fixture.term((2024, 2, 1), (2024, 6, 30));
        let offering = fixture.approved_offering(3, spring);
        fixture.graded(SELF, offering, 2.0);
        let snapshot = fixture.build();

        let own = cohort_totals(&snapshot, SELF, term, Scope::Carrier).unwrap();
        assert_eq!(own.average, Some(16.0));
    }

    #[test]
    fn broken_peer_lineage_aborts_peer_scopes_only() {
        let (mut fixture, term) = populated();
        fixture.data.subfields.retain(|s| s.id != 2000);
        let snapshot = fixture.build();

        assert!(cohort_totals(&snapshot, SELF, term, Scope::Carrier).is_ok());
        assert_eq!(
            cohort_totals(&snapshot, SELF, term, Scope::College),
            Err(RecordError::missing("subfield", 2000))
        );
    }

    #[test]
    fn career_totals_span_terms() {
        let (mut fixture, _) = populated();
        let spring = fixture.term((2024, 2, 1), (2024, 6, 30));
        let offering = fixture.approved_offering(3, spring);
        fixture.graded(SELF, offering, 12.0);
        let snapshot = fixture.build();

        let totals = career_totals(&snapshot, SELF).unwrap();
        assert_eq!(totals.credits_taken, 8);
        assert_eq!(totals.credits_considered, 6);
        assert_eq!(totals.credits_passed, 6);
        assert_eq!(totals.average, Some(14.0));
    }
}

use crate::average::round2;
use crate::error::{RecordError, RecordResult};
use crate::models::{AssessmentComponent, CourseOffering, Enrollment, GradeState};
use crate::snapshot::Snapshot;

/// Lowest grade, out of 20, that passes a course.
pub const PASS_MARK: f64 = 10.0;

/// Final 0–20 grade from assessment components.
///
/// Undefined when the enrollment was removed by the carrier or the
/// offering's grades are not approved. An approved enrollment with no
/// components grades as `0.0`.
pub fn compute_grade(
    removed_by_carrier: bool,
    offering: &CourseOffering,
    components: &[AssessmentComponent],
) -> RecordResult<Option<f64>> {
    if removed_by_carrier || !offering.grades_approved() {
        return Ok(None);
    }

    let mut sum = 0.0;
    for component in components {
        // NaN fails the comparison as well
        if !(component.base_value > 0.0) {
            return Err(RecordError::NonPositiveBase {
                component_id: component.id,
                base: component.base_value,
            });
        }
        sum += (component.value / component.base_value) * component.out_of_twenty;
    }

    Ok(Some(round2(sum)))
}

pub fn grade_state(grade: Option<f64>) -> Option<GradeState> {
    grade.map(|value| {
        if value >= PASS_MARK {
            GradeState::Passed
        } else {
            GradeState::Failed
        }
    })
}

/// Grade of one enrollment as recorded in the snapshot.
pub fn enrollment_grade(snapshot: &Snapshot, enrollment: &Enrollment) -> RecordResult<Option<f64>> {
    let offering = snapshot.offering(enrollment.offering_id)?;
    compute_grade(
        enrollment.removed_by_carrier,
        offering,
        snapshot.components_of(enrollment.id),
    )
}

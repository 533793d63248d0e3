use serde::Serialize;
use tracing::debug;

use crate::average::mean;
use crate::error::RecordResult;
use crate::grade::enrollment_grade;
use crate::models::OfferingId;
use crate::snapshot::Snapshot;

/// Grade distribution of one course offering. All fields are null until the
/// offering's grades are approved and at least one grade is defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CourseStatistics {
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[tracing::instrument(skip(snapshot))]
pub fn course_statistics(
    snapshot: &Snapshot,
    offering_id: OfferingId,
) -> RecordResult<CourseStatistics> {
    let offering = snapshot.offering(offering_id)?;
    if !offering.grades_approved() {
        return Ok(CourseStatistics::default());
    }

    let mut grades = Vec::new();
    for enrollment in snapshot.enrollments_of_offering(offering_id) {
        if let Some(grade) = enrollment_grade(snapshot, enrollment)? {
            grades.push(grade);
        }
    }
    debug!(graded = grades.len(), "Collected offering grades");

    Ok(CourseStatistics {
        average: mean(&grades),
        min: grades.iter().copied().reduce(f64::min),
        max: grades.iter().copied().reduce(f64::max),
    })
}

/// Enrollments in the offering that the carrier has not removed.
pub fn registered_count(snapshot: &Snapshot, offering_id: OfferingId) -> usize {
    snapshot
        .enrollments_of_offering(offering_id)
        .filter(|e| !e.removed_by_carrier)
        .count()
}

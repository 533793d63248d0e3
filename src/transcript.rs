use chrono::NaiveDate;
use serde::Serialize;

use crate::course_stats::{course_statistics, CourseStatistics};
use crate::error::RecordResult;
use crate::grade::{enrollment_grade, grade_state};
use crate::models::{CarrierId, CourseSerial, OfferingId, TermId};
use crate::snapshot::Snapshot;

/// One enrollment as it appears on a carrier's term transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptLine {
    pub offering_id: OfferingId,
    pub course_serial: CourseSerial,
    pub course_title: String,
    pub credit: i32,
    pub section_number: i32,
    pub course_type: Option<&'static str>,
    pub grade: Option<f64>,
    pub grade_status: Option<&'static str>,
    pub removed_by_carrier: bool,
    pub approval: &'static str,
    pub grades_status: &'static str,
    pub course_statistics: CourseStatistics,
}

pub fn term_transcript(
    snapshot: &Snapshot,
    carrier_id: CarrierId,
    term_id: TermId,
) -> RecordResult<Vec<TranscriptLine>> {
    let carrier = snapshot.carrier(carrier_id)?;
    snapshot.valid_term(term_id)?;

    let mut lines = Vec::new();
    for enrollment in snapshot.enrollments_for(carrier_id, term_id)? {
        let offering = snapshot.offering(enrollment.offering_id)?;
        let course = snapshot.course(offering.course_serial)?;
        let grade = enrollment_grade(snapshot, enrollment)?;

        lines.push(TranscriptLine {
            offering_id: offering.id,
            course_serial: course.serial_number,
            course_title: course.title.clone(),
            credit: course.credit(),
            section_number: offering.section_number,
            course_type: snapshot
                .subfield_course(carrier.subfield_id, course.serial_number)
                .map(|row| row.course_type.label()),
            grade,
            grade_status: grade_state(grade).map(|state| state.label()),
            removed_by_carrier: enrollment.removed_by_carrier,
            approval: enrollment.approval.label(),
            grades_status: offering.grades_status.label(),
            course_statistics: course_statistics(snapshot, offering.id)?,
        });
    }

    lines.sort_by_key(|line| (line.course_serial, line.section_number));
    Ok(lines)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentLine {
    pub title: String,
    pub percentage: f64,
    pub value: f64,
    pub base_value: f64,
    pub examined_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeBreakdown {
    pub components: Vec<ComponentLine>,
    pub final_grade: Option<f64>,
}

/// Assessment components behind one carrier's grade in an offering.
pub fn grade_breakdown(
    snapshot: &Snapshot,
    carrier_id: CarrierId,
    offering_id: OfferingId,
) -> RecordResult<GradeBreakdown> {
    snapshot.carrier(carrier_id)?;
    snapshot.offering(offering_id)?;

    let Some(enrollment) = snapshot
        .enrollments_of_offering(offering_id)
        .find(|e| e.carrier_id == carrier_id)
    else {
        return Ok(GradeBreakdown {
            components: Vec::new(),
            final_grade: None,
        });
    };

    let components = snapshot
        .components_of(enrollment.id)
        .iter()
        .map(|component| ComponentLine {
            title: component.title.clone(),
            percentage: component.percentage(),
            value: component.value,
            base_value: component.base_value,
            examined_on: component.examined_on,
        })
        .collect();

    Ok(GradeBreakdown {
        components,
        final_grade: enrollment_grade(snapshot, enrollment)?,
    })
}

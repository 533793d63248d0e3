use serde::Serialize;

use crate::error::RecordResult;
use crate::models::{CarrierId, CourseSerial, CurriculumCourse};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurriculumEntry {
    pub course_serial: CourseSerial,
    pub title: String,
    pub credit: i32,
    pub course_type: &'static str,
    pub suggested_term: Option<i32>,
    pub prerequisites: Vec<CourseSerial>,
    pub corequisites: Vec<CourseSerial>,
}

/// Resolves an adjacency list of course serial numbers.
pub fn related<'a>(
    snapshot: &'a Snapshot,
    edges: &[CourseSerial],
) -> RecordResult<Vec<&'a CurriculumCourse>> {
    edges.iter().map(|serial| snapshot.course(*serial)).collect()
}

/// The carrier's subfield curriculum, by suggested term then serial number.
/// Courses without a suggested term come last.
pub fn curriculum_plan(
    snapshot: &Snapshot,
    carrier_id: CarrierId,
) -> RecordResult<Vec<CurriculumEntry>> {
    let carrier = snapshot.carrier(carrier_id)?;
    snapshot.subfield(carrier.subfield_id)?;

    let mut entries = Vec::new();
    for row in snapshot.subfield_courses(carrier.subfield_id) {
        let course = snapshot.course(row.course_serial)?;
        let prerequisites = related(snapshot, &course.prerequisites)?;
        let corequisites = related(snapshot, &course.corequisites)?;

        entries.push(CurriculumEntry {
            course_serial: course.serial_number,
            title: course.title.clone(),
            credit: course.credit(),
            course_type: row.course_type.label(),
            suggested_term: row.suggested_term,
            prerequisites: prerequisites.iter().map(|c| c.serial_number).collect(),
            corequisites: corequisites.iter().map(|c| c.serial_number).collect(),
        });
    }

    entries.sort_by_key(|entry| {
        (
            entry.suggested_term.is_none(),
            entry.suggested_term,
            entry.course_serial,
        )
    });
    Ok(entries)
}

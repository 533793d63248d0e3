use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RecordError, RecordResult};
use crate::models::{
    AssessmentComponent, Carrier, CarrierId, College, CollegeId, CourseOffering, CourseSerial,
    CurriculumCourse, Department, DepartmentId, Enrollment, EnrollmentId, Field, FieldId,
    OfferingId, PreRegistration, Subfield, SubfieldCourse, SubfieldId, Term, TermId,
};

/// Flat, serializable form of a snapshot, as loaded from Postgres or JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotData {
    pub colleges: Vec<College>,
    pub departments: Vec<Department>,
    pub fields: Vec<Field>,
    pub subfields: Vec<Subfield>,
    pub courses: Vec<CurriculumCourse>,
    pub subfield_courses: Vec<SubfieldCourse>,
    pub terms: Vec<Term>,
    pub carriers: Vec<Carrier>,
    pub offerings: Vec<CourseOffering>,
    pub enrollments: Vec<Enrollment>,
    pub components: Vec<AssessmentComponent>,
    pub pre_registrations: Vec<PreRegistration>,
}

/// The cohort chain of one carrier: subfield → field → head department → college.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lineage {
    pub subfield_id: SubfieldId,
    pub field_id: FieldId,
    pub department_id: DepartmentId,
    pub college_id: CollegeId,
}

/// Read-only, indexed view over one consistent set of records.
///
/// Entities live in id-keyed arenas; relations between them are ids, never
/// references, so the snapshot owns everything and hands out borrows.
#[derive(Debug, Default)]
pub struct Snapshot {
    colleges: HashMap<CollegeId, College>,
    departments: HashMap<DepartmentId, Department>,
    fields: HashMap<FieldId, Field>,
    subfields: HashMap<SubfieldId, Subfield>,
    courses: HashMap<CourseSerial, CurriculumCourse>,
    subfield_courses: Vec<SubfieldCourse>,
    terms: HashMap<TermId, Term>,
    carriers: HashMap<CarrierId, Carrier>,
    offerings: HashMap<OfferingId, CourseOffering>,
    enrollments: Vec<Enrollment>,
    components: HashMap<EnrollmentId, Vec<AssessmentComponent>>,
    pre_registrations: Vec<PreRegistration>,
    enrollments_by_offering: HashMap<OfferingId, Vec<usize>>,
    enrollments_by_carrier: HashMap<CarrierId, Vec<usize>>,
    offerings_by_term: HashMap<TermId, Vec<OfferingId>>,
}

impl Snapshot {
    pub fn new(data: SnapshotData) -> Self {
        let mut snapshot = Snapshot {
            colleges: data.colleges.into_iter().map(|c| (c.id, c)).collect(),
            departments: data.departments.into_iter().map(|d| (d.id, d)).collect(),
            fields: data.fields.into_iter().map(|f| (f.id, f)).collect(),
            subfields: data.subfields.into_iter().map(|s| (s.id, s)).collect(),
            courses: data
                .courses
                .into_iter()
                .map(|c| (c.serial_number, c))
                .collect(),
            subfield_courses: data.subfield_courses,
            terms: data.terms.into_iter().map(|t| (t.id, t)).collect(),
            carriers: data.carriers.into_iter().map(|c| (c.id, c)).collect(),
            offerings: HashMap::new(),
            enrollments: data.enrollments,
            components: HashMap::new(),
            pre_registrations: data.pre_registrations,
            enrollments_by_offering: HashMap::new(),
            enrollments_by_carrier: HashMap::new(),
            offerings_by_term: HashMap::new(),
        };

        for offering in data.offerings {
            snapshot
                .offerings_by_term
                .entry(offering.term_id)
                .or_default()
                .push(offering.id);
            snapshot.offerings.insert(offering.id, offering);
        }

        for (index, enrollment) in snapshot.enrollments.iter().enumerate() {
            snapshot
                .enrollments_by_offering
                .entry(enrollment.offering_id)
                .or_default()
                .push(index);
            snapshot
                .enrollments_by_carrier
                .entry(enrollment.carrier_id)
                .or_default()
                .push(index);
        }

        let mut components = data.components;
        components.sort_by_key(|c| c.id);
        for component in components {
            snapshot
                .components
                .entry(component.enrollment_id)
                .or_default()
                .push(component);
        }

        snapshot
    }

    /// Loads a JSON snapshot document.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        let data: SnapshotData = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))?;
        info!(
            path = %path.display(),
            carriers = data.carriers.len(),
            enrollments = data.enrollments.len(),
            "Snapshot loaded from file"
        );
        Ok(Snapshot::new(data))
    }

    pub fn carrier(&self, id: CarrierId) -> RecordResult<&Carrier> {
        self.carriers
            .get(&id)
            .ok_or_else(|| RecordError::missing("carrier", id))
    }

    pub fn subfield(&self, id: SubfieldId) -> RecordResult<&Subfield> {
        self.subfields
            .get(&id)
            .ok_or_else(|| RecordError::missing("subfield", id))
    }

    pub fn field(&self, id: FieldId) -> RecordResult<&Field> {
        self.fields
            .get(&id)
            .ok_or_else(|| RecordError::missing("field", id))
    }

    pub fn department(&self, id: DepartmentId) -> RecordResult<&Department> {
        self.departments
            .get(&id)
            .ok_or_else(|| RecordError::missing("department", id))
    }

    pub fn college(&self, id: CollegeId) -> RecordResult<&College> {
        self.colleges
            .get(&id)
            .ok_or_else(|| RecordError::missing("college", id))
    }

    pub fn course(&self, serial: CourseSerial) -> RecordResult<&CurriculumCourse> {
        self.courses
            .get(&serial)
            .ok_or_else(|| RecordError::missing("curriculum course", serial))
    }

    pub fn term(&self, id: TermId) -> RecordResult<&Term> {
        self.terms
            .get(&id)
            .ok_or_else(|| RecordError::missing("term", id))
    }

    /// Term whose interval ends on or after its start and crosses at most
    /// one year boundary.
    pub fn valid_term(&self, id: TermId) -> RecordResult<&Term> {
        let term = self.term(id)?;
        if !term.has_valid_interval() {
            return Err(RecordError::InvalidTermInterval {
                term_id: term.id,
                start: term.start_date,
                end: term.end_date,
            });
        }
        Ok(term)
    }

    pub fn offering(&self, id: OfferingId) -> RecordResult<&CourseOffering> {
        self.offerings
            .get(&id)
            .ok_or_else(|| RecordError::missing("course offering", id))
    }

    /// Credit weight of the curriculum course behind an offering.
    pub fn offering_credit(&self, offering: &CourseOffering) -> RecordResult<i32> {
        Ok(self.course(offering.course_serial)?.credit())
    }

    /// Walks carrier → subfield → field → head department → college.
    pub fn lineage(&self, carrier_id: CarrierId) -> RecordResult<Lineage> {
        let carrier = self.carrier(carrier_id)?;
        let subfield = self.subfield(carrier.subfield_id)?;
        let field = self.field(subfield.field_id)?;
        let department = self.department(field.head_department_id)?;
        let college = self.college(department.college_id)?;
        Ok(Lineage {
            subfield_id: subfield.id,
            field_id: field.id,
            department_id: department.id,
            college_id: college.id,
        })
    }

    /// Components in recording order.
    pub fn components_of(&self, enrollment_id: EnrollmentId) -> &[AssessmentComponent] {
        self.components
            .get(&enrollment_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn enrollments_of_offering(
        &self,
        offering_id: OfferingId,
    ) -> impl Iterator<Item = &Enrollment> + '_ {
        self.indexed(self.enrollments_by_offering.get(&offering_id))
    }

    pub fn enrollments_of_carrier(
        &self,
        carrier_id: CarrierId,
    ) -> impl Iterator<Item = &Enrollment> + '_ {
        self.indexed(self.enrollments_by_carrier.get(&carrier_id))
    }

    /// Every enrollment in any offering of the term.
    pub fn enrollments_in_term(&self, term_id: TermId) -> impl Iterator<Item = &Enrollment> + '_ {
        self.offerings_by_term
            .get(&term_id)
            .into_iter()
            .flatten()
            .flat_map(move |offering_id| self.enrollments_of_offering(*offering_id))
    }

    /// The carrier's enrollments whose offering belongs to the term.
    pub fn enrollments_for(
        &self,
        carrier_id: CarrierId,
        term_id: TermId,
    ) -> RecordResult<Vec<&Enrollment>> {
        let mut found = Vec::new();
        for enrollment in self.enrollments_of_carrier(carrier_id) {
            if self.offering(enrollment.offering_id)?.term_id == term_id {
                found.push(enrollment);
            }
        }
        Ok(found)
    }

    /// Distinct terms the carrier enrolled or pre-registered in, ascending by
    /// start date. Equal start dates on distinct terms are rejected rather
    /// than tie-broken.
    pub fn carrier_terms(&self, carrier_id: CarrierId) -> RecordResult<Vec<&Term>> {
        let mut term_ids = Vec::new();
        for enrollment in self.enrollments_of_carrier(carrier_id) {
            term_ids.push(self.offering(enrollment.offering_id)?.term_id);
        }
        term_ids.extend(
            self.pre_registrations
                .iter()
                .filter(|p| p.carrier_id == carrier_id)
                .map(|p| p.term_id),
        );
        term_ids.sort_unstable();
        term_ids.dedup();

        let mut terms = Vec::with_capacity(term_ids.len());
        for id in term_ids {
            terms.push(self.valid_term(id)?);
        }

        terms.sort_by_key(|t| t.start_date);
        if let Some(pair) = terms
            .windows(2)
            .find(|pair| pair[0].start_date == pair[1].start_date)
        {
            return Err(RecordError::AmbiguousTermOrder {
                first: pair[0].id,
                second: pair[1].id,
                start: pair[0].start_date,
            });
        }

        Ok(terms)
    }

    /// Curriculum rows of one subfield.
    pub fn subfield_courses(
        &self,
        subfield_id: SubfieldId,
    ) -> impl Iterator<Item = &SubfieldCourse> + '_ {
        self.subfield_courses
            .iter()
            .filter(move |row| row.subfield_id == subfield_id)
    }

    pub fn subfield_course(
        &self,
        subfield_id: SubfieldId,
        serial: CourseSerial,
    ) -> Option<&SubfieldCourse> {
        self.subfield_courses(subfield_id)
            .find(|row| row.course_serial == serial)
    }

    fn indexed<'a>(
        &'a self,
        indexes: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a Enrollment> + 'a {
        indexes
            .into_iter()
            .flatten()
            .filter_map(move |index| self.enrollments.get(*index))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Snapshot builder with a fixed hierarchy:
    //!
    //! - college 1: departments 10 and 11
    //! - department 10 heads fields 100 and 101, department 11 heads field 102
    //! - subfields 1000 → 100, 1001 → 101, 1002 → 102
    //! - carriers 1 and 2 in subfield 1000, carrier 3 in 1001, carrier 4 in 1002
    //! - college 2 / department 20 / field 200 / subfield 2000 / carrier 5

    use chrono::NaiveDate;

    use super::{Snapshot, SnapshotData};
    use crate::models::*;

    pub const SELF: CarrierId = 1;
    pub const FIELD_PEER: CarrierId = 2;
    pub const DEPARTMENT_PEER: CarrierId = 3;
    pub const COLLEGE_PEER: CarrierId = 4;
    pub const OUTSIDER: CarrierId = 5;

    pub struct Fixture {
        pub data: SnapshotData,
        next_id: i64,
    }

    impl Fixture {
        pub fn new() -> Self {
            let mut data = SnapshotData::default();
            for (id, title) in [(1, "Engineering"), (2, "Humanities")] {
                data.colleges.push(College {
                    id,
                    title: title.to_string(),
                });
            }
            for (id, title, college_id) in [
                (10, "Computer Engineering", 1),
                (11, "Civil Engineering", 1),
                (20, "History", 2),
            ] {
                data.departments.push(Department {
                    id,
                    title: title.to_string(),
                    college_id,
                });
            }
            for (id, title, head) in [
                (100, "Software", 10),
                (101, "Hardware", 10),
                (102, "Structures", 11),
                (200, "Ancient History", 20),
            ] {
                data.fields.push(Field {
                    id,
                    title: title.to_string(),
                    degree: DegreeType::Bachelor,
                    head_department_id: head,
                    other_department_ids: Vec::new(),
                });
            }
            for (id, field_id) in [(1000, 100), (1001, 101), (1002, 102), (2000, 200)] {
                data.subfields.push(Subfield {
                    id,
                    title: format!("Track {id}"),
                    field_id,
                });
            }
            for (id, subfield_id) in [
                (SELF, 1000),
                (FIELD_PEER, 1000),
                (DEPARTMENT_PEER, 1001),
                (COLLEGE_PEER, 1002),
                (OUTSIDER, 2000),
            ] {
                data.carriers.push(Carrier {
                    id,
                    student_name: format!("Student {id}"),
                    subfield_id,
                    status: CarrierStatus::Studying,
                    admission_type: AdmissionType::Day,
                });
            }
            Fixture {
                data,
                next_id: 1,
            }
        }

        fn next(&mut self) -> i64 {
            let id = self.next_id;
            self.next_id += 1;
            id
        }

        pub fn term(&mut self, start: (i32, u32, u32), end: (i32, u32, u32)) -> TermId {
            let id = self.next();
            self.data.terms.push(Term {
                id,
                start_date: date(start),
                end_date: date(end),
            });
            id
        }

        pub fn course(&mut self, practical_units: i32, theoretical_units: i32) -> CourseSerial {
            let serial_number = 5000 + self.next();
            self.data.courses.push(CurriculumCourse {
                serial_number,
                title: format!("Course {serial_number}"),
                practical_units,
                theoretical_units,
                prerequisites: Vec::new(),
                corequisites: Vec::new(),
            });
            serial_number
        }

        pub fn offering(
            &mut self,
            course_serial: CourseSerial,
            term_id: TermId,
            grades_status: GradesStatus,
        ) -> OfferingId {
            let id = self.next();
            self.data.offerings.push(CourseOffering {
                id,
                course_serial,
                term_id,
                department_id: 10,
                section_number: 1,
                capacity: 40,
                grades_status,
            });
            id
        }

        pub fn enroll(&mut self, carrier_id: CarrierId, offering_id: OfferingId) -> EnrollmentId {
            let id = self.next();
            self.data.enrollments.push(Enrollment {
                id,
                carrier_id,
                offering_id,
                approval: ApprovalState::Approved,
                removed_by_carrier: false,
            });
            id
        }

        pub fn remove(&mut self, enrollment_id: EnrollmentId) {
            if let Some(enrollment) = self
                .data
                .enrollments
                .iter_mut()
                .find(|e| e.id == enrollment_id)
            {
                enrollment.removed_by_carrier = true;
            }
        }

        pub fn score(
            &mut self,
            enrollment_id: EnrollmentId,
            value: f64,
            base_value: f64,
            out_of_twenty: f64,
        ) -> ComponentId {
            let id = self.next();
            self.data.components.push(AssessmentComponent {
                id,
                enrollment_id,
                title: format!("Assessment {id}"),
                value,
                base_value,
                out_of_twenty,
                examined_on: None,
            });
            id
        }

        /// Enrolls the carrier and records a single full-weight component
        /// worth `grade` out of 20.
        pub fn graded(
            &mut self,
            carrier_id: CarrierId,
            offering_id: OfferingId,
            grade: f64,
        ) -> EnrollmentId {
            let enrollment_id = self.enroll(carrier_id, offering_id);
            self.score(enrollment_id, grade, 20.0, 20.0);
            enrollment_id
        }

        /// Offering of a fresh course with the given credit, grades approved.
        pub fn approved_offering(&mut self, credit: i32, term_id: TermId) -> OfferingId {
            let course = self.course(0, credit);
            self.offering(course, term_id, GradesStatus::Approved)
        }

        pub fn build(self) -> Snapshot {
            Snapshot::new(self.data)
        }
    }

    pub fn date((year, month, day): (i32, u32, u32)) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }
}

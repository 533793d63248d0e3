use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub type CollegeId = i64;
pub type DepartmentId = i64;
pub type FieldId = i64;
pub type SubfieldId = i64;
pub type CarrierId = i64;
pub type CourseSerial = i64;
pub type TermId = i64;
pub type OfferingId = i64;
pub type EnrollmentId = i64;
pub type ComponentId = i64;

/// Stored enumerations: each variant has a fixed database code and a
/// display label, both given by one exhaustive table.
macro_rules! coded_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn code(self) -> i16 {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            pub fn from_code(code: i16) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }
    };
}

coded_enum!(
    /// Degree awarded by a field of study.
    DegreeType {
        Associate = 0 => "associate",
        Bachelor = 1 => "bachelor",
        Master = 2 => "master",
        Doctorate = 3 => "doctorate",
    }
);

coded_enum!(
    /// Role a curriculum course plays in a subfield.
    CourseType {
        Elective = 0 => "elective",
        General = 1 => "general",
        Foundation = 2 => "foundation",
        Core = 3 => "core",
        RequiredSpecialized = 4 => "required specialized",
    }
);

coded_enum!(
    CarrierStatus {
        Studying = 0 => "studying",
        Graduated = 1 => "graduated",
        Withdrawn = 2 => "withdrawn",
    }
);

coded_enum!(
    AdmissionType {
        Day = 0 => "day",
        Evening = 1 => "evening",
        Guest = 2 => "guest",
        Transfer = 3 => "transfer",
    }
);

coded_enum!(
    /// Grade-publication state of a course offering.
    GradesStatus {
        NotSent = 0 => "not sent",
        Sent = 1 => "sent",
        Approved = 2 => "approved",
    }
);

coded_enum!(
    /// Registration approval of an enrollment. Does not affect grading.
    ApprovalState {
        NotApproved = 0 => "not approved",
        Approved = 1 => "approved",
    }
);

coded_enum!(
    GradeState {
        Passed = 1 => "passed",
        Failed = 2 => "failed",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct College {
    pub id: CollegeId,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub title: String,
    pub college_id: CollegeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub title: String,
    pub degree: DegreeType,
    pub head_department_id: DepartmentId,
    #[serde(default)]
    pub other_department_ids: Vec<DepartmentId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subfield {
    pub id: SubfieldId,
    pub title: String,
    pub field_id: FieldId,
}

/// Catalog course. Related courses are kept as serial-number adjacency lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumCourse {
    pub serial_number: CourseSerial,
    pub title: String,
    pub practical_units: i32,
    pub theoretical_units: i32,
    #[serde(default)]
    pub prerequisites: Vec<CourseSerial>,
    #[serde(default)]
    pub corequisites: Vec<CourseSerial>,
}

impl CurriculumCourse {
    pub fn credit(&self) -> i32 {
        self.practical_units + self.theoretical_units
    }
}

/// A course's place in one subfield's curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubfieldCourse {
    pub subfield_id: SubfieldId,
    pub course_serial: CourseSerial,
    pub suggested_term: Option<i32>,
    pub course_type: CourseType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermHalf {
    First,
    Second,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Term {
    /// Terms that start later in the calendar year than they end wrap into
    /// the next year and are the second half.
    pub fn half(&self) -> TermHalf {
        if self.start_date.month() > self.end_date.month() {
            TermHalf::Second
        } else {
            TermHalf::First
        }
    }

    pub fn title(&self) -> String {
        let half = match self.half() {
            TermHalf::First => "first half",
            TermHalf::Second => "second half",
        };
        format!("{} {}", self.start_date.year(), half)
    }

    /// End on or after start, and at most one year boundary crossed.
    pub fn has_valid_interval(&self) -> bool {
        self.end_date >= self.start_date && self.end_date.year() - self.start_date.year() <= 1
    }
}

/// A student's academic career in one subfield.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carrier {
    pub id: CarrierId,
    pub student_name: String,
    pub subfield_id: SubfieldId,
    pub status: CarrierStatus,
    pub admission_type: AdmissionType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseOffering {
    pub id: OfferingId,
    pub course_serial: CourseSerial,
    pub term_id: TermId,
    pub department_id: DepartmentId,
    pub section_number: i32,
    pub capacity: i32,
    pub grades_status: GradesStatus,
}

impl CourseOffering {
    pub fn grades_approved(&self) -> bool {
        self.grades_status == GradesStatus::Approved
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub carrier_id: CarrierId,
    pub offering_id: OfferingId,
    pub approval: ApprovalState,
    #[serde(default)]
    pub removed_by_carrier: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentComponent {
    pub id: ComponentId,
    pub enrollment_id: EnrollmentId,
    pub title: String,
    pub value: f64,
    pub base_value: f64,
    pub out_of_twenty: f64,
    pub examined_on: Option<NaiveDate>,
}

impl AssessmentComponent {
    /// Share of the final 20-point grade this component carries, in percent.
    pub fn percentage(&self) -> f64 {
        self.out_of_twenty * 100.0 / 20.0
    }
}

/// A course a carrier pre-registered for in a term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreRegistration {
    pub carrier_id: CarrierId,
    pub term_id: TermId,
    pub course_serial: CourseSerial,
}

use std::collections::HashMap;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info, warn};

use crate::models::{
    AdmissionType, ApprovalState, AssessmentComponent, Carrier, CarrierStatus, College,
    CourseOffering, CourseSerial, CourseType, CurriculumCourse, DegreeType, Department,
    Enrollment, Field, GradesStatus, PreRegistration, Subfield, SubfieldCourse, Term,
};
use crate::snapshot::SnapshotData;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO academic_records.colleges (id, title) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(1_i64)
    .bind("College of Engineering")
    .execute(&mut *tx)
    .await?;

    for (id, title) in [(10_i64, "Computer Engineering"), (11, "Electrical Engineering")] {
        sqlx::query(
            r#"
            INSERT INTO academic_records.departments (id, title, college_id)
            VALUES ($1, $2, 1)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(title)
        .execute(&mut *tx)
        .await?;
    }

    for (id, title, head_department_id) in [
        (100_i64, "Computer Engineering", 10_i64),
        (110, "Electrical Engineering", 11),
    ] {
        sqlx::query(
            r#"
            INSERT INTO academic_records.fields (id, title, degree, head_department_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(DegreeType::Bachelor.code())
        .bind(head_department_id)
        .execute(&mut *tx)
        .await?;
    }

    for (id, title, field_id) in [
        (1000_i64, "Software", 100_i64),
        (1001, "Hardware", 100),
        (1100, "Power Systems", 110),
    ] {
        sqlx::query(
            r#"
            INSERT INTO academic_records.subfields (id, title, field_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(field_id)
        .execute(&mut *tx)
        .await?;
    }

    let courses = [
        (2101_i64, "Calculus I", 0, 3),
        (2102, "Calculus II", 0, 3),
        (2201, "Programming Fundamentals", 1, 3),
        (2202, "Data Structures", 0, 3),
        (2203, "Programming Lab", 1, 0),
    ];
    for (serial_number, title, practical_units, theoretical_units) in courses {
        sqlx::query(
            r#"
            INSERT INTO academic_records.curriculum_courses
            (serial_number, title, practical_units, theoretical_units)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(serial_number)
        .bind(title)
        .bind(practical_units)
        .bind(theoretical_units)
        .execute(&mut *tx)
        .await?;
    }

    for (course, prerequisite) in [(2102_i64, 2101_i64), (2202, 2201)] {
        sqlx::query(
            r#"
            INSERT INTO academic_records.course_prerequisites (course_serial, prerequisite_serial)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(course)
        .bind(prerequisite)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO academic_records.course_corequisites (course_serial, corequisite_serial)
        VALUES (2203, 2201)
        ON CONFLICT DO NOTHING
        "#,
    )
    .execute(&mut *tx)
    .await?;

    let plan = [
        (2101_i64, Some(1), CourseType::Foundation),
        (2201, Some(1), CourseType::Core),
        (2203, Some(1), CourseType::Core),
        (2102, Some(2), CourseType::Foundation),
        (2202, Some(2), CourseType::RequiredSpecialized),
    ];
    for (course_serial, suggested_term, course_type) in plan {
        sqlx::query(
            r#"
            INSERT INTO academic_records.subfield_courses
            (subfield_id, course_serial, suggested_term, course_type)
            VALUES (1000, $1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(course_serial)
        .bind(suggested_term)
        .bind(course_type.code())
        .execute(&mut *tx)
        .await?;
    }

    let terms = [
        (
            1_i64,
            NaiveDate::from_ymd_opt(2025, 9, 21).context("invalid date")?,
            NaiveDate::from_ymd_opt(2026, 1, 20).context("invalid date")?,
        ),
        (
            2,
            NaiveDate::from_ymd_opt(2026, 2, 1).context("invalid date")?,
            NaiveDate::from_ymd_opt(2026, 6, 15).context("invalid date")?,
        ),
    ];
    for (id, start_date, end_date) in terms {
        sqlx::query(
            r#"
            INSERT INTO academic_records.terms (id, start_date, end_date)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(start_date)
        .bind(end_date)
        .execute(&mut *tx)
        .await?;
    }

    let carriers = [
        (40001_i64, "Avery Lee", 1000_i64),
        (40002, "Jules Moreno", 1000),
        (40003, "Kiara Patel", 1001),
        (40004, "Noor Haddad", 1100),
    ];
    for (id, student_name, subfield_id) in carriers {
        sqlx::query(
            r#"
            INSERT INTO academic_records.carriers
            (id, student_name, subfield_id, status, admission_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET student_name = EXCLUDED.student_name, subfield_id = EXCLUDED.subfield_id
            "#,
        )
        .bind(id)
        .bind(student_name)
        .bind(subfield_id)
        .bind(CarrierStatus::Studying.code())
        .bind(AdmissionType::Day.code())
        .execute(&mut *tx)
        .await?;
    }

    let offerings = [
        (1_i64, 2101_i64, 1_i64, 10_i64, GradesStatus::Approved),
        (2, 2201, 1, 10, GradesStatus::Approved),
        (3, 2102, 2, 10, GradesStatus::Sent),
        (4, 2202, 2, 10, GradesStatus::NotSent),
    ];
    for (id, course_serial, term_id, department_id, grades_status) in offerings {
        sqlx::query(
            r#"
            INSERT INTO academic_records.course_offerings
            (id, course_serial, term_id, department_id, section_number, capacity, grades_status)
            VALUES ($1, $2, $3, $4, 1, 40, $5)
            ON CONFLICT (id) DO UPDATE SET grades_status = EXCLUDED.grades_status
            "#,
        )
        .bind(id)
        .bind(course_serial)
        .bind(term_id)
        .bind(department_id)
        .bind(grades_status.code())
        .execute(&mut *tx)
        .await?;
    }

    // (offering, carrier, removed, components as (title, value, base, out of twenty))
    let enrollments: [(i64, i64, bool, &[(&str, f64, f64, f64)]); 8] = [
        (1, 40001, false, &[("Midterm", 16.0, 20.0, 8.0), ("Final", 36.0, 40.0, 12.0)]),
        (2, 40001, false, &[("Project", 9.0, 10.0, 6.0), ("Final", 14.0, 20.0, 14.0)]),
        (1, 40002, false, &[("Midterm", 11.0, 20.0, 8.0), ("Final", 22.0, 40.0, 12.0)]),
        (2, 40002, true, &[]),
        (1, 40003, false, &[("Midterm", 18.0, 20.0, 8.0), ("Final", 30.0, 40.0, 12.0)]),
        (1, 40004, false, &[("Midterm", 7.0, 20.0, 8.0), ("Final", 20.0, 40.0, 12.0)]),
        (3, 40001, false, &[("Midterm", 15.0, 20.0, 8.0)]),
        (4, 40001, false, &[]),
    ];
    for (index, (offering_id, carrier_id, removed, components)) in enrollments.iter().enumerate() {
        let enrollment_id: i64 = sqlx::query(
            r#"
            INSERT INTO academic_records.enrollments
            (offering_id, carrier_id, approval, removed_by_carrier)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (offering_id, carrier_id) DO UPDATE
            SET removed_by_carrier = EXCLUDED.removed_by_carrier
            RETURNING id
            "#,
        )
        .bind(offering_id)
        .bind(carrier_id)
        .bind(ApprovalState::Approved.code())
        .bind(removed)
        .fetch_one(&mut *tx)
        .await?
        .try_get("id")?;

        for (position, (title, value, base_value, out_of_twenty)) in components.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO academic_records.assessment_components
                (enrollment_id, title, value, base_value, out_of_twenty, source_key)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (source_key) DO NOTHING
                "#,
            )
            .bind(enrollment_id)
            .bind(title)
            .bind(value)
            .bind(base_value)
            .bind(out_of_twenty)
            .bind(format!("seed-{index:03}-{position}"))
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Appends assessment components from a CSV export. Returns how many rows
/// were inserted; rows already imported (same `source_key`) are skipped.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        carrier_id: i64,
        course_serial: CourseSerial,
        term_start: NaiveDate,
        section_number: i32,
        title: String,
        value: f64,
        base_value: f64,
        out_of_twenty: f64,
        examined_on: Option<NaiveDate>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let enrollment: Option<PgRow> = sqlx::query(
            r#"
            SELECT e.id
            FROM academic_records.enrollments e
            JOIN academic_records.course_offerings o ON o.id = e.offering_id
            JOIN academic_records.terms t ON t.id = o.term_id
            WHERE e.carrier_id = $1
              AND o.course_serial = $2
              AND t.start_date = $3
              AND o.section_number = $4
            "#,
        )
        .bind(row.carrier_id)
        .bind(row.course_serial)
        .bind(row.term_start)
        .bind(row.section_number)
        .fetch_optional(pool)
        .await?;

        let Some(enrollment) = enrollment else {
            warn!(
                carrier_id = row.carrier_id,
                course_serial = row.course_serial,
                term_start = %row.term_start,
                "No enrollment for imported score, skipping"
            );
            continue;
        };
        let enrollment_id: i64 = enrollment.try_get("id")?;

        let source_key = row.source_key.unwrap_or_else(|| {
            format!(
                "import-{}-{}-{}-{}-{}",
                row.carrier_id, row.course_serial, row.term_start, row.section_number, row.title
            )
        });

        let result = sqlx::query(
            r#"
            INSERT INTO academic_records.assessment_components
            (enrollment_id, title, value, base_value, out_of_twenty, examined_on, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(enrollment_id)
        .bind(&row.title)
        .bind(row.value)
        .bind(row.base_value)
        .bind(row.out_of_twenty)
        .bind(row.examined_on)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

fn decode<T>(code: i16, column: &str, from_code: fn(i16) -> Option<T>) -> anyhow::Result<T> {
    from_code(code).with_context(|| format!("unknown {column} code {code}"))
}

/// Reads every table inside one repeatable-read transaction so the
/// aggregation sees a consistent snapshot.
#[tracing::instrument(skip(pool))]
pub async fn fetch_snapshot(pool: &PgPool) -> anyhow::Result<SnapshotData> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;

    let mut data = SnapshotData::default();

    for row in sqlx::query("SELECT id, title FROM academic_records.colleges")
        .fetch_all(&mut *tx)
        .await?
    {
        data.colleges.push(College {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
        });
    }

    for row in sqlx::query("SELECT id, title, college_id FROM academic_records.departments")
        .fetch_all(&mut *tx)
        .await?
    {
        data.departments.push(Department {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            college_id: row.try_get("college_id")?,
        });
    }

    let mut other_departments: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in sqlx::query("SELECT field_id, department_id FROM academic_records.field_departments")
        .fetch_all(&mut *tx)
        .await?
    {
        other_departments
            .entry(row.try_get("field_id")?)
            .or_default()
            .push(row.try_get("department_id")?);
    }

    for row in sqlx::query(
        "SELECT id, title, degree, head_department_id FROM academic_records.fields",
    )
    .fetch_all(&mut *tx)
    .await?
    {
        let id: i64 = row.try_get("id")?;
        data.fields.push(Field {
            id,
            title: row.try_get("title")?,
            degree: decode(row.try_get("degree")?, "degree", DegreeType::from_code)?,
            head_department_id: row.try_get("head_department_id")?,
            other_department_ids: other_departments.remove(&id).unwrap_or_default(),
        });
    }

    for row in sqlx::query("SELECT id, title, field_id FROM academic_records.subfields")
        .fetch_all(&mut *tx)
        .await?
    {
        data.subfields.push(Subfield {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            field_id: row.try_get("field_id")?,
        });
    }

    let mut prerequisites: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in sqlx::query(
        "SELECT course_serial, prerequisite_serial FROM academic_records.course_prerequisites \
         ORDER BY course_serial, prerequisite_serial",
    )
    .fetch_all(&mut *tx)
    .await?
    {
        prerequisites
            .entry(row.try_get("course_serial")?)
            .or_default()
            .push(row.try_get("prerequisite_serial")?);
    }

    let mut corequisites: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in sqlx::query(
        "SELECT course_serial, corequisite_serial FROM academic_records.course_corequisites \
         ORDER BY course_serial, corequisite_serial",
    )
    .fetch_all(&mut *tx)
    .await?
    {
        corequisites
            .entry(row.try_get("course_serial")?)
            .or_default()
            .push(row.try_get("corequisite_serial")?);
    }

    for row in sqlx::query(
        "SELECT serial_number, title, practical_units, theoretical_units \
         FROM academic_records.curriculum_courses",
    )
    .fetch_all(&mut *tx)
    .await?
    {
        let serial_number: i64 = row.try_get("serial_number")?;
        data.courses.push(CurriculumCourse {
            serial_number,
            title: row.try_get("title")?,
            practical_units: row.try_get("practical_units")?,
            theoretical_units: row.try_get("theoretical_units")?,
            prerequisites: prerequisites.remove(&serial_number).unwrap_or_default(),
            corequisites: corequisites.remove(&serial_number).unwrap_or_default(),
        });
    }

    for row in sqlx::query(
        "SELECT subfield_id, course_serial, suggested_term, course_type \
         FROM academic_records.subfield_courses",
    )
    .fetch_all(&mut *tx)
    .await?
    {
        data.subfield_courses.push(SubfieldCourse {
            subfield_id: row.try_get("subfield_id")?,
            course_serial: row.try_get("course_serial")?,
            suggested_term: row.try_get("suggested_term")?,
            course_type: decode(
                row.try_get("course_type")?,
                "course_type",
                CourseType::from_code,
            )?,
        });
    }

    for row in sqlx::query("SELECT id, start_date, end_date FROM academic_records.terms")
        .fetch_all(&mut *tx)
        .await?
    {
        data.terms.push(Term {
            id: row.try_get("id")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
        });
    }

    for row in sqlx::query(
        "SELECT id, student_name, subfield_id, status, admission_type FROM academic_records.carriers",
    )
    .fetch_all(&mut *tx)
    .await?
    {
        data.carriers.push(Carrier {
            id: row.try_get("id")?,
            student_name: row.try_get("student_name")?,
            subfield_id: row.try_get("subfield_id")?,
            status: decode(row.try_get("status")?, "status", CarrierStatus::from_code)?,
            admission_type: decode(
                row.try_get("admission_type")?,
                "admission_type",
                AdmissionType::from_code,
            )?,
        });
    }

    for row in sqlx::query(
        "SELECT id, course_serial, term_id, department_id, section_number, capacity, grades_status \
         FROM academic_records.course_offerings",
    )
    .fetch_all(&mut *tx)
    .await?
    {
        data.offerings.push(CourseOffering {
            id: row.try_get("id")?,
            course_serial: row.try_get("course_serial")?,
            term_id: row.try_get("term_id")?,
            department_id: row.try_get("department_id")?,
            section_number: row.try_get("section_number")?,
            capacity: row.try_get("capacity")?,
            grades_status: decode(
                row.try_get("grades_status")?,
                "grades_status",
                GradesStatus::from_code,
            )?,
        });
    }

    for row in sqlx::query(
        "SELECT id, carrier_id, offering_id, approval, removed_by_carrier \
         FROM academic_records.enrollments ORDER BY id",
    )
    .fetch_all(&mut *tx)
    .await?
    {
        data.enrollments.push(Enrollment {
            id: row.try_get("id")?,
            carrier_id: row.try_get("carrier_id")?,
            offering_id: row.try_get("offering_id")?,
            approval: decode(row.try_get("approval")?, "approval", ApprovalState::from_code)?,
            removed_by_carrier: row.try_get("removed_by_carrier")?,
        });
    }

    for row in sqlx::query(
        "SELECT id, enrollment_id, title, value, base_value, out_of_twenty, examined_on \
         FROM academic_records.assessment_components ORDER BY id",
    )
    .fetch_all(&mut *tx)
    .await?
    {
        data.components.push(AssessmentComponent {
            id: row.try_get("id")?,
            enrollment_id: row.try_get("enrollment_id")?,
            title: row.try_get("title")?,
            value: row.try_get("value")?,
            base_value: row.try_get("base_value")?,
            out_of_twenty: row.try_get("out_of_twenty")?,
            examined_on: row.try_get("examined_on")?,
        });
    }

    for row in sqlx::query(
        "SELECT carrier_id, term_id, course_serial FROM academic_records.pre_registrations",
    )
    .fetch_all(&mut *tx)
    .await?
    {
        data.pre_registrations.push(PreRegistration {
            carrier_id: row.try_get("carrier_id")?,
            term_id: row.try_get("term_id")?,
            course_serial: row.try_get("course_serial")?,
        });
    }

    tx.commit().await?;

    info!(
        carriers = data.carriers.len(),
        enrollments = data.enrollments.len(),
        components = data.components.len(),
        "Snapshot loaded from Postgres"
    );
    Ok(data)
}

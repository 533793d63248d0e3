use chrono::Datelike;
use serde::Serialize;

use crate::cohort::career_totals;
use crate::error::RecordResult;
use crate::models::CarrierId;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarrierProfile {
    pub carrier_id: CarrierId,
    pub student_name: String,
    pub subfield: String,
    pub degree_type: &'static str,
    pub admission_type: &'static str,
    pub status: &'static str,
    pub entry_year: Option<i32>,
    pub total_credits_taken: i32,
    pub total_credits_passed: i32,
    pub average: Option<f64>,
}

/// Identity and career-long totals of one carrier.
pub fn carrier_profile(snapshot: &Snapshot, carrier_id: CarrierId) -> RecordResult<CarrierProfile> {
    let carrier = snapshot.carrier(carrier_id)?;
    let subfield = snapshot.subfield(carrier.subfield_id)?;
    let field = snapshot.field(subfield.field_id)?;
    let entry_year = snapshot
        .carrier_terms(carrier_id)?
        .first()
        .map(|term| term.start_date.year());
    let totals = career_totals(snapshot, carrier_id)?;

    Ok(CarrierProfile {
        carrier_id,
        student_name: carrier.student_name.clone(),
        subfield: format!("{}, {}", field.title, subfield.title),
        degree_type: field.degree.label(),
        admission_type: carrier.admission_type.label(),
        status: carrier.status.label(),
        entry_year,
        total_credits_taken: totals.credits_taken,
        total_credits_passed: totals.credits_passed,
        average: totals.average,
    })
}

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_date, parse_ts, StoreError};
use crate::domain::adr::Adr;

const COLUMNS: &str = "id, user_id, medical_institution_id, patient_name,
    inpatient_or_outpatient_number, patient_date_of_birth, patient_age, patient_address,
    patient_weight_kg, patient_height_cm, ward_or_clinic, gender, pregnancy_status,
    known_allergy, date_of_onset_of_reaction, description_of_reaction, rechallenge,
    dechallenge, severity, is_serious, criteria_for_seriousness, action_taken, outcome,
    comments, created_at, updated_at";

pub fn insert_adr(conn: &Connection, adr: &Adr) -> Result<(), StoreError> {
    conn.execute(
        &format!(
            "INSERT INTO adr ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
             ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)"
        ),
        params![
            adr.id,
            adr.user_id,
            adr.medical_institution_id,
            adr.patient_name,
            adr.inpatient_or_outpatient_number,
            adr.patient_date_of_birth.map(|d| d.to_string()),
            adr.patient_age,
            adr.patient_address,
            adr.patient_weight_kg,
            adr.patient_height_cm,
            adr.ward_or_clinic,
            adr.gender.as_str(),
            adr.pregnancy_status.as_str(),
            adr.known_allergy.as_str(),
            adr.date_of_onset_of_reaction.map(|d| d.to_string()),
            adr.description_of_reaction,
            adr.rechallenge.as_str(),
            adr.dechallenge.as_str(),
            adr.severity.as_str(),
            adr.is_serious.as_str(),
            adr.criteria_for_seriousness.as_str(),
            adr.action_taken.as_str(),
            adr.outcome.as_str(),
            adr.comments,
            format_ts(&adr.created_at),
            format_ts(&adr.updated_at),
        ],
    )?;
    Ok(())
}

/// Rewrite every mutable column of an existing report.
pub fn update_adr(conn: &Connection, adr: &Adr) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE adr SET medical_institution_id = ?2, patient_name = ?3,
            inpatient_or_outpatient_number = ?4, patient_date_of_birth = ?5, patient_age = ?6,
            patient_address = ?7, patient_weight_kg = ?8, patient_height_cm = ?9,
            ward_or_clinic = ?10, gender = ?11, pregnancy_status = ?12, known_allergy = ?13,
            date_of_onset_of_reaction = ?14, description_of_reaction = ?15, rechallenge = ?16,
            dechallenge = ?17, severity = ?18, is_serious = ?19, criteria_for_seriousness = ?20,
            action_taken = ?21, outcome = ?22, comments = ?23, updated_at = ?24
         WHERE id = ?1",
        params![
            adr.id,
            adr.medical_institution_id,
            adr.patient_name,
            adr.inpatient_or_outpatient_number,
            adr.patient_date_of_birth.map(|d| d.to_string()),
            adr.patient_age,
            adr.patient_address,
            adr.patient_weight_kg,
            adr.patient_height_cm,
            adr.ward_or_clinic,
            adr.gender.as_str(),
            adr.pregnancy_status.as_str(),
            adr.known_allergy.as_str(),
            adr.date_of_onset_of_reaction.map(|d| d.to_string()),
            adr.description_of_reaction,
            adr.rechallenge.as_str(),
            adr.dechallenge.as_str(),
            adr.severity.as_str(),
            adr.is_serious.as_str(),
            adr.criteria_for_seriousness.as_str(),
            adr.action_taken.as_str(),
            adr.outcome.as_str(),
            adr.comments,
            format_ts(&adr.updated_at),
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("adr", &adr.id));
    }
    Ok(())
}

pub fn get_adr(conn: &Connection, id: &str) -> Result<Adr, StoreError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM adr WHERE id = ?1"),
        [id],
        RawAdr::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("adr", id))?
    .try_into()
}

/// Page of reports, oldest first.
pub fn list_adrs(conn: &Connection, offset: u32, limit: u32) -> Result<Vec<Adr>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM adr ORDER BY created_at ASC, rowid ASC LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt.query_map(params![limit, offset], RawAdr::from_row)?;
    rows.map(|raw| Adr::try_from(raw?)).collect()
}

pub fn count_adrs(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM adr", [], |row| row.get(0))?)
}

/// Delete a report; its assessments and their reviews cascade.
pub fn delete_adr(conn: &Connection, id: &str) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM adr WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(StoreError::not_found("adr", id));
    }
    Ok(())
}

struct RawAdr {
    id: String,
    user_id: String,
    medical_institution_id: Option<String>,
    patient_name: String,
    inpatient_or_outpatient_number: Option<String>,
    patient_date_of_birth: Option<String>,
    patient_age: Option<i64>,
    patient_address: Option<String>,
    patient_weight_kg: Option<i64>,
    patient_height_cm: Option<i64>,
    ward_or_clinic: Option<String>,
    gender: String,
    pregnancy_status: String,
    known_allergy: String,
    date_of_onset_of_reaction: Option<String>,
    description_of_reaction: Option<String>,
    rechallenge: String,
    dechallenge: String,
    severity: String,
    is_serious: String,
    criteria_for_seriousness: String,
    action_taken: String,
    outcome: String,
    comments: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawAdr {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            medical_institution_id: row.get(2)?,
            patient_name: row.get(3)?,
            inpatient_or_outpatient_number: row.get(4)?,
            patient_date_of_birth: row.get(5)?,
            patient_age: row.get(6)?,
            patient_address: row.get(7)?,
            patient_weight_kg: row.get(8)?,
            patient_height_cm: row.get(9)?,
            ward_or_clinic: row.get(10)?,
            gender: row.get(11)?,
            pregnancy_status: row.get(12)?,
            known_allergy: row.get(13)?,
            date_of_onset_of_reaction: row.get(14)?,
            description_of_reaction: row.get(15)?,
            rechallenge: row.get(16)?,
            dechallenge: row.get(17)?,
            severity: row.get(18)?,
            is_serious: row.get(19)?,
            criteria_for_seriousness: row.get(20)?,
            action_taken: row.get(21)?,
            outcome: row.get(22)?,
            comments: row.get(23)?,
            created_at: row.get(24)?,
            updated_at: row.get(25)?,
        })
    }
}

impl TryFrom<RawAdr> for Adr {
    type Error = StoreError;

    fn try_from(raw: RawAdr) -> Result<Self, Self::Error> {
        Ok(Adr {
            id: raw.id,
            user_id: raw.user_id,
            medical_institution_id: raw.medical_institution_id,
            patient_name: raw.patient_name,
            inpatient_or_outpatient_number: raw.inpatient_or_outpatient_number,
            patient_date_of_birth: parse_date(raw.patient_date_of_birth)?,
            patient_age: raw.patient_age,
            patient_address: raw.patient_address,
            patient_weight_kg: raw.patient_weight_kg,
            patient_height_cm: raw.patient_height_cm,
            ward_or_clinic: raw.ward_or_clinic,
            gender: raw.gender.parse()?,
            pregnancy_status: raw.pregnancy_status.parse()?,
            known_allergy: raw.known_allergy.parse()?,
            date_of_onset_of_reaction: parse_date(raw.date_of_onset_of_reaction)?,
            description_of_reaction: raw.description_of_reaction,
            rechallenge: raw.rechallenge.parse()?,
            dechallenge: raw.dechallenge.parse()?,
            severity: raw.severity.parse()?,
            is_serious: raw.is_serious.parse()?,
            criteria_for_seriousness: raw.criteria_for_seriousness.parse()?,
            action_taken: raw.action_taken.parse()?,
            outcome: raw.outcome.parse()?,
            comments: raw.comments,
            created_at: parse_ts(&raw.created_at)?,
            updated_at: parse_ts(&raw.updated_at)?,
        })
    }
}

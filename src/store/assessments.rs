use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_ts, StoreError};
use crate::domain::assessment::CausalityAssessment;

const COLUMNS: &str = "id, adr_id, ml_model_id, causality_assessment_level_value,
    prediction_reason, created_at, updated_at";

pub fn insert_assessment(
    conn: &Connection,
    assessment: &CausalityAssessment,
) -> Result<(), StoreError> {
    conn.execute(
        &format!("INSERT INTO causality_assessment_level ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        params![
            assessment.id,
            assessment.adr_id,
            assessment.ml_model_id,
            assessment.causality_assessment_level_value.as_str(),
            assessment.prediction_reason,
            format_ts(&assessment.created_at),
            format_ts(&assessment.updated_at),
        ],
    )?;
    Ok(())
}

/// Replace the verdict of an existing assessment, keeping its id and reviews.
pub fn update_assessment(
    conn: &Connection,
    assessment: &CausalityAssessment,
) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE causality_assessment_level
         SET ml_model_id = ?2, causality_assessment_level_value = ?3,
             prediction_reason = ?4, updated_at = ?5
         WHERE id = ?1",
        params![
            assessment.id,
            assessment.ml_model_id,
            assessment.causality_assessment_level_value.as_str(),
            assessment.prediction_reason,
            format_ts(&assessment.updated_at),
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("causality assessment", &assessment.id));
    }
    Ok(())
}

pub fn get_assessment(conn: &Connection, id: &str) -> Result<CausalityAssessment, StoreError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM causality_assessment_level WHERE id = ?1"),
        [id],
        RawAssessment::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("causality assessment", id))?
    .try_into()
}

/// Every assessment of one report, newest first.
pub fn list_for_adr(conn: &Connection, adr_id: &str) -> Result<Vec<CausalityAssessment>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM causality_assessment_level
         WHERE adr_id = ?1 ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map([adr_id], RawAssessment::from_row)?;
    rows.map(|raw| CausalityAssessment::try_from(raw?)).collect()
}

pub fn latest_for_adr(
    conn: &Connection,
    adr_id: &str,
) -> Result<Option<CausalityAssessment>, StoreError> {
    conn.query_row(
        &format!(
            "SELECT {COLUMNS} FROM causality_assessment_level
             WHERE adr_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ),
        [adr_id],
        RawAssessment::from_row,
    )
    .optional()?
    .map(CausalityAssessment::try_from)
    .transpose()
}

struct RawAssessment {
    id: String,
    adr_id: String,
    ml_model_id: String,
    level: String,
    prediction_reason: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawAssessment {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            adr_id: row.get(1)?,
            ml_model_id: row.get(2)?,
            level: row.get(3)?,
            prediction_reason: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl TryFrom<RawAssessment> for CausalityAssessment {
    type Error = StoreError;

    fn try_from(raw: RawAssessment) -> Result<Self, Self::Error> {
        Ok(CausalityAssessment {
            id: raw.id,
            adr_id: raw.adr_id,
            ml_model_id: raw.ml_model_id,
            causality_assessment_level_value: raw.level.parse()?,
            prediction_reason: raw.prediction_reason,
            created_at: parse_ts(&raw.created_at)?,
            updated_at: parse_ts(&raw.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::categories::CausalityLevel;
    use crate::store::{adrs, test_support::store_with_user};

    #[test]
    fn latest_is_the_most_recent_insert() {
        let (store, user) = store_with_user("reporter");
        let adr = adrs::fixtures::adr(&user.id);
        let first = CausalityAssessment::new(&adr.id, "m@1", CausalityLevel::Possible);
        let second = CausalityAssessment::new(&adr.id, "m@1", CausalityLevel::Likely);
        store
            .write(|tx| {
                adrs::insert_adr(tx, &adr)?;
                insert_assessment(tx, &first)?;
                insert_assessment(tx, &second)
            })
            .unwrap();

        let latest = store
            .read(|conn| latest_for_adr(conn, &adr.id))
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, second.id);

        let all = store.read(|conn| list_for_adr(conn, &adr.id)).unwrap();
        let ids: Vec<_> = all.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[test]
    fn overwrite_keeps_identity() {
        let (store, user) = store_with_user("reporter");
        let adr = adrs::fixtures::adr(&user.id);
        let mut assessment = CausalityAssessment::new(&adr.id, "m@1", CausalityLevel::Possible);
        store
            .write(|tx| {
                adrs::insert_adr(tx, &adr)?;
                insert_assessment(tx, &assessment)
            })
            .unwrap();

        assessment.causality_assessment_level_value = CausalityLevel::Certain;
        store.write(|tx| update_assessment(tx, &assessment)).unwrap();
        let loaded = store
            .read(|conn| get_assessment(conn, &assessment.id))
            .unwrap();
        assert_eq!(loaded.causality_assessment_level_value, CausalityLevel::Certain);
        assert_eq!(store.read(|conn| list_for_adr(conn, &adr.id)).unwrap().len(), 1);
    }

    #[test]
    fn assessments_require_an_existing_report() {
        let (store, _) = store_with_user("reporter");
        let orphan = CausalityAssessment::new("missing", "m@1", CausalityLevel::Unlikely);
        assert!(store.write(|tx| insert_assessment(tx, &orphan)).is_err());
    }

    #[test]
    fn deleting_a_report_cascades() {
        let (store, user) = store_with_user("reporter");
        let adr = adrs::fixtures::adr(&user.id);
        let assessment = CausalityAssessment::new(&adr.id, "m@1", CausalityLevel::Likely);
        store
            .write(|tx| {
                adrs::insert_adr(tx, &adr)?;
                insert_assessment(tx, &assessment)
            })
            .unwrap();
        store.write(|tx| adrs::delete_adr(tx, &adr.id)).unwrap();
        assert!(store
            .read(|conn| get_assessment(conn, &assessment.id))
            .is_err());
    }
}

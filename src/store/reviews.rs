use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_ts, StoreError};
use crate::domain::{assessment::Review, user::UserSummary};

const COLUMNS: &str = "r.id, r.causality_assessment_level_id, r.user_id, r.approved,
    r.proposed_causality_level, r.reason, r.created_at, r.updated_at";

pub fn insert_review(conn: &Connection, review: &Review) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO review (id, causality_assessment_level_id, user_id, approved,
            proposed_causality_level, reason, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            review.id,
            review.causality_assessment_level_id,
            review.user_id,
            review.approved,
            review.proposed_causality_level.map(|level| level.as_str()),
            review.reason,
            format_ts(&review.created_at),
            format_ts(&review.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_review(conn: &Connection, review: &Review) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE review SET approved = ?2, proposed_causality_level = ?3, reason = ?4,
            updated_at = ?5
         WHERE id = ?1",
        params![
            review.id,
            review.approved,
            review.proposed_causality_level.map(|level| level.as_str()),
            review.reason,
            format_ts(&review.updated_at),
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("review", &review.id));
    }
    Ok(())
}

pub fn get_review(conn: &Connection, id: &str) -> Result<Review, StoreError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM review r WHERE r.id = ?1"),
        [id],
        RawReview::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("review", id))?
    .try_into()
}

/// Reviews of one assessment with their authors, oldest first.
pub fn list_for_assessment(
    conn: &Connection,
    assessment_id: &str,
) -> Result<Vec<(Review, UserSummary)>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS}, u.username, u.first_name, u.last_name
         FROM review r JOIN user u ON u.id = r.user_id
         WHERE r.causality_assessment_level_id = ?1
         ORDER BY r.created_at ASC, r.rowid ASC"
    ))?;
    let rows = stmt.query_map([assessment_id], |row| {
        let raw = RawReview::from_row(row)?;
        let author = UserSummary {
            id: raw.user_id.clone(),
            username: row.get(8)?,
            first_name: row.get(9)?,
            last_name: row.get(10)?,
        };
        Ok((raw, author))
    })?;
    rows.map(|row| {
        let (raw, author) = row?;
        Ok((Review::try_from(raw)?, author))
    })
    .collect()
}

pub fn delete_review(conn: &Connection, id: &str) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM review WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(StoreError::not_found("review", id));
    }
    Ok(())
}

struct RawReview {
    id: String,
    assessment_id: String,
    user_id: String,
    approved: bool,
    proposed: Option<String>,
    reason: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawReview {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            assessment_id: row.get(1)?,
            user_id: row.get(2)?,
            approved: row.get(3)?,
            proposed: row.get(4)?,
            reason: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl TryFrom<RawReview> for Review {
    type Error = StoreError;

    fn try_from(raw: RawReview) -> Result<Self, Self::Error> {
        Ok(Review {
            id: raw.id,
            causality_assessment_level_id: raw.assessment_id,
            user_id: raw.user_id,
            approved: raw.approved,
            proposed_causality_level: raw.proposed.map(|p| p.parse()).transpose()?,
            reason: raw.reason,
            created_at: parse_ts(&raw.created_at)?,
            updated_at: parse_ts(&raw.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        assessment::{CausalityAssessment, ReviewVerdict},
        categories::CausalityLevel,
    };
    use crate::store::{adrs, assessments, test_support::store_with_user};

    #[test]
    fn reviews_list_with_their_authors() {
        let (store, user) = store_with_user("reviewer");
        let adr = adrs::fixtures::adr(&user.id);
        let assessment = CausalityAssessment::new(&adr.id, "m@1", CausalityLevel::Possible);
        let mut review = Review::new(
            &assessment.id,
            &user.id,
            ReviewVerdict {
                approved: false,
                proposed_causality_level: Some(CausalityLevel::Likely),
                reason: Some("positive dechallenge".into()),
            },
        );
        store
            .write(|tx| {
                adrs::insert_adr(tx, &adr)?;
                assessments::insert_assessment(tx, &assessment)?;
                insert_review(tx, &review)
            })
            .unwrap();

        let listed = store
            .read(|conn| list_for_assessment(conn, &assessment.id))
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0.proposed_causality_level, Some(CausalityLevel::Likely));
        assert_eq!(listed[0].1.username, "reviewer");

        review.apply(ReviewVerdict {
            approved: true,
            proposed_causality_level: None,
            reason: None,
        });
        store.write(|tx| update_review(tx, &review)).unwrap();
        let loaded = store.read(|conn| get_review(conn, &review.id)).unwrap();
        assert!(loaded.approved);
        assert_eq!(loaded.proposed_causality_level, None);

        store.write(|tx| delete_review(tx, &review.id)).unwrap();
        assert!(store
            .read(|conn| list_for_assessment(conn, &assessment.id))
            .unwrap()
            .is_empty());
    }
}

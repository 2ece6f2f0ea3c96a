//! Categorical distribution of reports over a date range.

use chrono::NaiveDate;
use indexmap::IndexMap;
use rusqlite::{params, Connection};
use serde::Serialize;

use super::StoreError;
use crate::domain::categories::{field_literals, CATEGORICAL_FIELDS};

/// Key of the extra entry counting each report's newest assessment.
pub const ASSESSMENT_FIELD: &str = "causality_assessment_level";

/// Counts aligned with `series`: `data[i]` reports holding `series[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCounts {
    pub series: Vec<&'static str>,
    pub data: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total: i64,
    #[serde(flatten)]
    pub fields: IndexMap<&'static str, FieldCounts>,
}

/// Count reports created on days `start..=end`, per categorical literal.
pub fn summarize(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<MonitoringReport, StoreError> {
    let range = [start.to_string(), end.to_string()];
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM adr WHERE substr(created_at, 1, 10) BETWEEN ?1 AND ?2",
        params![range[0], range[1]],
        |row| row.get(0),
    )?;

    let mut fields = IndexMap::with_capacity(CATEGORICAL_FIELDS.len() + 1);
    for field in CATEGORICAL_FIELDS {
        // Column names come from the fixed field list, never from input.
        let sql = format!(
            "SELECT {field}, COUNT(*) FROM adr
             WHERE substr(created_at, 1, 10) BETWEEN ?1 AND ?2
             GROUP BY {field}"
        );
        fields.insert(field, tally(conn, field, &sql, &range)?);
    }

    let newest = "SELECT c.causality_assessment_level_value, COUNT(*)
        FROM causality_assessment_level c
        JOIN adr a ON a.id = c.adr_id
        WHERE substr(a.created_at, 1, 10) BETWEEN ?1 AND ?2
          AND c.rowid = (
            SELECT c2.rowid FROM causality_assessment_level c2
            WHERE c2.adr_id = c.adr_id
            ORDER BY c2.created_at DESC, c2.rowid DESC
            LIMIT 1
          )
        GROUP BY c.causality_assessment_level_value";
    fields.insert(ASSESSMENT_FIELD, tally(conn, ASSESSMENT_FIELD, newest, &range)?);

    Ok(MonitoringReport {
        start,
        end,
        total,
        fields,
    })
}

fn tally(
    conn: &Connection,
    field: &str,
    sql: &str,
    range: &[String; 2],
) -> Result<FieldCounts, StoreError> {
    let series = field_literals(field).ok_or_else(|| {
        StoreError::Constraint(format!("{field} is not a categorical field"))
    })?;
    let mut data = vec![0_i64; series.len()];

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![range[0], range[1]], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (literal, count) = row?;
        match series.iter().position(|known| *known == literal) {
            Some(idx) => data[idx] = count,
            None => {
                return Err(StoreError::Constraint(format!(
                    "stored {field} value {literal:?} is not a known literal"
                )))
            }
        }
    }
    Ok(FieldCounts { series, data })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::{
        assessment::CausalityAssessment,
        categories::{CausalityLevel, Rechallenge},
    };
    use crate::store::{adrs, assessments, test_support::store_with_user};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn counts_cover_the_inclusive_range_only() {
        let (store, user) = store_with_user("analyst");
        for (d, rechallenge) in [(1, Rechallenge::Yes), (15, Rechallenge::No), (31, Rechallenge::Yes)] {
            let mut adr = adrs::fixtures::adr(&user.id);
            adr.rechallenge = rechallenge;
            adr.created_at = Utc.with_ymd_and_hms(2024, 3, d, 23, 59, 59).unwrap();
            store.write(|tx| adrs::insert_adr(tx, &adr)).unwrap();
        }

        let report = store.read(|conn| summarize(conn, day(1), day(15))).unwrap();
        assert_eq!(report.total, 2);
        let rechallenge = &report.fields["rechallenge"];
        assert_eq!(rechallenge.series, vec!["yes", "no", "unknown", "na"]);
        assert_eq!(rechallenge.data, vec![1, 1, 0, 0]);
        for counts in report.fields.values().take(CATEGORICAL_FIELDS.len()) {
            assert_eq!(counts.data.iter().sum::<i64>(), report.total);
        }
    }

    #[test]
    fn only_the_newest_assessment_is_counted() {
        let (store, user) = store_with_user("analyst");
        let adr = adrs::fixtures::adr(&user.id);
        let old = CausalityAssessment::new(&adr.id, "m@1", CausalityLevel::Possible);
        let new = CausalityAssessment::new(&adr.id, "m@1", CausalityLevel::Certain);
        store
            .write(|tx| {
                adrs::insert_adr(tx, &adr)?;
                assessments::insert_assessment(tx, &old)?;
                assessments::insert_assessment(tx, &new)
            })
            .unwrap();

        let today = adr.created_at.date_naive();
        let report = store.read(|conn| summarize(conn, today, today)).unwrap();
        let levels = &report.fields[ASSESSMENT_FIELD];
        let certain = levels.series.iter().position(|l| *l == "certain").unwrap();
        assert_eq!(levels.data[certain], 1);
        assert_eq!(levels.data.iter().sum::<i64>(), 1);
    }

    #[test]
    fn empty_range_has_zeroes_for_every_literal() {
        let (store, _) = store_with_user("analyst");
        let report = store.read(|conn| summarize(conn, day(1), day(2))).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.fields.len(), CATEGORICAL_FIELDS.len() + 1);
        assert!(report.fields["severity"].data.iter().all(|c| *c == 0));
    }
}

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_ts, StoreError};
use crate::domain::institution::{MedicalInstitution, Telephone};

const COLUMNS: &str = "id, name, mfl_code, dhis_code, county, sub_county, created_at, updated_at";

pub fn insert_institution(
    conn: &Connection,
    institution: &MedicalInstitution,
) -> Result<(), StoreError> {
    conn.execute(
        &format!("INSERT INTO medical_institution ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
            institution.id,
            institution.name,
            institution.mfl_code,
            institution.dhis_code,
            institution.county,
            institution.sub_county,
            format_ts(&institution.created_at),
            format_ts(&institution.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_institution(
    conn: &Connection,
    institution: &MedicalInstitution,
) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE medical_institution SET name = ?2, mfl_code = ?3, dhis_code = ?4,
            county = ?5, sub_county = ?6, updated_at = ?7
         WHERE id = ?1",
        params![
            institution.id,
            institution.name,
            institution.mfl_code,
            institution.dhis_code,
            institution.county,
            institution.sub_county,
            format_ts(&institution.updated_at),
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("medical institution", &institution.id));
    }
    Ok(())
}

pub fn get_institution(conn: &Connection, id: &str) -> Result<MedicalInstitution, StoreError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM medical_institution WHERE id = ?1"),
        [id],
        RawInstitution::from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("medical institution", id))?
    .try_into()
}

pub fn institution_exists(conn: &Connection, id: &str) -> Result<bool, StoreError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM medical_institution WHERE id = ?1",
            [id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

pub fn list_institutions(
    conn: &Connection,
    offset: u32,
    limit: u32,
) -> Result<Vec<MedicalInstitution>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM medical_institution ORDER BY name ASC, id ASC LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt.query_map(params![limit, offset], RawInstitution::from_row)?;
    rows.map(|raw| MedicalInstitution::try_from(raw?)).collect()
}

/// Delete an institution; its telephones cascade and reports keep a null reference.
pub fn delete_institution(conn: &Connection, id: &str) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM medical_institution WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(StoreError::not_found("medical institution", id));
    }
    Ok(())
}

pub fn insert_telephone(conn: &Connection, telephone: &Telephone) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO medical_institution_telephone
            (id, medical_institution_id, telephone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            telephone.id,
            telephone.medical_institution_id,
            telephone.telephone,
            format_ts(&telephone.created_at),
            format_ts(&telephone.updated_at),
        ],
    )?;
    Ok(())
}

pub fn list_telephones(
    conn: &Connection,
    institution_id: &str,
) -> Result<Vec<Telephone>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, medical_institution_id, telephone, created_at, updated_at
         FROM medical_institution_telephone
         WHERE medical_institution_id = ?1 ORDER BY created_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map([institution_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;
    rows.map(|row| {
        let (id, medical_institution_id, telephone, created_at, updated_at) = row?;
        Ok(Telephone {
            id,
            medical_institution_id,
            telephone,
            created_at: parse_ts(&created_at)?,
            updated_at: parse_ts(&updated_at)?,
        })
    })
    .collect()
}

/// Remove one number from one institution.
pub fn delete_telephone(
    conn: &Connection,
    institution_id: &str,
    telephone_id: &str,
) -> Result<(), StoreError> {
    let changed = conn.execute(
        "DELETE FROM medical_institution_telephone
         WHERE id = ?1 AND medical_institution_id = ?2",
        [telephone_id, institution_id],
    )?;
    if changed == 0 {
        return Err(StoreError::not_found("telephone", telephone_id));
    }
    Ok(())
}

struct RawInstitution {
    id: String,
    name: String,
    mfl_code: Option<String>,
    dhis_code: Option<String>,
    county: String,
    sub_county: String,
    created_at: String,
    updated_at: String,
}

impl RawInstitution {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            mfl_code: row.get(2)?,
            dhis_code: row.get(3)?,
            county: row.get(4)?,
            sub_county: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl TryFrom<RawInstitution> for MedicalInstitution {
    type Error = StoreError;

    fn try_from(raw: RawInstitution) -> Result<Self, Self::Error> {
        Ok(MedicalInstitution {
            id: raw.id,
            name: raw.name,
            mfl_code: raw.mfl_code,
            dhis_code: raw.dhis_code,
            county: raw.county,
            sub_county: raw.sub_county,
            created_at: parse_ts(&raw.created_at)?,
            updated_at: parse_ts(&raw.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::institution::InstitutionInput;
    use crate::store::{adrs, test_support::store_with_user};

    fn institution(name: &str) -> MedicalInstitution {
        MedicalInstitution::new(InstitutionInput {
            name: name.to_string(),
            mfl_code: Some("13023".into()),
            dhis_code: None,
            county: "Nairobi".into(),
            sub_county: "Westlands".into(),
        })
    }

    #[test]
    fn telephones_belong_to_their_institution() {
        let (store, _) = store_with_user("admin");
        let clinic = institution("Riverside Clinic");
        let phone = Telephone::new(&clinic.id, " +254 700 000 001 ");
        store
            .write(|tx| {
                insert_institution(tx, &clinic)?;
                insert_telephone(tx, &phone)
            })
            .unwrap();

        let phones = store.read(|conn| list_telephones(conn, &clinic.id)).unwrap();
        assert_eq!(phones.len(), 1);
        assert_eq!(phones[0].telephone, "+254 700 000 001");

        assert!(store
            .write(|tx| delete_telephone(tx, "other-institution", &phone.id))
            .is_err());
        store
            .write(|tx| delete_telephone(tx, &clinic.id, &phone.id))
            .unwrap();
    }

    #[test]
    fn deleting_an_institution_detaches_reports() {
        let (store, user) = store_with_user("admin");
        let clinic = institution("Hillside Hospital");
        let mut adr = adrs::fixtures::adr(&user.id);
        adr.medical_institution_id = Some(clinic.id.clone());
        let phone = Telephone::new(&clinic.id, "020-2712345");
        store
            .write(|tx| {
                insert_institution(tx, &clinic)?;
                insert_telephone(tx, &phone)?;
                adrs::insert_adr(tx, &adr)
            })
            .unwrap();

        store.write(|tx| delete_institution(tx, &clinic.id)).unwrap();

        let adr = store.read(|conn| adrs::get_adr(conn, &adr.id)).unwrap();
        assert_eq!(adr.medical_institution_id, None);
        assert!(store
            .read(|conn| list_telephones(conn, &clinic.id))
            .unwrap()
            .is_empty());
        assert!(!store
            .read(|conn| institution_exists(conn, &clinic.id))
            .unwrap());
    }

    #[test]
    fn list_is_sorted_by_name() {
        let (store, _) = store_with_user("admin");
        for name in ["Zeta", "Alpha", "Mid"] {
            let clinic = institution(name);
            store.write(|tx| insert_institution(tx, &clinic)).unwrap();
        }
        let names: Vec<String> = store
            .read(|conn| list_institutions(conn, 0, 10))
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
    }
}

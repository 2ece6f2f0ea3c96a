//! Medical institutions and their contact numbers.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicalInstitution {
    pub id: String,
    pub name: String,
    pub mfl_code: Option<String>,
    pub dhis_code: Option<String>,
    pub county: String,
    pub sub_county: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstitutionInput {
    pub name: String,
    #[serde(default)]
    pub mfl_code: Option<String>,
    #[serde(default)]
    pub dhis_code: Option<String>,
    pub county: String,
    pub sub_county: String,
}

impl MedicalInstitution {
    pub fn new(input: InstitutionInput) -> Self {
        let now = super::now();
        let mut institution = Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            mfl_code: None,
            dhis_code: None,
            county: String::new(),
            sub_county: String::new(),
            created_at: now,
            updated_at: now,
        };
        institution.apply(input);
        institution.updated_at = now;
        institution
    }

    pub fn apply(&mut self, input: InstitutionInput) {
        let InstitutionInput {
            name,
            mfl_code,
            dhis_code,
            county,
            sub_county,
        } = input;
        self.name = name;
        self.mfl_code = mfl_code;
        self.dhis_code = dhis_code;
        self.county = county;
        self.sub_county = sub_county;
        self.updated_at = super::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telephone {
    pub id: String,
    pub medical_institution_id: String,
    pub telephone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Telephone {
    pub fn new(institution_id: &str, telephone: &str) -> Self {
        let now = super::now();
        Self {
            id: Uuid::new_v4().to_string(),
            medical_institution_id: institution_id.to_string(),
            telephone: telephone.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelephoneInput {
    pub telephone: String,
}

/// Accept dialable numbers: optional `+`, digits, spaces and dashes.
pub fn is_valid_telephone(raw: &str) -> bool {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").expect("valid regex"));
    PATTERN.is_match(raw.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telephone_validation() {
        assert!(is_valid_telephone("+254 712 345 678"));
        assert!(is_valid_telephone("020-2712345"));
        assert!(!is_valid_telephone("call me"));
        assert!(!is_valid_telephone("12"));
    }
}

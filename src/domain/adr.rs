//! Adverse drug reaction report records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::categories::{
    ActionTaken, ClinicalCategories, CriteriaForSeriousness, Dechallenge, Gender, IsSerious,
    KnownAllergy, Outcome, PregnancyStatus, Rechallenge, Severity,
};

/// A persisted ADR report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adr {
    pub id: String,
    pub user_id: String,
    pub medical_institution_id: Option<String>,
    pub patient_name: String,
    pub inpatient_or_outpatient_number: Option<String>,
    pub patient_date_of_birth: Option<NaiveDate>,
    pub patient_age: Option<i64>,
    pub patient_address: Option<String>,
    pub patient_weight_kg: Option<i64>,
    pub patient_height_cm: Option<i64>,
    pub ward_or_clinic: Option<String>,
    pub gender: Gender,
    pub pregnancy_status: PregnancyStatus,
    pub known_allergy: KnownAllergy,
    pub date_of_onset_of_reaction: Option<NaiveDate>,
    pub description_of_reaction: Option<String>,
    pub rechallenge: Rechallenge,
    pub dechallenge: Dechallenge,
    pub severity: Severity,
    pub is_serious: IsSerious,
    pub criteria_for_seriousness: CriteriaForSeriousness,
    pub action_taken: ActionTaken,
    pub outcome: Outcome,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied report body for create and full update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdrInput {
    #[serde(default)]
    pub medical_institution_id: Option<String>,
    pub patient_name: String,
    #[serde(default)]
    pub inpatient_or_outpatient_number: Option<String>,
    #[serde(default)]
    pub patient_date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub patient_age: Option<i64>,
    #[serde(default)]
    pub patient_address: Option<String>,
    #[serde(default)]
    pub patient_weight_kg: Option<i64>,
    #[serde(default)]
    pub patient_height_cm: Option<i64>,
    #[serde(default)]
    pub ward_or_clinic: Option<String>,
    pub gender: Gender,
    pub pregnancy_status: PregnancyStatus,
    pub known_allergy: KnownAllergy,
    #[serde(default)]
    pub date_of_onset_of_reaction: Option<NaiveDate>,
    #[serde(default)]
    pub description_of_reaction: Option<String>,
    pub rechallenge: Rechallenge,
    pub dechallenge: Dechallenge,
    pub severity: Severity,
    pub is_serious: IsSerious,
    pub criteria_for_seriousness: CriteriaForSeriousness,
    pub action_taken: ActionTaken,
    pub outcome: Outcome,
    #[serde(default)]
    pub comments: Option<String>,
}

impl AdrInput {
    pub fn categories(&self) -> ClinicalCategories {
        ClinicalCategories {
            gender: self.gender,
            pregnancy_status: self.pregnancy_status,
            known_allergy: self.known_allergy,
            rechallenge: self.rechallenge,
            dechallenge: self.dechallenge,
            severity: self.severity,
            is_serious: self.is_serious,
            criteria_for_seriousness: self.criteria_for_seriousness,
            action_taken: self.action_taken,
            outcome: self.outcome,
        }
    }
}

impl Adr {
    /// Build a new report owned by `user_id`, stamped now.
    pub fn new(user_id: &str, input: AdrInput) -> Self {
        let now = super::now();
        let mut adr = Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            medical_institution_id: None,
            patient_name: String::new(),
            inpatient_or_outpatient_number: None,
            patient_date_of_birth: None,
            patient_age: None,
            patient_address: None,
            patient_weight_kg: None,
            patient_height_cm: None,
            ward_or_clinic: None,
            gender: input.gender,
            pregnancy_status: input.pregnancy_status,
            known_allergy: input.known_allergy,
            date_of_onset_of_reaction: None,
            description_of_reaction: None,
            rechallenge: input.rechallenge,
            dechallenge: input.dechallenge,
            severity: input.severity,
            is_serious: input.is_serious,
            criteria_for_seriousness: input.criteria_for_seriousness,
            action_taken: input.action_taken,
            outcome: input.outcome,
            comments: None,
            created_at: now,
            updated_at: now,
        };
        adr.apply(input);
        adr.updated_at = now;
        adr
    }

    /// Overwrite every client-editable field from `input`.
    ///
    /// The destructuring is exhaustive: adding a field to [`AdrInput`]
    /// fails to compile until it is mapped here.
    pub fn apply(&mut self, input: AdrInput) {
        let AdrInput {
            medical_institution_id,
            patient_name,
            inpatient_or_outpatient_number,
            patient_date_of_birth,
            patient_age,
            patient_address,
            patient_weight_kg,
            patient_height_cm,
            ward_or_clinic,
            gender,
            pregnancy_status,
            known_allergy,
            date_of_onset_of_reaction,
            description_of_reaction,
            rechallenge,
            dechallenge,
            severity,
            is_serious,
            criteria_for_seriousness,
            action_taken,
            outcome,
            comments,
        } = input;

        self.medical_institution_id = medical_institution_id;
        self.patient_name = patient_name;
        self.inpatient_or_outpatient_number = inpatient_or_outpatient_number;
        self.patient_date_of_birth = patient_date_of_birth;
        self.patient_age = patient_age;
        self.patient_address = patient_address;
        self.patient_weight_kg = patient_weight_kg;
        self.patient_height_cm = patient_height_cm;
        self.ward_or_clinic = ward_or_clinic;
        self.gender = gender;
        self.pregnancy_status = pregnancy_status;
        self.known_allergy = known_allergy;
        self.date_of_onset_of_reaction = date_of_onset_of_reaction;
        self.description_of_reaction = description_of_reaction;
        self.rechallenge = rechallenge;
        self.dechallenge = dechallenge;
        self.severity = severity;
        self.is_serious = is_serious;
        self.criteria_for_seriousness = criteria_for_seriousness;
        self.action_taken = action_taken;
        self.outcome = outcome;
        self.comments = comments;
        self.updated_at = super::now();
    }

    pub fn categories(&self) -> ClinicalCategories {
        ClinicalCategories {
            gender: self.gender,
            pregnancy_status: self.pregnancy_status,
            known_allergy: self.known_allergy,
            rechallenge: self.rechallenge,
            dechallenge: self.dechallenge,
            severity: self.severity,
            is_serious: self.is_serious,
            criteria_for_seriousness: self.criteria_for_seriousness,
            action_taken: self.action_taken,
            outcome: self.outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AdrInput {
        serde_json::from_value(serde_json::json!({
            "patient_name": "Jane Doe",
            "patient_age": 34,
            "gender": "female",
            "pregnancy_status": "not pregnant",
            "known_allergy": "no",
            "rechallenge": "yes",
            "dechallenge": "no",
            "severity": "mild",
            "is_serious": "no",
            "criteria_for_seriousness": "hospitalisation",
            "action_taken": "drug withdrawn",
            "outcome": "recovering"
        }))
        .unwrap()
    }

    #[test]
    fn new_report_copies_every_field() {
        let adr = Adr::new("user-1", input());
        assert_eq!(adr.user_id, "user-1");
        assert_eq!(adr.patient_name, "Jane Doe");
        assert_eq!(adr.patient_age, Some(34));
        assert_eq!(adr.rechallenge, Rechallenge::Yes);
        assert_eq!(adr.medical_institution_id, None);
        assert!(Uuid::parse_str(&adr.id).is_ok());
    }

    #[test]
    fn apply_replaces_fields_and_keeps_identity() {
        let mut adr = Adr::new("user-1", input());
        let id = adr.id.clone();
        let created = adr.created_at;
        let mut update = input();
        update.dechallenge = Dechallenge::Yes;
        update.comments = Some("re-evaluated".into());
        adr.apply(update);
        assert_eq!(adr.id, id);
        assert_eq!(adr.created_at, created);
        assert_eq!(adr.dechallenge, Dechallenge::Yes);
        assert_eq!(adr.comments.as_deref(), Some("re-evaluated"));
    }

    #[test]
    fn unknown_literal_is_rejected_at_the_boundary() {
        let mut body = serde_json::to_value(input().categories()).unwrap();
        body["patient_name"] = "x".into();
        body["severity"] = "catastrophic".into();
        assert!(serde_json::from_value::<AdrInput>(body).is_err());
    }
}

//! Fixed categorical vocabularies recorded on an ADR report form.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A literal that does not belong to the named vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} value: {value:?}")]
pub struct UnknownLiteral {
    pub kind: &'static str,
    pub value: String,
}

/// Generate a closed string enum with its wire literals.
macro_rules! categorical_enum {
    ($(#[$meta:meta])* $name:ident : $kind:literal { $($variant:ident => $lit:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $lit)] $variant),+
        }

        impl $name {
            /// Every literal, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $lit),+
                }
            }

            pub fn literals() -> impl Iterator<Item = &'static str> {
                Self::ALL.iter().map(|value| value.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLiteral;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($lit => Ok(Self::$variant),)+
                    _ => Err(UnknownLiteral {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

categorical_enum!(Gender: "gender" {
    Male => "male",
    Female => "female",
});

categorical_enum!(PregnancyStatus: "pregnancy_status" {
    NotApplicable => "not applicable",
    NotPregnant => "not pregnant",
    FirstTrimester => "1st trimester",
    SecondTrimester => "2nd trimester",
    ThirdTrimester => "3rd trimester",
});

categorical_enum!(KnownAllergy: "known_allergy" {
    Yes => "yes",
    No => "no",
});

categorical_enum!(
    /// Outcome of re-exposing the patient to the suspected drug.
    Rechallenge: "rechallenge" {
        Yes => "yes",
        No => "no",
        Unknown => "unknown",
        Na => "na",
    }
);

categorical_enum!(
    /// Outcome of withdrawing the suspected drug.
    Dechallenge: "dechallenge" {
        Yes => "yes",
        No => "no",
        Unknown => "unknown",
        Na => "na",
    }
);

categorical_enum!(Severity: "severity" {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    Fatal => "fatal",
    Unknown => "unknown",
});

categorical_enum!(IsSerious: "is_serious" {
    Yes => "yes",
    No => "no",
});

categorical_enum!(CriteriaForSeriousness: "criteria_for_seriousness" {
    Hospitalisation => "hospitalisation",
    Disability => "disability",
    CongenitalAnomaly => "congenital anomaly",
    LifeThreatening => "life-threatening",
    Death => "death",
});

categorical_enum!(ActionTaken: "action_taken" {
    DrugWithdrawn => "drug withdrawn",
    DoseReduced => "dose reduced",
    DoseIncreased => "dose increased",
    DoseNotChanged => "dose not changed",
    NotApplicable => "not applicable",
    Unknown => "unknown",
});

categorical_enum!(Outcome: "outcome" {
    Recovered => "recovered",
    RecoveredWithSequelae => "recovered with sequelae",
    Recovering => "recovering",
    NotRecovered => "not recovered",
    Death => "death",
    Unknown => "unknown",
});

categorical_enum!(
    /// Causality level assigned by the classifier or proposed by a reviewer.
    CausalityLevel: "causality_assessment_level" {
        Certain => "certain",
        Likely => "likely",
        Possible => "possible",
        Unlikely => "unlikely",
        Unclassified => "unclassified",
        Unclassifiable => "unclassifiable",
    }
);

/// Names of the ten categorical columns, in the order they are fed to the encoder.
pub const CATEGORICAL_FIELDS: [&str; 10] = [
    "gender",
    "pregnancy_status",
    "known_allergy",
    "rechallenge",
    "dechallenge",
    "severity",
    "is_serious",
    "criteria_for_seriousness",
    "action_taken",
    "outcome",
];

/// The ten categorical answers of one report, the only model inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClinicalCategories {
    pub gender: Gender,
    pub pregnancy_status: PregnancyStatus,
    pub known_allergy: KnownAllergy,
    pub rechallenge: Rechallenge,
    pub dechallenge: Dechallenge,
    pub severity: Severity,
    pub is_serious: IsSerious,
    pub criteria_for_seriousness: CriteriaForSeriousness,
    pub action_taken: ActionTaken,
    pub outcome: Outcome,
}

impl ClinicalCategories {
    /// `(field, literal)` pairs aligned with [`CATEGORICAL_FIELDS`].
    pub fn pairs(&self) -> [(&'static str, &'static str); 10] {
        [
            (CATEGORICAL_FIELDS[0], self.gender.as_str()),
            (CATEGORICAL_FIELDS[1], self.pregnancy_status.as_str()),
            (CATEGORICAL_FIELDS[2], self.known_allergy.as_str()),
            (CATEGORICAL_FIELDS[3], self.rechallenge.as_str()),
            (CATEGORICAL_FIELDS[4], self.dechallenge.as_str()),
            (CATEGORICAL_FIELDS[5], self.severity.as_str()),
            (CATEGORICAL_FIELDS[6], self.is_serious.as_str()),
            (CATEGORICAL_FIELDS[7], self.criteria_for_seriousness.as_str()),
            (CATEGORICAL_FIELDS[8], self.action_taken.as_str()),
            (CATEGORICAL_FIELDS[9], self.outcome.as_str()),
        ]
    }
}

/// Every literal of the named categorical field, for aggregate reporting.
pub fn field_literals(field: &str) -> Option<Vec<&'static str>> {
    let literals = match field {
        "gender" => Gender::literals().collect(),
        "pregnancy_status" => PregnancyStatus::literals().collect(),
        "known_allergy" => KnownAllergy::literals().collect(),
        "rechallenge" => Rechallenge::literals().collect(),
        "dechallenge" => Dechallenge::literals().collect(),
        "severity" => Severity::literals().collect(),
        "is_serious" => IsSerious::literals().collect(),
        "criteria_for_seriousness" => CriteriaForSeriousness::literals().collect(),
        "action_taken" => ActionTaken::literals().collect(),
        "outcome" => Outcome::literals().collect(),
        "causality_assessment_level" => CausalityLevel::literals().collect(),
        _ => return None,
    };
    Some(literals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_round_trip_through_from_str() {
        for level in CausalityLevel::ALL {
            assert_eq!(level.as_str().parse::<CausalityLevel>().unwrap(), *level);
        }
        assert_eq!(
            "1st trimester".parse::<PregnancyStatus>().unwrap(),
            PregnancyStatus::FirstTrimester
        );
    }

    #[test]
    fn unknown_literal_names_the_vocabulary() {
        let err = "maybe".parse::<Rechallenge>().unwrap_err();
        assert_eq!(err.kind, "rechallenge");
        assert_eq!(err.value, "maybe");
    }

    #[test]
    fn serde_uses_wire_literals() {
        let json = serde_json::to_string(&ActionTaken::DoseNotChanged).unwrap();
        assert_eq!(json, "\"dose not changed\"");
        let parsed: CriteriaForSeriousness = serde_json::from_str("\"life-threatening\"").unwrap();
        assert_eq!(parsed, CriteriaForSeriousness::LifeThreatening);
        assert!(serde_json::from_str::<Gender>("\"other\"").is_err());
    }

    #[test]
    fn every_field_has_literals() {
        for field in CATEGORICAL_FIELDS {
            assert!(field_literals(field).is_some(), "{field}");
        }
        assert_eq!(field_literals("causality_assessment_level").unwrap().len(), 6);
        assert!(field_literals("patient_name").is_none());
    }
}

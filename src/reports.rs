//! Report creation and update, each paired with a fresh causality assessment.

use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    domain::{
        adr::{Adr, AdrInput},
        assessment::CausalityAssessment,
    },
    inference::{InferenceEngine, InferenceError, Prediction},
    store::{adrs, assessments, institutions, Store, StoreError},
};

/// What an update does to the assessments already attached to a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReassessmentPolicy {
    /// Insert a new assessment; the newest one is authoritative.
    #[default]
    Append,
    /// Rewrite the newest assessment in place, keeping its reviews.
    Overwrite,
}

impl FromStr for ReassessmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(format!("unknown reassessment policy {other:?}")),
        }
    }
}

impl fmt::Display for ReassessmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Append => "append",
            Self::Overwrite => "overwrite",
        })
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("medical institution {0} does not exist")]
    UnknownInstitution(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A stored report together with the assessment written alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct AssessedReport {
    pub adr: Adr,
    pub assessment: CausalityAssessment,
}

/// A new report assessed in memory and not yet written.
#[derive(Debug, Clone)]
pub struct PendingReport {
    report: AssessedReport,
    prediction: Prediction,
}

impl PendingReport {
    pub fn adr(&self) -> &Adr {
        &self.report.adr
    }

    /// Hand back the report once its transaction has committed.
    pub fn into_stored(self) -> AssessedReport {
        log_assessment(&self.report.adr, &self.report.assessment, self.prediction);
        self.report
    }
}

/// Run inference for a new report and build the rows to store.
pub fn assess_new_report(
    engine: &InferenceEngine,
    user_id: &str,
    input: AdrInput,
) -> Result<PendingReport, ReportError> {
    let prediction = engine.assess(&input.categories())?;
    let adr = Adr::new(user_id, input);
    let assessment = CausalityAssessment::new(&adr.id, engine.model_id(), prediction.level);
    Ok(PendingReport {
        report: AssessedReport { adr, assessment },
        prediction,
    })
}

/// Write a pending report and its assessment inside the caller's transaction.
pub fn insert_report(
    conn: &rusqlite::Connection,
    pending: &PendingReport,
) -> Result<(), ReportError> {
    let AssessedReport { adr, assessment } = &pending.report;
    ensure_institution(conn, adr.medical_institution_id.as_deref())?;
    adrs::insert_adr(conn, adr)?;
    assessments::insert_assessment(conn, assessment)?;
    Ok(())
}

/// Assess and store a new report. Nothing is written unless inference succeeds.
#[instrument(skip(store, engine, input))]
pub fn create_report(
    store: &Store,
    engine: &InferenceEngine,
    user_id: &str,
    input: AdrInput,
) -> Result<AssessedReport, ReportError> {
    let pending = assess_new_report(engine, user_id, input)?;
    store.write(|tx| insert_report(tx, &pending))?;
    Ok(pending.into_stored())
}

/// Replace every editable field of a report and reassess it under `policy`.
#[instrument(skip(store, engine, input))]
pub fn update_report(
    store: &Store,
    engine: &InferenceEngine,
    adr_id: &str,
    input: AdrInput,
    policy: ReassessmentPolicy,
) -> Result<AssessedReport, ReportError> {
    store.read(|conn| adrs::get_adr(conn, adr_id))?;
    let prediction = engine.assess(&input.categories())?;

    let (adr, assessment) = store.write(|tx| {
        let mut adr = adrs::get_adr(tx, adr_id)?;
        adr.apply(input);
        ensure_institution(tx, adr.medical_institution_id.as_deref())?;
        adrs::update_adr(tx, &adr)?;

        let current = match policy {
            ReassessmentPolicy::Append => None,
            ReassessmentPolicy::Overwrite => assessments::latest_for_adr(tx, &adr.id)?,
        };
        let assessment = match current {
            Some(mut existing) => {
                existing.ml_model_id = engine.model_id().to_string();
                existing.causality_assessment_level_value = prediction.level;
                existing.prediction_reason = None;
                existing.updated_at = adr.updated_at;
                assessments::update_assessment(tx, &existing)?;
                existing
            }
            None => {
                let fresh = CausalityAssessment::new(&adr.id, engine.model_id(), prediction.level);
                assessments::insert_assessment(tx, &fresh)?;
                fresh
            }
        };
        Ok::<_, ReportError>((adr, assessment))
    })?;

    log_assessment(&adr, &assessment, prediction);
    Ok(AssessedReport { adr, assessment })
}

fn ensure_institution(
    conn: &rusqlite::Connection,
    institution_id: Option<&str>,
) -> Result<(), ReportError> {
    match institution_id {
        Some(id) if !institutions::institution_exists(conn, id)? => {
            Err(ReportError::UnknownInstitution(id.to_string()))
        }
        _ => Ok(()),
    }
}

fn log_assessment(adr: &Adr, assessment: &CausalityAssessment, prediction: Prediction) {
    info!(
        adr_id = %adr.id,
        assessment_id = %assessment.id,
        level = %prediction.level,
        class_code = prediction.class_code,
        model_id = %assessment.ml_model_id,
        "report assessed"
    );
}

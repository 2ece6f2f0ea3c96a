//! Model-derived causality assessments and their peer reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::categories::CausalityLevel;

/// Model identifier stamped on assessments when none is configured.
pub const DEFAULT_MODEL_ID: &str = "final_ml_model@champion";

/// One classifier verdict for an ADR report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CausalityAssessment {
    pub id: String,
    pub adr_id: String,
    pub ml_model_id: String,
    pub causality_assessment_level_value: CausalityLevel,
    pub prediction_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CausalityAssessment {
    pub fn new(adr_id: &str, ml_model_id: &str, level: CausalityLevel) -> Self {
        let now = super::now();
        Self {
            id: Uuid::new_v4().to_string(),
            adr_id: adr_id.to_string(),
            ml_model_id: ml_model_id.to_string(),
            causality_assessment_level_value: level,
            prediction_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user's judgement on one assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: String,
    pub causality_assessment_level_id: String,
    pub user_id: String,
    pub approved: bool,
    pub proposed_causality_level: Option<CausalityLevel>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(assessment_id: &str, user_id: &str, verdict: ReviewVerdict) -> Self {
        let now = super::now();
        Self {
            id: Uuid::new_v4().to_string(),
            causality_assessment_level_id: assessment_id.to_string(),
            user_id: user_id.to_string(),
            approved: verdict.approved,
            proposed_causality_level: verdict.proposed_causality_level,
            reason: verdict.reason,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, verdict: ReviewVerdict) {
        let ReviewVerdict {
            approved,
            proposed_causality_level,
            reason,
        } = verdict;
        self.approved = approved;
        self.proposed_causality_level = proposed_causality_level;
        self.reason = reason;
        self.updated_at = super::now();
    }
}

/// Reviewer-supplied fields of a review.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewVerdict {
    pub approved: bool,
    #[serde(default)]
    pub proposed_causality_level: Option<CausalityLevel>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ReviewVerdict {
    /// A rejection must say what the level should have been.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.approved && self.proposed_causality_level.is_none() {
            return Err("proposed_causality_level is required when the assessment is not approved");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_requires_a_proposal() {
        let verdict = ReviewVerdict {
            approved: false,
            proposed_causality_level: None,
            reason: Some("timeline does not fit".into()),
        };
        assert!(verdict.validate().is_err());

        let verdict = ReviewVerdict {
            proposed_causality_level: Some(CausalityLevel::Possible),
            ..verdict
        };
        assert!(verdict.validate().is_ok());
    }

    #[test]
    fn approval_needs_no_proposal() {
        let verdict = ReviewVerdict {
            approved: true,
            proposed_causality_level: None,
            reason: None,
        };
        assert!(verdict.validate().is_ok());
    }
}

//! Record → indicators → class code → causality level.

use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::{
    artifacts::{ArtifactPaths, ArtifactSource},
    classifier::{LinearClassifier, ModelArtifact},
    encoders::{column_names, OneHotEncoder, OrdinalEncoder},
    InferenceError,
};
use crate::domain::categories::{CausalityLevel, ClinicalCategories};

/// Indicator columns the classifier was trained on.
pub const PREDICTION_COLUMNS: [&str; 8] = [
    "rechallenge_yes",
    "rechallenge_no",
    "rechallenge_unknown",
    "rechallenge_na",
    "dechallenge_yes",
    "dechallenge_no",
    "dechallenge_unknown",
    "dechallenge_na",
];

/// Outcome of one inference call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub level: CausalityLevel,
    pub class_code: usize,
}

/// Loaded encoders and classifier. Immutable once built, so one instance
/// is shared by every request.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    one_hot: OneHotEncoder,
    ordinal: OrdinalEncoder,
    classifier: LinearClassifier,
    model_id: String,
}

impl InferenceEngine {
    pub fn new(
        one_hot: OneHotEncoder,
        ordinal: OrdinalEncoder,
        classifier: LinearClassifier,
        model_id: impl Into<String>,
    ) -> Result<Self, InferenceError> {
        one_hot.validate()?;
        ordinal.validate()?;
        if let Some(code) = classifier
            .classes()
            .iter()
            .copied()
            .find(|code| *code >= ordinal.len())
        {
            return Err(InferenceError::ArtifactInvalid {
                artifact: classifier.name().to_string(),
                reason: format!(
                    "class code {code} exceeds the {} ordinal categories",
                    ordinal.len()
                ),
            });
        }
        let mut features: Vec<&str> = classifier
            .feature_names()
            .iter()
            .map(String::as_str)
            .collect();
        features.sort_unstable();
        let mut expected = PREDICTION_COLUMNS.to_vec();
        expected.sort_unstable();
        if features != expected {
            return Err(InferenceError::ArtifactInvalid {
                artifact: classifier.name().to_string(),
                reason: format!(
                    "model features {:?} are not the prediction columns",
                    classifier.feature_names()
                ),
            });
        }
        let encoded = one_hot.feature_names();
        let missing: Vec<&str> = PREDICTION_COLUMNS
            .into_iter()
            .filter(|column| !encoded.iter().any(|name| name.as_str() == *column))
            .collect();
        if !missing.is_empty() {
            return Err(InferenceError::ArtifactInvalid {
                artifact: "one-hot encoder".to_string(),
                reason: format!("never emits prediction columns {missing:?}"),
            });
        }
        Ok(Self {
            one_hot,
            ordinal,
            classifier,
            model_id: model_id.into(),
        })
    }

    /// Fetch and validate all artifacts.
    #[instrument(skip(source))]
    pub async fn load(
        source: &ArtifactSource,
        paths: &ArtifactPaths,
        model_id: &str,
    ) -> Result<Self, InferenceError> {
        let one_hot: OneHotEncoder = source.fetch_json(&paths.one_hot_encoder).await?;
        let ordinal: OrdinalEncoder = source.fetch_json(&paths.ordinal_encoder).await?;
        let artifact: ModelArtifact = source.fetch_json(&paths.model).await?;
        let classifier = LinearClassifier::try_from(artifact)?;
        let engine = Self::new(one_hot, ordinal, classifier, model_id)?;
        info!(
            model = %engine.classifier.name(),
            model_id,
            features = engine.classifier.feature_names().len(),
            "inference artifacts loaded"
        );
        Ok(engine)
    }

    /// Tag stamped on every assessment produced by this engine.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Run encode → select → predict → decode for one record.
    #[instrument(skip(self), fields(model_id = %self.model_id))]
    pub fn assess(&self, categories: &ClinicalCategories) -> Result<Prediction, InferenceError> {
        let frame = project(categories)?;
        let encoded = self.one_hot.transform(&frame)?;
        let features = select_prediction_features(&encoded)?;
        let code = self
            .classifier
            .predict(&features)?
            .first()
            .copied()
            .ok_or(InferenceError::EmptyPrediction)?;
        let level = self.ordinal.inverse_transform(code)?;
        debug!(code, %level, "decoded prediction");
        Ok(Prediction {
            level,
            class_code: code,
        })
    }
}

/// Single-row frame holding the ten categorical answers as strings.
pub fn project(categories: &ClinicalCategories) -> Result<DataFrame, InferenceError> {
    let columns: Vec<Series> = categories
        .pairs()
        .into_iter()
        .map(|(field, value)| Series::new(field.into(), vec![value]))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Keep only [`PREDICTION_COLUMNS`], in that order.
pub fn select_prediction_features(encoded: &DataFrame) -> Result<DataFrame, InferenceError> {
    let mut columns = Vec::with_capacity(PREDICTION_COLUMNS.len());
    for name in PREDICTION_COLUMNS {
        let column = encoded
            .column(name)
            .map_err(|_| InferenceError::FeatureSchemaMismatch {
                expected: PREDICTION_COLUMNS.iter().map(|c| c.to_string()).collect(),
                found: column_names(encoded),
            })?;
        columns.push(column.clone());
    }
    Ok(DataFrame::new(columns)?)
}

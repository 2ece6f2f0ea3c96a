//! Pre-trained multinomial linear classifier.

use linfa::traits::PredictInplace;
use ndarray::{Array1, Array2, ArrayView1};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{encoders::column_names, InferenceError};

/// Serialized weights exported from the training environment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelArtifact {
    pub name: String,
    /// Input columns, in the order the coefficients expect them.
    pub feature_names: Vec<String>,
    /// Class code emitted for each coefficient row.
    pub classes: Vec<usize>,
    /// One row of `feature_names.len()` weights per class.
    pub coefficients: Vec<Vec<f64>>,
    /// One bias per class.
    pub intercepts: Vec<f64>,
}

/// Scores every class as `x · w_c + b_c` and picks the highest,
/// lowest index first on ties.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    name: String,
    feature_names: Vec<String>,
    classes: Vec<usize>,
    /// `(n_features, n_classes)`
    weights: Array2<f64>,
    intercepts: Array1<f64>,
}

impl TryFrom<ModelArtifact> for LinearClassifier {
    type Error = InferenceError;

    fn try_from(artifact: ModelArtifact) -> Result<Self, Self::Error> {
        let invalid = |reason: String| InferenceError::ArtifactInvalid {
            artifact: artifact.name.clone(),
            reason,
        };
        let n_features = artifact.feature_names.len();
        let n_classes = artifact.classes.len();
        if n_features == 0 || n_classes == 0 {
            return Err(invalid("model has no features or no classes".to_string()));
        }
        if artifact.coefficients.len() != n_classes || artifact.intercepts.len() != n_classes {
            return Err(invalid(format!(
                "expected {n_classes} coefficient rows and intercepts, found {} and {}",
                artifact.coefficients.len(),
                artifact.intercepts.len()
            )));
        }
        if let Some(row) = artifact
            .coefficients
            .iter()
            .find(|row| row.len() != n_features)
        {
            return Err(invalid(format!(
                "coefficient row has {} weights for {n_features} features",
                row.len()
            )));
        }

        let flat: Vec<f64> = artifact.coefficients.iter().flatten().copied().collect();
        let weights = Array2::from_shape_vec((n_classes, n_features), flat)
            .map_err(|err| invalid(err.to_string()))?
            .reversed_axes();

        Ok(Self {
            weights,
            intercepts: Array1::from(artifact.intercepts.clone()),
            classes: artifact.classes.clone(),
            feature_names: artifact.feature_names.clone(),
            name: artifact.name,
        })
    }
}

impl LinearClassifier {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Predict one class code per row of `features`.
    ///
    /// The frame must carry exactly the model's feature columns; their
    /// order does not matter.
    pub fn predict(&self, features: &DataFrame) -> Result<Vec<usize>, InferenceError> {
        let mut found = column_names(features);
        let mut expected = self.feature_names.clone();
        found.sort();
        expected.sort();
        if found != expected {
            return Err(InferenceError::FeatureSchemaMismatch {
                expected: self.feature_names.clone(),
                found: column_names(features),
            });
        }

        let mut x = Array2::<f64>::zeros((features.height(), self.feature_names.len()));
        for (j, name) in self.feature_names.iter().enumerate() {
            let column = features.column(name)?.f64()?;
            for (i, value) in column.into_iter().enumerate() {
                x[[i, j]] = value.unwrap_or(0.0);
            }
        }

        let mut y = self.default_target(&x);
        self.predict_inplace(&x, &mut y);
        debug!(model = %self.name, rows = y.len(), "classified feature rows");
        Ok(y.to_vec())
    }
}

impl PredictInplace<Array2<f64>, Array1<usize>> for LinearClassifier {
    fn predict_inplace<'a>(&'a self, x: &'a Array2<f64>, y: &mut Array1<usize>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        let scores = x.dot(&self.weights) + &self.intercepts;
        for (target, row) in y.iter_mut().zip(scores.rows()) {
            *target = self.classes[argmax(row)];
        }
    }

    fn default_target(&self, x: &Array2<f64>) -> Array1<usize> {
        Array1::zeros(x.nrows())
    }
}

fn argmax(row: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (idx, value) in row.iter().enumerate() {
        if *value > row[best] {
            best = idx;
        }
    }
    best
}

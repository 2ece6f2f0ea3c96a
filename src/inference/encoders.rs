//! Fitted categorical encoders: one-hot for inputs, ordinal for labels.

use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};

use super::InferenceError;
use crate::domain::categories::CausalityLevel;

/// Categories recorded for one input column at fit time, in fit order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FittedField {
    pub name: String,
    pub categories: Vec<String>,
}

/// Category-to-indicator encoder. Emits one `{field}_{category}` column
/// per fitted category, fields in fit order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OneHotEncoder {
    fields: Vec<FittedField>,
}

impl OneHotEncoder {
    pub fn new(fields: Vec<FittedField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FittedField] {
        &self.fields
    }

    /// Output column names, in output order.
    pub fn feature_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|field| {
                field
                    .categories
                    .iter()
                    .map(move |category| format!("{}_{category}", field.name))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        let invalid = |reason: String| InferenceError::ArtifactInvalid {
            artifact: "one-hot encoder".to_string(),
            reason,
        };
        if self.fields.is_empty() {
            return Err(invalid("no fitted fields".to_string()));
        }
        for field in &self.fields {
            if field.categories.is_empty() {
                return Err(invalid(format!("field {} has no categories", field.name)));
            }
        }
        let mut names = self.feature_names();
        let total = names.len();
        names.sort();
        names.dedup();
        if names.len() != total {
            return Err(invalid("duplicate output columns".to_string()));
        }
        Ok(())
    }

    /// Encode string columns into `f64` indicator columns.
    pub fn transform(&self, frame: &DataFrame) -> Result<DataFrame, InferenceError> {
        let height = frame.height();
        let mut columns = Vec::with_capacity(self.feature_names().len());
        for field in &self.fields {
            let column = frame
                .column(&field.name)
                .map_err(|_| InferenceError::FeatureSchemaMismatch {
                    expected: self.fields.iter().map(|f| f.name.clone()).collect(),
                    found: column_names(frame),
                })?;
            let values = column.str()?;

            let mut indicators = vec![vec![0.0_f64; height]; field.categories.len()];
            for row in 0..height {
                let value = values.get(row).unwrap_or_default();
                let idx = field
                    .categories
                    .iter()
                    .position(|category| category == value)
                    .ok_or_else(|| InferenceError::UnknownCategory {
                        field: field.name.clone(),
                        value: value.to_string(),
                    })?;
                indicators[idx][row] = 1.0;
            }

            for (category, indicator) in field.categories.iter().zip(indicators) {
                let name = format!("{}_{category}", field.name);
                columns.push(Series::new(name.as_str().into(), indicator));
            }
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Label encoder mapping class codes back to causality levels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrdinalEncoder {
    categories: Vec<String>,
}

impl OrdinalEncoder {
    pub fn new(categories: Vec<String>) -> Self {
        Self { categories }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Every category must be a causality level literal.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.categories.is_empty() {
            return Err(InferenceError::ArtifactInvalid {
                artifact: "ordinal encoder".to_string(),
                reason: "no categories".to_string(),
            });
        }
        for category in &self.categories {
            category
                .parse::<CausalityLevel>()
                .map_err(|err| InferenceError::ArtifactInvalid {
                    artifact: "ordinal encoder".to_string(),
                    reason: err.to_string(),
                })?;
        }
        Ok(())
    }

    pub fn inverse_transform(&self, code: usize) -> Result<CausalityLevel, InferenceError> {
        let literal = self
            .categories
            .get(code)
            .ok_or(InferenceError::UnknownClassCode(code))?;
        literal
            .parse()
            .map_err(|err: crate::domain::categories::UnknownLiteral| {
                InferenceError::ArtifactInvalid {
                    artifact: "ordinal encoder".to_string(),
                    reason: err.to_string(),
                }
            })
    }
}

pub(crate) fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect()
}

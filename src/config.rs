//! Runtime configuration resolved from `.env` and the process environment.

use std::{env, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context};
use chrono::Duration;

use crate::{
    auth::{password::DEFAULT_ITERATIONS, TokenPolicy},
    domain::assessment::DEFAULT_MODEL_ID,
    inference::{ArtifactPaths, ArtifactSource, InferenceError},
    reports::ReassessmentPolicy,
};

const DEFAULT_ACCESS_MINUTES: i64 = 30;
const DEFAULT_REFRESH_DAYS: i64 = 7;
/// Upper bound on either token lifetime, keeping every expiry representable.
const MAX_TOKEN_LIFETIME_DAYS: i64 = 36_500;

#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Local artifact root, used unless `artifacts_base_url` is set.
    pub artifacts_dir: PathBuf,
    pub artifacts_base_url: Option<String>,
    pub artifact_paths: ArtifactPaths,
    /// Tag stamped on every assessment.
    pub ml_model_id: String,
    /// Access and refresh token lifetimes.
    pub token_policy: TokenPolicy,
    pub password_hash_iterations: u32,
    pub reassessment_policy: ReassessmentPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./data/adr.sqlite3"),
            artifacts_dir: PathBuf::from("./artifacts"),
            artifacts_base_url: None,
            artifact_paths: ArtifactPaths::default(),
            ml_model_id: DEFAULT_MODEL_ID.to_string(),
            token_policy: TokenPolicy {
                access_ttl: Duration::minutes(DEFAULT_ACCESS_MINUTES),
                refresh_ttl: Duration::days(DEFAULT_REFRESH_DAYS),
            },
            password_hash_iterations: DEFAULT_ITERATIONS,
            reassessment_policy: ReassessmentPolicy::default(),
        }
    }
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);
        let artifacts_dir = env::var("ARTIFACTS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.artifacts_dir);
        let artifacts_base_url = env::var("ARTIFACTS_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let artifact_paths = ArtifactPaths {
            model: env::var("ML_MODEL_PATH").unwrap_or(defaults.artifact_paths.model),
            one_hot_encoder: env::var("ONE_HOT_ENCODER_PATH")
                .unwrap_or(defaults.artifact_paths.one_hot_encoder),
            ordinal_encoder: env::var("ORDINAL_ENCODER_PATH")
                .unwrap_or(defaults.artifact_paths.ordinal_encoder),
        };
        let ml_model_id = env::var("ML_MODEL_ID").unwrap_or(defaults.ml_model_id);

        let settings = Self {
            database_path,
            artifacts_dir,
            artifacts_base_url,
            artifact_paths,
            ml_model_id,
            token_policy: TokenPolicy {
                access_ttl: token_lifetime(
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    parsed("ACCESS_TOKEN_EXPIRE_MINUTES")?.unwrap_or(DEFAULT_ACCESS_MINUTES),
                    Duration::try_minutes,
                )?,
                refresh_ttl: token_lifetime(
                    "REFRESH_TOKEN_EXPIRE_DAYS",
                    parsed("REFRESH_TOKEN_EXPIRE_DAYS")?.unwrap_or(DEFAULT_REFRESH_DAYS),
                    Duration::try_days,
                )?,
            },
            password_hash_iterations: parsed("PASSWORD_HASH_ITERATIONS")?
                .unwrap_or(defaults.password_hash_iterations),
            reassessment_policy: parsed("REASSESSMENT_POLICY")?
                .unwrap_or(defaults.reassessment_policy),
        };

        if let Some(parent) = settings.database_path.parent() {
            std::fs::create_dir_all(parent).context("creating database dir")?;
        }
        Ok(settings)
    }

    /// Remote store when a base URL is configured, the local directory otherwise.
    pub fn artifact_source(&self) -> Result<ArtifactSource, InferenceError> {
        match &self.artifacts_base_url {
            Some(url) => ArtifactSource::remote(url),
            None => Ok(ArtifactSource::directory(&self.artifacts_dir)),
        }
    }
}

/// Convert a configured count into a positive, bounded token lifetime.
fn token_lifetime(
    key: &str,
    value: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> anyhow::Result<Duration> {
    to_duration(value)
        .filter(|ttl| *ttl > Duration::zero() && ttl.num_days() <= MAX_TOKEN_LIFETIME_DAYS)
        .ok_or_else(|| {
            anyhow!("invalid {key}={value}: must be positive and at most {MAX_TOKEN_LIFETIME_DAYS} days")
        })
}

/// Parse an optional variable, failing loudly on a malformed value.
fn parsed<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|err| anyhow!("invalid {key}={raw:?}: {err}")),
        Err(_) => Ok(None),
    }
}

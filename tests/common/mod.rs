#![allow(dead_code)]

use std::path::Path;

use adr_causality::{
    api::{self, AppState},
    config::Settings,
    domain::categories::{field_literals, CATEGORICAL_FIELDS},
    inference::{
        ArtifactPaths, ArtifactSource, FittedField, InferenceEngine, ModelArtifact,
        OneHotEncoder, OrdinalEncoder, PREDICTION_COLUMNS,
    },
    reports::ReassessmentPolicy,
    store::Store,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Class labels in ordinal-encoder order.
pub const LEVELS: [&str; 6] = [
    "certain",
    "likely",
    "possible",
    "unclassifiable",
    "unclassified",
    "unlikely",
];

/// Encoder fitted on every literal, categories sorted per field.
/// `(field, literal)` pairs in `omit` are left out.
pub fn one_hot_fixture(omit: &[(&str, &str)]) -> OneHotEncoder {
    let fields: Vec<FittedField> = CATEGORICAL_FIELDS
        .iter()
        .map(|field| {
            let mut categories: Vec<String> = field_literals(field)
                .unwrap()
                .into_iter()
                .filter(|literal| !omit.contains(&(*field, *literal)))
                .map(str::to_string)
                .collect();
            categories.sort();
            FittedField {
                name: field.to_string(),
                categories,
            }
        })
        .collect();
    OneHotEncoder::new(fields)
}

/// Linear model over the challenge indicators:
/// yes+yes → certain, yes+other → likely, no → unlikely,
/// unknown → possible, na → unclassifiable.
pub fn model_fixture() -> ModelArtifact {
    ModelArtifact {
        name: "challenge-fixture".into(),
        feature_names: PREDICTION_COLUMNS.iter().map(|c| c.to_string()).collect(),
        classes: (0..LEVELS.len()).collect(),
        coefficients: vec![
            vec![5.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            vec![5.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            vec![0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0; 8],
            vec![0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ],
        intercepts: vec![0.0; LEVELS.len()],
    }
}

/// Level the fixture model assigns to a challenge pair.
pub fn expected_level(rechallenge: &str, dechallenge: &str) -> &'static str {
    match (rechallenge, dechallenge) {
        ("yes", "yes") => "certain",
        ("yes", _) => "likely",
        ("no", _) => "unlikely",
        ("unknown", _) => "possible",
        _ => "unclassifiable",
    }
}

/// Write encoder and model artifacts into `dir` at the default paths.
pub fn write_artifacts(dir: &Path, omit: &[(&str, &str)]) {
    let ordinal = OrdinalEncoder::new(LEVELS.iter().map(|l| l.to_string()).collect());
    let paths = ArtifactPaths::default();
    write_json(&dir.join(&paths.one_hot_encoder), &one_hot_fixture(omit));
    write_json(&dir.join(&paths.ordinal_encoder), &ordinal);
    write_json(&dir.join(&paths.model), &model_fixture());
}

pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

pub async fn load_engine(dir: &Path) -> InferenceEngine {
    InferenceEngine::load(
        &ArtifactSource::directory(dir),
        &ArtifactPaths::default(),
        "fixture@1",
    )
    .await
    .unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _artifacts: TempDir,
}

impl TestApp {
    pub async fn new(policy: ReassessmentPolicy) -> Self {
        Self::with_omitted(policy, &[]).await
    }

    pub async fn with_omitted(policy: ReassessmentPolicy, omit: &[(&str, &str)]) -> Self {
        let artifacts = TempDir::new().unwrap();
        write_artifacts(artifacts.path(), omit);
        let engine = load_engine(artifacts.path()).await;
        let settings = Settings {
            artifacts_dir: artifacts.path().to_path_buf(),
            ml_model_id: "fixture@1".into(),
            password_hash_iterations: 1_000,
            reassessment_policy: policy,
            ..Settings::default()
        };
        let state = AppState::new(Store::open_in_memory().unwrap(), engine, settings);
        Self {
            router: api::router(state.clone()),
            state,
            _artifacts: artifacts,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        read_response(response).await
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(request(method, uri, token, body)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={username}&password={password}")))
            .unwrap();
        self.send(request).await
    }

    /// Register `username` and return a fresh access token.
    pub async fn user_token(&self, username: &str) -> String {
        let (status, _) = self
            .call(
                "POST",
                "/api/v1/signup",
                None,
                Some(json!({"username": username, "password": "pa55word"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(username, "pa55word").await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Status and JSON body; non-JSON bodies come back as a string value.
pub async fn read_response(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn adr_body(rechallenge: &str, dechallenge: &str) -> Value {
    json!({
        "patient_name": "Jane Doe",
        "patient_age": 41,
        "gender": "female",
        "pregnancy_status": "not pregnant",
        "known_allergy": "no",
        "date_of_onset_of_reaction": "2024-05-02",
        "description_of_reaction": "generalised rash",
        "rechallenge": rechallenge,
        "dechallenge": dechallenge,
        "severity": "moderate",
        "is_serious": "no",
        "criteria_for_seriousness": "hospitalisation",
        "action_taken": "drug withdrawn",
        "outcome": "recovered"
    })
}

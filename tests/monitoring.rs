mod common;

use adr_causality::reports::ReassessmentPolicy;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{adr_body, TestApp};
use serde_json::{json, Value};

fn window() -> String {
    let today = Utc::now().date_naive();
    format!(
        "/api/v1/monitoring?start={}&end={}",
        today - Duration::days(1),
        today + Duration::days(1)
    )
}

/// `literal=count` strings for one field of the monitoring response.
fn counts(body: &Value, field: &str) -> Vec<String> {
    let series = body[field]["series"].as_array().unwrap();
    let data = body[field]["data"].as_array().unwrap();
    series
        .iter()
        .zip(data)
        .map(|(literal, count)| format!("{}={}", literal.as_str().unwrap(), count))
        .collect()
}

#[tokio::test]
async fn monitoring_counts_every_literal() {
    let app = TestApp::new(ReassessmentPolicy::Append).await;
    let token = app.user_token("analyst").await;
    for (rechallenge, dechallenge) in [("yes", "yes"), ("yes", "no"), ("no", "no")] {
        let (status, _) = app
            .call(
                "POST",
                "/api/v1/adr",
                Some(&token),
                Some(adr_body(rechallenge, dechallenge)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.call("GET", &window(), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let view = json!({
        "causality_assessment_level": counts(&body, "causality_assessment_level"),
        "rechallenge": counts(&body, "rechallenge"),
        "total": body["total"],
    });
    insta::assert_json_snapshot!(view, @r###"
    {
      "causality_assessment_level": [
        "certain=1",
        "likely=1",
        "possible=0",
        "unlikely=1",
        "unclassified=0",
        "unclassifiable=0"
      ],
      "rechallenge": [
        "yes=2",
        "no=1",
        "unknown=0",
        "na=0"
      ],
      "total": 3
    }
    "###);

    for field in [
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
    ] {
        let sum: i64 = body[field]["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|count| count.as_i64().unwrap())
            .sum();
        assert_eq!(sum, 3, "{field}");
    }
}

#[tokio::test]
async fn reassessed_reports_count_their_newest_level() {
    let app = TestApp::new(ReassessmentPolicy::Append).await;
    let token = app.user_token("analyst").await;
    let (_, created) = app
        .call("POST", "/api/v1/adr", Some(&token), Some(adr_body("yes", "no")))
        .await;
    let id = created["id"].as_str().unwrap();
    app.call(
        "PUT",
        &format!("/api/v1/adr/{id}"),
        Some(&token),
        Some(adr_body("yes", "yes")),
    )
    .await;

    let (_, body) = app.call("GET", &window(), Some(&token), None).await;
    let levels = counts(&body, "causality_assessment_level");
    assert!(levels.contains(&"certain=1".to_string()));
    assert!(levels.contains(&"likely=0".to_string()));
}

#[tokio::test]
async fn inverted_or_missing_range_is_400() {
    let app = TestApp::new(ReassessmentPolicy::Append).await;
    let token = app.user_token("analyst").await;
    for uri in [
        "/api/v1/monitoring?start=2024-02-01&end=2024-01-01",
        "/api/v1/monitoring?start=2024-02-01",
        "/api/v1/monitoring?start=yesterday&end=2024-01-01",
    ] {
        let (status, body) = app.call("GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}

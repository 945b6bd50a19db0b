use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::eligibility::{eligibility_router, AdmissionLimiter, DecisionPolicy};

fn test_router() -> (Router, MemoryLog) {
    let (service, _, log) = build_service(DecisionPolicy::default());
    (eligibility_router(service, None), log)
}

fn json_request(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn validate_route_returns_candidate() {
    let (router, _) = test_router();

    let response = router
        .oneshot(json_request("/api/validate", json!({ "address": FRESNO_ADDRESS })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload.get("standardized").and_then(Value::as_str),
        Some("2220 Tulare St, Fresno CA 93721-2104")
    );
    assert_eq!(payload.get("zipcode"), Some(&json!("93721")));
}

#[tokio::test]
async fn validate_route_maps_errors_to_statuses() {
    let cases = [
        (json!({ "address": "" }), StatusCode::BAD_REQUEST),
        (json!({}), StatusCode::BAD_REQUEST),
        (json!({ "address": "404 Nowhere" }), StatusCode::NOT_FOUND),
    ];

    for (payload, expected) in cases {
        let (router, _) = test_router();
        let response = router
            .oneshot(json_request("/api/validate", payload))
            .await
            .expect("route executes");
        assert_eq!(response.status(), expected);
        let body = read_json_body(response).await;
        assert!(body.get("error").is_some());
    }
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (router, _) = test_router();

    let response = router
        .oneshot(
            Request::post("/api/lookup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"address\":"))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overlay_route_returns_outcome() {
    let (router, _) = test_router();

    let response = router
        .oneshot(json_request(
            "/api/overlay",
            json!({ "lat": 34.0522, "lon": -118.2437 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("success"), Some(&json!(true)));
    assert_eq!(payload.get("eligible"), Some(&json!(false)));
    assert_eq!(payload.get("action"), Some(&json!("redirect")));
    assert_eq!(payload.get("link"), Some(&json!("https://program-site/Southern")));
    assert_eq!(payload.get("county_income"), Some(&Value::Null));
}

#[tokio::test]
async fn overlay_route_rejects_zero_and_reports_upstream_failure() {
    let (router, _) = test_router();
    let response = router
        .oneshot(json_request("/api/overlay", json!({ "lat": 0, "lon": -118.2 })))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (router, _) = test_router();
    let response = router
        .oneshot(json_request("/api/overlay", json!({ "lat": 1.5, "lon": 2.5 })))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn lookup_route_merges_candidate_and_outcome() {
    let (router, _) = test_router();

    let response = router
        .oneshot(json_request("/api/lookup", json!({ "address": FRESNO_ADDRESS })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("tract"), Some(&json!("6019000100")));
    assert_eq!(payload.get("eligible"), Some(&json!(true)));
    assert!(payload.get("lat").and_then(Value::as_f64).is_some());
    assert!(payload.get("action").is_none(), "no action when eligible");
    assert_eq!(
        payload
            .pointer("/county_income/income_by_household/1")
            .and_then(Value::as_u64),
        Some(62_400)
    );
}

#[tokio::test]
async fn notify_route_saves_valid_emails_only() {
    let (service, _, log) = build_service(DecisionPolicy::default());
    let router = eligibility_router(service, None);

    let rejected = router
        .clone()
        .oneshot(json_request("/api/notify", json!({ "email": "nope", "tract": "6019000200" })))
        .await
        .expect("route executes");
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert!(log.records().is_empty());

    let accepted = router
        .oneshot(json_request(
            "/api/notify",
            json!({ "email": "resident@example.org", "tract": "6019000200" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(accepted.status(), StatusCode::OK);
    let payload = read_json_body(accepted).await;
    assert_eq!(payload.get("success"), Some(&json!(true)));
    assert_eq!(log.records().len(), 1);
    assert_eq!(log.records()[0].tract, "6019000200");
}

#[tokio::test]
async fn notify_route_reports_storage_failure() {
    let (validator, overlay) = scripted_collaborators();
    let service = Arc::new(crate::workflows::eligibility::EligibilityLookupService::new(
        Arc::new(reference_data()),
        Arc::new(validator),
        Arc::new(overlay),
        Arc::new(BrokenLog),
        DecisionPolicy::default(),
    ));

    let response = eligibility_router(service, None)
        .oneshot(json_request("/api/notify", json!({ "email": "resident@example.org" })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("error"), Some(&json!("Failed to save email")));
}

#[tokio::test]
async fn batch_route_returns_csv_attachment() {
    let (router, _) = test_router();

    let response = router
        .oneshot(
            Request::post("/api/batch")
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from(format!("address\n\"{FRESNO_ADDRESS}\"\n404 Nowhere\n")))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/csv; charset=utf-8")
    );
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok()),
        Some("attachment; filename=\"batch_results.csv\"")
    );
    let body = read_text_body(response).await;
    assert_eq!(body.lines().count(), 3);
    assert!(body.contains("Address not found"));
}

#[tokio::test]
async fn batch_route_returns_error_rows_when_every_lookup_fails() {
    let (_, overlay) = scripted_collaborators();
    let router = eligibility_router(service_with(ScriptedValidator::failing(), overlay), None);

    let response = router
        .oneshot(
            Request::post("/api/batch")
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from(format!(
                    "address\n\"{FRESNO_ADDRESS}\"\n\"{WAITLIST_ADDRESS}\"\n\"{SOUTHERN_ADDRESS}\"\n"
                )))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_text_body(response).await;
    let rows: Vec<&str> = body.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows
        .iter()
        .all(|row| row.ends_with("address validation request failed: connection refused")));
}

#[tokio::test]
async fn batch_route_rejects_csv_without_addresses() {
    let (router, _) = test_router();

    let response = router
        .oneshot(
            Request::post("/api/batch")
                .body(Body::from("name\nnobody\n"))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn limiter_guards_validate_route_only() {
    let (service, _, _) = build_service(DecisionPolicy::default());
    let router = eligibility_router(service, Some(Arc::new(AdmissionLimiter::per_second(1))));

    let request = || {
        let mut request = json_request("/api/validate", json!({ "address": FRESNO_ADDRESS }));
        request
            .headers_mut()
            .insert("x-forwarded-for", "198.51.100.4".parse().expect("header"));
        request
    };

    let first = router.clone().oneshot(request()).await.expect("route executes");
    assert_eq!(first.status(), StatusCode::OK);
    let second = router.clone().oneshot(request()).await.expect("route executes");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let lookup = router
        .oneshot(json_request("/api/lookup", json!({ "address": FRESNO_ADDRESS })))
        .await
        .expect("route executes");
    assert_eq!(lookup.status(), StatusCode::OK);
}

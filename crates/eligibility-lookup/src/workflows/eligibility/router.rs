use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::address::AddressValidator;
use super::admission::{client_key, AdmissionLimiter};
use super::batch::parse_addresses;
use super::error::LookupError;
use super::notify::NotificationLog;
use super::overlay::OverlayProvider;
use super::service::EligibilityLookupService;

const BATCH_FILENAME: &str = "batch_results.csv";

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct OverlayRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub zipcode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub tract: Option<String>,
}

/// Router exposing validation, overlay, lookup, notification, and batch endpoints.
/// When a limiter is supplied it only guards `/api/validate`.
pub fn eligibility_router<V, O, N>(
    service: Arc<EligibilityLookupService<V, O, N>>,
    limiter: Option<Arc<AdmissionLimiter>>,
) -> Router
where
    V: AddressValidator + 'static,
    O: OverlayProvider + 'static,
    N: NotificationLog + 'static,
{
    let mut validate = Router::new().route("/api/validate", post(validate_handler::<V, O, N>));
    if let Some(limiter) = limiter {
        validate = validate.route_layer(middleware::from_fn_with_state(limiter, admit));
    }

    Router::new()
        .route("/api/overlay", post(overlay_handler::<V, O, N>))
        .route("/api/lookup", post(lookup_handler::<V, O, N>))
        .route("/api/notify", post(notify_handler::<V, O, N>))
        .route("/api/batch", post(batch_handler::<V, O, N>))
        .merge(validate)
        .with_state(service)
}

async fn admit(State(limiter): State<Arc<AdmissionLimiter>>, request: Request, next: Next) -> Response {
    let client = client_key(request.headers());
    if !limiter.allow(&client) {
        warn!(%client, "validate request rejected by admission limiter");
        let payload = json!({ "error": "Too many requests" });
        return (StatusCode::TOO_MANY_REQUESTS, Json(payload)).into_response();
    }
    next.run(request).await
}

pub(crate) async fn validate_handler<V, O, N>(
    State(service): State<Arc<EligibilityLookupService<V, O, N>>>,
    payload: Result<Json<AddressRequest>, JsonRejection>,
) -> Response
where
    V: AddressValidator + 'static,
    O: OverlayProvider + 'static,
    N: NotificationLog + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.validate_address(&request.address).await {
        Ok(candidate) => (StatusCode::OK, Json(candidate)).into_response(),
        Err(err) => lookup_error_response(&err),
    }
}

pub(crate) async fn overlay_handler<V, O, N>(
    State(service): State<Arc<EligibilityLookupService<V, O, N>>>,
    payload: Result<Json<OverlayRequest>, JsonRejection>,
) -> Response
where
    V: AddressValidator + 'static,
    O: OverlayProvider + 'static,
    N: NotificationLog + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service
        .overlay(request.lat, request.lon, request.zipcode.as_deref())
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => lookup_error_response(&err),
    }
}

pub(crate) async fn lookup_handler<V, O, N>(
    State(service): State<Arc<EligibilityLookupService<V, O, N>>>,
    payload: Result<Json<AddressRequest>, JsonRejection>,
) -> Response
where
    V: AddressValidator + 'static,
    O: OverlayProvider + 'static,
    N: NotificationLog + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.lookup(&request.address).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => lookup_error_response(&err),
    }
}

pub(crate) async fn notify_handler<V, O, N>(
    State(service): State<Arc<EligibilityLookupService<V, O, N>>>,
    payload: Result<Json<NotifyRequest>, JsonRejection>,
) -> Response
where
    V: AddressValidator + 'static,
    O: OverlayProvider + 'static,
    N: NotificationLog + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match service.record_notification(&request.email, request.tract.as_deref()) {
        Ok(_) => {
            let payload = json!({
                "success": true,
                "message": "Email saved for notifications.",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => lookup_error_response(&err),
    }
}

pub(crate) async fn batch_handler<V, O, N>(
    State(service): State<Arc<EligibilityLookupService<V, O, N>>>,
    body: String,
) -> Response
where
    V: AddressValidator + 'static,
    O: OverlayProvider + 'static,
    N: NotificationLog + 'static,
{
    let addresses = match parse_addresses(body.as_bytes()) {
        Ok(addresses) => addresses,
        Err(err) => return lookup_error_response(&err),
    };

    let report = service.process_batch(&addresses).await;
    match report.to_csv_bytes() {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{BATCH_FILENAME}\""),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => {
            error!(%err, "failed to serialize batch results");
            let payload = json!({ "error": "Batch processing failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({ "error": rejection.body_text() });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

/// Maps a lookup failure onto its HTTP status and `{"error": ...}` body.
pub fn lookup_error_response(err: &LookupError) -> Response {
    let (status, message) = match err {
        LookupError::ClientInput(message) => (StatusCode::BAD_REQUEST, message.clone()),
        LookupError::NoMatch => (StatusCode::NOT_FOUND, "No match found".to_string()),
        LookupError::UpstreamFormat { .. } | LookupError::UpstreamTransport { .. } => {
            warn!(%err, "upstream lookup failed");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        LookupError::Notification(source) => {
            error!(%source, "notification log append failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save email".to_string(),
            )
        }
    };
    (status, Json(json!({ "error": message }))).into_response()
}

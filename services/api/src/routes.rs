use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use eligibility_lookup::workflows::eligibility::{
    eligibility_router, AddressValidator, AdmissionLimiter, EligibilityLookupService,
    NotificationLog, OverlayProvider,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes<V, O, N>(
    service: Arc<EligibilityLookupService<V, O, N>>,
    limiter: Option<Arc<AdmissionLimiter>>,
) -> axum::Router
where
    V: AddressValidator + 'static,
    O: OverlayProvider + 'static,
    N: NotificationLog + 'static,
{
    eligibility_router(service, limiter)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    if ready {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

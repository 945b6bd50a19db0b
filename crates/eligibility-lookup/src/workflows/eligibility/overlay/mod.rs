//! Geographic overlay normalization.
//!
//! The overlay service sometimes wraps its JSON in an HTML page, so the raw body
//! goes through an ordered chain of parsing strategies before any field is read.
//! Nothing past this module ever sees the raw payload.

mod payload;

use async_trait::async_trait;
use tracing::debug;

use super::domain::OverlayResult;
use super::error::{Collaborator, LookupError, TransportError};

/// Geographic overlay collaborator returning the raw response body.
#[async_trait]
pub trait OverlayProvider: Send + Sync {
    async fn locate(&self, lat: f64, lon: f64) -> Result<String, TransportError>;
}

/// Rejects absent or falsy coordinates.
///
/// A coordinate of exactly 0 is rejected as well.
pub fn require_coordinates(lat: Option<f64>, lon: Option<f64>) -> Result<(f64, f64), LookupError> {
    match (lat.filter(is_truthy), lon.filter(is_truthy)) {
        (Some(lat), Some(lon)) => Ok((lat, lon)),
        _ => Err(LookupError::client("Missing lat/lon input")),
    }
}

fn is_truthy(value: &f64) -> bool {
    *value != 0.0 && !value.is_nan()
}

pub async fn overlay_coordinates<O>(
    provider: &O,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<OverlayResult, LookupError>
where
    O: OverlayProvider + ?Sized,
{
    let (lat, lon) = require_coordinates(lat, lon)?;

    let body = provider
        .locate(lat, lon)
        .await
        .map_err(|source| LookupError::UpstreamTransport {
            service: Collaborator::GeoOverlay,
            source,
        })?;

    normalize_overlay_body(&body)
}

/// Parses a raw overlay body into an [`OverlayResult`].
pub fn normalize_overlay_body(body: &str) -> Result<OverlayResult, LookupError> {
    let (document, strategy) = payload::parse_payload(body).ok_or_else(|| {
        LookupError::format(Collaborator::GeoOverlay, "response was not valid JSON")
    })?;
    debug!(strategy, "overlay payload parsed");

    if let Some(message) = payload::error_message(&document) {
        return Err(LookupError::format(Collaborator::GeoOverlay, message));
    }

    Ok(payload::overlay_result(&document))
}

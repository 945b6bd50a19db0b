use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::domain::AddressCandidate;
use super::error::{Collaborator, LookupError, TransportError};

/// Address-validation collaborator. Implementations return the raw candidate
/// payload; interpretation happens in [`candidate_from_response`].
#[async_trait]
pub trait AddressValidator: Send + Sync {
    async fn street_address(&self, address: &str) -> Result<Value, TransportError>;
}

/// Validates a free-text address and returns the first candidate.
pub async fn validate_address<V>(validator: &V, address: &str) -> Result<AddressCandidate, LookupError>
where
    V: AddressValidator + ?Sized,
{
    let address = address.trim();
    if address.is_empty() {
        return Err(LookupError::client("Missing address input"));
    }

    let response = validator
        .street_address(address)
        .await
        .map_err(|source| LookupError::UpstreamTransport {
            service: Collaborator::AddressValidation,
            source,
        })?;

    candidate_from_response(&response)
}

/// First-match policy: the first element of a non-empty list is authoritative.
pub fn candidate_from_response(response: &Value) -> Result<AddressCandidate, LookupError> {
    let candidate = match response.as_array().and_then(|candidates| candidates.first()) {
        Some(candidate) => candidate,
        None => {
            debug!(response = %response, "address validation returned no candidates");
            return Err(LookupError::NoMatch);
        }
    };

    let metadata = candidate.get("metadata");
    let lat = metadata.and_then(|meta| meta.get("latitude")).and_then(Value::as_f64);
    let lon = metadata.and_then(|meta| meta.get("longitude")).and_then(Value::as_f64);
    let (lat, lon) = match (lat, lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(LookupError::format(
                Collaborator::AddressValidation,
                "No coordinates returned for the matched address",
            ))
        }
    };

    let standardized = ["delivery_line_1", "last_line"]
        .iter()
        .filter_map(|field| candidate.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let zipcode = candidate
        .get("components")
        .and_then(|components| components.get("zipcode"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|zip| !zip.is_empty())
        .map(str::to_string);

    Ok(AddressCandidate {
        standardized,
        lat,
        lon,
        zipcode,
    })
}

//! HTTP implementations of the two remote collaborators.
//!
//! Each call is a single attempt with no retry or timeout layer.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use super::address::AddressValidator;
use super::error::TransportError;
use super::overlay::OverlayProvider;

/// Smarty US street-address client.
#[derive(Debug, Clone)]
pub struct SmartyStreetClient {
    client: Client,
    base_url: String,
    auth_id: String,
    auth_token: String,
}

impl SmartyStreetClient {
    pub fn new(client: Client, base_url: impl Into<String>, auth_id: String, auth_token: String) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            auth_id,
            auth_token,
        }
    }

    fn request_url(&self, address: &str) -> Result<Url, TransportError> {
        let endpoint = format!("{}/street-address", self.base_url.trim_end_matches('/'));
        Url::parse_with_params(
            &endpoint,
            &[
                ("auth-id", self.auth_id.as_str()),
                ("auth-token", self.auth_token.as_str()),
                ("street", address),
            ],
        )
        .map_err(|err| TransportError(format!("invalid address validation url: {err}")))
    }
}

#[async_trait]
impl AddressValidator for SmartyStreetClient {
    async fn street_address(&self, address: &str) -> Result<Value, TransportError> {
        let url = self.request_url(address)?;
        let response = self.client.get(url).send().await?;
        debug!(status = %response.status(), "address validation responded");
        Ok(response.json::<Value>().await?)
    }
}

/// ArcGIS geoprocessing task returning tract and screening attributes.
#[derive(Debug, Clone)]
pub struct ArcGisOverlayClient {
    client: Client,
    execute_url: String,
}

impl ArcGisOverlayClient {
    pub fn new(client: Client, execute_url: impl Into<String>) -> Self {
        Self {
            client,
            execute_url: execute_url.into(),
        }
    }

    fn request_url(&self, lat: f64, lon: f64) -> Result<Url, TransportError> {
        let longitude = lon.to_string();
        let latitude = lat.to_string();
        Url::parse_with_params(
            &self.execute_url,
            &[
                ("longitude", longitude.as_str()),
                ("latitude", latitude.as_str()),
                ("returnZ", "false"),
                ("returnM", "false"),
                ("returnTrueCurves", "false"),
                ("returnFeatureCollection", "false"),
                ("returnColumnName", "false"),
                ("simplifyFeatures", "true"),
                ("context", ""),
                ("f", "pjson"),
            ],
        )
        .map_err(|err| TransportError(format!("invalid overlay url: {err}")))
    }
}

#[async_trait]
impl OverlayProvider for ArcGisOverlayClient {
    /// Returns the body as text; it is not always JSON.
    async fn locate(&self, lat: f64, lon: f64) -> Result<String, TransportError> {
        let url = self.request_url(lat, lon)?;
        let response = self.client.get(url).send().await?;
        debug!(status = %response.status(), "overlay responded");
        Ok(response.text().await?)
    }
}

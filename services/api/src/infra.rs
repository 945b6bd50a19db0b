use eligibility_lookup::config::AppConfig;
use eligibility_lookup::error::AppError;
use eligibility_lookup::workflows::eligibility::{
    AdmissionLimiter, ArcGisOverlayClient, CsvNotificationLog, EligibilityLookupService,
    ReferenceData, SmartyStreetClient,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

const USER_AGENT: &str = concat!("eligibility-lookup/", env!("CARGO_PKG_VERSION"));

pub(crate) type LiveService =
    EligibilityLookupService<SmartyStreetClient, ArcGisOverlayClient, CsvNotificationLog>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads reference tables and wires the HTTP collaborators. Fails before any
/// request is served when a table or a credential is missing.
pub(crate) fn build_service(config: &AppConfig) -> Result<Arc<LiveService>, AppError> {
    let (auth_id, auth_token) = config.upstream.smarty_credentials()?;
    let reference = ReferenceData::load(&config.reference)?;

    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let validator = SmartyStreetClient::new(
        client.clone(),
        config.upstream.smarty_base_url.clone(),
        auth_id,
        auth_token,
    );
    let overlay = ArcGisOverlayClient::new(client, config.upstream.overlay_url.clone());
    let notifications = CsvNotificationLog::new(config.notifications.log_path.clone());

    info!(
        tracts = reference.tract_count(),
        notify_log = %notifications.path().display(),
        "eligibility service assembled"
    );

    Ok(Arc::new(EligibilityLookupService::new(
        Arc::new(reference),
        Arc::new(validator),
        Arc::new(overlay),
        Arc::new(notifications),
        config.program.decision_policy(),
    )))
}

pub(crate) fn admission_limiter(config: &AppConfig) -> Option<Arc<AdmissionLimiter>> {
    config
        .admission
        .validate_per_second
        .map(|limit| Arc::new(AdmissionLimiter::per_second(limit)))
}

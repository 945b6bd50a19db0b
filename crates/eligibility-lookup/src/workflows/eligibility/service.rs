use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::address::{self, AddressValidator};
use super::decision::{DecisionEngine, DecisionInput, DecisionPolicy};
use super::domain::{AddressCandidate, EligibilityOutcome, NotificationRecord, OverlayResult};
use super::error::LookupError;
use super::notify::{build_notification, NotificationLog};
use super::overlay::{self, OverlayProvider};
use super::reference::ReferenceData;

/// Validation, overlay, and decision for one address.
#[derive(Debug, Clone, Serialize)]
pub struct LookupReport {
    #[serde(flatten)]
    pub candidate: AddressCandidate,
    #[serde(skip)]
    pub overlay: OverlayResult,
    #[serde(flatten)]
    pub outcome: EligibilityOutcome,
}

/// Overlay attributes together with the decision they produced.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub overlay: OverlayResult,
    pub outcome: EligibilityOutcome,
}

/// Service composing the collaborators, the reference tables, and the decision engine.
pub struct EligibilityLookupService<V, O, N> {
    reference: Arc<ReferenceData>,
    validator: Arc<V>,
    overlay: Arc<O>,
    notifications: Arc<N>,
    engine: Arc<DecisionEngine>,
}

impl<V, O, N> EligibilityLookupService<V, O, N>
where
    V: AddressValidator + 'static,
    O: OverlayProvider + 'static,
    N: NotificationLog + 'static,
{
    pub fn new(
        reference: Arc<ReferenceData>,
        validator: Arc<V>,
        overlay: Arc<O>,
        notifications: Arc<N>,
        policy: DecisionPolicy,
    ) -> Self {
        Self {
            reference,
            validator,
            overlay,
            notifications,
            engine: Arc::new(DecisionEngine::new(policy)),
        }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn policy(&self) -> &DecisionPolicy {
        self.engine.policy()
    }

    /// Geocode a free-text address, returning the first candidate.
    pub async fn validate_address(&self, address: &str) -> Result<AddressCandidate, LookupError> {
        address::validate_address(self.validator.as_ref(), address).await
    }

    /// Overlay coordinates and decide eligibility.
    pub async fn overlay(
        &self,
        lat: Option<f64>,
        lon: Option<f64>,
        zipcode: Option<&str>,
    ) -> Result<EligibilityOutcome, LookupError> {
        self.assess(lat, lon, zipcode)
            .await
            .map(|assessment| assessment.outcome)
    }

    pub async fn assess(
        &self,
        lat: Option<f64>,
        lon: Option<f64>,
        zipcode: Option<&str>,
    ) -> Result<Assessment, LookupError> {
        let overlay = overlay::overlay_coordinates(self.overlay.as_ref(), lat, lon).await?;
        let outcome = self.decide(&overlay, zipcode);
        Ok(Assessment { overlay, outcome })
    }

    /// Full chain for one address: validate, overlay, decide.
    pub async fn lookup(&self, address: &str) -> Result<LookupReport, LookupError> {
        let candidate = self.validate_address(address).await?;
        let Assessment { overlay, outcome } = self
            .assess(
                Some(candidate.lat),
                Some(candidate.lon),
                candidate.zipcode.as_deref(),
            )
            .await?;

        Ok(LookupReport {
            candidate,
            overlay,
            outcome,
        })
    }

    /// Applies the decision engine to already-normalized overlay attributes.
    pub fn decide(&self, overlay: &OverlayResult, zipcode: Option<&str>) -> EligibilityOutcome {
        let tract = overlay.tract();
        let tract_record = tract.as_ref().and_then(|tract| self.reference.tract(tract));
        let county_income = zipcode.and_then(|zip| self.reference.income_for_zip(zip));

        let outcome = self.engine.decide(&DecisionInput {
            tract: tract.as_ref(),
            tract_record,
            overlay_county: overlay.county.as_deref(),
            priority_label: overlay.priority_label.as_deref(),
            county_income,
        });

        debug!(
            tract = %outcome.tract,
            region = %outcome.region,
            eligible = outcome.eligible,
            action = outcome.action.label(),
            "eligibility decided"
        );
        outcome
    }

    /// Validate and append a notification request. Invalid input never reaches the log.
    pub fn record_notification(
        &self,
        email: &str,
        tract: Option<&str>,
    ) -> Result<NotificationRecord, LookupError> {
        let record = build_notification(email, tract, Utc::now())?;
        self.notifications.append(&record)?;
        info!(tract = %record.tract, "notification request saved");
        Ok(record)
    }
}

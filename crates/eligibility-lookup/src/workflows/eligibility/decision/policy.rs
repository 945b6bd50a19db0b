use reqwest::Url;
use serde::{Deserialize, Serialize};

/// What an in-region but not-yet-eligible visitor is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IneligibleAction {
    /// Capture an email address inline through the notification log.
    CollectEmail,
    /// Send the visitor to an external signup form.
    VisitSignup,
}

impl IneligibleAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "collect-email" | "collect_email" | "email" => Some(Self::CollectEmail),
            "visit-signup" | "visit_signup" | "signup" => Some(Self::VisitSignup),
            _ => None,
        }
    }
}

/// Deployment settings that shape outcomes without changing which branch is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    pub general_redirect_url: String,
    pub region_redirect_base: String,
    pub ineligible_action: IneligibleAction,
    pub signup_url: Option<String>,
}

impl DecisionPolicy {
    /// Appends the region label as one percent-encoded path segment.
    pub fn region_redirect_url(&self, region: &str) -> String {
        let fallback = || {
            format!(
                "{}/{}",
                self.region_redirect_base.trim_end_matches('/'),
                region
            )
        };
        let Ok(mut url) = Url::parse(&self.region_redirect_base) else {
            return fallback();
        };
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().push(region);
            }
            Err(()) => return fallback(),
        }
        url.into()
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            general_redirect_url: "https://program-site/general".to_string(),
            region_redirect_base: "https://program-site".to_string(),
            ineligible_action: IneligibleAction::CollectEmail,
            signup_url: None,
        }
    }
}

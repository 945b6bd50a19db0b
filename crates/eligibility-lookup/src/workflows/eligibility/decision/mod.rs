mod policy;
mod priority;
mod rules;

pub use policy::{DecisionPolicy, IneligibleAction};
pub use rules::{classify, DecisionBranch};

pub(crate) use priority::assess_priority;

use super::domain::{
    EligibilityAction, EligibilityOutcome, IncomeRecord, TractId, TractRecord,
};

const UNKNOWN_REGION: &str = "Unknown";

/// Everything the engine needs for one decision, already normalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionInput<'a> {
    pub tract: Option<&'a TractId>,
    pub tract_record: Option<&'a TractRecord>,
    pub overlay_county: Option<&'a str>,
    pub priority_label: Option<&'a str>,
    pub county_income: Option<&'a IncomeRecord>,
}

/// Stateless engine applying the deployment policy to a normalized lookup.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    policy: DecisionPolicy,
}

impl DecisionEngine {
    pub fn new(policy: DecisionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Total over its inputs: every combination maps to exactly one outcome.
    pub fn decide(&self, input: &DecisionInput<'_>) -> EligibilityOutcome {
        let tract = input.tract.map(TractId::display).unwrap_or_default().to_string();
        let priority_population = assess_priority(input.priority_label);
        let county_income = input.county_income.cloned();

        let mut outcome = EligibilityOutcome {
            success: true,
            eligible: false,
            tract,
            message: String::new(),
            region: String::new(),
            action: EligibilityAction::None,
            link: None,
            signup_url: None,
            priority_population,
            county_income,
        };

        match classify(input.tract_record) {
            DecisionBranch::TractNotFound => {
                let shown = if outcome.tract.is_empty() {
                    "unknown"
                } else {
                    outcome.tract.as_str()
                };
                outcome.message = format!("Tract {shown} not found in dataset.");
                outcome.region = input
                    .overlay_county
                    .map(str::trim)
                    .filter(|county| !county.is_empty())
                    .unwrap_or(UNKNOWN_REGION)
                    .to_string();
                outcome.action = EligibilityAction::Redirect;
                outcome.link = Some(self.policy.general_redirect_url.clone());
            }
            DecisionBranch::OutsideRegion(region) => {
                outcome.message = format!(
                    "You are located in the {region} region, which is outside the area this program currently serves."
                );
                outcome.region = region.label().to_string();
                outcome.action = EligibilityAction::Redirect;
                outcome.link = Some(self.policy.region_redirect_url(region.label()));
            }
            DecisionBranch::AwaitingExpansion => {
                outcome.region = "Central".to_string();
                match self.policy.ineligible_action {
                    IneligibleAction::CollectEmail => {
                        outcome.message = "You are in the Central region but not yet eligible. Leave your email to be notified when eligibility expands.".to_string();
                        outcome.action = EligibilityAction::CollectEmail;
                    }
                    IneligibleAction::VisitSignup => {
                        outcome.message = "You are in the Central region but not yet eligible. Join our mailing list to be notified when eligibility expands.".to_string();
                        outcome.action = EligibilityAction::VisitSignup;
                        outcome.signup_url = self.policy.signup_url.clone();
                    }
                }
            }
            DecisionBranch::Eligible => {
                outcome.eligible = true;
                outcome.region = "Central".to_string();
                outcome.message = "You are in the Central region and eligible!".to_string();
            }
        }

        outcome
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Width of a census tract GEOID (state + county + tract).
pub const TRACT_WIDTH: usize = 11;

/// Census tract identifier, always held in its zero-padded 11 character form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TractId(String);

impl TractId {
    /// Trims and left-pads with `'0'`; identifiers already 11+ characters wide are kept.
    pub fn normalize(raw: &str) -> Self {
        Self(format!("{:0>width$}", raw.trim(), width = TRACT_WIDTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public-facing form: exactly one leading zero is dropped when present.
    pub fn display(&self) -> &str {
        self.0.strip_prefix('0').unwrap_or(&self.0)
    }
}

impl fmt::Display for TractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Program region a tract belongs to. Only `Central` is served today.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Region {
    Central,
    Northern,
    Southern,
    Other(String),
}

impl Region {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "central" => Self::Central,
            "northern" => Self::Northern,
            "southern" => Self::Southern,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Central => "Central",
            Self::Northern => "Northern",
            Self::Southern => "Southern",
            Self::Other(label) => label,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Central)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Row of the tract eligibility table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TractRecord {
    pub tract: TractId,
    pub region: Region,
    pub eligible: bool,
}

/// Household income limits for a ZIP code, keyed by household size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomeRecord {
    pub zipcode: String,
    pub county: String,
    pub income_by_household: BTreeMap<u8, u64>,
}

/// First candidate returned by the address-validation service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressCandidate {
    pub standardized: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
}

/// Attributes pulled from one overlay response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlayResult {
    pub raw_tract: Option<String>,
    pub priority_label: Option<String>,
    pub county: Option<String>,
    pub assembly_district: Option<String>,
    pub senate_district: Option<String>,
    pub climate_zone: Option<String>,
    pub dac: Option<String>,
    pub lic: Option<String>,
}

impl OverlayResult {
    pub fn tract(&self) -> Option<TractId> {
        self.raw_tract.as_deref().map(TractId::normalize)
    }
}

/// Follow-up the caller should present alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EligibilityAction {
    None,
    Redirect,
    CollectEmail,
    VisitSignup,
}

impl EligibilityAction {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Redirect => "redirect",
            Self::CollectEmail => "collect-email",
            Self::VisitSignup => "visit-signup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityPopulation {
    pub is_priority: bool,
    pub label: String,
}

impl PriorityPopulation {
    /// Column value used by the batch export.
    pub fn eligibility_label(&self) -> &'static str {
        if self.label.is_empty() {
            "Unknown"
        } else if self.is_priority {
            "Eligible"
        } else {
            "Not Eligible"
        }
    }
}

/// Terminal result of one lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityOutcome {
    pub success: bool,
    pub eligible: bool,
    pub tract: String,
    pub message: String,
    pub region: String,
    #[serde(skip_serializing_if = "EligibilityAction::is_none")]
    pub action: EligibilityAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signup_url: Option<String>,
    pub priority_population: PriorityPopulation,
    pub county_income: Option<IncomeRecord>,
}

/// Append-only entry written when a visitor asks to hear about expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRecord {
    pub timestamp: String,
    pub tract: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tract_padding_is_idempotent_and_fixed_width() {
        for raw in ["6037101110", "06037101110", "1", "", "12345678901"] {
            let once = TractId::normalize(raw);
            let twice = TractId::normalize(once.as_str());
            assert_eq!(once, twice);
            assert_eq!(once.as_str().len(), TRACT_WIDTH);
        }
    }

    #[test]
    fn display_drops_exactly_one_leading_zero() {
        assert_eq!(TractId::normalize("6037101110").display(), "6037101110");
        assert_eq!(TractId::normalize("37101110").display(), "0037101110");
        assert_eq!(TractId::normalize("16037101110").display(), "16037101110");
    }

    #[test]
    fn normalize_trims_surrounding_whitespace() {
        assert_eq!(TractId::normalize(" 6019000100 ").as_str(), "06019000100");
    }

    #[test]
    fn region_parse_recognizes_known_labels() {
        assert_eq!(Region::parse(" central "), Region::Central);
        assert_eq!(Region::parse("Northern"), Region::Northern);
        assert_eq!(Region::parse("SOUTHERN"), Region::Southern);
        assert_eq!(Region::parse("Coastal"), Region::Other("Coastal".to_string()));
        assert!(Region::Central.is_primary());
        assert!(!Region::parse("Coastal").is_primary());
    }

    #[test]
    fn action_serializes_kebab_case() {
        let value = serde_json::to_value(EligibilityAction::CollectEmail).expect("serializes");
        assert_eq!(value, serde_json::json!("collect-email"));
        assert_eq!(EligibilityAction::VisitSignup.label(), "visit-signup");
    }

    #[test]
    fn priority_eligibility_label_covers_unknown() {
        let unknown = PriorityPopulation {
            is_priority: false,
            label: String::new(),
        };
        assert_eq!(unknown.eligibility_label(), "Unknown");
        let priority = PriorityPopulation {
            is_priority: true,
            label: "Disadvantaged Community".to_string(),
        };
        assert_eq!(priority.eligibility_label(), "Eligible");
    }
}

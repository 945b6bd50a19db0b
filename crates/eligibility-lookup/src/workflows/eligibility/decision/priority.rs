use crate::workflows::eligibility::domain::PriorityPopulation;

const PREVIEW_PREFIX: &str = "preview for";

/// Screening labels that name a low-income area rather than a priority population.
const INELIGIBLE_LABELS: &[&str] = &[
    "low-income community",
    "not a priority population area: low-income households are eligible",
];

pub(crate) fn normalize_label(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    if let Some(rest) = lowered.strip_prefix(PREVIEW_PREFIX) {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return rest.trim().to_string();
        }
    }
    lowered
}

pub(crate) fn assess_priority(label: Option<&str>) -> PriorityPopulation {
    let label = label.map(str::trim).unwrap_or_default();
    let normalized = normalize_label(label);
    let is_priority = !normalized.is_empty() && !INELIGIBLE_LABELS.contains(&normalized.as_str());

    PriorityPopulation {
        is_priority,
        label: label.to_string(),
    }
}

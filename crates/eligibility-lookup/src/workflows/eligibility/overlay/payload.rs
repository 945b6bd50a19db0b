use crate::workflows::eligibility::domain::OverlayResult;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

type Strategy = fn(&str) -> Option<Value>;

/// Tried in order; the first strategy that yields a document wins.
const STRATEGIES: &[(&str, Strategy)] = &[("json", parse_strict), ("embedded-json", parse_embedded)];

static EMBEDDED_OBJECT: OnceLock<Regex> = OnceLock::new();

fn embedded_object() -> &'static Regex {
    EMBEDDED_OBJECT.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("embedded object pattern"))
}

/// Returns the parsed document and the name of the strategy that produced it.
pub(crate) fn parse_payload(body: &str) -> Option<(Value, &'static str)> {
    STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(body).map(|value| (value, *name)))
}

fn parse_strict(body: &str) -> Option<Value> {
    serde_json::from_str(body.trim()).ok()
}

/// Pulls the outermost `{ ... }` span out of wrapper text such as an HTML page.
fn parse_embedded(body: &str) -> Option<Value> {
    let span = embedded_object().find(body)?;
    serde_json::from_str(span.as_str()).ok()
}

/// Message of an explicit `{"error": {...}}` envelope, when the service sent one.
pub(crate) fn error_message(payload: &Value) -> Option<String> {
    if payload.get("results").is_some() {
        return None;
    }
    let error = payload.get("error")?;
    let message = error
        .get("message")
        .and_then(coerce_string)
        .unwrap_or_else(|| error.to_string());
    Some(message)
}

/// Reads `results[0].value`; a missing envelope yields an empty result.
pub(crate) fn overlay_result(payload: &Value) -> OverlayResult {
    let empty = Map::new();
    let value = payload
        .get("results")
        .and_then(|results| results.get(0))
        .and_then(|first| first.get("value"))
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let field = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| value.get(*name).and_then(coerce_string))
    };

    OverlayResult {
        raw_tract: field(&["tract", "GeoID"]),
        priority_label: field(&["carb_priority_pops_4"]),
        county: field(&["county"]),
        assembly_district: field(&["AssemblyDist"]),
        senate_district: field(&["SenateDistrict"]),
        climate_zone: field(&["CA_climate_zone"]),
        dac: field(&["dac"]),
        lic: field(&["lic"]),
    }
}

/// Strings are trimmed; numbers keep their integer form so tracts survive.
fn coerce_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => {
            if let Some(int) = number.as_u64() {
                int.to_string()
            } else if let Some(int) = number.as_i64() {
                int.to_string()
            } else {
                match number.as_f64() {
                    Some(float) if float.fract() == 0.0 => format!("{float:.0}"),
                    Some(float) => float.to_string(),
                    None => return None,
                }
            }
        }
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

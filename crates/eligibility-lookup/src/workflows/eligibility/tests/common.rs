use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{json, Value};

use crate::workflows::eligibility::domain::{
    IncomeRecord, NotificationRecord, Region, TractId, TractRecord,
};
use crate::workflows::eligibility::{
    AddressValidator, DecisionPolicy, EligibilityLookupService, NotificationError,
    NotificationLog, OverlayProvider, ReferenceData, TransportError,
};

pub(super) const FRESNO_ADDRESS: &str = "2220 Tulare St, Fresno CA";
pub(super) const WAITLIST_ADDRESS: &str = "100 Waitlist Ave, Fresno CA";
pub(super) const SOUTHERN_ADDRESS: &str = "1 Pier Rd, Los Angeles CA";
pub(super) const UNMAPPED_ADDRESS: &str = "9 Unmapped Ln, Fresno CA";

pub(super) type TestService = EligibilityLookupService<ScriptedValidator, ScriptedOverlay, MemoryLog>;

pub(super) fn reference_data() -> ReferenceData {
    let tracts = vec![
        tract_record("6019000100", Region::Central, true),
        tract_record("6019000200", Region::Central, false),
        tract_record("6037101110", Region::Southern, true),
    ];
    let income = vec![IncomeRecord {
        zipcode: "93721".to_string(),
        county: "Fresno".to_string(),
        income_by_household: BTreeMap::from([(1, 62_400), (2, 71_300), (3, 80_200)]),
    }];
    ReferenceData::from_records(tracts, income)
        .with_climate_zones(vec![("93721".to_string(), "13".to_string())])
}

fn tract_record(tract: &str, region: Region, eligible: bool) -> TractRecord {
    TractRecord {
        tract: TractId::normalize(tract),
        region,
        eligible,
    }
}

pub(super) fn smarty_candidate(line_one: &str, last_line: &str, lat: f64, lon: f64, zip: &str) -> Value {
    json!([{
        "delivery_line_1": line_one,
        "last_line": last_line,
        "components": { "zipcode": zip },
        "metadata": { "latitude": lat, "longitude": lon }
    }])
}

pub(super) fn overlay_body(value: Value) -> String {
    json!({ "results": [{ "paramName": "output", "value": value }] }).to_string()
}

/// Address validator answering from a fixed table; unknown addresses get no candidates.
#[derive(Default)]
pub(super) struct ScriptedValidator {
    responses: HashMap<String, Value>,
    failing: bool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedValidator {
    pub(super) fn with(mut self, address: &str, response: Value) -> Self {
        self.responses.insert(address.to_string(), response);
        self
    }

    pub(super) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl AddressValidator for ScriptedValidator {
    async fn street_address(&self, address: &str) -> Result<Value, TransportError> {
        self.calls.lock().expect("lock").push(address.to_string());
        if self.failing {
            return Err(TransportError("connection refused".to_string()));
        }
        Ok(self
            .responses
            .get(address)
            .cloned()
            .unwrap_or_else(|| json!([])))
    }
}

/// Overlay provider keyed by latitude.
#[derive(Default)]
pub(super) struct ScriptedOverlay {
    bodies: Vec<(f64, String)>,
    calls: Mutex<Vec<(f64, f64)>>,
}

impl ScriptedOverlay {
    pub(super) fn with(mut self, lat: f64, body: impl Into<String>) -> Self {
        self.bodies.push((lat, body.into()));
        self
    }

    pub(super) fn calls(&self) -> Vec<(f64, f64)> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl OverlayProvider for ScriptedOverlay {
    async fn locate(&self, lat: f64, lon: f64) -> Result<String, TransportError> {
        self.calls.lock().expect("lock").push((lat, lon));
        self.bodies
            .iter()
            .find(|(known, _)| (*known - lat).abs() < 1e-9)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| TransportError("overlay unavailable".to_string()))
    }
}

#[derive(Clone, Default)]
pub(super) struct MemoryLog {
    records: Arc<Mutex<Vec<NotificationRecord>>>,
}

impl MemoryLog {
    pub(super) fn records(&self) -> Vec<NotificationRecord> {
        self.records.lock().expect("lock").clone()
    }
}

impl NotificationLog for MemoryLog {
    fn append(&self, record: &NotificationRecord) -> Result<(), NotificationError> {
        self.records.lock().expect("lock").push(record.clone());
        Ok(())
    }
}

pub(super) struct BrokenLog;

impl NotificationLog for BrokenLog {
    fn append(&self, _record: &NotificationRecord) -> Result<(), NotificationError> {
        Err(NotificationError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only filesystem",
        )))
    }
}

/// Validator and overlay covering one address per decision branch.
pub(super) fn scripted_collaborators() -> (ScriptedValidator, ScriptedOverlay) {
    let validator = ScriptedValidator::default()
        .with(
            FRESNO_ADDRESS,
            smarty_candidate("2220 Tulare St", "Fresno CA 93721-2104", 36.7365, -119.7871, "93721"),
        )
        .with(
            WAITLIST_ADDRESS,
            smarty_candidate("100 Waitlist Ave", "Fresno CA 93721", 36.7401, -119.7902, "93721"),
        )
        .with(
            SOUTHERN_ADDRESS,
            smarty_candidate("1 Pier Rd", "Los Angeles CA 90012", 34.0522, -118.2437, "90012"),
        )
        .with(
            UNMAPPED_ADDRESS,
            smarty_candidate("9 Unmapped Ln", "Fresno CA 93721", 36.7501, -119.8001, "93721"),
        );

    let overlay = ScriptedOverlay::default()
        .with(
            36.7365,
            overlay_body(json!({
                "tract": 6019000100u64,
                "county": "Fresno",
                "carb_priority_pops_4": "Disadvantaged Community",
                "AssemblyDist": 31,
                "SenateDistrict": 14,
                "dac": "Yes",
                "lic": "No"
            })),
        )
        .with(
            36.7401,
            format!(
                "<html><body><pre>{}</pre></body></html>",
                overlay_body(json!({
                    "tract": "6019000200",
                    "county": "Fresno",
                    "carb_priority_pops_4": "Low-income community",
                    "CA_climate_zone": "12"
                }))
            ),
        )
        .with(
            34.0522,
            overlay_body(json!({ "tract": "6037101110", "county": "Los Angeles" })),
        )
        .with(
            36.7501,
            overlay_body(json!({ "tract": "6019999999", "county": "Fresno" })),
        );

    (validator, overlay)
}

pub(super) fn build_service(policy: DecisionPolicy) -> (Arc<TestService>, Arc<ScriptedValidator>, MemoryLog) {
    let (validator, overlay) = scripted_collaborators();
    let validator = Arc::new(validator);
    let log = MemoryLog::default();
    let service = EligibilityLookupService::new(
        Arc::new(reference_data()),
        validator.clone(),
        Arc::new(overlay),
        Arc::new(log.clone()),
        policy,
    );
    (Arc::new(service), validator, log)
}

pub(super) fn service_with(validator: ScriptedValidator, overlay: ScriptedOverlay) -> Arc<TestService> {
    Arc::new(EligibilityLookupService::new(
        Arc::new(reference_data()),
        Arc::new(validator),
        Arc::new(overlay),
        Arc::new(MemoryLog::default()),
        DecisionPolicy::default(),
    ))
}

/// Overlay answering every scripted latitude with a body that is not JSON.
pub(super) fn garbled_overlay() -> ScriptedOverlay {
    [36.7365, 36.7401, 34.0522, 36.7501]
        .into_iter()
        .fold(ScriptedOverlay::default(), |overlay, lat| {
            overlay.with(lat, "<html><body>Service temporarily unavailable</body></html>")
        })
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("json body")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    String::from_utf8(body.to_vec()).expect("utf8 body")
}

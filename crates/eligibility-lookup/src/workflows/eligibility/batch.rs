use std::io::{Read, Write};

use serde::Serialize;
use tracing::{info, warn};

use super::address::AddressValidator;
use super::error::LookupError;
use super::notify::NotificationLog;
use super::overlay::OverlayProvider;
use super::reference::ReferenceData;
use super::service::{EligibilityLookupService, LookupReport};

const ADDRESS_COLUMN: &str = "address";
const NOT_AVAILABLE: &str = "N/A";

/// Reads the `address` column in input order, skipping blank cells.
pub fn parse_addresses<R: Read>(reader: R) -> Result<Vec<String>, LookupError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|err| LookupError::client(format!("CSV is empty or invalid format: {err}")))?
        .clone();
    let column = headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(ADDRESS_COLUMN))
        .ok_or_else(|| LookupError::client("CSV must include an 'address' column"))?;

    let mut addresses = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|err| LookupError::client(format!("CSV is empty or invalid format: {err}")))?;
        match record.get(column).map(str::trim) {
            Some(address) if !address.is_empty() => addresses.push(address.to_string()),
            _ => continue,
        }
    }

    if addresses.is_empty() {
        return Err(LookupError::client("CSV is empty or invalid format"));
    }
    Ok(addresses)
}

/// One line of the results export. Error rows carry only the input and the error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchRow {
    pub input_address: String,
    pub standardized_address: String,
    pub zip_code: String,
    pub census_tract: String,
    pub county: String,
    pub region: String,
    pub eligible: String,
    pub message: String,
    pub assembly_district: String,
    pub senate_district: String,
    pub california_climate_zone: String,
    pub disadvantaged_community: String,
    pub low_income_community: String,
    #[serde(rename = "CARB_PriorityPopulation")]
    pub carb_priority_population: String,
    #[serde(rename = "WithinHalfMileOfADisadvantagedCommunity")]
    pub priority_population_eligibility: String,
    pub error: String,
}

impl BatchRow {
    pub fn failed(input: &str, err: &LookupError) -> Self {
        let error = match err {
            LookupError::NoMatch => "Address not found".to_string(),
            other => other.to_string(),
        };
        Self {
            input_address: input.to_string(),
            error,
            ..Self::default()
        }
    }

    pub fn succeeded(input: &str, report: &LookupReport, reference: &ReferenceData) -> Self {
        let overlay = &report.overlay;
        let outcome = &report.outcome;
        let zip_code = report.candidate.zipcode.clone().unwrap_or_default();

        let climate_zone = non_empty(overlay.climate_zone.as_deref())
            .or_else(|| reference.climate_zone_for_zip(&zip_code))
            .unwrap_or(NOT_AVAILABLE)
            .to_string();
        let carb_label = non_empty(Some(outcome.priority_population.label.as_str()))
            .unwrap_or(NOT_AVAILABLE)
            .to_string();

        Self {
            input_address: input.to_string(),
            standardized_address: report.candidate.standardized.clone(),
            zip_code,
            census_tract: outcome.tract.clone(),
            county: overlay.county.clone().unwrap_or_default(),
            region: outcome.region.clone(),
            eligible: outcome.eligible.to_string(),
            message: outcome.message.clone(),
            assembly_district: overlay.assembly_district.clone().unwrap_or_default(),
            senate_district: overlay.senate_district.clone().unwrap_or_default(),
            california_climate_zone: climate_zone,
            disadvantaged_community: overlay.dac.clone().unwrap_or_default(),
            low_income_community: overlay.lic.clone().unwrap_or_default(),
            carb_priority_population: carb_label,
            priority_population_eligibility: outcome
                .priority_population
                .eligibility_label()
                .to_string(),
            error: String::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Rows in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub rows: Vec<BatchRow>,
}

impl BatchReport {
    pub fn failed_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_error()).count()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, csv::Error> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}

impl<V, O, N> EligibilityLookupService<V, O, N>
where
    V: AddressValidator + 'static,
    O: OverlayProvider + 'static,
    N: NotificationLog + 'static,
{
    /// Runs the single-lookup chain over each address sequentially. A failing
    /// row never aborts the batch.
    pub async fn process_batch(&self, addresses: &[String]) -> BatchReport {
        let mut rows = Vec::with_capacity(addresses.len());
        for (index, address) in addresses.iter().enumerate() {
            let row = match self.lookup(address).await {
                Ok(report) => BatchRow::succeeded(address, &report, self.reference()),
                Err(err) => {
                    warn!(row = index + 1, %err, "batch row failed");
                    BatchRow::failed(address, &err)
                }
            };
            rows.push(row);
        }

        let report = BatchReport { rows };
        info!(
            rows = report.rows.len(),
            failed = report.failed_count(),
            "batch processed"
        );
        report
    }
}

//! Static reference tables loaded once before the service accepts requests.
//!
//! Keys are normalized at load time (tracts padded to 11 digits, ZIP codes to
//! five) so request-time lookups are exact string matches against read-only maps.

mod normalizer;
mod parser;

use crate::config::ReferenceConfig;
use crate::workflows::eligibility::domain::{IncomeRecord, TractId, TractRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub(crate) use normalizer::normalize_zip;
use parser::TableError;

#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("failed to read reference table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid reference table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("reference table {path} is missing the '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },
}

impl ReferenceDataError {
    fn from_table(path: &Path, err: TableError) -> Self {
        match err {
            TableError::Csv(source) => Self::Csv {
                path: path.to_path_buf(),
                source,
            },
            TableError::MissingColumn(column) => Self::MissingColumn {
                path: path.to_path_buf(),
                column,
            },
        }
    }
}

/// Immutable lookup tables shared by every request.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    tracts: HashMap<TractId, TractRecord>,
    income_by_zip: HashMap<String, IncomeRecord>,
    climate_zone_by_zip: HashMap<String, String>,
}

impl ReferenceData {
    /// Loads every configured table. The tract and income tables are required;
    /// the climate-zone table is best effort.
    pub fn load(config: &ReferenceConfig) -> Result<Self, ReferenceDataError> {
        let tracts = read_table(&config.tracts_path, parser::parse_tracts)?;
        let income = read_table(&config.income_limits_path, parser::parse_income_limits)?;
        let mut data = Self::from_records(tracts, income);

        if let Some(path) = &config.climate_zones_path {
            match read_table(path, parser::parse_climate_zones) {
                Ok(zones) => data = data.with_climate_zones(zones),
                Err(err) => {
                    warn!(%err, "climate zone table unavailable; ZIP fallback disabled");
                }
            }
        }

        info!(
            tracts = data.tracts.len(),
            zip_codes = data.income_by_zip.len(),
            climate_zones = data.climate_zone_by_zip.len(),
            "reference data loaded"
        );
        Ok(data)
    }

    pub fn from_readers<T: Read, I: Read>(
        tracts: T,
        income_limits: I,
    ) -> Result<Self, ReferenceDataError> {
        let tracts = parser::parse_tracts(tracts)
            .map_err(|err| ReferenceDataError::from_table(Path::new("<tracts>"), err))?;
        let income = parser::parse_income_limits(income_limits)
            .map_err(|err| ReferenceDataError::from_table(Path::new("<income limits>"), err))?;
        Ok(Self::from_records(tracts, income))
    }

    /// The first row wins when a key repeats.
    pub fn from_records(tracts: Vec<TractRecord>, income: Vec<IncomeRecord>) -> Self {
        let mut tract_map = HashMap::with_capacity(tracts.len());
        for record in tracts {
            tract_map.entry(record.tract.clone()).or_insert(record);
        }

        let mut income_map = HashMap::with_capacity(income.len());
        for record in income {
            income_map.entry(record.zipcode.clone()).or_insert(record);
        }

        Self {
            tracts: tract_map,
            income_by_zip: income_map,
            climate_zone_by_zip: HashMap::new(),
        }
    }

    pub fn with_climate_zones<I>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (zip, zone) in zones {
            self.climate_zone_by_zip
                .entry(normalize_zip(&zip))
                .or_insert(zone);
        }
        self
    }

    pub fn tract(&self, tract: &TractId) -> Option<&TractRecord> {
        self.tracts.get(tract)
    }

    pub fn income_for_zip(&self, zipcode: &str) -> Option<&IncomeRecord> {
        if zipcode.trim().is_empty() {
            return None;
        }
        self.income_by_zip.get(&normalize_zip(zipcode))
    }

    pub fn climate_zone_for_zip(&self, zipcode: &str) -> Option<&str> {
        if zipcode.trim().is_empty() {
            return None;
        }
        self.climate_zone_by_zip
            .get(&normalize_zip(zipcode))
            .map(String::as_str)
    }

    pub fn tract_count(&self) -> usize {
        self.tracts.len()
    }
}

fn read_table<T>(
    path: &Path,
    parse: fn(std::fs::File) -> Result<T, TableError>,
) -> Result<T, ReferenceDataError> {
    let file = std::fs::File::open(path).map_err(|source| ReferenceDataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(file).map_err(|err| ReferenceDataError::from_table(path, err))
}

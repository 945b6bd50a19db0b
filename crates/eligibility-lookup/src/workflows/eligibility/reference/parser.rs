use super::normalizer::{
    clean_income, household_size_from_header, normalize_header, normalize_zip,
};
use crate::workflows::eligibility::domain::{IncomeRecord, Region, TractId, TractRecord};
use csv::StringRecord;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

const ZIP_HEADERS: &[&str] = &["zipcode", "zip", "zip code", "zip_code"];
const COUNTY_HEADERS: &[&str] = &["county", "county name"];
const CLIMATE_HEADERS: &[&str] = &["building cz", "climate zone", "building climate zone"];

#[derive(Debug)]
pub(crate) enum TableError {
    Csv(csv::Error),
    MissingColumn(&'static str),
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct TractRow {
    tract: String,
    region: String,
    eligible: String,
}

impl TractRow {
    fn into_record(self) -> TractRecord {
        TractRecord {
            tract: TractId::normalize(&self.tract),
            region: Region::parse(&self.region),
            eligible: !self.eligible.trim().eq_ignore_ascii_case("false"),
        }
    }
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

pub(crate) fn parse_tracts<R: Read>(source: R) -> Result<Vec<TractRecord>, TableError> {
    let mut csv_reader = reader(source);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<TractRow>() {
        let row = row?;
        if row.tract.is_empty() {
            continue;
        }
        records.push(row.into_record());
    }

    Ok(records)
}

pub(crate) fn parse_income_limits<R: Read>(source: R) -> Result<Vec<IncomeRecord>, TableError> {
    let mut csv_reader = reader(source);
    let headers = csv_reader.headers()?.clone();

    let zip_index = column_index(&headers, ZIP_HEADERS).ok_or(TableError::MissingColumn("zipcode"))?;
    let county_index =
        column_index(&headers, COUNTY_HEADERS).ok_or(TableError::MissingColumn("county"))?;
    let size_columns: Vec<(usize, u8)> = headers
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != zip_index && *index != county_index)
        .filter_map(|(index, header)| household_size_from_header(header).map(|size| (index, size)))
        .collect();

    if size_columns.is_empty() {
        return Err(TableError::MissingColumn("household size 1-8"));
    }

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let zip = row.get(zip_index).unwrap_or_default();
        if zip.is_empty() {
            continue;
        }

        let income_by_household: BTreeMap<u8, u64> = size_columns
            .iter()
            .map(|(index, size)| (*size, clean_income(row.get(*index).unwrap_or_default())))
            .collect();

        records.push(IncomeRecord {
            zipcode: normalize_zip(zip),
            county: row.get(county_index).unwrap_or_default().to_string(),
            income_by_household,
        });
    }

    Ok(records)
}

pub(crate) fn parse_climate_zones<R: Read>(
    source: R,
) -> Result<Vec<(String, String)>, TableError> {
    let mut csv_reader = reader(source);
    let headers = csv_reader.headers()?.clone();

    let zip_index = column_index(&headers, ZIP_HEADERS).ok_or(TableError::MissingColumn("Zip Code"))?;
    let zone_index =
        column_index(&headers, CLIMATE_HEADERS).ok_or(TableError::MissingColumn("Building CZ"))?;

    let mut zones = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let zip = row.get(zip_index).unwrap_or_default();
        let zone = row.get(zone_index).unwrap_or_default();
        if zip.is_empty() || zone.is_empty() {
            continue;
        }
        zones.push((normalize_zip(zip), zone.to_string()));
    }

    Ok(zones)
}

fn column_index(headers: &StringRecord, candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| candidates.contains(&normalize_header(header).as_str()))
}

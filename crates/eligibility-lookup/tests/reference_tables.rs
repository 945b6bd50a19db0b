use std::path::PathBuf;

use eligibility_lookup::config::ReferenceConfig;
use eligibility_lookup::workflows::eligibility::domain::{Region, TractId};
use eligibility_lookup::workflows::eligibility::ReferenceData;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

fn bundled_config() -> ReferenceConfig {
    ReferenceConfig {
        tracts_path: data_dir().join("tracts.csv"),
        income_limits_path: data_dir().join("income_limits.csv"),
        climate_zones_path: Some(data_dir().join("climate_zones.csv")),
    }
}

#[test]
fn bundled_tables_load() {
    let data = ReferenceData::load(&bundled_config()).expect("bundled tables load");

    assert_eq!(data.tract_count(), 8);
    let central = data
        .tract(&TractId::normalize("06019000100"))
        .expect("padded and unpadded keys agree");
    assert_eq!(central.region, Region::Central);
    assert!(central.eligible);

    let waitlisted = data
        .tract(&TractId::normalize("6019000200"))
        .expect("waitlisted tract present");
    assert!(!waitlisted.eligible);
}

#[test]
fn income_limits_cover_all_household_sizes() {
    let data = ReferenceData::load(&bundled_config()).expect("bundled tables load");

    let fresno = data.income_for_zip("93721").expect("fresno zip present");
    assert_eq!(fresno.county, "Fresno");
    assert_eq!(fresno.income_by_household.len(), 8);
    assert_eq!(fresno.income_by_household.get(&1), Some(&62_400));
    assert_eq!(fresno.income_by_household.get(&8), Some(&117_650));
    assert!(data.income_for_zip("00000").is_none());
}

#[test]
fn climate_zones_resolve_by_zip() {
    let data = ReferenceData::load(&bundled_config()).expect("bundled tables load");

    assert_eq!(data.climate_zone_for_zip("90012"), Some("9"));
    assert_eq!(data.climate_zone_for_zip("93721-2104"), Some("13"));
}

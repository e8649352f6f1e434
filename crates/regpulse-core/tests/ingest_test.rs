//! Tests for CSV ingestion into record tables.

use proptest::prelude::*;
use regpulse_core::config::IngestConfig;
use regpulse_core::errors::{IngestError, RegpulseErrorCode, SchemaError};
use regpulse_core::ingest::CsvLoader;
use regpulse_core::{Family, Region};

fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_load_dataset_from_configured_files() {
    let dir = tempfile::TempDir::new().unwrap();
    write(
        &dir,
        "bio.csv",
        "date,state,district,pincode,bio_age_5_17,bio_age_17_\n\
         01-03-2025,Goa,North Goa,403001,4,6\n\
         02-03-2025,Goa,South Goa,403601,1,1\n",
    );
    write(
        &dir,
        "demo_1.csv",
        "date,state,district,pincode,demo_age_5_17,demo_age_17_\n\
         01-03-2025,Goa,North Goa,403001,2,3\n",
    );
    write(
        &dir,
        "demo_2.csv",
        "date,state,district,pincode,demo_age_5_17,demo_age_17_\n\
         03-03-2025,Bihar,Patna,800001,5,\n",
    );
    write(
        &dir,
        "enrol.csv",
        "date,state,district,pincode,age_0_5,age_5_17,age_18_greater\n",
    );

    let config = IngestConfig {
        biometric_files: vec!["bio.csv".into()],
        demographic_files: vec!["demo_1.csv".into(), "demo_2.csv".into()],
        enrollment_files: vec!["enrol.csv".into()],
        ..Default::default()
    };
    let dataset = CsvLoader::new(&config)
        .load_dataset(&config, dir.path())
        .unwrap();

    assert_eq!(dataset.biometric.len(), 2);
    assert_eq!(dataset.biometric.grand_total(), 12);
    assert_eq!(dataset.demographic.len(), 2);
    assert_eq!(dataset.demographic.records()[1].region, Region::new("Bihar", "Patna"));
    assert_eq!(dataset.demographic.records()[1].count(1), None);
    assert!(dataset.enrollment.is_empty());
    assert_eq!(dataset.get(Family::Enrollment).family(), Family::Enrollment);
}

#[test]
fn test_custom_date_format() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write(
        &dir,
        "enrol.csv",
        "date,state,district,pincode,age_0_5,age_5_17,age_18_greater\n\
         2025-03-15,Kerala,Kollam,691001,1,2,3\n",
    );
    let config = IngestConfig {
        date_format: Some("%Y-%m-%d".into()),
        ..Default::default()
    };
    let table = CsvLoader::new(&config)
        .load_family(Family::Enrollment, &[path])
        .unwrap();
    let (from, to) = table.date_range().unwrap();
    assert_eq!(from, to);
    assert_eq!(from.to_string(), "2025-03-15");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let loader = CsvLoader::new(&IngestConfig::default());
    let err = loader
        .load_family(Family::Biometric, &[dir.path().join("absent.csv")])
        .unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
    assert_eq!(err.error_code(), "INGEST_ERROR");
}

#[test]
fn test_missing_category_column_maps_to_schema_code() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write(
        &dir,
        "enrol.csv",
        "date,state,district,pincode,age_0_5,age_5_17\n01-03-2025,Goa,North Goa,1,1,1\n",
    );
    let err = CsvLoader::new(&IngestConfig::default())
        .load_family(Family::Enrollment, &[path])
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Schema(SchemaError::MissingColumn { ref column, .. }) if column == "age_18_greater"
    ));
    assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
}

#[test]
fn test_negative_count_rejected_with_column() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write(
        &dir,
        "bio.csv",
        "date,state,district,pincode,bio_age_5_17,bio_age_17_\n\
         01-03-2025,Goa,North Goa,403001,4,6\n\
         02-03-2025,Goa,North Goa,403001,-2,6\n",
    );
    let err = CsvLoader::new(&IngestConfig::default())
        .load_family(Family::Biometric, &[path])
        .unwrap_err();
    match err {
        IngestError::InvalidCount {
            line,
            column,
            value,
            ..
        } => {
            assert_eq!(line, 3);
            assert_eq!(column, "bio_age_5_17");
            assert_eq!(value, "-2");
        }
        other => panic!("expected InvalidCount, got {other:?}"),
    }
}

#[test]
fn test_extra_columns_and_reordered_header() {
    let data = "state,note,age_18_greater,date,age_5_17,district,age_0_5\n\
                Goa,ok,9,05-03-2025,2,North Goa,1\n";
    let records = CsvLoader::new(&IngestConfig::default())
        .load_reader(Family::Enrollment, data.as_bytes(), "mem")
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].counts(), &[Some(1), Some(2), Some(9)]);
    assert_eq!(records[0].pincode, None);
}

proptest! {
    #[test]
    fn prop_total_is_sum_of_present_counts(
        counts in proptest::collection::vec(proptest::option::of(0u64..1_000_000), 3)
    ) {
        let cell = |c: &Option<u64>| c.map(|v| v.to_string()).unwrap_or_default();
        let data = format!(
            "date,state,district,pincode,age_0_5,age_5_17,age_18_greater\n\
             01-03-2025,Goa,North Goa,403001,{},{},{}\n",
            cell(&counts[0]),
            cell(&counts[1]),
            cell(&counts[2]),
        );
        let records = CsvLoader::new(&IngestConfig::default())
            .load_reader(Family::Enrollment, data.as_bytes(), "mem")
            .unwrap();
        let expected: u64 = counts.iter().flatten().sum();
        prop_assert_eq!(records[0].total(), expected);
        prop_assert_eq!(records[0].counts(), counts.as_slice());
    }
}

//! Loading configuration documents from disk.

use std::io::Write;

use camino::Utf8PathBuf;
use rstest::rstest;
use tempfile::NamedTempFile;

use crate::{EntityKind, LoadError, count_of, load_capabilities, load_sensor_config};

fn document(contents: &str) -> (NamedTempFile, Utf8PathBuf) {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf()).expect("utf-8 temp path");
    (file, path)
}

#[rstest]
fn sensor_document_is_loaded_and_validated() {
    let (_file, path) = document(
        r#"{
            "inlet": [{"instance": 1, "dbus": "/sensors/inlet", "record_id": 7}],
            "cpu": [
                {"dbus": "/sensors/cpu0", "record_id": 8},
                {"dbus": "/sensors/cpu1", "record_id": 9}
            ]
        }"#,
    );

    let config = load_sensor_config(&path).expect("document is valid");

    assert_eq!(count_of(EntityKind::Inlet, &config), 1);
    assert_eq!(count_of(EntityKind::Cpu, &config), 2);
    assert_eq!(count_of(EntityKind::Baseboard, &config), 0);
}

#[rstest]
fn missing_sections_are_empty() {
    let (_file, path) = document("{}");

    let config = load_sensor_config(&path).expect("empty document is valid");

    assert!(config.descriptors().is_empty());
}

#[rstest]
fn unreadable_document_is_a_read_error() {
    let directory = tempfile::tempdir().expect("create temp dir");
    let path = Utf8PathBuf::from_path_buf(directory.path().join("absent.json"))
        .expect("utf-8 temp path");

    let error = load_sensor_config(&path).expect_err("file does not exist");

    assert!(matches!(error, LoadError::Read { .. }));
}

#[rstest]
fn malformed_document_is_a_parse_error() {
    let (_file, path) = document("{\"cpu\": [");

    let error = load_sensor_config(&path).expect_err("document is truncated");

    assert!(matches!(error, LoadError::Parse(_)));
}

#[rstest]
fn invalid_ordering_is_reported() {
    let (_file, path) = document(
        r#"{"cpu": [
            {"instance": 4, "dbus": "/sensors/cpu4", "record_id": 1},
            {"instance": 2, "dbus": "/sensors/cpu2", "record_id": 2}
        ]}"#,
    );

    let error = load_sensor_config(&path).expect_err("instances decrease");

    assert!(matches!(error, LoadError::Invalid(_)));
}

#[rstest]
#[case(r#"{"PowerManagement": 1}"#, true)]
#[case(r#"{"PowerManagement": 0}"#, false)]
#[case(r#"{"PowerManagement": true}"#, false)]
#[case(r#"{"Other": 1}"#, false)]
fn power_management_flag_requires_one(#[case] contents: &str, #[case] expected: bool) {
    let (_file, path) = document(contents);

    let capabilities = load_capabilities(&path).expect("document is JSON");

    assert_eq!(capabilities.power_management(), expected);
}

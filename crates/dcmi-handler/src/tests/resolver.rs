//! Entity resolution, configuration validation and framing.

use rstest::rstest;
use serde_json::json;

use super::support::{descriptors, sensors};
use crate::{
    ConfigError, DcmiError, EntityDescriptor, EntityKind, LoadError, MAX_RECORDS, SensorConfig,
    count_of, paginate, resolve_one, resolve_range,
};
use dcmi_bus::ErrorKind;

fn explicit(kind: EntityKind, instance: u8, record_id: u16) -> EntityDescriptor {
    EntityDescriptor {
        kind,
        instance: Some(instance),
        object_path: format!("/sensors/{kind}{instance}"),
        record_id,
    }
}

#[rstest]
#[case(EntityKind::Cpu, 10)]
#[case(EntityKind::Inlet, 2)]
#[case(EntityKind::Baseboard, 0)]
fn range_from_first_visits_every_descriptor(
    sensors: SensorConfig,
    #[case] kind: EntityKind,
    #[case] expected: usize,
) {
    let (records, total) = resolve_range(kind, 1, &sensors);

    assert_eq!(records.len(), expected);
    assert_eq!(total, expected);
    assert_eq!(count_of(kind, &sensors), expected);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(5)]
#[case(10)]
#[case(11)]
#[case(255)]
fn total_ignores_instance_start(sensors: SensorConfig, #[case] start: u8) {
    let (_, total) = resolve_range(EntityKind::Cpu, start, &sensors);

    assert_eq!(total, 10);
}

#[rstest]
fn start_zero_and_one_begin_at_first_descriptor(sensors: SensorConfig) {
    let (from_zero, _) = resolve_range(EntityKind::Cpu, 0, &sensors);
    let (from_one, _) = resolve_range(EntityKind::Cpu, 1, &sensors);

    assert_eq!(from_zero, from_one);
    assert_eq!(from_zero.first().map(|record| record.record_id), Some(100));
}

#[rstest]
fn range_is_not_truncated_by_the_resolver(sensors: SensorConfig) {
    let (records, _) = resolve_range(EntityKind::Cpu, 2, &sensors);

    assert_eq!(records.len(), 9);
    assert_eq!(records.first().map(|record| record.instance), Some(2));
}

#[rstest]
fn every_valid_instance_resolves_in_order(sensors: SensorConfig) {
    for instance in 1..=10_u8 {
        let (record, total) =
            resolve_one(EntityKind::Cpu, instance, &sensors).expect("instance should resolve");

        assert_eq!(record.instance, instance);
        assert_eq!(record.record_id, 99 + u16::from(instance));
        assert_eq!(record.entity_id, 0x41);
        assert_eq!(total, 10);
    }
}

#[rstest]
#[case(0)]
#[case(11)]
fn out_of_range_instances_are_not_found(sensors: SensorConfig, #[case] instance: u8) {
    let error = resolve_one(EntityKind::Cpu, instance, &sensors).expect_err("should fail");

    assert!(matches!(
        error,
        DcmiError::InstanceNotFound { available: 10, .. }
    ));
    assert!(error.kind().is_some_and(ErrorKind::is_not_found));
}

#[rstest]
fn explicit_instances_are_authoritative() {
    let config = SensorConfig::new(vec![
        explicit(EntityKind::Inlet, 2, 20),
        explicit(EntityKind::Inlet, 5, 50),
    ])
    .expect("explicit instances are valid");

    let (record, total) = resolve_one(EntityKind::Inlet, 5, &config).expect("instance 5");
    assert_eq!(record.record_id, 50);
    assert_eq!(total, 2);

    assert!(resolve_one(EntityKind::Inlet, 1, &config).is_err());

    let (records, _) = resolve_range(EntityKind::Inlet, 3, &config);
    let ids: Vec<_> = records.iter().map(|record| record.record_id).collect();
    assert_eq!(ids, [50]);
}

#[rstest]
fn zero_instance_is_rejected() {
    let error = SensorConfig::new(vec![explicit(EntityKind::Cpu, 0, 1)])
        .expect_err("instance 0 is reserved");

    assert_eq!(
        error,
        ConfigError::ZeroInstance {
            kind: EntityKind::Cpu,
            position: 1
        }
    );
}

#[rstest]
fn decreasing_instances_are_rejected() {
    let mut entries = vec![explicit(EntityKind::Baseboard, 3, 1)];
    entries.extend(descriptors(EntityKind::Baseboard, 1, 2));

    let error = SensorConfig::new(entries).expect_err("implicit 2 follows explicit 3");

    assert!(matches!(
        error,
        ConfigError::OutOfOrder {
            previous: 3,
            instance: 2,
            ..
        }
    ));
}

#[rstest]
fn oversized_kinds_are_rejected() {
    let error = SensorConfig::new(descriptors(EntityKind::Inlet, 256, 0))
        .expect_err("256 entries cannot be numbered");

    assert!(matches!(error, ConfigError::TooManyInstances { count: 256, .. }));
}

#[rstest]
fn document_with_wrong_shape_is_a_parse_error() {
    let error = SensorConfig::from_value(json!({"cpu": [{"dbus": 5}]}))
        .expect_err("dbus must be a string");

    assert!(matches!(error, LoadError::Parse(_)));
}

#[rstest]
#[case(0, 0)]
#[case(3, 3)]
#[case(8, 8)]
#[case(10, 8)]
fn paginate_packs_at_most_eight(#[case] available: u16, #[case] packed: usize) {
    let config = SensorConfig::new(descriptors(EntityKind::Cpu, available, 500))
        .expect("config is valid");
    let (records, total) = resolve_range(EntityKind::Cpu, 1, &config);

    let frame = paginate(&records, total);

    assert_eq!(frame.num_records(), packed);
    assert!(frame.num_records() <= MAX_RECORDS);
    assert_eq!(frame.num_instances, usize::from(available));
    let expected: Vec<u16> = (500..500 + available).take(packed).collect();
    assert_eq!(frame.record_ids, expected);
}

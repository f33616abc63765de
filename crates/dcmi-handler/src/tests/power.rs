//! Power aggregation against an in-memory bus.

use dcmi_bus::{BusError, BusMethod, ErrorKind, MemoryBus};
use dcmi_config::BusLayout;
use rstest::{fixture, rstest};

use super::support::{POWER_PATH, POWER_SERVICE, platform_bus};
use crate::{DcmiError, PowerAggregator, PowerReading, UNAVAILABLE_TIME_FRAME, UNAVAILABLE_WATTS};

#[fixture]
fn layout() -> BusLayout {
    BusLayout::default()
}

#[rstest]
fn reading_reports_backend_values_unmodified(platform_bus: MemoryBus, layout: BusLayout) {
    let reading = PowerAggregator::new(&platform_bus, &layout.power)
        .read_power_at(1_700_000_000)
        .expect("power should be readable");

    assert_eq!(
        reading,
        PowerReading {
            current: 120,
            minimum: 80,
            maximum: 200,
            average: 110,
            timestamp: 1_700_000_000,
            time_frame: 1000,
            state: 1,
        }
    );
}

#[rstest]
fn missing_statistics_use_the_unavailable_sentinel(layout: BusLayout) {
    let bus = MemoryBus::new()
        .with_object(POWER_PATH, POWER_SERVICE, &[layout.power.interface.as_str()])
        .with_property(POWER_SERVICE, POWER_PATH, &layout.power.interface, "Value", 95.4);

    let reading = PowerAggregator::new(&bus, &layout.power)
        .read_power_at(7)
        .expect("current value alone is enough");

    assert_eq!(reading.current, 95);
    assert_eq!(reading.minimum, UNAVAILABLE_WATTS);
    assert_eq!(reading.maximum, UNAVAILABLE_WATTS);
    assert_eq!(reading.average, UNAVAILABLE_WATTS);
    assert_eq!(reading.time_frame, UNAVAILABLE_TIME_FRAME);
    assert_eq!(reading.state, 0);
}

#[rstest]
fn complete_statistics_without_state_are_marked_active(layout: BusLayout) {
    let interface = layout.power.interface.as_str();
    let bus = MemoryBus::new()
        .with_object(POWER_PATH, POWER_SERVICE, &[interface])
        .with_property(POWER_SERVICE, POWER_PATH, interface, "Value", 10_u64)
        .with_property(POWER_SERVICE, POWER_PATH, interface, "MinimumValue", 5_u64)
        .with_property(POWER_SERVICE, POWER_PATH, interface, "MaximumValue", 15_u64)
        .with_property(POWER_SERVICE, POWER_PATH, interface, "AverageValue", 10_u64)
        .with_property(POWER_SERVICE, POWER_PATH, interface, "TimeFrame", 60_000_u64);

    let reading = PowerAggregator::new(&bus, &layout.power)
        .read_power_at(0)
        .expect("power should be readable");

    assert_eq!(reading.state, 0x40);
}

#[rstest]
fn missing_power_object_is_not_found(layout: BusLayout) {
    let bus = MemoryBus::new();

    let error = PowerAggregator::new(&bus, &layout.power)
        .read_power()
        .expect_err("no power sensor exists");

    assert!(matches!(error, DcmiError::Bus(BusError::NoImplementation { .. })));
    assert_eq!(error.kind(), Some(ErrorKind::NotFound));
}

#[rstest]
fn missing_current_value_fails_without_a_reading(layout: BusLayout) {
    let interface = layout.power.interface.as_str();
    let bus = MemoryBus::new()
        .with_object(POWER_PATH, POWER_SERVICE, &[interface])
        .with_property(POWER_SERVICE, POWER_PATH, interface, "MaximumValue", 15_u64);

    let error = PowerAggregator::new(&bus, &layout.power)
        .read_power()
        .expect_err("current value is required");

    assert!(matches!(error, DcmiError::MissingProperty { ref property, .. } if property == "Value"));
}

#[rstest]
fn property_failure_propagates(platform_bus: MemoryBus, layout: BusLayout) {
    platform_bus.fail_on(BusMethod::GetAll);

    let error = PowerAggregator::new(&platform_bus, &layout.power)
        .read_power()
        .expect_err("property read fails");

    assert_eq!(error.kind(), Some(ErrorKind::Rpc));
}

#[rstest]
fn oversized_values_saturate_below_the_sentinel(layout: BusLayout) {
    let interface = layout.power.interface.as_str();
    let bus = MemoryBus::new()
        .with_object(POWER_PATH, POWER_SERVICE, &[interface])
        .with_property(POWER_SERVICE, POWER_PATH, interface, "Value", 1_000_000_u64)
        .with_property(POWER_SERVICE, POWER_PATH, interface, "TimeFrame", 5_000_000_000_u64)
        .with_property(POWER_SERVICE, POWER_PATH, interface, "ReadingState", 1_u64);

    let reading = PowerAggregator::new(&bus, &layout.power)
        .read_power_at(0)
        .expect("power should be readable");

    assert_eq!(reading.current, 0xFFFE);
    assert_eq!(reading.time_frame, 0xFFFF_FFFE);
    assert_ne!(reading.time_frame, UNAVAILABLE_TIME_FRAME);
    assert_eq!(reading.state, 1);
}

#[rstest]
fn reading_state_wider_than_a_byte_is_rejected(layout: BusLayout) {
    let interface = layout.power.interface.as_str();
    let bus = MemoryBus::new()
        .with_object(POWER_PATH, POWER_SERVICE, &[interface])
        .with_property(POWER_SERVICE, POWER_PATH, interface, "Value", 10_u64)
        .with_property(POWER_SERVICE, POWER_PATH, interface, "ReadingState", 256_u64);

    let error = PowerAggregator::new(&bus, &layout.power)
        .read_power_at(0)
        .expect_err("state does not fit the reply");

    assert!(matches!(
        error,
        DcmiError::Bus(BusError::TypeMismatch { ref property, .. }) if property == "ReadingState"
    ));
}

//! Behavioural tests for JSONL request dispatch over a TCP listener.

use std::cell::RefCell;
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use dcmi_bus::MemoryBus;
use dcmi_config::{BusLayout, SocketEndpoint};
use dcmi_handler::{Capabilities, DcmiHandler, SensorConfig};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

use crate::dispatch::DispatchConnectionHandler;
use crate::transport::{ListenerHandle, SocketListener};

use super::support::SENSORS_DOCUMENT;

const BOARD_SERVICE: &str = "xyz.openbmc_project.Inventory.Manager";
const BOARD_PATH: &str = "/xyz/openbmc_project/inventory/system/board";

struct DispatchWorld {
    listener: Option<ListenerHandle>,
    address: Option<SocketAddr>,
    reply: Option<Value>,
}

impl DispatchWorld {
    fn start(&mut self) {
        let layout = BusLayout::default();
        let bus = MemoryBus::new()
            .with_object(BOARD_PATH, BOARD_SERVICE, &[layout.asset_tag.interface.as_str()])
            .with_property(
                BOARD_SERVICE,
                BOARD_PATH,
                &layout.asset_tag.interface,
                &layout.asset_tag.property,
                "RACK-0042",
            );
        let sensors = SensorConfig::from_value(
            serde_json::from_str(SENSORS_DOCUMENT).expect("sensor document parses"),
        )
        .expect("sensor document is valid");
        let handler = DcmiHandler::new(bus, layout, sensors, Capabilities::new(false));
        let dispatcher = Arc::new(DispatchConnectionHandler::new(Arc::new(handler)));

        let listener = SocketListener::bind(&SocketEndpoint::tcp("127.0.0.1", 0))
            .expect("bind listener");
        self.address = listener.local_addr();
        self.listener = Some(listener.start(dispatcher).expect("start listener"));
    }

    fn send(&mut self, payload: &[u8]) {
        let address = self.address.expect("listener started");
        let mut stream = TcpStream::connect(address).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("set read timeout");
        stream.write_all(payload).expect("write request");
        stream.shutdown(Shutdown::Write).expect("close write half");

        let mut line = String::new();
        BufReader::new(stream)
            .read_line(&mut line)
            .expect("read reply");
        self.reply = Some(serde_json::from_str(&line).expect("reply is JSON"));
    }

    fn send_line(&mut self, line: &str) {
        self.send(format!("{line}\n").as_bytes());
    }

    fn reply(&self) -> &Value {
        self.reply.as_ref().expect("a reply was received")
    }
}

impl Drop for DispatchWorld {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            let _ = handle.join();
        }
    }
}

#[fixture]
fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld {
        listener: None,
        address: None,
        reply: None,
    })
}

#[given("a daemon serving three cpu sensors")]
fn given_daemon(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().start();
}

#[when("sensor info for entity {entity_id} is requested from instance {start}")]
fn when_enumerated(world: &RefCell<DispatchWorld>, entity_id: u8, start: u8) {
    world.borrow_mut().send_line(&format!(
        r#"{{"command":"get_sensor_info","sensor_type":1,"entity_id":{entity_id},"entity_instance":0,"instance_start":{start}}}"#
    ));
}

#[when("sensor info for entity {entity_id} instance {instance} is requested")]
fn when_single_instance(world: &RefCell<DispatchWorld>, entity_id: u8, instance: u8) {
    world.borrow_mut().send_line(&format!(
        r#"{{"command":"get_sensor_info","sensor_type":1,"entity_id":{entity_id},"entity_instance":{instance}}}"#
    ));
}

#[when("{bytes} asset tag bytes are read from offset {offset}")]
fn when_asset_tag(world: &RefCell<DispatchWorld>, bytes: u8, offset: u8) {
    world.borrow_mut().send_line(&format!(
        r#"{{"command":"get_asset_tag","offset":{offset},"bytes":{bytes}}}"#
    ));
}

#[when("a power reading is requested")]
fn when_power(world: &RefCell<DispatchWorld>) {
    world
        .borrow_mut()
        .send_line(r#"{"command":"get_power_reading","mode":1}"#);
}

#[when("the line {line} is sent")]
fn when_line(world: &RefCell<DispatchWorld>, line: String) {
    world.borrow_mut().send_line(strip_quotes(&line));
}

#[when("an oversized request is sent")]
fn when_oversized(world: &RefCell<DispatchWorld>) {
    let payload = vec![b' '; 64 * 1024 + 1];
    world.borrow_mut().send(&payload);
}

#[then("the reply status is {status}")]
fn then_status(world: &RefCell<DispatchWorld>, status: String) {
    let world = world.borrow();
    assert_eq!(
        world.reply().get("status").and_then(Value::as_str),
        Some(strip_quotes(&status)),
        "unexpected reply {}",
        world.reply()
    );
}

#[then("the reply completion code is {code}")]
fn then_completion_code(world: &RefCell<DispatchWorld>, code: u8) {
    let world = world.borrow();
    assert_eq!(
        world.reply().get("completion_code").and_then(Value::as_u64),
        Some(u64::from(code)),
        "unexpected reply {}",
        world.reply()
    );
}

#[then("the reply lists the record ids {ids}")]
fn then_record_ids(world: &RefCell<DispatchWorld>, ids: String) {
    let expected: Vec<u64> = strip_quotes(&ids)
        .split(',')
        .map(|id| id.trim().parse().expect("numeric record id"))
        .collect();
    let world = world.borrow();
    let actual: Vec<u64> = world
        .reply()
        .pointer("/data/record_ids")
        .and_then(Value::as_array)
        .expect("reply carries record ids")
        .iter()
        .filter_map(Value::as_u64)
        .collect();
    assert_eq!(actual, expected);
}

#[then("the reply reports a tag length of {length}")]
fn then_tag_length(world: &RefCell<DispatchWorld>, length: u8) {
    let world = world.borrow();
    assert_eq!(
        world.reply().pointer("/data/total_length").and_then(Value::as_u64),
        Some(u64::from(length))
    );
}

fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

#[scenario(path = "tests/features/dispatch.feature")]
fn request_dispatch(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

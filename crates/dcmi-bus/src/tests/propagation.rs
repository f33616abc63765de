//! Failure propagation through the clients, using `mockall` doubles.

use mockall::mock;
use mockall::predicate::eq;
use rstest::rstest;

use crate::{
    BusError, BusMethod, DirectoryService, ErrorKind, ObjectDirectory, ObjectEntry, ObjectTree,
    PropertyBackend, PropertyClient, PropertyMap, ServiceMap, ServiceResolver, Value,
};

mock! {
    Directory {}
    impl DirectoryService for Directory {
        fn get_sub_tree(
            &self,
            root: &str,
            depth: i32,
            interfaces: &[String],
        ) -> Result<ObjectTree, BusError>;
        fn get_object(&self, path: &str, interfaces: &[String]) -> Result<ServiceMap, BusError>;
    }
}

mock! {
    Properties {}
    impl PropertyBackend for Properties {
        fn get(
            &self,
            service: &str,
            path: &str,
            interface: &str,
            property: &str,
        ) -> Result<Value, BusError>;
        fn get_all(
            &self,
            service: &str,
            path: &str,
            interface: &str,
        ) -> Result<PropertyMap, BusError>;
        fn set(
            &self,
            service: &str,
            path: &str,
            interface: &str,
            property: &str,
            value: Value,
        ) -> Result<(), BusError>;
    }
}

fn transport_failure() -> BusError {
    BusError::rpc(BusMethod::GetSubTree, "/a", "K", "connection reset")
}

#[rstest]
fn directory_is_queried_with_unrestricted_depth() {
    let mut directory = MockDirectory::new();
    directory
        .expect_get_sub_tree()
        .withf(|root: &str, depth: &i32, interfaces: &[String]| {
            root == "/a" && *depth == 0 && interfaces == ["K".to_owned()]
        })
        .once()
        .returning(|_, _, _| Ok(vec![ObjectEntry::single("/a/x", "svc", &["K"])]));

    let object = ObjectDirectory::new(&directory)
        .locate("K", "/a", None)
        .expect("lookup should succeed");

    assert_eq!(object.path, "/a/x");
}

#[rstest]
fn directory_failure_is_returned_unchanged() {
    let mut directory = MockDirectory::new();
    directory
        .expect_get_sub_tree()
        .once()
        .returning(|_, _, _| Err(transport_failure()));

    let error = ObjectDirectory::new(&directory)
        .locate("K", "/a", Some("x"))
        .expect_err("failure should propagate");

    assert!(matches!(error, BusError::Rpc { ref message, .. } if message == "connection reset"));
}

#[rstest]
fn entries_without_services_are_skipped() {
    let mut directory = MockDirectory::new();
    directory.expect_get_sub_tree().once().returning(|_, _, _| {
        Ok(vec![
            ObjectEntry {
                path: "/a/orphan".to_owned(),
                services: Vec::new(),
            },
            ObjectEntry::single("/a/owned", "svc", &["K"]),
        ])
    });

    let object = ObjectDirectory::new(&directory)
        .locate("K", "/a", None)
        .expect("lookup should succeed");

    assert_eq!(object.path, "/a/owned");
}

#[rstest]
fn resolver_failure_keeps_rpc_kind() {
    let mut directory = MockDirectory::new();
    directory
        .expect_get_object()
        .once()
        .returning(|path, _| Err(BusError::rpc(BusMethod::GetObject, path, "K", "timeout")));

    let error = ServiceResolver::new(&directory)
        .resolve_owner("/a/x", "K")
        .expect_err("failure should propagate");

    assert_eq!(error.kind(), ErrorKind::Rpc);
}

#[rstest]
fn property_reads_are_not_retried() {
    let mut properties = MockProperties::new();
    properties
        .expect_get()
        .with(eq("svc"), eq("/p"), eq("Iface"), eq("Value"))
        .once()
        .returning(|_, path, interface, _| {
            Err(BusError::rpc(BusMethod::Get, path, interface, "denied"))
        });

    let error = PropertyClient::new(&properties)
        .get("svc", "/p", "Iface", "Value")
        .expect_err("failure should propagate");

    assert_eq!(error.kind(), ErrorKind::Rpc);
}

#[rstest]
fn property_writes_forward_the_value() {
    let mut properties = MockProperties::new();
    properties
        .expect_set()
        .withf(|_, _, _, property: &str, value: &Value| {
            property == "HostName" && value == &Value::from("bmc-01")
        })
        .once()
        .returning(|_, _, _, _, _| Ok(()));

    PropertyClient::new(&properties)
        .set("svc", "/net", "Iface", "HostName", Value::from("bmc-01"))
        .expect("set should succeed");
}

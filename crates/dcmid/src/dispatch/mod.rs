//! JSONL request dispatch for DCMI commands.
//!
//! Clients send a single JSONL line holding a tagged DCMI request:
//!
//! ```json
//! {"command":"get_sensor_info","sensor_type":1,"entity_id":64,"entity_instance":0,"instance_start":1}
//! ```
//!
//! The daemon answers with one line and closes the connection:
//!
//! ```json
//! {"status":"ok","completion_code":0,"data":{"num_instances":2,"num_records":2,"record_ids":[1,2]}}
//! {"status":"error","completion_code":203,"message":"cpu instance 11 is not configured (10 available)"}
//! ```

mod errors;
mod handler;
mod request;
mod response;

pub(crate) use self::handler::DispatchConnectionHandler;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

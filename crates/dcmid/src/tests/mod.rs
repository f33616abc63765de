//! Test suites for the DCMI daemon.

mod dispatch_behaviour;
mod support;

//! Test suites for the DCMI command handlers.

mod loader;
mod power;
mod resolver;
mod support;

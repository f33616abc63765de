//! Test suites for the directory and property clients.

mod propagation;

//! logxray explorer: library half of the `lx-explorer` binary.
//!
//! Holds configuration loading and the tool registry so integration tests
//! (e.g. `lx-e2e-tests`) can drive the same dispatch path as the binary.

pub mod config;
pub mod registry;

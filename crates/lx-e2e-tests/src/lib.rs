//! End-to-end integration tests for logxray.
//!
//! This crate has no runtime code. All tests live in `tests/` and write
//! real (optionally compressed) files to temporary directories before
//! driving the engine through `FileLogSource`, the session manager and the
//! explorer's tool registry.

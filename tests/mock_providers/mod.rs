//! Mock provider infrastructure for integration tests.

pub mod websocket_mock;

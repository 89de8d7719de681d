//! Shared helpers for unit tests.

pub mod digest_server;
pub mod socket_guard;

//! Shared helpers for integration tests.
//!
//! The digest responder and socket guard are the unit-test helpers from
//! `src/test_support`, compiled into this target as well.

#![allow(dead_code)]

pub mod device;
#[path = "../../src/test_support/digest_server.rs"]
pub mod digest_server;
#[path = "../../src/test_support/socket_guard.rs"]
pub mod socket_guard;

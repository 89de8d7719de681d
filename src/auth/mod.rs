//! HTTP Digest authentication.
//!
//! The device protects every endpoint with Digest auth (RFC 7616). This module
//! parses `WWW-Authenticate` challenges, computes `Authorization` responses,
//! and wraps a reqwest client in a [`DigestSession`] that performs the whole
//! challenge/response exchange for each request it sends.

mod challenge;
mod digest;
mod session;

pub use challenge::{ChallengeError, DigestAlgorithm, DigestChallenge, Qop};
pub use digest::authorization_header;
pub use session::{Credentials, DigestSession};

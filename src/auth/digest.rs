//! Digest response computation (RFC 7616, with RFC 2069 fallback).

use rand::Rng;

use super::challenge::{DigestChallenge, Qop};
use super::session::Credentials;

/// Builds the `Authorization` header value answering `challenge`.
///
/// `uri` must be the request-target exactly as sent (path plus query), and
/// `nonce_count` the number of times this nonce has been used, starting at 1.
#[must_use]
pub fn authorization_header(
    challenge: &DigestChallenge,
    credentials: &Credentials,
    method: &str,
    uri: &str,
    cnonce: &str,
    nonce_count: u32,
) -> String {
    let nc = format!("{nonce_count:08x}");
    let response = response_digest(challenge, credentials, method, uri, cnonce, &nc);

    let mut header = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", algorithm={}, response=\"{}\"",
        quote(credentials.username()),
        quote(&challenge.realm),
        quote(&challenge.nonce),
        quote(uri),
        challenge.algorithm,
        response,
    );
    if let Some(opaque) = &challenge.opaque {
        header.push_str(&format!(", opaque=\"{}\"", quote(opaque)));
    }
    if challenge.qop.is_some() {
        header.push_str(&format!(", qop=auth, nc={nc}, cnonce=\"{}\"", quote(cnonce)));
    }
    header
}

fn response_digest(
    challenge: &DigestChallenge,
    credentials: &Credentials,
    method: &str,
    uri: &str,
    cnonce: &str,
    nc: &str,
) -> String {
    let algorithm = challenge.algorithm;

    let mut ha1 = algorithm.hash_hex(&format!(
        "{}:{}:{}",
        credentials.username(),
        challenge.realm,
        credentials.password()
    ));
    if algorithm.is_session() {
        ha1 = algorithm.hash_hex(&format!("{ha1}:{}:{cnonce}", challenge.nonce));
    }

    let ha2 = algorithm.hash_hex(&format!("{method}:{uri}"));

    match challenge.qop {
        Some(Qop::Auth) => algorithm.hash_hex(&format!(
            "{ha1}:{}:{nc}:{cnonce}:auth:{ha2}",
            challenge.nonce
        )),
        None => algorithm.hash_hex(&format!("{ha1}:{}:{ha2}", challenge.nonce)),
    }
}

/// Fresh client nonce: 16 random bytes, hex encoded.
pub(crate) fn generate_cnonce() -> String {
    let bytes: [u8; 16] = rand::thread_rng().r#gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

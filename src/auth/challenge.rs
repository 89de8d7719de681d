//! Parsing of `WWW-Authenticate: Digest ...` challenges.

use std::fmt;

use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Reasons a challenge header cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChallengeError {
    /// No `WWW-Authenticate` header offered the Digest scheme.
    #[error("no Digest challenge offered")]
    NotDigest,

    /// A required parameter is absent.
    #[error("challenge is missing the `{0}` parameter")]
    MissingParam(&'static str),

    /// The `algorithm` parameter names something we cannot compute.
    #[error("unsupported digest algorithm `{0}`")]
    UnsupportedAlgorithm(String),

    /// The `qop` parameter offers no protection level we implement.
    #[error("unsupported qop `{0}`")]
    UnsupportedQop(String),

    /// The parameter list could not be tokenized.
    #[error("malformed challenge parameters")]
    Malformed,
}

/// Hash algorithm requested by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// `MD5` (the default when the parameter is absent).
    #[default]
    Md5,
    /// `MD5-sess`
    Md5Sess,
    /// `SHA-256`
    Sha256,
    /// `SHA-256-sess`
    Sha256Sess,
}

impl DigestAlgorithm {
    /// Parses the `algorithm` parameter value (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeError::UnsupportedAlgorithm`] for anything other than
    /// the MD5 and SHA-256 families.
    pub fn parse(value: &str) -> Result<Self, ChallengeError> {
        match value.to_ascii_uppercase().as_str() {
            "MD5" => Ok(Self::Md5),
            "MD5-SESS" => Ok(Self::Md5Sess),
            "SHA-256" => Ok(Self::Sha256),
            "SHA-256-SESS" => Ok(Self::Sha256Sess),
            _ => Err(ChallengeError::UnsupportedAlgorithm(value.to_string())),
        }
    }

    /// Canonical token used in the `Authorization` header.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-sess",
            Self::Sha256 => "SHA-256",
            Self::Sha256Sess => "SHA-256-sess",
        }
    }

    /// Whether HA1 is re-keyed with the nonce pair (`-sess` variants).
    #[must_use]
    pub fn is_session(self) -> bool {
        matches!(self, Self::Md5Sess | Self::Sha256Sess)
    }

    /// Lowercase hex digest of `data`.
    pub(crate) fn hash_hex(self, data: &str) -> String {
        match self {
            Self::Md5 | Self::Md5Sess => format!("{:x}", md5::compute(data.as_bytes())),
            Self::Sha256 | Self::Sha256Sess => format!("{:x}", Sha256::digest(data.as_bytes())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality of protection. Only `auth` is implemented; `auth-int` would need
/// the request body hashed, and GET/HEAD requests carry none worth signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qop {
    /// `qop=auth`
    Auth,
}

/// A parsed Digest challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    /// Protection space announced by the server.
    pub realm: String,
    /// Server nonce for this exchange.
    pub nonce: String,
    /// Opaque value to echo back unchanged.
    pub opaque: Option<String>,
    /// Hash algorithm.
    pub algorithm: DigestAlgorithm,
    /// `None` means the legacy RFC 2069 form without `qop`/`nc`/`cnonce`.
    pub qop: Option<Qop>,
    /// The previous nonce expired but the credentials were fine.
    pub stale: bool,
}

impl DigestChallenge {
    /// Parses a single `WWW-Authenticate` header value.
    ///
    /// # Errors
    ///
    /// Returns a [`ChallengeError`] when the value is not a Digest challenge,
    /// is malformed, or requests an unsupported algorithm or qop.
    pub fn parse(header: &str) -> Result<Self, ChallengeError> {
        let header = header.trim();
        let params = strip_digest_scheme(header).ok_or(ChallengeError::NotDigest)?;
        let params = parse_auth_params(params)?;

        let find = |name: &str| {
            params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        };

        let realm = find("realm").ok_or(ChallengeError::MissingParam("realm"))?;
        let nonce = find("nonce").ok_or(ChallengeError::MissingParam("nonce"))?;
        let algorithm = match find("algorithm") {
            Some(value) => DigestAlgorithm::parse(&value)?,
            None => DigestAlgorithm::Md5,
        };
        let qop = match find("qop") {
            Some(value) => Some(parse_qop(&value)?),
            None => None,
        };
        let stale = find("stale").is_some_and(|value| value.eq_ignore_ascii_case("true"));

        Ok(Self {
            realm,
            nonce,
            opaque: find("opaque"),
            algorithm,
            qop,
            stale,
        })
    }

    /// Picks the first usable Digest challenge among all `WWW-Authenticate` headers.
    ///
    /// Servers may offer several challenges (e.g. one per algorithm). Values
    /// that are not Digest, or that we cannot satisfy, are skipped; if none is
    /// usable, the most specific error seen is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeError::NotDigest`] when no Digest challenge is present.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ChallengeError> {
        let mut last_error = ChallengeError::NotDigest;
        for value in headers.get_all(WWW_AUTHENTICATE) {
            let Ok(text) = value.to_str() else {
                continue;
            };
            match Self::parse(text) {
                Ok(challenge) => return Ok(challenge),
                Err(ChallengeError::NotDigest) => {}
                Err(error) => last_error = error,
            }
        }
        Err(last_error)
    }
}

fn strip_digest_scheme(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(char::is_whitespace)?;
    scheme.eq_ignore_ascii_case("digest").then_some(rest)
}

fn parse_qop(value: &str) -> Result<Qop, ChallengeError> {
    let offered_auth = value
        .split(',')
        .map(str::trim)
        .any(|token| token.eq_ignore_ascii_case("auth"));
    if offered_auth {
        Ok(Qop::Auth)
    } else {
        Err(ChallengeError::UnsupportedQop(value.to_string()))
    }
}

/// Splits an auth-param list (`key=value, key="quoted, value"`) into pairs.
///
/// Keys are lowercased; quoted values are unescaped.
pub(crate) fn parse_auth_params(input: &str) -> Result<Vec<(String, String)>, ChallengeError> {
    let mut params = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        loop {
            match chars.next() {
                Some('=') => break,
                Some(',') | None => return Err(ChallengeError::Malformed),
                Some(c) => key.push(c),
            }
        }
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(ChallengeError::Malformed);
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some(escaped) => value.push(escaped),
                        None => return Err(ChallengeError::Malformed),
                    },
                    Some(c) => value.push(c),
                    None => return Err(ChallengeError::Malformed),
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                value.push(c);
            }
            value = value.trim_end().to_string();
        }

        params.push((key, value));
    }

    Ok(params)
}

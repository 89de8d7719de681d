//! Digest-authenticated HTTP session.

use std::fmt;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use tracing::{debug, instrument, warn};
use url::{Position, Url};

use super::challenge::DigestChallenge;
use super::digest::{authorization_header, generate_cnonce};
use crate::download::DownloadError;
use crate::user_agent;

/// Username and password presented to the device.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A reqwest client paired with the credentials it answers challenges with.
///
/// Each request is first sent without credentials. When the device answers
/// `401` with a Digest challenge, the request is repeated once with an
/// `Authorization` header computed for that challenge. A second `401` that
/// marks the nonce `stale` earns one more attempt with the fresh nonce; any
/// other second `401` is an authentication failure.
///
/// The session is cheap to clone and safe to share; reqwest pools the
/// underlying connections.
#[derive(Debug, Clone)]
pub struct DigestSession {
    client: Client,
    credentials: Credentials,
}

impl DigestSession {
    /// Creates a session whose requests give up after `timeout` without
    /// connecting or without receiving data.
    ///
    /// The timeout bounds each connect and each read, never the whole
    /// transfer, so a slow but steady archive download is not cut off.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the reqwest client cannot be
    /// constructed (TLS backend initialization failure).
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self::with_client(client, credentials))
    }

    /// Wraps an already configured client.
    #[must_use]
    pub fn with_client(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Sends an authenticated GET and returns the response with its body
    /// unread.
    ///
    /// Any non-401 status is returned as-is; interpreting it is up to the
    /// caller.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] if `url` does not parse
    /// - [`DownloadError::Network`] / [`DownloadError::Timeout`] on transport failure
    /// - [`DownloadError::Protocol`] if the 401 carries no usable Digest challenge
    /// - [`DownloadError::Auth`] if the device rejects the computed response
    pub async fn perform_get(&self, url: &str) -> Result<Response, DownloadError> {
        self.perform(Method::GET, url).await
    }

    /// Sends an authenticated HEAD.
    ///
    /// # Errors
    ///
    /// Same as [`perform_get`](Self::perform_get).
    pub async fn perform_head(&self, url: &str) -> Result<Response, DownloadError> {
        self.perform(Method::HEAD, url).await
    }

    #[instrument(level = "debug", skip(self), fields(method = %method))]
    async fn perform(&self, method: Method, url: &str) -> Result<Response, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let request_target = &parsed[Position::BeforePath..Position::AfterQuery];

        let probe = self.send(method.clone(), &parsed, url, None).await?;
        if probe.status() != StatusCode::UNAUTHORIZED {
            return Ok(probe);
        }

        let mut challenge = challenge_from(&probe, url)?;
        debug!(
            realm = %challenge.realm,
            algorithm = %challenge.algorithm,
            "answering digest challenge"
        );

        let mut stale_retry_used = false;
        loop {
            let header = authorization_header(
                &challenge,
                &self.credentials,
                method.as_str(),
                request_target,
                &generate_cnonce(),
                1,
            );
            let value = HeaderValue::from_str(&header)
                .map_err(|_| DownloadError::protocol(url, "challenge produced an invalid header"))?;

            let response = self
                .send(method.clone(), &parsed, url, Some(value))
                .await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            match DigestChallenge::from_headers(response.headers()) {
                Ok(fresh) if fresh.stale && !stale_retry_used => {
                    debug!("nonce marked stale; retrying with fresh challenge");
                    stale_retry_used = true;
                    challenge = fresh;
                }
                _ => {
                    warn!(url, "credentials rejected");
                    return Err(DownloadError::auth(url, StatusCode::UNAUTHORIZED.as_u16()));
                }
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        parsed: &Url,
        url: &str,
        authorization: Option<HeaderValue>,
    ) -> Result<Response, DownloadError> {
        let mut request = self.client.request(method, parsed.clone());
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        request
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))
    }
}

fn challenge_from(response: &Response, url: &str) -> Result<DigestChallenge, DownloadError> {
    DigestChallenge::from_headers(response.headers())
        .map_err(|e| DownloadError::protocol(url, format!("unusable digest challenge: {e}")))
}

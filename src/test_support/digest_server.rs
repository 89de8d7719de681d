//! Wiremock responders that behave like the camera's digest-protected API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use wiremock::{Request, Respond, ResponseTemplate};

pub const TEST_USER: &str = "root";
pub const TEST_PASS: &str = "timelapse";
pub const TEST_REALM: &str = "AXIS_ACCC8E000000";
pub const TEST_NONCE: &str = "0000a1b2c3d4e5f60718293a4b5c6d7e";

/// Challenges unauthenticated requests and hands verified ones to `inner`.
///
/// The `Authorization` header is checked independently of the client code:
/// the MD5 response is recomputed from the test credentials and the `uri`
/// must equal the request's path and query.
pub struct DigestAuth<R> {
    inner: R,
}

impl<R: Respond> DigestAuth<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Respond> Respond for DigestAuth<R> {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let authorized = request
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|header| verify(header, request));
        if authorized {
            self.inner.respond(request)
        } else {
            challenge()
        }
    }
}

fn challenge() -> ResponseTemplate {
    ResponseTemplate::new(401).insert_header(
        "WWW-Authenticate",
        format!(
            "Digest realm=\"{TEST_REALM}\", nonce=\"{TEST_NONCE}\", algorithm=MD5, qop=\"auth\""
        )
        .as_str(),
    )
}

fn verify(header: &str, request: &Request) -> bool {
    let Some(params) = header.strip_prefix("Digest ") else {
        return false;
    };
    let param = |name: &str| {
        params.split(", ").find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.trim_matches('"').to_string())
        })
    };
    let (Some(username), Some(uri), Some(nc), Some(cnonce), Some(response)) = (
        param("username"),
        param("uri"),
        param("nc"),
        param("cnonce"),
        param("response"),
    ) else {
        return false;
    };

    let expected_uri = match request.url.query() {
        Some(query) => format!("{}?{query}", request.url.path()),
        None => request.url.path().to_string(),
    };
    if username != TEST_USER || uri != expected_uri {
        return false;
    }

    let ha1 = format!("{:x}", md5::compute(format!("{TEST_USER}:{TEST_REALM}:{TEST_PASS}")));
    let ha2 = format!("{:x}", md5::compute(format!("{}:{uri}", request.method.as_str())));
    let expected = format!(
        "{:x}",
        md5::compute(format!("{ha1}:{TEST_NONCE}:{nc}:{cnonce}:auth:{ha2}"))
    );
    response == expected
}

/// Replays templates in order, repeating the last one once exhausted.
pub struct SequenceResponder {
    templates: Vec<ResponseTemplate>,
    calls: Arc<AtomicUsize>,
}

impl SequenceResponder {
    pub fn new(templates: Vec<ResponseTemplate>) -> Self {
        assert!(!templates.is_empty(), "at least one template required");
        Self {
            templates,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter of requests answered so far.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.templates[index.min(self.templates.len() - 1)].clone()
    }
}

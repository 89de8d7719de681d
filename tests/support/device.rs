//! A wiremock stand-in for the camera's timelapse API.
//!
//! Every route sits behind [`DigestAuth`], so tests exercise the full
//! challenge/response exchange the real device requires.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use super::digest_server::DigestAuth;

pub use timelapse_core::catalog::ARCHIVES_PATH;

/// One archive the fake camera lists and exports.
pub struct Archive {
    pub id: u32,
    pub filename: &'static str,
    pub body: Vec<u8>,
}

impl Archive {
    pub fn new(id: u32, filename: &'static str, body: &[u8]) -> Self {
        Self {
            id,
            filename,
            body: body.to_vec(),
        }
    }
}

/// Mounts the listing for `archives`.
pub async fn mount_listing(server: &MockServer, archives: &[Archive]) {
    let entries: Vec<serde_json::Value> = archives
        .iter()
        .map(|archive| serde_json::json!({ "id": archive.id, "filename": archive.filename }))
        .collect();
    Mock::given(method("GET"))
        .and(path(ARCHIVES_PATH))
        .and(ListingOnly)
        .respond_with(DigestAuth::new(
            ResponseTemplate::new(200).set_body_json(serde_json::Value::Array(entries)),
        ))
        .mount(server)
        .await;
}

/// Mounts the export route of `archive`.
pub async fn mount_export(server: &MockServer, archive: &Archive, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(ARCHIVES_PATH))
        .and(query_param("export", archive.id.to_string()))
        .respond_with(DigestAuth::new(template))
        .mount(server)
        .await;
}

/// Mounts the export route of `archive` with an exact request count. A
/// digest exchange costs two requests: the challenge and the authorized one.
pub async fn mount_export_expecting(
    server: &MockServer,
    archive: &Archive,
    template: ResponseTemplate,
    hits: u64,
) {
    Mock::given(method("GET"))
        .and(path(ARCHIVES_PATH))
        .and(query_param("export", archive.id.to_string()))
        .respond_with(DigestAuth::new(template))
        .expect(hits)
        .mount(server)
        .await;
}

/// Serves a full camera: listing plus one successful export per archive.
pub async fn mount_camera(server: &MockServer, archives: &[Archive]) {
    mount_listing(server, archives).await;
    for archive in archives {
        mount_export(
            server,
            archive,
            ResponseTemplate::new(200).set_body_bytes(archive.body.clone()),
        )
        .await;
    }
}

/// Matches listing requests, never exports.
struct ListingOnly;

impl wiremock::Match for ListingOnly {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == "export")
    }
}

//! Archive listing and export URL derivation.
//!
//! The device lists its timelapse archives as a JSON array at
//! `/local/timelapseme/archives`. Each usable entry carries an `id` and a
//! `filename`; the archive itself is exported from the same path with
//! `?export={id}&file={filename}`.
//!
//! Entries with an empty `id` or `filename` are dropped along with those
//! missing either key: an empty `file` would publish under the fallback
//! name and an empty `export` names no archive.

mod error;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use error::CatalogError;

use crate::auth::DigestSession;
use crate::download::{DownloadError, DownloadTarget};

/// Path of the listing and export endpoint on the device.
pub const ARCHIVES_PATH: &str = "/local/timelapseme/archives";

/// One archive as listed by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDescriptor {
    /// Export identifier (string or number on the wire, kept as text).
    pub id: String,
    /// Name the device gives the archive.
    pub filename: String,
}

#[derive(Debug, Deserialize)]
struct RawArchiveEntry {
    id: Option<ArchiveId>,
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArchiveId {
    Text(String),
    Number(serde_json::Number),
}

impl RawArchiveEntry {
    fn into_descriptor(self) -> Option<ArchiveDescriptor> {
        let id = match self.id? {
            ArchiveId::Text(text) => text,
            ArchiveId::Number(number) => number.to_string(),
        };
        let filename = self.filename?;
        if id.is_empty() || filename.is_empty() {
            return None;
        }
        Some(ArchiveDescriptor { id, filename })
    }
}

/// Parses a listing body into descriptors.
///
/// Entries that are not objects or lack a usable `id`/`filename` are skipped.
/// A valid JSON document that is not an array yields no descriptors.
///
/// # Errors
///
/// Returns the JSON error when `body` is not valid JSON.
pub fn parse_catalog(body: &[u8]) -> Result<Vec<ArchiveDescriptor>, serde_json::Error> {
    let document: serde_json::Value = serde_json::from_slice(body)?;
    let serde_json::Value::Array(entries) = document else {
        warn!("archive listing is not a JSON array; treating as empty");
        return Ok(Vec::new());
    };

    let total = entries.len();
    let descriptors: Vec<ArchiveDescriptor> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<RawArchiveEntry>(entry).ok())
        .filter_map(RawArchiveEntry::into_descriptor)
        .collect();

    if descriptors.len() < total {
        debug!(
            skipped = total - descriptors.len(),
            "ignored archive entries without id or filename"
        );
    }
    Ok(descriptors)
}

/// Lists archives on one device.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    session: DigestSession,
    endpoint: Url,
}

impl CatalogClient {
    /// Creates a client for the device at `host` (`name` or `name:port`).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidHost`] when `host` does not form a plain
    /// `http://{host}/local/timelapseme/archives` URL.
    pub fn new(host: &str, session: DigestSession) -> Result<Self, CatalogError> {
        let endpoint = Url::parse(&format!("http://{host}{ARCHIVES_PATH}"))
            .map_err(|_| CatalogError::invalid_host(host))?;
        if host.is_empty()
            || endpoint.host_str().is_none()
            || endpoint.path() != ARCHIVES_PATH
            || endpoint.query().is_some()
            || endpoint.fragment().is_some()
            || !endpoint.username().is_empty()
        {
            return Err(CatalogError::invalid_host(host));
        }
        Ok(Self { session, endpoint })
    }

    /// Returns the listing/export endpoint without query.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Listing URL with a fresh cache-busting `_` parameter.
    #[must_use]
    pub fn listing_url(&self) -> Url {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let mut url = self.endpoint.clone();
        url.set_query(Some(&format!("_={millis}")));
        url
    }

    /// Export URL for `descriptor`.
    #[must_use]
    pub fn export_url(&self, descriptor: &ArchiveDescriptor) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(Some(&format!(
            "export={}&file={}",
            urlencoding::encode(&descriptor.id),
            urlencoding::encode(&descriptor.filename)
        )));
        url
    }

    /// Fetches and parses the listing.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Fetch`] on transport, auth or HTTP status (≥ 400) failure
    /// - [`CatalogError::Parse`] when the body is not JSON
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn fetch_descriptors(&self) -> Result<Vec<ArchiveDescriptor>, CatalogError> {
        let url = self.listing_url();
        let response = self
            .session
            .perform_get(url.as_str())
            .await
            .map_err(CatalogError::Fetch)?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(CatalogError::Fetch(DownloadError::http_status(
                url.as_str(),
                status.as_u16(),
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::Fetch(DownloadError::network(url.as_str(), e)))?;
        let descriptors = parse_catalog(&body).map_err(|e| CatalogError::parse(url.as_str(), e))?;
        info!(count = descriptors.len(), "fetched archive listing");
        Ok(descriptors)
    }

    /// Fetches the listing and maps each archive to a target in `output_dir`.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_descriptors`](Self::fetch_descriptors).
    pub async fn list_archives(
        &self,
        output_dir: &Path,
    ) -> Result<Vec<DownloadTarget>, CatalogError> {
        let descriptors = self.fetch_descriptors().await?;
        Ok(descriptors
            .iter()
            .map(|descriptor| DownloadTarget::from_url(&self.export_url(descriptor), output_dir))
            .collect())
    }
}

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Server-assigned photo identity. Two records with the same id are the
/// same photo, whatever the rest of their fields say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub u64);

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoRecord {
    pub id: PhotoId,
    /// Not part of the serializer output; empty unless a CDN variant
    /// shows up in the payload.
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(rename = "url")]
    pub full_url: String,
    #[serde(default)]
    pub original_filename: String,
    pub uploaded_at: DateTime<Utc>,
}

impl PhotoRecord {
    /// URL to show in the grid. The service serves one presigned URL per
    /// photo, so the full image stands in when no thumbnail exists.
    pub fn thumbnail(&self) -> &str {
        if self.thumbnail_url.is_empty() {
            &self.full_url
        } else {
            &self.thumbnail_url
        }
    }
}

/// One fetched page, normalized from the service's listing response.
/// `next_cursor` is an opaque token for the following page; `None` means
/// the listing is exhausted.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub records: Vec<PhotoRecord>,
    pub next_cursor: Option<String>,
    pub total_count: Option<u64>,
}

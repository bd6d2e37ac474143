use std::fs::File;
use std::io::{self, Read};

use reqwest::StatusCode;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{PageResult, PhotoRecord};
use crate::upload::PendingFile;

/// Client for the event photo service. Page listings go through the async
/// client; uploads go through the blocking client because the multipart
/// body is a counting `Read` that reports byte progress as the transport
/// consumes it.
pub struct PhotoApi {
    base_url: String,
    access_token: String,
    http: reqwest::Client,
}

/// Raw shape of the listing endpoint: page-number pagination with a fully
/// qualified `next` URL.
#[derive(Debug, Deserialize)]
struct PhotoListing {
    results: Vec<PhotoRecord>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl PhotoApi {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            access_token: access_token.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Fetch one page of the event's photo stream. `cursor` is the opaque
    /// token from a previous page, or `None` for the first page.
    pub async fn fetch_photo_page(&self, cursor: Option<&str>) -> Result<PageResult, ApiError> {
        let url = format!("{}/api/gallery/photos/", self.base_url);
        let mut params = vec![("access_token", self.access_token.as_str())];
        if let Some(page) = cursor {
            params.push(("page", page));
        }

        let response = self.http.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Server(server_error_message(status, &body)));
        }

        let listing: PhotoListing = response.json().await?;
        Ok(PageResult {
            next_cursor: listing.next.as_deref().and_then(page_token),
            total_count: listing.count,
            records: listing.results,
        })
    }

    /// Upload one photo as multipart form data. `on_progress` receives the
    /// cumulative byte count as the request body is read out.
    pub fn upload_photo(
        &self,
        file: &PendingFile,
        on_progress: Box<dyn FnMut(u64) + Send>,
    ) -> Result<PhotoRecord, ApiError> {
        let reader = ProgressReader {
            inner: File::open(&file.path)?,
            sent: 0,
            on_progress,
        };

        let part = reqwest::blocking::multipart::Part::reader_with_length(reader, file.size)
            .file_name(file.name.clone())
            .mime_str(image_mime(&file.name))?;
        let form = reqwest::blocking::multipart::Form::new()
            .text("access_token", self.access_token.clone())
            .part("photo", part);

        let client = reqwest::blocking::Client::new();
        let url = format!("{}/api/gallery/upload/", self.base_url);
        let response = client.post(&url).multipart(form).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Server(server_error_message(status, &body)));
        }

        Ok(response.json()?)
    }
}

/// Wraps the upload body and reports the cumulative bytes handed to the
/// transport after every read.
struct ProgressReader<R> {
    inner: R,
    sent: u64,
    on_progress: Box<dyn FnMut(u64) + Send>,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.sent += n as u64;
            (self.on_progress)(self.sent);
        }
        Ok(n)
    }
}

/// Pull the `page` token out of the listing's `next` URL. The token is
/// treated as opaque by everything above this function.
fn page_token(next_url: &str) -> Option<String> {
    let (_, query) = next_url.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("page="))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn server_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
            return error;
        }
    }

    match status.as_u16() {
        401 | 403 => "Access denied. Check the event access code.".to_string(),
        404 => "Not found. Check the server address and access code.".to_string(),
        _ => format!("Request failed with status: {}", status),
    }
}

fn image_mime(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    #[test]
    fn page_token_is_extracted_from_next_url() {
        let url = "http://localhost:8000/api/gallery/photos/?access_token=abc&page=3";
        assert_eq!(page_token(url), Some("3".to_string()));
    }

    #[test]
    fn page_token_handles_leading_page_param() {
        let url = "http://localhost:8000/api/gallery/photos/?page=2&access_token=abc";
        assert_eq!(page_token(url), Some("2".to_string()));
    }

    #[test]
    fn page_token_missing_or_empty_yields_none() {
        assert_eq!(page_token("http://localhost:8000/api/gallery/photos/"), None);
        assert_eq!(
            page_token("http://localhost:8000/api/gallery/photos/?access_token=abc"),
            None
        );
        assert_eq!(
            page_token("http://localhost:8000/api/gallery/photos/?page="),
            None
        );
    }

    #[test]
    fn listing_json_deserializes() {
        // The serializer sends one presigned URL per photo and no
        // thumbnail variant.
        let json = r#"{
            "count": 42,
            "next": "http://localhost:8000/api/gallery/photos/?access_token=abc&page=2",
            "previous": null,
            "results": [{
                "id": 7,
                "original_filename": "IMG_0007.jpg",
                "uploaded_at": "2025-06-14T18:03:11Z",
                "file_size": 2048000,
                "content_type": "image/jpeg",
                "url": "http://storage.example/e1/7.jpg?signature=xyz"
            }]
        }"#;

        let listing: PhotoListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.count, Some(42));
        assert_eq!(listing.results.len(), 1);

        let record = &listing.results[0];
        assert_eq!(record.id.0, 7);
        assert_eq!(record.original_filename, "IMG_0007.jpg");
        assert_eq!(record.thumbnail(), record.full_url);
        assert_eq!(page_token(listing.next.as_deref().unwrap()), Some("2".to_string()));
    }

    #[test]
    fn server_error_message_prefers_body_error() {
        let message = server_error_message(
            StatusCode::BAD_REQUEST,
            r#"{"error": "Invalid file type. Allowed types: .jpg, .jpeg, .png, .gif, .webp"}"#,
        );
        assert!(message.starts_with("Invalid file type"));
    }

    #[test]
    fn server_error_message_falls_back_to_status() {
        let message = server_error_message(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(message.contains("500"));
        let denied = server_error_message(StatusCode::FORBIDDEN, "not json");
        assert!(denied.contains("access code"));
    }

    #[test]
    fn progress_reader_reports_cumulative_bytes() {
        let payload = vec![7u8; 10_000];
        let reports: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let mut reader = ProgressReader {
            inner: Cursor::new(payload),
            sent: 0,
            on_progress: Box::new(move |sent| sink.lock().unwrap().push(sent)),
        };

        let mut out = Vec::new();
        io::copy(&mut reader, &mut out).unwrap();
        assert_eq!(out.len(), 10_000);

        let reports = reports.lock().unwrap();
        assert!(!reports.is_empty());
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*reports.last().unwrap(), 10_000);
    }

    #[test]
    fn image_mime_matches_extension() {
        assert_eq!(image_mime("party.JPG"), "image/jpeg");
        assert_eq!(image_mime("party.webp"), "image/webp");
        assert_eq!(image_mime("party"), "application/octet-stream");
    }
}

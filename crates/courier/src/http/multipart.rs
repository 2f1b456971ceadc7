//! `multipart/form-data` encoding for file uploads.

use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use rand::Rng;
use rand::distributions::Alphanumeric;

/// Media type used when an upload has no explicit content type.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const BOUNDARY_LEN: usize = 30;

/// A single part of a multipart form.
///
/// ```ignore
/// UploadFile::new("images", "example.jpg", jpeg_bytes, "image/jpeg");
/// UploadFile::new("file", "report.csv", csv_bytes, "");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    /// Form field name.
    pub name: String,
    /// File name reported to the server; omitted from the part when empty.
    pub file_name: String,
    /// Raw content.
    pub data: Bytes,
    /// Media type; [`DEFAULT_CONTENT_TYPE`] when empty.
    pub content_type: String,
}

impl UploadFile {
    /// Create an upload descriptor.
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// The media type written into the part header.
    pub fn effective_content_type(&self) -> &str {
        if self.content_type.is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            &self.content_type
        }
    }

    fn contains(&self, needle: &[u8]) -> bool {
        contains(&self.data, needle)
            || contains(self.name.as_bytes(), needle)
            || contains(self.file_name.as_bytes(), needle)
    }
}

/// An encoded multipart body and the boundary it uses.
#[derive(Clone, Debug)]
pub struct MultipartBody {
    boundary: String,
    body: Bytes,
}

impl MultipartBody {
    /// Encode `files` in order, choosing a boundary that occurs in none of them.
    pub fn encode(files: &[UploadFile]) -> Self {
        let boundary = loop {
            let candidate = generate_boundary();
            let delimiter = format!("--{candidate}");
            if files.iter().all(|file| !file.contains(delimiter.as_bytes())) {
                break candidate;
            }
            tracing::debug!(target: "courier::http", "Multipart boundary collided with content, regenerating");
        };
        Self::encode_with_boundary(files, boundary)
    }

    /// Encode `files` with a caller-chosen boundary.
    pub(crate) fn encode_with_boundary(files: &[UploadFile], boundary: String) -> Self {
        let capacity: usize = files
            .iter()
            .map(|file| file.data.len() + boundary.len() + 128)
            .sum();
        let mut body = BytesMut::with_capacity(capacity + boundary.len() + 8);

        for file in files {
            body.put_slice(b"--");
            body.put_slice(boundary.as_bytes());
            body.put_slice(b"\r\n");

            body.put_slice(b"Content-Disposition: form-data; name=\"");
            body.put_slice(escape_quoted(&file.name).as_bytes());
            body.put_slice(b"\"");
            if !file.file_name.is_empty() {
                body.put_slice(b"; filename=\"");
                body.put_slice(escape_quoted(&file.file_name).as_bytes());
                body.put_slice(b"\"");
            }
            body.put_slice(b"\r\n");

            body.put_slice(b"Content-Type: ");
            body.put_slice(file.effective_content_type().as_bytes());
            body.put_slice(b"\r\n\r\n");

            body.put_slice(&file.data);
            body.put_slice(b"\r\n");
        }

        body.put_slice(b"--");
        body.put_slice(boundary.as_bytes());
        body.put_slice(b"--\r\n");

        Self {
            boundary,
            body: body.freeze(),
        }
    }

    /// The boundary token (without the leading dashes).
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The `Content-Type` header value for this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// The encoded body.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }
}

fn generate_boundary() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_LEN)
        .map(char::from)
        .collect()
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty()
        || haystack.len() >= needle.len()
            && haystack.windows(needle.len()).any(|window| window == needle)
}

/// Guess a media type from a file extension.
///
/// Returns an empty string for unknown extensions so the encoder falls back
/// to [`DEFAULT_CONTENT_TYPE`].
pub fn media_type_for_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return "";
    };
    match ext.to_ascii_lowercase().as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let files = vec![
            UploadFile::new("a", "a.txt", "alpha", "text/plain"),
            UploadFile::new("b", "", "beta", ""),
        ];
        let body = MultipartBody::encode_with_boundary(&files, "XyZ".to_string());
        assert_eq!(body.content_type(), "multipart/form-data; boundary=XyZ");

        let expected = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"a\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            alpha\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"b\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            beta\r\n\
            --XyZ--\r\n";
        assert_eq!(body.into_bytes(), expected.as_bytes());
    }

    #[test]
    fn test_boundary_is_random_alphanumeric() {
        let first = MultipartBody::encode(&[]);
        let second = MultipartBody::encode(&[]);
        assert_eq!(first.boundary().len(), BOUNDARY_LEN);
        assert!(first.boundary().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first.boundary(), second.boundary());
    }

    #[test]
    fn test_boundary_absent_from_content() {
        let file = UploadFile::new("f", "f.bin", "--abc payload", "");
        let body = MultipartBody::encode(std::slice::from_ref(&file));
        assert!(!file.contains(format!("--{}", body.boundary()).as_bytes()));
    }

    #[test]
    fn test_quoted_names_are_escaped() {
        assert_eq!(escape_quoted("a\"b"), "a\\\"b");
        assert_eq!(escape_quoted("line\r\nbreak"), "line  break");
    }

    #[test]
    fn test_media_type_for_path() {
        assert_eq!(media_type_for_path(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("data.json")), "application/json");
        assert_eq!(media_type_for_path(Path::new("archive.unknown")), "");
        assert_eq!(media_type_for_path(Path::new("Makefile")), "");
    }
}

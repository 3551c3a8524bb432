//! Normalization of image inputs into the base64 text the service expects.
//!
//! Every recognition call accepts a [`FileSource`]: text that is already
//! base64 (with or without a `data:` header), a file-backed [`Blob`] that is
//! read lazily, or an in-memory byte buffer. An [`Encoder`] turns any of them
//! into base64 text, and [`strip_header`] removes the data URL prefix before
//! the payload goes on the wire.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;

use crate::error::{Result, UmiError};

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = "base64,";

/// A file-backed binary source, read asynchronously when encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    path: PathBuf,
    mime: Option<String>,
}

impl Blob {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Explicit MIME type if one was set, otherwise a guess from the file
    /// extension.
    pub fn mime_type(&self) -> String {
        self.mime.clone().unwrap_or_else(|| {
            mime_guess::from_path(&self.path)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
    }

    pub(crate) async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            UmiError::Encoding(format!("Failed to read {}: {e}", self.path.display()))
        })
    }
}

/// Any input accepted by the recognition endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Already-encoded base64 text, optionally carrying a data URL header.
    Base64(String),
    Blob(Blob),
    Buffer(Vec<u8>),
}

impl From<&str> for FileSource {
    fn from(value: &str) -> Self {
        FileSource::Base64(value.to_string())
    }
}

impl From<String> for FileSource {
    fn from(value: String) -> Self {
        FileSource::Base64(value)
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(value: Vec<u8>) -> Self {
        FileSource::Buffer(value)
    }
}

impl From<&[u8]> for FileSource {
    fn from(value: &[u8]) -> Self {
        FileSource::Buffer(value.to_vec())
    }
}

impl From<Blob> for FileSource {
    fn from(value: Blob) -> Self {
        FileSource::Blob(value)
    }
}

/// Facilities available for turning blobs into base64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Blobs can be read into a data URL (`data:<mime>;base64,...`).
    pub blob_reader: bool,
    /// Raw bytes can be encoded to bare base64.
    pub buffer_encoder: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        blob_reader: false,
        buffer_encoder: false,
    };

    /// Both facilities are backed by `tokio::fs` and the `base64` crate.
    pub fn detect() -> Self {
        Self {
            blob_reader: true,
            buffer_encoder: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    DataUrlReader,
    BufferEncoder,
}

/// Converts [`FileSource`] values into base64 text using the strategy chosen
/// when it was probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoder {
    strategy: Strategy,
}

impl Encoder {
    /// Picks the blob strategy from the available capabilities, preferring
    /// the data URL reader. Fails immediately when neither is present.
    pub fn probe(capabilities: Capabilities) -> Result<Self> {
        let strategy = if capabilities.blob_reader {
            Strategy::DataUrlReader
        } else if capabilities.buffer_encoder {
            Strategy::BufferEncoder
        } else {
            return Err(UmiError::UnsupportedEnvironment(
                "Blob is not supported in this environment".to_string(),
            ));
        };
        debug!(?strategy, "Selected base64 encoding strategy");
        Ok(Self { strategy })
    }

    pub fn detect() -> Result<Self> {
        Self::probe(Capabilities::detect())
    }

    /// Returns base64 text for `source`. A header is kept if the input had
    /// one or if the data URL reader produced one.
    pub async fn normalize_to_base64(&self, source: &FileSource) -> Result<String> {
        match source {
            FileSource::Base64(text) => Ok(text.clone()),
            FileSource::Buffer(bytes) => Ok(STANDARD.encode(bytes)),
            FileSource::Blob(blob) => {
                let bytes = blob.read().await?;
                let payload = STANDARD.encode(&bytes);
                match self.strategy {
                    Strategy::DataUrlReader => Ok(data_url(&blob.mime_type(), &payload)),
                    Strategy::BufferEncoder => Ok(payload),
                }
            }
        }
    }

    /// [`normalize_to_base64`](Self::normalize_to_base64) followed by
    /// [`strip_header`]: the form every recognition request carries.
    pub async fn normalize_without_header(&self, source: &FileSource) -> Result<String> {
        let encoded = self.normalize_to_base64(source).await?;
        Ok(strip_header(&encoded).to_string())
    }
}

fn strip_one_header(input: &str) -> Option<&str> {
    let rest = input.strip_prefix(DATA_PREFIX)?;
    // The media type part must be non-empty and stay on one line.
    let first = rest.chars().next()?.len_utf8();
    let marker = rest[first..].find(BASE64_MARKER)? + first;
    if rest[..marker].contains(['\n', '\r', '\u{2028}', '\u{2029}']) {
        return None;
    }
    Some(&rest[marker + BASE64_MARKER.len()..])
}

/// Removes leading `data:<mime>;base64,` headers. Idempotent.
pub fn strip_header(input: &str) -> &str {
    let mut current = input;
    while let Some(rest) = strip_one_header(current) {
        current = rest;
    }
    current
}

/// Builds a directly renderable data URI.
pub fn data_url(mime: &str, payload: &str) -> String {
    format!("{DATA_PREFIX}{mime};{BASE64_MARKER}{payload}")
}

/// Decodes base64 text, with or without a data URL header, back to bytes.
pub fn decode_base64(input: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(strip_header(input).trim())
        .map_err(|e| UmiError::Encoding(format!("Invalid base64 payload: {e}")))
}

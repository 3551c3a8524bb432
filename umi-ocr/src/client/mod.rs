//! HTTP clients for the Umi-OCR service.
//!
//! [`UmiClient`] owns one connection pool and hands out per-area clients
//! that share it. Each client method maps to exactly one HTTP request.

mod document;
mod http;
mod image;
mod qrcode;

pub use document::{
    DocumentClient, DOC_CLEAR_PATH, DOC_DOWNLOAD_PATH, DOC_RESULT_PATH, DOC_UPLOAD_PATH,
};
pub use image::{ImageOcrClient, IMAGE_OCR_PATH};
pub use qrcode::{QrcodeClient, QRCODE_PATH};

use crate::config::ClientConfig;
use crate::encoding::Encoder;
use crate::error::Result;

use self::http::HttpTransport;

#[derive(Clone, Debug)]
pub struct UmiClient {
    base_url: String,
    image: ImageOcrClient,
    qrcode: QrcodeClient,
    documents: DocumentClient,
}

impl UmiClient {
    /// Builds a client for the service at `config.base_url`.
    ///
    /// Fails if the base URL is not http(s) or if no base64 strategy is
    /// available for local inputs.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = HttpTransport::new(config)?;
        let encoder = Encoder::detect()?;
        tracing::debug!(base_url = http.base_url(), "Umi-OCR client ready");

        Ok(Self {
            base_url: http.base_url().to_string(),
            image: ImageOcrClient::new(http.clone(), encoder),
            qrcode: QrcodeClient::new(http.clone(), encoder),
            documents: DocumentClient::new(http),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn image(&self) -> &ImageOcrClient {
        &self.image
    }

    pub fn qrcode(&self) -> &QrcodeClient {
        &self.qrcode
    }

    pub fn documents(&self) -> &DocumentClient {
        &self.documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_base_url() {
        let client = UmiClient::new(&ClientConfig::with_base_url("http://localhost:1224/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1224");
    }

    #[test]
    fn test_new_rejects_other_schemes() {
        let err = UmiClient::new(&ClientConfig::with_base_url("ftp://localhost:1224")).unwrap_err();
        assert!(err.to_string().contains("ftp"));
    }
}

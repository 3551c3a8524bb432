//! Typed client for a local Umi-OCR service.
//!
//! Covers single-image OCR, barcode/QR generation and recognition, and the
//! asynchronous document OCR job lifecycle (submit, query, download, clear).
//!
//! ```no_run
//! use umi_ocr::{ClientConfig, ImageOcrOptions, Text, UmiClient};
//!
//! # async fn run() -> umi_ocr::Result<()> {
//! let client = UmiClient::new(&ClientConfig::default())?;
//! let result = client
//!     .image()
//!     .recognize_image(b"...".to_vec(), &ImageOcrOptions::<Text>::new())
//!     .await?;
//! if let Some(text) = result.data.value() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod job;
pub mod models;

pub use client::{DocumentClient, ImageOcrClient, QrcodeClient, UmiClient};
pub use config::{ClientConfig, Config, PollingConfig};
pub use encoding::{Blob, Encoder, FileSource};
pub use error::{Result, UmiError};
pub use job::{JobSnapshot, JobTracker, Observation};
pub use models::{
    DataFormat, Dict, DocClearOptions, DocDownloadOptions, DocOcrOptions, DocQueryOptions,
    DocumentFile, DownloadFileType, ImageOcrOptions, JobState, QrcodeFormat,
    QrcodeGenerationOptions, QrcodeRecognitionOptions, ResponseData, Text,
};

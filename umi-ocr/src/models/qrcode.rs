use serde::{Deserialize, Serialize};

use super::common::{is_success_code, Quad, ResponseData};
use super::image::timestamp_to_utc;
use crate::encoding::{data_url, decode_base64};
use crate::error::{Result, UmiError};

/// Barcode / matrix code symbologies understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QrcodeFormat {
    Aztec,
    Codabar,
    Code128,
    Code39,
    Code93,
    DataBar,
    DataBarExpanded,
    DataMatrix,
    #[serde(rename = "EAN13")]
    Ean13,
    #[serde(rename = "EAN8")]
    Ean8,
    #[serde(rename = "ITF")]
    Itf,
    LinearCodes,
    MatrixCodes,
    MaxiCode,
    #[serde(rename = "MicroQRCode")]
    MicroQrCode,
    #[serde(rename = "PDF417")]
    Pdf417,
    #[default]
    #[serde(rename = "QRCode")]
    QrCode,
    #[serde(rename = "UPCA")]
    Upca,
    #[serde(rename = "UPCE")]
    Upce,
}

impl QrcodeFormat {
    pub const ALL: [QrcodeFormat; 19] = [
        Self::Aztec,
        Self::Codabar,
        Self::Code128,
        Self::Code39,
        Self::Code93,
        Self::DataBar,
        Self::DataBarExpanded,
        Self::DataMatrix,
        Self::Ean13,
        Self::Ean8,
        Self::Itf,
        Self::LinearCodes,
        Self::MatrixCodes,
        Self::MaxiCode,
        Self::MicroQrCode,
        Self::Pdf417,
        Self::QrCode,
        Self::Upca,
        Self::Upce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aztec => "Aztec",
            Self::Codabar => "Codabar",
            Self::Code128 => "Code128",
            Self::Code39 => "Code39",
            Self::Code93 => "Code93",
            Self::DataBar => "DataBar",
            Self::DataBarExpanded => "DataBarExpanded",
            Self::DataMatrix => "DataMatrix",
            Self::Ean13 => "EAN13",
            Self::Ean8 => "EAN8",
            Self::Itf => "ITF",
            Self::LinearCodes => "LinearCodes",
            Self::MatrixCodes => "MatrixCodes",
            Self::MaxiCode => "MaxiCode",
            Self::MicroQrCode => "MicroQRCode",
            Self::Pdf417 => "PDF417",
            Self::QrCode => "QRCode",
            Self::Upca => "UPCA",
            Self::Upce => "UPCE",
        }
    }

    /// Formats for which `ec_level` has an effect.
    pub fn supports_ec_level(&self) -> bool {
        matches!(self, Self::Aztec | Self::Pdf417 | Self::QrCode)
    }
}

impl std::fmt::Display for QrcodeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QrcodeFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown code format: {s}"))
    }
}

/// Error correction level. Wire values are the service's own ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(into = "i8")]
pub enum EcLevel {
    #[default]
    Auto,
    /// About 7% of codewords recoverable.
    Low,
    /// About 15%.
    Medium,
    /// About 25%.
    Quartile,
    /// About 30%.
    High,
}

impl From<EcLevel> for i8 {
    fn from(value: EcLevel) -> Self {
        match value {
            EcLevel::Auto => -1,
            EcLevel::Low => 1,
            EcLevel::Medium => 0,
            EcLevel::Quartile => 3,
            EcLevel::High => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QrcodeGenerationOptions {
    /// Full endpoint URL, replacing `<base>/api/qrcode`. Never sent.
    #[serde(skip)]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<QrcodeFormat>,
    /// Image width; 0 picks the minimum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    /// Image height; 0 picks the minimum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    /// Blank margin around the code; -1 lets the service decide.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_zone: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec_level: Option<EcLevel>,
}

impl QrcodeGenerationOptions {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QrcodeGenerationBody<'a> {
    pub text: &'a str,
    pub options: &'a QrcodeGenerationOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrcodeGenerationResult {
    pub code: i64,
    /// A `data:image/jpeg;base64,...` URI on success, otherwise the reason
    /// generation failed.
    #[serde(default)]
    pub data: String,
}

impl QrcodeGenerationResult {
    pub fn is_success(&self) -> bool {
        is_success_code(self.code)
    }

    /// Turns the raw base64 payload of a successful response into a data URI.
    pub(crate) fn decorate(mut self) -> Self {
        if self.is_success() && !self.data.is_empty() {
            self.data = data_url("image/jpeg", &self.data);
        }
        self
    }

    /// Decoded JPEG bytes of a successful generation.
    pub fn image_bytes(&self) -> Result<Vec<u8>> {
        if !self.is_success() {
            return Err(UmiError::Encoding(format!(
                "No image in failed generation (code {}): {}",
                self.code, self.data
            )));
        }
        decode_base64(&self.data)
    }
}

/// Median filter window for QR preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum MedianFilterSize {
    One,
    Three,
    Five,
    Seven,
    Nine,
}

impl From<MedianFilterSize> for u8 {
    fn from(value: MedianFilterSize) -> Self {
        match value {
            MedianFilterSize::One => 1,
            MedianFilterSize::Three => 3,
            MedianFilterSize::Five => 5,
            MedianFilterSize::Seven => 7,
            MedianFilterSize::Nine => 9,
        }
    }
}

impl TryFrom<u8> for MedianFilterSize {
    type Error = UmiError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::One),
            3 => Ok(Self::Three),
            5 => Ok(Self::Five),
            7 => Ok(Self::Seven),
            9 => Ok(Self::Nine),
            other => Err(UmiError::Validation(format!(
                "median filter size must be one of 1, 3, 5, 7, 9 (got {other})"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QrcodeRecognitionOptions {
    /// Full endpoint URL, replacing `<base>/api/qrcode`. Never sent.
    #[serde(skip)]
    pub url: Option<String>,
    #[serde(
        rename = "preprocessing.median_filter_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub median_filter_size: Option<MedianFilterSize>,
    #[serde(
        rename = "preprocessing.sharpness_factor",
        skip_serializing_if = "Option::is_none"
    )]
    pub sharpness_factor: Option<f64>,
    #[serde(
        rename = "preprocessing.contrast_factor",
        skip_serializing_if = "Option::is_none"
    )]
    pub contrast_factor: Option<f64>,
    #[serde(rename = "preprocessing.grayscale", skip_serializing_if = "Option::is_none")]
    pub grayscale: Option<bool>,
    /// Binarization threshold; only applied when `grayscale` is on.
    #[serde(rename = "preprocessing.threshold", skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,
}

impl QrcodeRecognitionOptions {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Checks the enhancement factors lie in (0, 10].
    pub fn validate(&self) -> Result<()> {
        for (name, factor) in [
            ("sharpness_factor", self.sharpness_factor),
            ("contrast_factor", self.contrast_factor),
        ] {
            if let Some(value) = factor {
                if !(value > 0.0 && value <= 10.0) {
                    return Err(UmiError::Validation(format!(
                        "{name} must be in (0, 10] (got {value})"
                    )));
                }
            }
        }
        Ok(())
    }

    /// True when a threshold is set but grayscale conversion is not, in
    /// which case the service ignores the threshold.
    pub fn threshold_ignored(&self) -> bool {
        self.threshold.is_some() && self.grayscale != Some(true)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QrcodeRecognitionBody<'a> {
    pub base64: String,
    pub options: &'a QrcodeRecognitionOptions,
}

/// One decoded code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrcodeData {
    /// Rotation of the code; 0 is upright.
    #[serde(default)]
    pub orientation: i32,
    /// Corners clockwise from the top-left.
    #[serde(rename = "box")]
    pub bbox: Quad,
    /// Always 1; present so the shape matches OCR text blocks.
    #[serde(default = "default_score")]
    pub score: f64,
    pub format: QrcodeFormat,
    pub text: String,
}

fn default_score() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawQrcodeRecognitionResult {
    pub code: i64,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrcodeRecognitionResult {
    pub code: i64,
    pub data: ResponseData<Vec<QrcodeData>>,
    pub time: f64,
    pub timestamp: f64,
}

impl QrcodeRecognitionResult {
    pub(crate) fn from_raw(raw: RawQrcodeRecognitionResult) -> Result<Self> {
        Ok(Self {
            code: raw.code,
            data: ResponseData::decode("qrcodeRecognition", raw.code, raw.data)?,
            time: raw.time,
            timestamp: raw.timestamp,
        })
    }

    pub fn is_success(&self) -> bool {
        is_success_code(self.code)
    }

    /// Decoded codes; empty on failure.
    pub fn codes(&self) -> &[QrcodeData] {
        self.data.value().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn timestamp_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        timestamp_to_utc(self.timestamp)
    }
}

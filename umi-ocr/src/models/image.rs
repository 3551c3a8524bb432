use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{is_success_code, DataFormat, FormatTag, Quad, ResponseData, ResultFormat};
use super::document::DocPageResult;
use crate::error::Result;

/// Language / model library used for recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "models/config_chinese.txt")]
    Chinese,
    #[serde(rename = "models/config_en.txt")]
    English,
    #[serde(rename = "models/config_chinese_cht(v2).txt")]
    TraditionalChinese,
    #[serde(rename = "models/config_japan.txt")]
    Japanese,
    #[serde(rename = "models/config_korean.txt")]
    Korean,
    #[serde(rename = "models/config_cyrillic.txt")]
    Cyrillic,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chinese => write!(f, "zh"),
            Self::English => write!(f, "en"),
            Self::TraditionalChinese => write!(f, "zh-tw"),
            Self::Japanese => write!(f, "ja"),
            Self::Korean => write!(f, "ko"),
            Self::Cyrillic => write!(f, "ru"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zh" | "zh-cn" | "chinese" => Ok(Self::Chinese),
            "en" | "english" => Ok(Self::English),
            "zh-tw" | "cht" => Ok(Self::TraditionalChinese),
            "ja" | "japanese" => Ok(Self::Japanese),
            "ko" | "korean" => Ok(Self::Korean),
            "ru" | "cyrillic" => Ok(Self::Cyrillic),
            _ => Err(format!("Unknown language: {s}")),
        }
    }
}

/// Images with a longer side than this are scaled down before recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(into = "u32")]
pub enum LimitSideLen {
    #[default]
    Default,
    Large,
    ExtraLarge,
    Unlimited,
}

impl From<LimitSideLen> for u32 {
    fn from(value: LimitSideLen) -> Self {
        match value {
            LimitSideLen::Default => 960,
            LimitSideLen::Large => 2880,
            LimitSideLen::ExtraLarge => 4320,
            LimitSideLen::Unlimited => 999_999,
        }
    }
}

impl std::str::FromStr for LimitSideLen {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "960" | "default" => Ok(Self::Default),
            "2880" | "large" => Ok(Self::Large),
            "4320" | "extra-large" => Ok(Self::ExtraLarge),
            "999999" | "unlimited" => Ok(Self::Unlimited),
            _ => Err(format!("Unsupported side length limit: {s}")),
        }
    }
}

/// Layout parsing scheme: how text blocks are grouped and ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TbpuParser {
    #[default]
    MultiPara,
    MultiLine,
    MultiNone,
    SinglePara,
    SingleLine,
    SingleNone,
    SingleCode,
    None,
}

impl std::fmt::Display for TbpuParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultiPara => write!(f, "multi_para"),
            Self::MultiLine => write!(f, "multi_line"),
            Self::MultiNone => write!(f, "multi_none"),
            Self::SinglePara => write!(f, "single_para"),
            Self::SingleLine => write!(f, "single_line"),
            Self::SingleNone => write!(f, "single_none"),
            Self::SingleCode => write!(f, "single_code"),
            Self::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for TbpuParser {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "multi_para" => Ok(Self::MultiPara),
            "multi_line" => Ok(Self::MultiLine),
            "multi_none" => Ok(Self::MultiNone),
            "single_para" => Ok(Self::SinglePara),
            "single_line" => Ok(Self::SingleLine),
            "single_none" => Ok(Self::SingleNone),
            "single_code" => Ok(Self::SingleCode),
            "none" => Ok(Self::None),
            _ => Err(format!("Unknown layout parser: {s}")),
        }
    }
}

/// Rectangle excluded from recognition, as `[[left, top], [right, bottom]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreArea(pub [i64; 2], pub [i64; 2]);

impl IgnoreArea {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self([left, top], [right, bottom])
    }
}

/// Structured recognition format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dict;

/// Plain text recognition format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Text;

impl DataFormat for Dict {
    const FORMAT: ResultFormat = ResultFormat::Dict;
    type ImageData = Vec<TextBlock>;
    type DocEntry = DocPageResult;
}

impl DataFormat for Text {
    const FORMAT: ResultFormat = ResultFormat::Text;
    type ImageData = String;
    type DocEntry = String;
}

/// Options for a single image recognition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(bound(serialize = "F: DataFormat"))]
pub struct ImageOcrOptions<F: DataFormat = Dict> {
    /// Full endpoint URL, replacing `<base>/api/ocr`. Never sent.
    #[serde(skip)]
    pub url: Option<String>,
    #[serde(rename = "ocr.language", skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Orientation correction; slower but handles rotated text.
    #[serde(rename = "ocr.cls", skip_serializing_if = "Option::is_none")]
    pub cls: Option<bool>,
    #[serde(rename = "ocr.limit_side_len", skip_serializing_if = "Option::is_none")]
    pub limit_side_len: Option<LimitSideLen>,
    #[serde(rename = "tbpu.parser", skip_serializing_if = "Option::is_none")]
    pub parser: Option<TbpuParser>,
    #[serde(rename = "tbpu.ignoreArea", skip_serializing_if = "Option::is_none")]
    pub ignore_area: Option<Vec<IgnoreArea>>,
    /// Fixed by `F`; always sent.
    #[serde(rename = "data.format")]
    pub format: FormatTag<F>,
}

impl<F: DataFormat> ImageOcrOptions<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn format(&self) -> ResultFormat {
        F::FORMAT
    }
}

/// Request body for `POST /api/ocr`.
#[derive(Debug, Serialize)]
#[serde(bound(serialize = "F: DataFormat"))]
pub(crate) struct ImageOcrBody<'a, F: DataFormat> {
    pub base64: String,
    pub options: &'a ImageOcrOptions<F>,
}

/// One recognized text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "box")]
    pub bbox: Quad,
    pub score: f64,
    pub text: String,
    /// Separator that follows this block in reading order.
    #[serde(default)]
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImageOcrResult {
    pub code: i64,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageOcrResult<F: DataFormat = Dict> {
    pub code: i64,
    pub data: ResponseData<F::ImageData>,
    /// Average confidence over all blocks.
    pub score: f64,
    /// Processing time in seconds.
    pub time: f64,
    /// Unix time in seconds when processing started.
    pub timestamp: f64,
}

impl<F: DataFormat> ImageOcrResult<F> {
    pub(crate) fn from_raw(raw: RawImageOcrResult) -> Result<Self> {
        Ok(Self {
            code: raw.code,
            data: ResponseData::decode("imageOcr", raw.code, raw.data)?,
            score: raw.score,
            time: raw.time,
            timestamp: raw.timestamp,
        })
    }

    pub fn is_success(&self) -> bool {
        is_success_code(self.code)
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        timestamp_to_utc(self.timestamp)
    }
}

pub(crate) fn timestamp_to_utc(timestamp: f64) -> Option<DateTime<Utc>> {
    if !timestamp.is_finite() || timestamp <= 0.0 {
        return None;
    }
    let secs = timestamp.trunc() as i64;
    let nanos = (timestamp.fract() * 1e9) as u32;
    DateTime::from_timestamp(secs, nanos)
}

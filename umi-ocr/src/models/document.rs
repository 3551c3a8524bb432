use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::common::{is_success_code, DataFormat, FormatTag, ResponseData};
use super::image::{Dict, IgnoreArea, Language, LimitSideLen, TbpuParser, TextBlock};
use crate::error::{Result, UmiError};

/// How content is pulled out of each document page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionMode {
    /// OCR images, copy embedded text as is.
    #[default]
    Mixed,
    /// Render and OCR every page, ignoring embedded text.
    FullPage,
    ImageOnly,
    TextOnly,
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mixed => write!(f, "mixed"),
            Self::FullPage => write!(f, "fullPage"),
            Self::ImageOnly => write!(f, "imageOnly"),
            Self::TextOnly => write!(f, "textOnly"),
        }
    }
}

impl std::str::FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "mixed" => Ok(Self::Mixed),
            "fullpage" => Ok(Self::FullPage),
            "imageonly" => Ok(Self::ImageOnly),
            "textonly" => Ok(Self::TextOnly),
            _ => Err(format!("Unknown extraction mode: {s}")),
        }
    }
}

/// Options captured when a document is submitted. They apply for the whole
/// life of the job; later calls only carry the job id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(bound(serialize = "F: DataFormat"))]
pub struct DocOcrOptions<F: DataFormat = Dict> {
    /// Full endpoint URL, replacing `<base>/api/doc/upload`. Never sent.
    #[serde(skip)]
    pub url: Option<String>,
    #[serde(rename = "ocr.language", skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(rename = "ocr.cls", skip_serializing_if = "Option::is_none")]
    pub cls: Option<bool>,
    #[serde(rename = "ocr.limit_side_len", skip_serializing_if = "Option::is_none")]
    pub limit_side_len: Option<LimitSideLen>,
    #[serde(rename = "tbpu.parser", skip_serializing_if = "Option::is_none")]
    pub parser: Option<TbpuParser>,
    #[serde(rename = "tbpu.ignoreArea", skip_serializing_if = "Option::is_none")]
    pub ignore_area: Option<Vec<IgnoreArea>>,
    /// First page (from 1) the ignore areas apply to.
    #[serde(rename = "tbpu.ignoreRangeStart", skip_serializing_if = "Option::is_none")]
    pub ignore_range_start: Option<i64>,
    /// Last page the ignore areas apply to; negative counts from the end.
    #[serde(rename = "tbpu.ignoreRangeEnd", skip_serializing_if = "Option::is_none")]
    pub ignore_range_end: Option<i64>,
    #[serde(rename = "pageRangeStart", skip_serializing_if = "Option::is_none")]
    pub page_range_start: Option<i64>,
    /// Negative counts from the end: -1 is the last page.
    #[serde(rename = "pageRangeEnd", skip_serializing_if = "Option::is_none")]
    pub page_range_end: Option<i64>,
    /// Explicit pages; wins over the range when both are set.
    #[serde(rename = "pageList", skip_serializing_if = "Option::is_none")]
    pub page_list: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "doc.extractionMode", skip_serializing_if = "Option::is_none")]
    pub extraction_mode: Option<ExtractionMode>,
    /// Fixed by `F`; always sent.
    #[serde(rename = "data.format")]
    pub format: FormatTag<F>,
}

impl<F: DataFormat> DocOcrOptions<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A document to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl DocumentFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime: None,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| UmiError::Encoding(format!("Failed to read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn mime_type(&self) -> String {
        self.mime.clone().unwrap_or_else(|| {
            mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocUploadResult {
    pub code: i64,
    /// The job id on success, otherwise the reason the upload was refused.
    #[serde(default)]
    pub data: String,
}

impl DocUploadResult {
    pub fn is_success(&self) -> bool {
        is_success_code(self.code)
    }

    pub fn job_id(&self) -> Option<&str> {
        self.is_success().then_some(self.data.as_str())
    }
}

/// Server-side state of a document job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Waiting,
    Running,
    Success,
    Failure,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success | JobState::Failure)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = "F: DataFormat"))]
pub struct DocQueryOptions<F: DataFormat = Dict> {
    /// Full endpoint URL, replacing `<base>/api/doc/result`. Never sent.
    #[serde(skip)]
    pub url: Option<String>,
    pub id: String,
    /// Include recognized content. The service defaults to `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_data: Option<bool>,
    /// Only entries not yet delivered. The service defaults to `true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_unread: Option<bool>,
    format: FormatTag<F>,
}

impl<F: DataFormat> DocQueryOptions<F> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            url: None,
            id: id.into(),
            is_data: None,
            is_unread: None,
            format: FormatTag::default(),
        }
    }

    pub fn with_data(mut self, is_data: bool) -> Self {
        self.is_data = Some(is_data);
        self
    }

    pub fn unread(mut self, is_unread: bool) -> Self {
        self.is_unread = Some(is_unread);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn includes_data(&self) -> bool {
        self.is_data.unwrap_or(false)
    }

    pub fn unread_only(&self) -> bool {
        self.is_unread.unwrap_or(true)
    }
}

fn blocks_or_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<TextBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    // blank pages carry a string (or nothing) instead of a block list
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null | serde_json::Value::String(_) => Ok(Vec::new()),
        blocks => serde_json::from_value(blocks).map_err(serde::de::Error::custom),
    }
}

fn success_code() -> i64 {
    super::common::SUCCESS_CODE
}

/// Recognition result for one page, in the structured format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocPageResult {
    /// 1-based page number.
    pub page: u32,
    #[serde(default = "success_code")]
    pub code: i64,
    /// Text blocks on the page. Empty for blank pages, whose `data` the
    /// service reports as a string.
    #[serde(default, deserialize_with = "blocks_or_empty")]
    pub data: Vec<TextBlock>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub timestamp: f64,
}

impl DocPageResult {
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|block| block.text.trim().is_empty())
    }

    /// Page text with each block followed by its separator.
    pub fn text(&self) -> String {
        self.data
            .iter()
            .map(|block| format!("{}{}", block.text, block.end))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDocQueryResult {
    pub code: i64,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub processed_count: u32,
    #[serde(default)]
    pub pages_count: u32,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub state: JobState,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocQueryResult<F: DataFormat = Dict> {
    pub code: i64,
    /// Entries on success (empty when content was not requested), the
    /// failure reason otherwise.
    pub data: ResponseData<Vec<F::DocEntry>>,
    pub processed_count: u32,
    pub pages_count: u32,
    pub is_done: bool,
    pub state: JobState,
    /// Why the job failed; only set in the `failure` state. Pages finished
    /// before the failure can still be queried.
    pub message: Option<String>,
}

impl<F: DataFormat> DocQueryResult<F> {
    pub(crate) fn from_raw(raw: RawDocQueryResult) -> Result<Self> {
        Ok(Self {
            code: raw.code,
            data: ResponseData::decode("docOcrResult", raw.code, raw.data)?,
            processed_count: raw.processed_count,
            pages_count: raw.pages_count,
            is_done: raw.is_done,
            state: raw.state,
            message: raw.message,
        })
    }

    pub fn is_success(&self) -> bool {
        is_success_code(self.code)
    }

    pub fn entries(&self) -> &[F::DocEntry] {
        self.data.value().map(Vec::as_slice).unwrap_or_default()
    }

    /// The failure reason of a job in the `failure` state.
    pub fn job_failure(&self) -> Option<&str> {
        if self.state == JobState::Failure {
            Some(self.message.as_deref().unwrap_or_default())
        } else {
            None
        }
    }
}

/// Export formats for a finished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DownloadFileType {
    /// Searchable PDF with a hidden text layer.
    PdfLayered,
    /// PDF containing only the recognized text.
    PdfOneLayer,
    /// Text with page headers.
    Txt,
    TxtPlain,
    /// One JSON object per line, like the structured query format.
    Jsonl,
    /// One row per page.
    Csv,
}

impl std::fmt::Display for DownloadFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PdfLayered => write!(f, "pdfLayered"),
            Self::PdfOneLayer => write!(f, "pdfOneLayer"),
            Self::Txt => write!(f, "txt"),
            Self::TxtPlain => write!(f, "txtPlain"),
            Self::Jsonl => write!(f, "jsonl"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for DownloadFileType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "pdflayered" => Ok(Self::PdfLayered),
            "pdfonelayer" => Ok(Self::PdfOneLayer),
            "txt" => Ok(Self::Txt),
            "txtplain" => Ok(Self::TxtPlain),
            "jsonl" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown file type: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocDownloadOptions {
    /// Full endpoint URL, replacing `<base>/api/doc/download`. Never sent.
    #[serde(skip)]
    pub url: Option<String>,
    pub id: String,
    /// One type yields a direct file; several are bundled into a zip.
    pub file_types: Vec<DownloadFileType>,
    /// Skip pages without text. The service defaults to `true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_blank: Option<bool>,
}

impl DocDownloadOptions {
    pub fn new(id: impl Into<String>, file_types: Vec<DownloadFileType>) -> Self {
        Self {
            url: None,
            id: id.into(),
            file_types,
            ignore_blank: None,
        }
    }

    pub fn ignore_blank(mut self, ignore_blank: bool) -> Self {
        self.ignore_blank = Some(ignore_blank);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocDownloadResult {
    pub code: i64,
    /// Download URL on success, otherwise the reason no file was produced.
    #[serde(default)]
    pub data: String,
    /// File name behind the URL; only present on success.
    #[serde(default)]
    pub name: Option<String>,
}

impl DocDownloadResult {
    pub fn is_success(&self) -> bool {
        is_success_code(self.code)
    }

    pub fn download_url(&self) -> Option<&str> {
        self.is_success().then_some(self.data.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocClearOptions {
    /// Replaces `<base>/api/doc/clear`; the id is appended as a path segment.
    pub url: Option<String>,
    pub id: String,
}

impl DocClearOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            url: None,
            id: id.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocClearResult {
    pub code: i64,
    #[serde(default)]
    pub data: String,
}

impl DocClearResult {
    pub fn is_success(&self) -> bool {
        is_success_code(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Text;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_doc_options_wire_format() {
        let options = DocOcrOptions::<Dict> {
            language: Some(Language::Japanese),
            ignore_area: Some(vec![IgnoreArea::new(0, 0, 50, 20)]),
            ignore_range_start: Some(1),
            ignore_range_end: Some(-1),
            page_range_start: Some(2),
            page_range_end: Some(-2),
            page_list: Some(vec![1, 2, 5]),
            password: Some("secret".to_string()),
            extraction_mode: Some(ExtractionMode::FullPage),
            ..Default::default()
        }
        .with_url("http://example.invalid/upload");

        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({
                "ocr.language": "models/config_japan.txt",
                "tbpu.ignoreArea": [[[0, 0], [50, 20]]],
                "tbpu.ignoreRangeStart": 1,
                "tbpu.ignoreRangeEnd": -1,
                "pageRangeStart": 2,
                "pageRangeEnd": -2,
                "pageList": [1, 2, 5],
                "password": "secret",
                "doc.extractionMode": "fullPage",
                "data.format": "dict"
            })
        );
    }

    #[test]
    fn test_query_options_defaults() {
        let options = DocQueryOptions::<Text>::new("job-1");
        assert!(!options.includes_data());
        assert!(options.unread_only());
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({"id": "job-1", "format": "text"})
        );

        let options = DocQueryOptions::<Dict>::new("job-1").with_data(true).unread(false);
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({"id": "job-1", "is_data": true, "is_unread": false, "format": "dict"})
        );
    }

    #[test]
    fn test_page_result_blank_page_from_string_data() {
        let page: DocPageResult = serde_json::from_value(json!({
            "page": 2,
            "code": 101,
            "data": ""
        }))
        .unwrap();
        assert!(page.is_blank());
        assert_eq!(page.text(), "");
    }

    #[test]
    fn test_page_result_malformed_blocks_are_rejected() {
        let err = serde_json::from_value::<DocPageResult>(json!({
            "page": 1,
            "code": 100,
            "data": [{"box": [[0, 0], [1, 0], [1, 1], [0, 1]], "text": "Important text", "end": "\n"}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("score"));

        let raw: RawDocQueryResult = serde_json::from_value(json!({
            "code": 100,
            "data": [{"page": 1, "data": {"text": "not a list"}}],
            "processed_count": 1,
            "pages_count": 1,
            "is_done": true,
            "state": "success"
        }))
        .unwrap();
        assert!(matches!(
            DocQueryResult::<Dict>::from_raw(raw),
            Err(UmiError::Decode { .. })
        ));
    }

    #[test]
    fn test_query_result_failure_keeps_message() {
        let raw: RawDocQueryResult = serde_json::from_value(json!({
            "code": 100,
            "data": [],
            "processed_count": 1,
            "pages_count": 4,
            "is_done": true,
            "state": "failure",
            "message": "page 2 could not be rendered"
        }))
        .unwrap();
        let result = DocQueryResult::<Dict>::from_raw(raw).unwrap();
        assert_eq!(result.job_failure(), Some("page 2 could not be rendered"));
        assert!(result.entries().is_empty());
    }

    #[test]
    fn test_query_result_unknown_id_is_message() {
        let raw: RawDocQueryResult = serde_json::from_value(json!({
            "code": 101,
            "data": "task_id not found"
        }))
        .unwrap();
        let result = DocQueryResult::<Dict>::from_raw(raw).unwrap();
        assert!(!result.is_success());
        assert_eq!(result.data.message(), Some("task_id not found"));
        assert!(result.job_failure().is_none());
    }

    #[test]
    fn test_file_type_names() {
        assert_eq!(
            serde_json::to_value(vec![DownloadFileType::PdfLayered, DownloadFileType::TxtPlain])
                .unwrap(),
            json!(["pdfLayered", "txtPlain"])
        );
        assert_eq!("pdf-one-layer".parse::<DownloadFileType>().unwrap(), DownloadFileType::PdfOneLayer);
        assert_eq!(DownloadFileType::Jsonl.to_string(), "jsonl");
    }

    #[test]
    fn test_upload_and_download_accessors() {
        let upload = DocUploadResult {
            code: 100,
            data: "a1b2".to_string(),
        };
        assert_eq!(upload.job_id(), Some("a1b2"));

        let refused = DocUploadResult {
            code: 101,
            data: "unsupported file".to_string(),
        };
        assert!(refused.job_id().is_none());

        let download: DocDownloadResult =
            serde_json::from_value(json!({"code": 101, "data": "no result"})).unwrap();
        assert!(download.download_url().is_none());
        assert!(download.name.is_none());
    }

    #[test]
    fn test_document_file_mime() {
        let file = DocumentFile::from_bytes("scan.pdf", vec![1, 2, 3]);
        assert_eq!(file.mime_type(), "application/pdf");
    }
}

//! Document OCR jobs: submit, query, download, clear.
//!
//! Each operation is a single request against one server-side job. The job
//! id returned by [`DocumentClient::submit_document`] is the only thing the
//! other three operations need; the options given at submit time cannot be
//! changed afterwards.
//!
//! There is no built-in wait. Callers repeat
//! [`DocumentClient::query_document`] (or [`DocumentClient::poll_once`] with
//! a [`JobTracker`]) at a cadence of their choosing until `is_done`, and
//! decide themselves when to give up.

use reqwest::multipart;
use tracing::{debug, info, warn};

use super::http::HttpTransport;
use crate::error::{Result, UmiError};
use crate::job::{JobTracker, Observation};
use crate::models::{
    DataFormat, DocClearOptions, DocClearResult, DocDownloadOptions, DocDownloadResult,
    DocOcrOptions, DocQueryOptions, DocQueryResult, DocUploadResult, DocumentFile,
    RawDocQueryResult,
};

pub const DOC_UPLOAD_PATH: &str = "/api/doc/upload";
pub const DOC_RESULT_PATH: &str = "/api/doc/result";
pub const DOC_DOWNLOAD_PATH: &str = "/api/doc/download";
pub const DOC_CLEAR_PATH: &str = "/api/doc/clear";

#[derive(Clone, Debug)]
pub struct DocumentClient {
    http: HttpTransport,
}

impl DocumentClient {
    pub(crate) fn new(http: HttpTransport) -> Self {
        Self { http }
    }

    /// Uploads a document and starts a recognition job.
    ///
    /// On success `data` of the result is the new job id.
    pub async fn submit_document<F: DataFormat>(
        &self,
        file: DocumentFile,
        options: &DocOcrOptions<F>,
    ) -> Result<DocUploadResult> {
        let url = self.http.endpoint(DOC_UPLOAD_PATH, options.url.as_deref());
        let json = serde_json::to_string(options)?;
        let mime = file.mime_type();
        let file_name = file.file_name.clone();
        let size = file.bytes.len();

        let file_part = multipart::Part::bytes(file.bytes)
            .file_name(file_name.clone())
            .mime_str(&mime)
            .map_err(|e| UmiError::Validation(format!("Invalid MIME type '{mime}': {e}")))?;
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("json", json);

        debug!(file = %file_name, size, %mime, "Uploading document");
        let result: DocUploadResult = self.http.post_multipart("docUpload", &url, form).await?;

        match result.job_id() {
            Some(id) => info!(job_id = %id, file = %file_name, "Document job submitted"),
            None => warn!(code = result.code, reason = %result.data, "Document upload refused"),
        }
        Ok(result)
    }

    /// Fetches the current status of a job, and its content if requested.
    pub async fn query_document<F: DataFormat>(
        &self,
        options: &DocQueryOptions<F>,
    ) -> Result<DocQueryResult<F>> {
        let url = self.http.endpoint(DOC_RESULT_PATH, options.url.as_deref());
        let raw: RawDocQueryResult = self.http.post_json("docOcrResult", &url, options).await?;
        let result = DocQueryResult::from_raw(raw)?;

        debug!(
            job_id = %options.id,
            state = %result.state,
            processed = result.processed_count,
            pages = result.pages_count,
            entries = result.entries().len(),
            "Job status"
        );
        Ok(result)
    }

    /// Queries unread content once and folds it into `tracker`.
    ///
    /// This is a single request; call it again until
    /// [`JobTracker::is_done`] returns true.
    pub async fn poll_once<F: DataFormat>(
        &self,
        tracker: &mut JobTracker<F>,
    ) -> Result<Observation> {
        let options = DocQueryOptions::<F>::new(tracker.id())
            .with_data(true)
            .unread(true);
        let result = self.query_document(&options).await?;
        Ok(tracker.observe(&result, true))
    }

    /// Re-reads every entry of the job into `tracker`, replacing what it
    /// accumulated. Useful after a failure to collect the finished pages.
    pub async fn resync<F: DataFormat>(&self, tracker: &mut JobTracker<F>) -> Result<Observation> {
        let options = DocQueryOptions::<F>::new(tracker.id())
            .with_data(true)
            .unread(false);
        let result = self.query_document(&options).await?;
        Ok(tracker.observe(&result, false))
    }

    /// Asks the service to export the job's results.
    ///
    /// What happens for a job that has not produced anything yet is up to
    /// the service; it is not checked here.
    pub async fn download_document(
        &self,
        options: &DocDownloadOptions,
    ) -> Result<DocDownloadResult> {
        let url = self.http.endpoint(DOC_DOWNLOAD_PATH, options.url.as_deref());
        let result: DocDownloadResult = self.http.post_json("docDownload", &url, options).await?;

        if let Some(link) = result.download_url() {
            debug!(job_id = %options.id, url = %link, name = ?result.name, "Export ready");
        }
        Ok(result)
    }

    /// Releases the job on the service. The id is invalid afterwards.
    ///
    /// Clearing an unknown or already cleared job is reported through
    /// `code`, not as an error.
    pub async fn clear_document(&self, options: &DocClearOptions) -> Result<DocClearResult> {
        let url = self.clear_url(options)?;
        let result: DocClearResult = self.http.get_json("docOcrTaskClear", url.as_str()).await?;

        if result.is_success() {
            info!(job_id = %options.id, "Document job cleared");
        } else {
            debug!(job_id = %options.id, code = result.code, reason = %result.data, "Clear refused");
        }
        Ok(result)
    }

    fn clear_url(&self, options: &DocClearOptions) -> Result<url::Url> {
        let prefix = self.http.endpoint(DOC_CLEAR_PATH, options.url.as_deref());
        let mut url = url::Url::parse(&prefix)?;
        url.path_segments_mut()
            .map_err(|_| UmiError::Config(format!("Cannot append job id to {prefix}")))?
            .pop_if_empty()
            .push(&options.id);
        Ok(url)
    }
}

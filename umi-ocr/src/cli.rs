use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use futures::future::join_all;
use tracing::{debug, info, warn};

use umi_ocr::models::{
    DocPageResult, ExtractionMode, ImageOcrResult, Language, TbpuParser, TextBlock,
};
use umi_ocr::{
    Blob, DataFormat, Dict, DocClearOptions, DocDownloadOptions, DocOcrOptions, DocumentClient,
    DocumentFile, DownloadFileType, ImageOcrOptions, JobState, JobTracker, Observation, PollingConfig,
    QrcodeFormat, QrcodeGenerationOptions, QrcodeRecognitionOptions, ResponseData, Text,
    UmiClient,
};

#[derive(Parser)]
#[command(name = "umi-ocr")]
#[command(about = "Command-line client for a local Umi-OCR service")]
pub struct Cli {
    /// Service root; overrides UMI_OCR_BASE_URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Recognize text in one or more images
    Ocr(OcrArgs),
    /// Generate or scan barcodes and QR codes
    #[command(subcommand)]
    Qrcode(QrcodeCommand),
    /// Run a document (PDF, EPUB, ...) through OCR
    Doc(DocArgs),
}

#[derive(Args)]
pub struct OcrArgs {
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Ask for plain text instead of text blocks
    #[arg(long)]
    text: bool,

    /// zh, en, zh-tw, ja, ko, ru
    #[arg(long)]
    language: Option<Language>,

    /// Correct rotated text
    #[arg(long)]
    cls: bool,

    #[arg(long)]
    parser: Option<TbpuParser>,
}

#[derive(Subcommand)]
pub enum QrcodeCommand {
    /// Render text as a code image
    Generate {
        text: String,
        #[arg(long)]
        format: Option<QrcodeFormat>,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Write the JPEG here instead of printing a data URI
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Decode every code found in an image
    Scan {
        image: PathBuf,
        #[arg(long)]
        grayscale: bool,
        #[arg(long)]
        threshold: Option<u8>,
    },
}

#[derive(Args)]
pub struct DocArgs {
    file: PathBuf,

    #[arg(long)]
    page_start: Option<i64>,

    /// Negative values count from the last page
    #[arg(long, allow_hyphen_values = true)]
    page_end: Option<i64>,

    /// Explicit page list, e.g. 1,2,5; wins over the range
    #[arg(long, value_delimiter = ',')]
    pages: Vec<u32>,

    #[arg(long)]
    password: Option<String>,

    /// mixed, fullPage, imageOnly, textOnly
    #[arg(long)]
    mode: Option<ExtractionMode>,

    #[arg(long)]
    language: Option<Language>,

    /// Export formats to request once the job ends, e.g. csv,txt
    #[arg(long, value_delimiter = ',')]
    export: Vec<DownloadFileType>,

    /// Include blank pages in exports
    #[arg(long)]
    keep_blank: bool,

    /// Leave the job on the service instead of clearing it
    #[arg(long)]
    keep_job: bool,
}

pub async fn run(command: Command, client: &UmiClient, polling: &PollingConfig) -> anyhow::Result<()> {
    match command {
        Command::Ocr(args) => run_ocr(client, args).await,
        Command::Qrcode(QrcodeCommand::Generate {
            text,
            format,
            width,
            height,
            output,
        }) => {
            let options = QrcodeGenerationOptions {
                format,
                w: width,
                h: height,
                ..Default::default()
            };
            let result = client.qrcode().generate_qrcode(&text, &options).await?;
            if !result.is_success() {
                bail!("Generation failed (code {}): {}", result.code, result.data);
            }
            match output {
                Some(path) => {
                    tokio::fs::write(&path, result.image_bytes()?)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(path = %path.display(), "Code image written");
                }
                None => println!("{}", result.data),
            }
            Ok(())
        }
        Command::Qrcode(QrcodeCommand::Scan {
            image,
            grayscale,
            threshold,
        }) => {
            let options = QrcodeRecognitionOptions {
                grayscale: grayscale.then_some(true),
                threshold,
                ..Default::default()
            };
            let result = client
                .qrcode()
                .recognize_qrcode(Blob::from_path(image), &options)
                .await?;
            match &result.data {
                ResponseData::Message(reason) if !result.is_success() => {
                    println!("No code found ({}): {reason}", result.code)
                }
                _ => {
                    for code in result.codes() {
                        println!("[{}] {}", code.format, code.text);
                    }
                }
            }
            Ok(())
        }
        Command::Doc(args) => run_doc(client, polling, args).await,
    }
}

async fn run_ocr(client: &UmiClient, args: OcrArgs) -> anyhow::Result<()> {
    if args.text {
        let options = ImageOcrOptions::<Text> {
            language: args.language,
            cls: args.cls.then_some(true),
            parser: args.parser,
            ..Default::default()
        };
        recognize_all(client, &args.images, &options, |text: &String| text.clone()).await
    } else {
        let options = ImageOcrOptions::<Dict> {
            language: args.language,
            cls: args.cls.then_some(true),
            parser: args.parser,
            ..Default::default()
        };
        recognize_all(client, &args.images, &options, |blocks: &Vec<TextBlock>| {
            blocks_to_text(blocks)
        })
        .await
    }
}

async fn recognize_all<F, R>(
    client: &UmiClient,
    images: &[PathBuf],
    options: &ImageOcrOptions<F>,
    render: R,
) -> anyhow::Result<()>
where
    F: DataFormat,
    R: Fn(&F::ImageData) -> String,
{
    let requests = images
        .iter()
        .map(|path| client.image().recognize_image(Blob::from_path(path), options));
    let results: Vec<umi_ocr::Result<ImageOcrResult<F>>> = join_all(requests).await;

    let mut failures = 0;
    for (path, result) in images.iter().zip(results) {
        println!("== {}", path.display());
        match result {
            Ok(result) => match &result.data {
                ResponseData::Value(data) => println!("{}", render(data)),
                ResponseData::Message(reason) => println!("({}) {reason}", result.code),
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Recognition failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} images failed", images.len());
    }
    Ok(())
}

fn blocks_to_text(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|block| format!("{}{}", block.text, block.end))
        .collect()
}

async fn run_doc(client: &UmiClient, polling: &PollingConfig, args: DocArgs) -> anyhow::Result<()> {
    let file = DocumentFile::from_path(&args.file).await?;
    let options = DocOcrOptions::<Dict> {
        language: args.language,
        page_range_start: args.page_start,
        page_range_end: args.page_end,
        page_list: (!args.pages.is_empty()).then_some(args.pages),
        password: args.password,
        extraction_mode: args.mode,
        ..Default::default()
    };

    let documents = client.documents();
    let upload = documents.submit_document(file, &options).await?;
    let Some(job_id) = upload.job_id() else {
        bail!("Upload refused (code {}): {}", upload.code, upload.data);
    };

    let mut tracker = JobTracker::<Dict>::new(job_id);
    let finished = wait_for_job(client, polling, &mut tracker).await;

    let outcome = match finished {
        Ok(true) => export_results(client, &tracker, &args.export, args.keep_blank).await,
        Ok(false) => Err(anyhow::anyhow!(
            "Job {} still running after {} polls",
            tracker.id(),
            polling.max_attempts
        )),
        Err(e) => Err(e),
    };

    finish_job(documents, tracker.id(), args.keep_job, outcome).await
}

/// Clears the job unless asked to keep it, then hands back `outcome`.
/// A failed clear is logged, never returned.
async fn finish_job(
    documents: &DocumentClient,
    job_id: &str,
    keep_job: bool,
    outcome: anyhow::Result<()>,
) -> anyhow::Result<()> {
    if keep_job {
        info!(job_id, "Keeping job on the service");
        return outcome;
    }

    match documents.clear_document(&DocClearOptions::new(job_id)).await {
        Ok(cleared) if !cleared.is_success() => {
            debug!(job_id, code = cleared.code, reason = %cleared.data, "Job not cleared");
        }
        Ok(_) => {}
        Err(e) => warn!(job_id, error = %e, "Failed to clear job"),
    }
    outcome
}

/// Polls until the job reports done. Returns `Ok(false)` when the attempt
/// budget runs out first.
async fn wait_for_job(
    client: &UmiClient,
    polling: &PollingConfig,
    tracker: &mut JobTracker<Dict>,
) -> anyhow::Result<bool> {
    let interval = Duration::from_millis(polling.interval_ms);
    let documents = client.documents();

    for attempt in 1..=polling.max_attempts {
        let seen = tracker.entries().len();
        match documents.poll_once(tracker).await? {
            Observation::Rejected { code, reason } => {
                bail!("Job {} query rejected (code {code}): {reason}", tracker.id())
            }
            Observation::Updated { .. } | Observation::Stale { .. } => {}
        }

        print_pages(&tracker.entries()[seen..]);
        if let Some(snapshot) = tracker.snapshot() {
            info!(
                attempt,
                state = %snapshot.state,
                processed = snapshot.processed_count,
                pages = snapshot.pages_count,
                "Progress {:.0}%",
                snapshot.progress() * 100.0
            );
        }

        if tracker.is_done() {
            if tracker.state() == Some(JobState::Failure) {
                let reason = tracker
                    .snapshot()
                    .and_then(|s| s.failure())
                    .unwrap_or_default()
                    .to_string();
                warn!(job_id = %tracker.id(), %reason, "Job failed");
                let seen = tracker.entries().len();
                documents.resync(tracker).await?;
                print_pages(&tracker.entries()[seen.min(tracker.entries().len())..]);
            }
            return Ok(true);
        }

        tokio::time::sleep(interval).await;
    }

    Ok(false)
}

fn print_pages(pages: &[DocPageResult]) {
    for page in pages {
        if page.is_blank() {
            debug!(page = page.page, "Blank page");
            continue;
        }
        println!("== page {}", page.page);
        println!("{}", page.text());
    }
}

async fn export_results(
    client: &UmiClient,
    tracker: &JobTracker<Dict>,
    file_types: &[DownloadFileType],
    keep_blank: bool,
) -> anyhow::Result<()> {
    if file_types.is_empty() {
        return Ok(());
    }

    let options = DocDownloadOptions::new(tracker.id(), file_types.to_vec()).ignore_blank(!keep_blank);
    let result = client.documents().download_document(&options).await?;
    match result.download_url() {
        Some(url) => {
            println!("Export: {url}");
            if let Some(name) = &result.name {
                println!("File name: {name}");
            }
            Ok(())
        }
        None => bail!("Export failed (code {}): {}", result.code, result.data),
    }
}

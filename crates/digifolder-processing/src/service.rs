//! Conversion service
//!
//! Every conversion is local: inputs are read from disk, outputs are written
//! under the service's output directory with a millisecond timestamp in the
//! name. Decoding, resizing and PDF assembly run on the blocking pool.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use digifolder_core::models::FileType;
use digifolder_core::Config;

use crate::doc::render_html;
use crate::error::{ConversionError, ConversionResult};
use crate::image::ImagePreprocessor;
use crate::pdf::layout::{layout_pages, wrap_words, MARGIN, PAGE_WIDTH};
use crate::pdf::{DocumentInfo, PdfWriter};
use crate::table::{looks_like_table, reconstruct_csv};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub title: String,
    pub author: String,
    pub font_size: f32,
    pub line_spacing: f32,
    /// Continue onto new pages instead of dropping lines past the bottom margin.
    pub paginate: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            title: "Scanned Document".to_string(),
            author: "DigiFolder".to_string(),
            font_size: 12.0,
            line_spacing: 1.2,
            paginate: false,
        }
    }
}

/// What to do with `.txt` / `.csv` entries when combining pages into a PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonImagePagePolicy {
    #[default]
    Skip,
    RenderText,
}

#[derive(Debug, Clone)]
pub struct ConversionService {
    output_dir: PathBuf,
}

impl ConversionService {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_dir().clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Lay `text` out on US-Letter pages and write `<timestamp>.pdf`.
    #[tracing::instrument(skip(self, text, options), fields(chars = text.len(), paginate = options.paginate))]
    pub async fn text_to_pdf(
        &self,
        text: &str,
        options: &ConversionOptions,
    ) -> ConversionResult<PathBuf> {
        let text = text.to_string();
        let options = options.clone();
        let bytes = run_blocking(move || render_text_pdf(&text, &options)).await?;
        self.write_output("", "pdf", &bytes).await
    }

    /// Write `text` as an HTML document Word can open, `<timestamp>.html`.
    pub async fn text_to_doc(
        &self,
        text: &str,
        options: &ConversionOptions,
    ) -> ConversionResult<PathBuf> {
        let html = render_html(text, &options.title, &options.author);
        self.write_output("", "html", html.as_bytes()).await
    }

    /// Write `text` unchanged to `<prefix><timestamp>.<extension>`.
    pub async fn write_text(
        &self,
        prefix: &str,
        extension: &str,
        text: &str,
    ) -> ConversionResult<PathBuf> {
        self.write_output(prefix, extension, text.as_bytes()).await
    }

    /// Rebuild table-like text as CSV. Text that does not look tabular is
    /// rejected rather than converted.
    pub async fn text_to_csv(&self, text: &str) -> ConversionResult<PathBuf> {
        if !looks_like_table(text) {
            return Err(ConversionError::NotTabular);
        }
        self.write_output("converted_", "csv", reconstruct_csv(text).as_bytes())
            .await
    }

    /// Combine page files into one PDF, one page each, in the given order.
    #[tracing::instrument(skip(self, pages), fields(pages = pages.len(), policy = ?policy))]
    pub async fn images_to_pdf(
        &self,
        pages: &[PathBuf],
        policy: NonImagePagePolicy,
    ) -> ConversionResult<PathBuf> {
        let mut inputs = Vec::with_capacity(pages.len());
        for page in pages {
            let is_text = matches!(
                FileType::from_path(page),
                Some(FileType::Txt) | Some(FileType::Csv)
            );
            if is_text && policy == NonImagePagePolicy::Skip {
                tracing::info!(page = %page.display(), "Skipping non-image page");
                continue;
            }
            let data = read_input(page).await?;
            inputs.push(if is_text {
                PageInput::Text(String::from_utf8_lossy(&data).into_owned())
            } else {
                PageInput::Image(data)
            });
        }

        if inputs.is_empty() {
            return Err(ConversionError::NoPages);
        }

        let start = std::time::Instant::now();
        let page_count = inputs.len();
        let bytes = run_blocking(move || render_combined_pdf(inputs)).await?;
        let path = self.write_output("combined_", "pdf", &bytes).await?;

        tracing::info!(
            path = %path.display(),
            pages = page_count,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Pages combined into PDF"
        );
        Ok(path)
    }

    /// Encoded image bytes to a one-page PDF, in memory.
    pub async fn image_bytes_to_pdf(&self, data: Vec<u8>) -> ConversionResult<Vec<u8>> {
        run_blocking(move || render_combined_pdf(vec![PageInput::Image(data)])).await
    }

    /// Upright, bounded JPEG copy of `image` for OCR, `<prefix><timestamp>.jpg`.
    pub async fn prepare_for_ocr(&self, image: &Path, prefix: &str) -> ConversionResult<PathBuf> {
        let data = read_input(image).await?;
        let prepared = run_blocking(move || ImagePreprocessor::OCR.prepare(&data)).await?;
        self.write_output(prefix, "jpg", &prepared.jpeg).await
    }

    /// Write bytes under a fresh timestamped name. A name already taken gets
    /// a numeric suffix, so concurrent conversions never share a file.
    async fn write_output(
        &self,
        prefix: &str,
        extension: &str,
        bytes: &[u8],
    ) -> ConversionResult<PathBuf> {
        fs::create_dir_all(&self.output_dir).await?;
        let timestamp = Utc::now().timestamp_millis();

        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{}{}.{}", prefix, timestamp, extension)
            } else {
                format!("{}{}_{}.{}", prefix, timestamp, attempt, extension)
            };
            let path = self.output_dir.join(name);

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    tracing::debug!(path = %path.display(), size_bytes = bytes.len(), "Conversion output written");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

enum PageInput {
    Image(Vec<u8>),
    Text(String),
}

fn render_text_pdf(text: &str, options: &ConversionOptions) -> ConversionResult<Vec<u8>> {
    let lines = wrap_words(text, options.font_size, PAGE_WIDTH - 2.0 * MARGIN);
    let total = lines.len();
    let (pages, dropped) = layout_pages(
        lines,
        options.font_size,
        options.line_spacing,
        options.paginate,
    );
    if dropped > 0 {
        tracing::warn!(
            lines = total,
            dropped = dropped,
            "Text exceeds one page; overflow lines omitted"
        );
    }

    let mut writer = PdfWriter::new();
    for page in &pages {
        writer.add_text_page(page, options.font_size)?;
    }
    writer.finish(&document_info(options))
}

fn render_combined_pdf(inputs: Vec<PageInput>) -> ConversionResult<Vec<u8>> {
    let options = ConversionOptions::default();
    let mut writer = PdfWriter::new();

    for input in inputs {
        match input {
            PageInput::Image(data) => {
                let prepared = ImagePreprocessor::PDF_PAGE.prepare(&data)?;
                writer.add_image_page(&prepared)?;
            }
            PageInput::Text(text) => {
                let lines = wrap_words(&text, options.font_size, PAGE_WIDTH - 2.0 * MARGIN);
                let (pages, _) = layout_pages(lines, options.font_size, options.line_spacing, true);
                for page in &pages {
                    writer.add_text_page(page, options.font_size)?;
                }
            }
        }
    }

    writer.finish(&document_info(&options))
}

fn document_info(options: &ConversionOptions) -> DocumentInfo {
    DocumentInfo {
        title: options.title.clone(),
        author: options.author.clone(),
        created_at: Utc::now(),
    }
}

async fn read_input(path: &Path) -> ConversionResult<Vec<u8>> {
    fs::read(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ConversionError::InputNotFound(path.to_path_buf())
        } else {
            ConversionError::Io(e)
        }
    })
}

async fn run_blocking<T, F>(f: F) -> ConversionResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ConversionResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ConversionError::Task(e.to_string()))?
}

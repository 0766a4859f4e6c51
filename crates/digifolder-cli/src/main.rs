//! DigiFolder CLI: scan, convert and manage documents in a personal library.
//!
//! Reads configuration from the environment (see `Config::from_env`). Commands
//! that touch the library need an access token via --token or
//! DIGIFOLDER_ACCESS_TOKEN.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use digifolder_cli::{init_tracing, upload_name, upload_type, ErrorReport};
use digifolder_core::models::{DocumentCategory, OcrOptions, ScannedPage, ScannedPages};
use digifolder_core::{Config, SessionContext};
use digifolder_ocr::{OcrCache, OcrClient};
use digifolder_processing::{ConversionService, NonImagePagePolicy};
use digifolder_services::{Backend, FileCamera, FileService, ScannerService};

#[derive(Parser)]
#[command(name = "digifolder", about = "DigiFolder document library CLI")]
struct Cli {
    /// Access token issued by the auth service
    #[arg(long, env = "DIGIFOLDER_ACCESS_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local file under a declared type
    Upload {
        /// Path to the local file
        file: PathBuf,
        /// Declared type (pdf, txt, csv, png, ...); defaults to the file extension
        #[arg(long = "type")]
        file_type: Option<String>,
        /// Name to record; defaults to the local file name
        #[arg(long)]
        name: Option<String>,
    },
    /// List your files, newest first
    List,
    /// Delete files by ID
    Delete {
        /// File UUIDs
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Download a stored file into the local cache
    Download {
        /// File UUID
        id: Uuid,
    },
    /// Show storage usage per file type
    Stats,
    /// Scan a document from an image file and convert it
    Scan {
        /// Image standing in for the camera capture
        image: PathBuf,
        /// OCR language hint
        #[arg(long, default_value = "en")]
        language: String,
        /// Bypass the OCR result cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Combine page images into one document and upload it
    Combine {
        /// Page files, in order
        #[arg(required = true)]
        pages: Vec<PathBuf>,
        /// Base name of the stored document
        #[arg(long, default_value = "Scanned Document")]
        name: String,
        /// Save the OCR text of all pages instead of a PDF
        #[arg(long)]
        text: bool,
        /// Render .txt/.csv pages as text pages instead of skipping them
        #[arg(long)]
        render_text: bool,
    },
    /// Finish upload and delete operations interrupted by earlier failures
    Resume,
    /// Remove every cached OCR result
    ClearOcrCache,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn session(backend: &Backend, token: Option<&str>) -> anyhow::Result<SessionContext> {
    let token = token.context("An access token is required. Pass --token or set DIGIFOLDER_ACCESS_TOKEN")?;
    Ok(backend.sessions.verify(token)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (report, code) = ErrorReport::from_error(&err);
            match serde_json::to_string_pretty(&report) {
                Ok(body) => eprintln!("{}", body),
                Err(_) => eprintln!("{}", err),
            }
            code
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.is_production());

    if let Commands::ClearOcrCache = cli.command {
        let cache = OcrCache::new(
            config.cache_dir(),
            Duration::from_secs(config.ocr_cache_ttl_secs()),
        );
        cache.clear().await?;
        print_json(&serde_json::json!({ "success": true, "dir": cache.dir() }))?;
        return Ok(());
    }

    let conversion = ConversionService::from_config(&config);
    let ocr = Arc::new(
        OcrClient::from_config(&config)
            .context("Failed to create OCR client. Set GOOGLE_CLOUD_API_KEY")?,
    );

    match cli.command {
        Commands::Scan {
            image,
            language,
            no_cache,
        } => {
            let scanner = ScannerService::new(Arc::new(FileCamera::new(image)), ocr, conversion);
            let options = OcrOptions {
                language,
                use_cache: !no_cache,
                ..OcrOptions::default()
            };
            let result = scanner.scan_document(&options).await?;
            print_json(&result)?;
        }
        command => {
            config.validate()?;
            let backend = Backend::connect(&config)
                .await
                .context("Failed to connect to the backend")?;
            let session = session(&backend, cli.token.as_deref())?;
            let files = FileService::from_backend(&backend, ocr, conversion)
                .with_quota(config.storage_quota_bytes());
            run_library_command(command, files, &session).await?;
        }
    }

    Ok(())
}

async fn run_library_command(
    command: Commands,
    files: FileService,
    session: &SessionContext,
) -> anyhow::Result<()> {
    match command {
        Commands::Upload {
            file,
            file_type,
            name,
        } => {
            let file_type = upload_type(&file, file_type.as_deref())?;
            let name = upload_name(&file, name.as_deref());
            let record = files.upload_file(session, &file, file_type, &name).await?;
            print_json(&record)?;
        }
        Commands::List => {
            let records = files.get_files(session).await?;
            print_json(&records)?;
        }
        Commands::Delete { ids } => {
            let remaining = files.delete_files(session, &ids).await?;
            print_json(&remaining)?;
        }
        Commands::Download { id } => {
            let record = files
                .get_files(session)
                .await?
                .into_iter()
                .find(|f| f.id == id)
                .with_context(|| format!("File {} not found", id))?;
            let path = files.download_record(session, &record).await?;
            print_json(&serde_json::json!({ "path": path }))?;
        }
        Commands::Stats => {
            let stats = files.get_storage_stats(session).await?;
            print_json(&stats)?;
        }
        Commands::Combine {
            pages,
            name,
            text,
            render_text,
        } => {
            let mut scanned = ScannedPages::new();
            for page in pages {
                scanned.push(ScannedPage::new(page));
            }
            let category = if text {
                DocumentCategory::Text
            } else {
                DocumentCategory::Document
            };
            let policy = if render_text {
                NonImagePagePolicy::RenderText
            } else {
                NonImagePagePolicy::Skip
            };
            let record = files
                .with_page_policy(policy)
                .save_multi_page_document(session, &scanned, category, &name)
                .await?;
            print_json(&record)?;
        }
        Commands::Resume => {
            let replayed = files.resume_pending(session).await?;
            print_json(&serde_json::json!({ "replayed": replayed }))?;
        }
        Commands::Scan { .. } | Commands::ClearOcrCache => {
            anyhow::bail!("Command does not use the document library")
        }
    }

    Ok(())
}

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pantry_core::Catalog;
use pantry_cv::detection::{cancel_pair, LowConfidencePolicy};
use pantry_cv::utils::ImageUtils;
use pantry_cv::{FoodScanner, ModelHandle, PipelineConfig, PipelineError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod replay;
mod report;

use replay::{FileTextRecognizer, ReplayLoader};

#[derive(Parser)]
#[command(name = "pantry", version, about = "Food recognition and expiry tracking")]
struct Cli {
    /// Pipeline configuration (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Food catalog file; the built-in catalog is used when omitted
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Date used as purchase date and for remaining-day counts (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Identify a food item and schedule its expiry
    Scan {
        image: PathBuf,
        /// Recorded detector output (JSON)
        #[arg(long)]
        detections: PathBuf,
        /// Keep the best detection even below the acceptance confidence
        #[arg(long)]
        accept_best: bool,
        /// Print the scan as JSON
        #[arg(long)]
        json: bool,
        /// Also write the scan as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Read the printed expiry date from a label photo
    Label {
        image: PathBuf,
        /// Recognised label text
        #[arg(long)]
        ocr_text: PathBuf,
        /// Product name for an inventory draft
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        #[arg(long)]
        json: bool,
    },
    /// List inventory drafts sorted by expiry
    Report { drafts: PathBuf },
    /// Print the effective configuration
    Config {
        /// Write it to this file instead
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    let catalog = match &cli.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin().clone(),
    };
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let outcome = match cli.command {
        Command::Scan {
            image,
            detections,
            accept_best,
            json,
            output,
        } => {
            scan(
                config,
                &catalog,
                today,
                &image,
                detections,
                accept_best,
                json,
                output.as_deref(),
            )
            .await
        }
        Command::Label {
            image,
            ocr_text,
            name,
            quantity,
            json,
        } => label(config, &catalog, today, &image, ocr_text, name, quantity, json).await,
        Command::Report { drafts } => {
            let drafts = report::load_drafts(&drafts)?;
            report::print_inventory(drafts, today);
            Ok(())
        }
        Command::Config { write } => {
            match write {
                Some(path) => {
                    config.to_file(&path)?;
                    println!("Configuration written to {}", path.display());
                }
                None => println!(
                    "{}",
                    serde_json::to_string_pretty(&config).map_err(anyhow::Error::from)?
                ),
            }
            Ok(())
        }
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(PipelineError::Internal(e)) => Err(e),
        Err(e) => {
            tracing::error!(kind = e.kind(), "{}", e);
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn scan(
    mut config: PipelineConfig,
    catalog: &Catalog,
    today: NaiveDate,
    image: &Path,
    detections: PathBuf,
    accept_best: bool,
    json: bool,
    output: Option<&Path>,
) -> Result<(), PipelineError> {
    if accept_best {
        config.retry.low_confidence_policy = LowConfidencePolicy::AcceptBest;
    }

    let scanner = FoodScanner::new(config, catalog)?;
    let model = ModelHandle::new(ReplayLoader::new(detections));
    model.initialize().await?;

    let image = ImageUtils::load_rgb(image)
        .map_err(|e| PipelineError::InvalidImage(format!("{e:#}")))?;

    let (cancel, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling scan");
            cancel.cancel();
        }
    });

    let result = scanner
        .detect_with_model(&model, &image, today, &signal)
        .await;
    model.dispose().await;
    let scan = result?;

    if let Some(path) = output {
        scanner.export_json(&scan, path)?;
        tracing::info!(path = %path.display(), "Scan exported");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&scan).map_err(anyhow::Error::from)?);
    } else {
        report::print_scan(&scan, today);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn label(
    config: PipelineConfig,
    catalog: &Catalog,
    today: NaiveDate,
    image: &Path,
    ocr_text: PathBuf,
    name: Option<String>,
    quantity: u32,
    json: bool,
) -> Result<(), PipelineError> {
    let scanner = FoodScanner::new(config, catalog)?;
    let recognizer = FileTextRecognizer::new(ocr_text);

    let extraction = scanner
        .extract_from_label_file(&recognizer, image, today)
        .await?;

    match name {
        Some(name) => {
            let draft = extraction.clone().into_draft(name, quantity, today)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&draft).map_err(anyhow::Error::from)?);
            } else {
                report::print_label(&extraction, today);
                report::print_inventory(vec![draft], today);
            }
        }
        None if json => {
            println!("{}", serde_json::to_string_pretty(&extraction).map_err(anyhow::Error::from)?)
        }
        None => report::print_label(&extraction, today),
    }

    Ok(())
}

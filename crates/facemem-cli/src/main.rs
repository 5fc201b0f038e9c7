//! Roster extraction batch binary.
//!
//! `facemem extract` runs the full pipeline over one or more roster
//! pages and writes face crops plus a `people.json` manifest.
//! `facemem crop-point` is the manual fallback: a fixed-size crop around
//! a user-picked pixel, for faces the detector missed.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use facemem_models::CanonicalPerson;
use facemem_roster::{crop_at_point, extract_roster_pages, RosterExtraction};
use facemem_vision::GeminiVision;

/// Face and metadata extraction from roster images.
#[derive(Parser)]
#[command(name = "facemem")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract every individual from one or more roster pages.
    Extract {
        /// Roster image files (pages), processed as one batch.
        images: Vec<PathBuf>,

        /// Directory for crops and the people.json manifest.
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,

        /// File with one already-known name per line; matching
        /// detections are skipped.
        #[arg(long)]
        known_names: Option<PathBuf>,
    },

    /// Crop a fixed-size square around a pixel position.
    CropPoint {
        /// Source image file.
        image: PathBuf,

        /// Center X in pixels.
        #[arg(long)]
        x: f64,

        /// Center Y in pixels.
        #[arg(long)]
        y: f64,

        /// Output JPEG file.
        #[arg(long, default_value = "crop.jpg")]
        out: PathBuf,
    },
}

/// One manifest entry in `people.json`.
#[derive(Serialize)]
struct ManifestEntry<'a> {
    #[serde(flatten)]
    person: &'a CanonicalPerson,
    crop_file: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production.
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("facemem=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    if let Err(e) = run(Cli::parse()).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Extract {
            images,
            out_dir,
            known_names,
        } => extract(images, out_dir, known_names).await,
        Command::CropPoint { image, x, y, out } => crop_point(image, x, y, out),
    }
}

async fn extract(
    images: Vec<PathBuf>,
    out_dir: PathBuf,
    known_names: Option<PathBuf>,
) -> anyhow::Result<()> {
    anyhow::ensure!(!images.is_empty(), "no input images given");

    let known = match known_names {
        Some(path) => read_known_names(&path)?,
        None => HashSet::new(),
    };

    let extractor = GeminiVision::from_env().context("creating Gemini client")?;

    let mut pages = Vec::with_capacity(images.len());
    for path in &images {
        pages.push(std::fs::read(path).with_context(|| format!("reading {}", path.display()))?);
    }

    let result = extract_roster_pages(&extractor, &pages, &known)
        .await
        .context("roster extraction failed")?;

    if result.faces.is_empty() {
        info!("No faces found");
        return Ok(());
    }

    write_output(&result, &out_dir)?;
    info!(
        "Wrote {} crop(s) to {} ({} known skipped, {} malformed dropped)",
        result.faces.len(),
        out_dir.display(),
        result.skipped_known,
        result.dropped_malformed
    );
    Ok(())
}

fn write_output(result: &RosterExtraction, out_dir: &PathBuf) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut manifest = Vec::with_capacity(result.faces.len());
    for (index, face) in result.faces.iter().enumerate() {
        let crop_file = format!("{:03}.jpg", index);
        let bytes = face.crop.to_jpeg().context("encoding crop")?;
        std::fs::write(out_dir.join(&crop_file), bytes)?;
        manifest.push(ManifestEntry {
            person: &face.person,
            crop_file,
        });
    }

    let manifest_path = out_dir.join("people.json");
    std::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)?;
    Ok(())
}

fn crop_point(image_path: PathBuf, x: f64, y: f64, out: PathBuf) -> anyhow::Result<()> {
    let image = image::open(&image_path)
        .with_context(|| format!("opening {}", image_path.display()))?;
    let crop = crop_at_point(&image, x, y);
    std::fs::write(&out, crop.to_jpeg().context("encoding crop")?)?;
    info!(
        "Wrote {}x{} crop to {}",
        crop.width(),
        crop.height(),
        out.display()
    );
    Ok(())
}

fn read_known_names(path: &PathBuf) -> anyhow::Result<HashSet<String>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

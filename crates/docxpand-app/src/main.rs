// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docxpand: synthetic identity-document imagery
//
// Entry point. Initialises logging, parses the command line, and runs the
// requested batch job.

mod batch;
mod manifest;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use docxpand_core::{CompositorConfig, Margins, Result};

use batch::{InsertOptions, run_insert};

#[derive(Parser)]
#[command(name = "docxpand", version)]
#[command(about = "Composite rendered identity documents into photographed scenes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Insert every document of a directory into scenes from a manifest.
    Insert(InsertArgs),
}

#[derive(Args)]
struct InsertArgs {
    /// JSON list of scenes: `{id, filename, position, template}`
    #[arg(long)]
    scenes: PathBuf,

    /// Directory holding the scene images
    #[arg(long)]
    scene_dir: PathBuf,

    /// Directory of rendered document images
    #[arg(long)]
    documents: PathBuf,

    /// Directory of specimen images, one per document type
    #[arg(long, env = "DOCXPAND_SPECIMENS")]
    specimens: PathBuf,

    /// Output directory for composited images and annotations.json
    #[arg(short, long)]
    output: PathBuf,

    /// Margins around the destination: one value, or left,top,right,bottom
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    margins: Vec<f64>,

    /// Seed for the scene assignment
    #[arg(long)]
    seed: Option<u64>,

    /// JSON compositor configuration; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the rectification width
    #[arg(long)]
    target_width: Option<u32>,
}

impl InsertArgs {
    fn into_options(self) -> Result<InsertOptions> {
        let mut config = match &self.config {
            Some(path) => CompositorConfig::from_json_file(path)?,
            None => CompositorConfig::default(),
        };
        if let Some(width) = self.target_width {
            config.target_width = width;
        }
        let margins = match self.margins.as_slice() {
            [] => None,
            values => Some(Margins::from_slice(values)?),
        };
        Ok(InsertOptions {
            scene_manifest: self.scenes,
            scene_dir: self.scene_dir,
            document_dir: self.documents,
            specimen_dir: self.specimens,
            output_dir: self.output,
            margins,
            seed: self.seed,
            config,
        })
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("docxpand starting");

    let outcome = match cli.command {
        Command::Insert(args) => args.into_options().and_then(|options| run_insert(&options)),
    };
    match outcome {
        Ok(summary) => {
            tracing::info!(inserted = summary.inserted, failed = summary.failed, "Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "docxpand failed");
            ExitCode::FAILURE
        }
    }
}

// -- Tests --------------------------------------------------------------------

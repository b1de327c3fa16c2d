use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "csmf",
    version,
    about = "Inspect, create and export colour-specio measurement files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Falls back
    /// to RUST_LOG when absent.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print a summary of a measurement file.
    Info(InfoArgs),

    /// Build a measurement file from a table of spectra.
    Import(ImportArgs),

    /// Write the measurements of a file as CSV.
    Export(ExportArgs),
}

#[derive(Args)]
pub struct InfoArgs {
    /// Measurement file (the suffix is replaced by .csmf).
    pub file: PathBuf,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Recompute derived quantities from the spectra.
    #[arg(long)]
    pub recompute: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Spectra table (.parquet, .json or .csv).
    pub input: PathBuf,

    /// Output path (the suffix is replaced by .csmf).
    #[arg(short, long)]
    pub output: PathBuf,

    /// Columns forming each test colour, in channel order.
    #[arg(long, value_delimiter = ',', default_values = ["r", "g", "b"])]
    pub color_columns: Vec<String>,

    /// Integer column with the presentation order.
    #[arg(long, default_value = "order")]
    pub order_column: String,

    /// Numeric column with the exposure time in seconds.
    #[arg(long, default_value = "exposure")]
    pub exposure_column: String,

    /// Identifier of the instrument that took the measurements.
    #[arg(long, default_value = "")]
    pub spectrometer: String,

    /// JSON file with `notes`, `author`, `location`, `software`.
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Measurement file (the suffix is replaced by .csmf).
    pub file: PathBuf,

    /// Destination CSV file.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Recompute derived quantities from the spectra.
    #[arg(long)]
    pub recompute: bool,
}

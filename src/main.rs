mod cli;

use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use serde_json::json;

use cli::{Cli, Command, ExportArgs, ImportArgs, InfoArgs};
use csmf::data::{export, import};
use csmf::{ColorMode, MeasurementCollection, Metadata};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Info(args) => run_info(&args),
        Command::Import(args) => run_import(&args),
        Command::Export(args) => run_export(&args),
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    let level = match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

fn run_info(args: &InfoArgs) -> Result<()> {
    let collection = csmf::load(&args.file, args.recompute)
        .with_context(|| format!("loading {}", args.file.display()))?;

    if args.json {
        let summary = json!({
            "shortname": collection.shortname(),
            "measurements": collection.measurements.len(),
            "test_colors": collection.test_colors.len(),
            "test_color_mode": color_mode(&collection),
            "order": collection.order,
            "metadata": collection.metadata,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let meta = &collection.metadata;
    println!("{collection}");
    println!("  measurements: {}", collection.measurements.len());
    match color_mode(&collection) {
        Some(mode) => println!("  test colours: {} ({mode:?})", collection.test_colors.len()),
        None => println!("  test colours: 0"),
    }
    println!("  order:        {} entries", collection.order.len());
    for (label, value) in [
        ("notes", &meta.notes),
        ("author", &meta.author),
        ("location", &meta.location),
        ("software", &meta.software),
    ] {
        println!("  {label:<13} {}", value.as_deref().unwrap_or(""));
    }
    Ok(())
}

/// Representation of the stored rows; `None` for an empty matrix.
fn color_mode(collection: &MeasurementCollection) -> Option<ColorMode> {
    let rows = collection.test_colors.rows();
    let first = rows.first()?.mode();
    if rows.iter().all(|r| r.mode() == first) {
        Some(first)
    } else {
        Some(ColorMode::Float)
    }
}

fn run_import(args: &ImportArgs) -> Result<()> {
    let mut metadata = match &args.metadata {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<Metadata>(&text).context("parsing metadata JSON")?
        }
        None => Metadata::default(),
    };
    for (flag, field) in [
        (&args.notes, &mut metadata.notes),
        (&args.author, &mut metadata.author),
        (&args.location, &mut metadata.location),
    ] {
        if flag.is_some() {
            *field = flag.clone();
        }
    }

    let options = import::ImportOptions {
        color_columns: args
            .color_columns
            .iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect(),
        order_column: args.order_column.clone(),
        exposure_column: args.exposure_column.clone(),
        spectrometer_id: args.spectrometer.clone(),
        metadata,
    };

    let records = import::load_spectra(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let collection = import::build_collection(records, &options)?;
    let written = csmf::save(&args.output, &collection)?;
    println!("{} -> {}", collection, written.display());
    Ok(())
}

fn run_export(args: &ExportArgs) -> Result<()> {
    let collection = csmf::load(&args.file, args.recompute)
        .with_context(|| format!("loading {}", args.file.display()))?;
    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    export::write_csv(&collection, BufWriter::new(file))?;
    log::info!(
        "exported {} measurements to {}",
        collection.measurements.len(),
        args.output.display()
    );
    Ok(())
}

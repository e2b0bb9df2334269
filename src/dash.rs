use log::{debug, info, warn};

use region_ranks::bundle::ExportBundle;
use region_ranks::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::dash::artifact::*;
use crate::dash::config_reader::*;

pub mod artifact;
pub mod config_reader;
pub mod io_csv;
pub mod io_xlsx;
pub mod report;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DashError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet or its first row is missing"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} has no worksheet named {name}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("The input {path} has no header"))]
    EmptyInput { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading or writing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display(
        "The bundle {path} cannot be read, use --force-refresh to regenerate it"
    ))]
    UnreadableArtifact {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing the bundle to {path}"))]
    WritingArtifact {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("Invalid table: {source}"))]
    InvalidTable { source: TableError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashError>;

pub fn read_table(settings: &DashSettings) -> DashResult<RawTable> {
    info!(
        "Attempting to read table {:?} ({:?})",
        settings.input_path, settings.input_type
    );
    let raw = match settings.input_type {
        InputType::Csv => io_csv::read_csv_table(&settings.input_path),
        InputType::Xlsx => {
            io_xlsx::read_excel_table(&settings.input_path, settings.worksheet.as_deref())
        }
    }?;
    info!(
        "Read {} regions and {} fields",
        raw.rows().len(),
        raw.fields().len()
    );
    Ok(raw)
}

/// Cleans and ranks the table, and packs the result.
pub fn compute_bundle(raw: &RawTable, settings: &DashSettings) -> DashResult<ExportBundle> {
    let outcome = clean_table(raw, settings.parse_policy).context(InvalidTableSnafu {})?;
    if !outcome.skipped.is_empty() {
        warn!(
            "{} regions were left out of the bundle",
            outcome.skipped.len()
        );
    }
    let ranks = rank_table(&outcome.table);
    ExportBundle::assemble(
        &outcome.table,
        &ranks,
        &settings.polarity,
        Some(raw.digest()),
    )
    .context(InvalidTableSnafu {})
}

pub fn bundle_to_pretty_json(bundle: &ExportBundle) -> DashResult<String> {
    serde_json::to_string_pretty(bundle).context(ParsingJsonSnafu {})
}

fn read_reference(path: &str) -> DashResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Fails if the bundle differs from the reference file, after printing the difference.
pub fn check_reference(bundle: &ExportBundle, reference_path: &str) -> DashResult<()> {
    let reference = read_reference(reference_path)?;
    debug!("reference: {:?}", reference);
    // Going through a JSValue sorts the keys of both sides the same way.
    let computed = serde_json::to_value(bundle).context(ParsingJsonSnafu {})?;
    let pretty_computed =
        serde_json::to_string_pretty(&computed).context(ParsingJsonSnafu {})?;
    let pretty_reference =
        serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    if pretty_reference != pretty_computed {
        warn!("Found differences with the reference bundle");
        print_diff(pretty_reference.as_str(), pretty_computed.as_str(), "\n");
        whatever!("Difference detected between the computed bundle and the reference bundle")
    }
    info!("The bundle matches the reference {}", reference_path);
    Ok(())
}

pub fn run_dashboard(args: &Args) -> DashResult<()> {
    let settings = resolve_settings(args)?;
    info!("settings: {:?}", settings);

    let raw = read_table(&settings)?;
    let digest = raw.digest();
    debug!("input digest: {}", digest);

    let bundle = match &settings.output {
        OutputTarget::Stdout => {
            let bundle = compute_bundle(&raw, &settings)?;
            println!("{}", bundle_to_pretty_json(&bundle)?);
            bundle
        }
        OutputTarget::File(path) => {
            let (bundle, status) = export(path, settings.cache_policy, &digest, || {
                compute_bundle(&raw, &settings)
            })?;
            info!("{} {}", status, path.display());
            bundle
        }
    };

    if let Some(field) = &args.field {
        println!("{}", report::field_overview(&bundle, field)?);
    }
    if let Some(area) = &args.area {
        println!("{}", report::area_details(&bundle, area)?);
    }
    if let Some(reference) = &args.reference {
        check_reference(&bundle, reference)?;
    }
    Ok(())
}

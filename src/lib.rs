pub mod analysis;
pub mod classify;
pub mod cli;
pub mod columns;
pub mod donor;
pub mod error;
pub mod frequency;
pub mod header;
pub mod identity;
pub mod insights;
pub mod io_utils;
pub mod loader;
pub mod reconcile;
pub mod registration;
pub mod stats;
pub mod summary;
pub mod table;

use std::{env, io::Write, path::Path, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

pub use crate::analysis::{AnalysisReport, EventType, SourceInput, analyze, analyze_sources};
pub use crate::error::{AnalysisError, FileSlot, LoadError};

use crate::{
    cli::{AnalyzeArgs, Cli, Commands, DetectArgs, OutputFormat},
    loader::LoadOptions,
};

static LOGGER: OnceLock<()> = OnceLock::new();

const MAX_INPUTS: usize = 2;
const DETECT_CELL_WIDTH: usize = 60;

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("event_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => handle_analyze(&args),
        Commands::Detect(args) => handle_detect(&args),
    }
}

fn load_options(path: &Path, delimiter: Option<u8>, encoding: Option<&str>) -> Result<LoadOptions> {
    Ok(LoadOptions {
        delimiter: io_utils::resolve_input_delimiter(path, delimiter),
        encoding: io_utils::resolve_encoding(encoding)?,
    })
}

fn read_sources(
    paths: &[std::path::PathBuf],
    delimiter: Option<u8>,
    encoding: Option<&str>,
) -> Result<Vec<(Vec<u8>, LoadOptions)>> {
    if paths.iter().filter(|path| io_utils::is_dash(path)).count() > 1 {
        bail!("stdin ('-') can only be used for one input");
    }
    paths
        .iter()
        .map(|path| {
            let bytes = io_utils::read_input_bytes(path)?;
            debug!("Read {} byte(s) from {:?}", bytes.len(), path);
            Ok((bytes, load_options(path, delimiter, encoding)?))
        })
        .collect()
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<()> {
    if args.inputs.len() > MAX_INPUTS {
        bail!(
            "analyze accepts at most {MAX_INPUTS} inputs (got {})",
            args.inputs.len()
        );
    }
    let sources = read_sources(&args.inputs, args.delimiter, args.input_encoding.as_deref())?;
    let mut inputs = sources
        .iter()
        .map(|(bytes, options)| SourceInput::with_options(bytes, *options));
    let Some(first) = inputs.next() else {
        bail!("analyze requires at least one input");
    };
    let second = inputs.next();
    info!(
        "Analyzing {} {} input(s)",
        args.inputs.len(),
        args.event_type.as_str()
    );

    let report = analyze_sources(first, second, args.event_type)?;
    for warning in &report.warnings {
        warn!("{warning}");
    }

    let mut writer = io_utils::open_output_writer(args.output.as_deref())?;
    write_report(&mut writer, &report, args.format, args.pretty)
        .context("Writing analysis report")?;
    writer.flush().context("Flushing analysis report")?;
    if let Some(path) = args.output.as_deref().filter(|p| !io_utils::is_dash(p)) {
        info!(
            "Report with {} insight(s) written to {:?}",
            report.insights.len(),
            path
        );
    }
    Ok(())
}

pub fn write_report<W: Write>(
    writer: &mut W,
    report: &AnalysisReport,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json if pretty => serde_json::to_writer_pretty(&mut *writer, report)?,
        OutputFormat::Json => serde_json::to_writer(&mut *writer, report)?,
        OutputFormat::Yaml => {
            writer.write_all(serde_yaml::to_string(report)?.as_bytes())?;
            return Ok(());
        }
        OutputFormat::Summary => {
            writer.write_all(summary::render_summary(report).as_bytes())?;
            return Ok(());
        }
    }
    writeln!(writer)?;
    Ok(())
}

fn handle_detect(args: &DetectArgs) -> Result<()> {
    let sources = read_sources(&args.inputs, args.delimiter, args.input_encoding.as_deref())?;
    let slots = if sources.len() == 1 {
        vec![FileSlot::Only]
    } else {
        vec![FileSlot::First, FileSlot::Second]
    };
    let mut rows = Vec::with_capacity(sources.len());
    for (idx, ((bytes, options), path)) in sources.iter().zip(&args.inputs).enumerate() {
        let slot = slots.get(idx).copied().unwrap_or(FileSlot::Only);
        let summary = analysis::inspect(&SourceInput::with_options(bytes, *options), slot)
            .with_context(|| format!("Inspecting {path:?}"))?;
        let role = match (
            summary.classification.donor,
            summary.classification.registration,
        ) {
            (true, true) => "ambiguous",
            (true, false) => "donor",
            (false, true) => "registration",
            (false, false) => "unrecognized",
        };
        let signals = summary
            .donor_signals
            .iter()
            .chain(&summary.registration_signals)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        rows.push(vec![
            path.display().to_string(),
            format!("{:?}", summary.format).to_lowercase(),
            summary.rows.to_string(),
            summary.columns.to_string(),
            role.to_string(),
            signals,
        ]);
    }
    print!(
        "{}",
        table::render_table(
            &["Input", "Format", "Rows", "Columns", "Role", "Signals"],
            &rows,
            DETECT_CELL_WIDTH,
        )
    );
    Ok(())
}

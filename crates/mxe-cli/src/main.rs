//! mxe - Read and edit the Main Table of Valkyria Chronicles 4 .mxe files
//!
//! Usage:
//!   mxe <mxe_file> read   - Export every record type to CSV
//!   mxe <mxe_file> test   - Apply CSV files in memory only
//!   mxe <mxe_file> write  - Apply CSV files and write the MXE back
//!   mxe <mxe_file> dummy  - Only load templates, XLB and MXE

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use mxe::mxe_utils::{apply_csv_dir, apply_csv_file, export_csv_dir, show_mxe_info, write_mxe};
use mxe::{MainTable, Settings, TemplateRegistry, Xlb};

const DEFAULT_TEMPLATES: &str = "VlMx_entry_templates.csv";
const DEFAULT_XLB: &str = "text_mx.xlb";
const DEFAULT_LOG: &str = "write_log.txt";

#[derive(Parser)]
#[command(name = "mxe")]
#[command(version = "0.1.0")]
#[command(about = "Read and edit the main table of Valkyria Chronicles 4 .mxe files", long_about = None)]
struct Cli {
    /// Path to the .mxe file
    mxe_path: PathBuf,

    /// Operation mode
    #[arg(value_enum)]
    mode: Mode,

    /// Template CSV file [default: VlMx_entry_templates.csv next to the MXE]
    #[arg(short = 't', long)]
    template_csv_path: Option<PathBuf>,

    /// CSV directory: output of read mode, input of test and write modes
    /// [default: the MXE path without extension]
    #[arg(short = 'd', long)]
    csv_dir: Option<PathBuf>,

    /// Single CSV file applied by test and write modes, after --csv-dir
    #[arg(short = 's', long)]
    single_csv: Option<PathBuf>,

    /// XLB file used to resolve text ids [default: text_mx.xlb next to the MXE]
    #[arg(short = 'x', long)]
    xlb_path: Option<PathBuf>,

    /// Do not write the trace log in write mode
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Trace log written in write mode [default: write_log.txt next to the MXE]
    #[arg(short = 'l', long)]
    log: Option<PathBuf>,

    /// JSON configuration file; defaults are used when omitted
    #[arg(short = 'c', long)]
    config_file: Option<PathBuf>,

    /// Back up the MXE file before writing it
    #[arg(short = 'b', long)]
    backup_mxe: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Export the MXE to CSV
    #[value(alias = "R", alias = "r")]
    Read,
    /// Apply CSV to the MXE in memory only
    #[value(alias = "T", alias = "t")]
    Test,
    /// Apply CSV to the MXE and write the result
    #[value(alias = "W", alias = "w")]
    Write,
    /// Only read templates, XLB and MXE
    #[value(alias = "D", alias = "d")]
    Dummy,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let mxe_path = cli.mxe_path.as_path();
    if !mxe_path.is_file() || mxe_path.extension().and_then(|e| e.to_str()) != Some("mxe") {
        bail!("{} is not an .mxe file", mxe_path.display());
    }
    let base_dir = mxe_path.parent().unwrap_or_else(|| Path::new(""));

    let settings = match &cli.config_file {
        Some(path) => {
            println!("Applying config file: {}", path.display());
            Settings::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => Settings::default(),
    };

    let template_path = cli
        .template_csv_path
        .clone()
        .unwrap_or_else(|| base_dir.join(DEFAULT_TEMPLATES));
    let csv_dir = cli
        .csv_dir
        .clone()
        .unwrap_or_else(|| mxe_path.with_extension(""));
    let xlb_path = cli.xlb_path.clone().unwrap_or_else(|| base_dir.join(DEFAULT_XLB));
    let log_path = cli.log.clone().unwrap_or_else(|| base_dir.join(DEFAULT_LOG));

    println!("Reading templates from {}...", template_path.display());
    let templates = TemplateRegistry::load(&template_path)
        .with_context(|| format!("Failed to load templates {}", template_path.display()))?;
    println!("Templates: {}", templates.len());

    let outcome = MainTable::open(mxe_path, &templates, &settings.layout, &settings.policy)
        .with_context(|| format!("Failed to read {}", mxe_path.display()))?;
    show_mxe_info(mxe_path, &outcome);
    let mut main = outcome.table;

    match cli.mode {
        Mode::Dummy => {
            load_xlb(&xlb_path, &settings)?;
            println!("Dummy mode execution finished");
        }
        Mode::Read => {
            let xlb = load_xlb(&xlb_path, &settings)?;
            export_csv_dir(&main, &templates, xlb.as_ref(), &settings, &csv_dir)?;
        }
        Mode::Test | Mode::Write => {
            if cli.csv_dir.is_some() || cli.single_csv.is_none() {
                println!("Applying CSV directory {}", csv_dir.display());
                apply_csv_dir(&mut main, &templates, &csv_dir, &settings)?;
            }
            if let Some(single) = &cli.single_csv {
                println!("Applying CSV file {}", single.display());
                let report = apply_csv_file(&mut main, &templates, single, &settings)?;
                println!(
                    "Applied: {} fields changed, {} skipped",
                    report.changed,
                    report.diagnostics.len()
                );
            }

            if cli.mode == Mode::Write {
                let trace_log = (!cli.quiet).then_some(log_path.as_path());
                write_mxe(
                    mxe_path,
                    &main,
                    &templates,
                    &settings,
                    cli.backup_mxe,
                    trace_log,
                )?;
            }
        }
    }

    Ok(())
}

/// Load the XLB when text ids are resolved
fn load_xlb(path: &Path, settings: &Settings) -> Result<Option<Xlb>> {
    if !settings.policy.resolve_xlb_strings {
        return Ok(None);
    }
    println!("Reading XLB from {}...", path.display());
    let xlb = Xlb::open(path, settings.layout.encoding)
        .with_context(|| format!("Failed to read XLB {}", path.display()))?;
    Ok(Some(xlb))
}

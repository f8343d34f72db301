//! MXE file utility functions
//!
//! This module contains the file and directory level operations behind the
//! command line modes: exporting tables to CSV, applying CSV files and
//! writing the MXE back.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{
    apply_table, export_tables, utils::collect_csv_files, ImportReport, MainTable, ReadOutcome,
    Settings, Table, TemplateRegistry, WriteOptions, WriteReport, Xlb,
};

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Backup file name for an MXE written at `now`
///
/// `game_info.mxe` becomes `game_info.mxe_2024-01-31T18_05_09.bak`.
pub fn backup_path(path: &Path, now: NaiveDateTime) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!("_{}.bak", now.format("%Y-%m-%dT%H_%M_%S")));
    PathBuf::from(name)
}

/// Print a summary of a read Main Table
pub fn show_mxe_info(path: &Path, outcome: &ReadOutcome) {
    let mut per_type: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in outcome.table.entries() {
        *per_type.entry(entry.type_name.template_key()).or_default() += 1;
    }

    println!("\nMXE Info: {}", path.display());
    println!("  Entries: {}", outcome.table.len());
    println!("  Record types: {}", per_type.len());
    for (key, count) in &per_type {
        println!("    {:<40} {:>6}", key, count);
    }
    if !outcome.diagnostics.is_empty() {
        println!("  Diagnostics: {}", outcome.diagnostics.len());
    }
}

/// Export one `<templateKey>.csv` per record type into `out_dir`
///
/// Returns the written files.
pub fn export_csv_dir(
    main: &MainTable,
    templates: &TemplateRegistry,
    xlb: Option<&Xlb>,
    settings: &Settings,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory {}", out_dir.display()))?;

    let outcome = export_tables(main, templates, xlb, settings)?;
    println!("Writing {} tables to {}...", outcome.tables.len(), out_dir.display());

    let pb = progress_bar(outcome.tables.len())?;
    let mut written = Vec::with_capacity(outcome.tables.len());
    for table in &outcome.tables {
        pb.set_message(table.name.clone());
        let path = out_dir.join(format!("{}.csv", table.name));
        table
            .write_csv(&path, settings.layout.encoding)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    println!("Exported: {} tables", written.len());
    if !outcome.diagnostics.is_empty() {
        println!("Skipped: {} record types without a template", outcome.diagnostics.len());
    }
    Ok(written)
}

/// Apply one CSV file to the Main Table in memory
pub fn apply_csv_file(
    main: &mut MainTable,
    templates: &TemplateRegistry,
    path: &Path,
    settings: &Settings,
) -> Result<ImportReport> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let table = Table::read_csv(path, &name, settings.layout.encoding)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let report = apply_table(&table, main, templates, settings.layout.encoding)
        .with_context(|| format!("Failed to apply {}", path.display()))?;
    Ok(report)
}

/// Apply every `*.csv` file of a directory, in name order
pub fn apply_csv_dir(
    main: &mut MainTable,
    templates: &TemplateRegistry,
    dir: &Path,
    settings: &Settings,
) -> Result<ImportReport> {
    let files = collect_csv_files(dir)?;
    println!("Found {} CSV files in {}", files.len(), dir.display());

    let pb = progress_bar(files.len())?;
    let mut total = ImportReport::default();
    for path in &files {
        pb.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let report = apply_csv_file(main, templates, path, settings)?;
        total.changed += report.changed;
        total.diagnostics.extend(report.diagnostics);
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    println!(
        "Applied: {} fields changed, {} skipped",
        total.changed,
        total.diagnostics.len()
    );
    Ok(total)
}

/// Write the Main Table back into the MXE file
///
/// With `backup` the original file is first copied next to itself. With a
/// `trace_log` every written field is logged to that file.
pub fn write_mxe(
    path: &Path,
    main: &MainTable,
    templates: &TemplateRegistry,
    settings: &Settings,
    backup: bool,
    trace_log: Option<&Path>,
) -> Result<WriteReport> {
    let backup = backup.then(|| backup_path(path, chrono::Local::now().naive_local()));

    let mut log = trace_log
        .map(|log| {
            File::create(log)
                .map(BufWriter::new)
                .with_context(|| format!("Failed to create log {}", log.display()))
        })
        .transpose()?;

    println!("Writing {}...", path.display());
    let report = main
        .write(
            path,
            templates,
            &settings.layout,
            WriteOptions {
                backup,
                trace: log.as_mut().map(|w| w as &mut dyn Write),
            },
        )
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if let Some(backup) = &report.backup {
        println!("Backup: {}", backup.display());
    }
    println!("Wrote: {} entries", report.entries_written);
    if !report.diagnostics.is_empty() {
        println!("Skipped: {} entries without a template", report.diagnostics.len());
    }
    Ok(report)
}

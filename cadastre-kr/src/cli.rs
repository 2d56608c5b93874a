//! Définition et implémentation des commandes CLI
//!
//! - `process`: archives .zip → GeoJSON WGS84 par région
//! - `count`: inventaire des géométries des régions extraites

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use cadastre_kr::pipeline;
use cadastre_kr::report::BatchReport;
use cadastre_kr::Settings;

#[derive(Subcommand)]
pub enum Commands {
    /// Extract every archive in <data>/zip and write <data>/json/<region>-4326.json
    Process {
        /// Also write the batch report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Count geometries of every region already extracted in <data>/unzipped
    Count,
}

impl Commands {
    /// Seul `process` signale les régions en échec par le code de sortie
    pub fn exits_with_failure(&self, report: &BatchReport) -> bool {
        matches!(self, Self::Process { .. }) && report.has_failures()
    }
}

/// Exécute la commande process
pub fn cmd_process(settings: &Settings, report_path: Option<&Path>) -> Result<BatchReport> {
    info!(
        data_dir = %settings.data_dir.display(),
        prefix = %settings.archive_prefix,
        "Starting process"
    );

    println!("=== Process ===");
    println!("Archives: {}", settings.zip_dir().display());
    println!("Output: {}", settings.json_dir().display());
    println!("Source CRS: EPSG:{} -> EPSG:4326", settings.source_epsg);
    println!("Jobs: {}", settings.jobs);

    let report = pipeline::process_all(settings)?;
    report.display();

    if let Some(path) = report_path {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Report saved");
    }

    Ok(report)
}

/// Exécute la commande count
pub fn cmd_count(settings: &Settings) -> Result<BatchReport> {
    info!(data_dir = %settings.data_dir.display(), "Starting count");

    let report = pipeline::count_all(settings)?;
    report.display();

    Ok(report)
}

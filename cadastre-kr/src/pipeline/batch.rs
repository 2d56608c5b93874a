//! Traitement par lot des archives `data/zip/*.zip`
//!
//! Chaque région est isolée: un échec ou une région ignorée n'interrompt
//! jamais les suivantes. Avec `jobs > 1`, les régions passent sur un pool
//! rayon; le rapport reste trié par nom d'archive.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{error, info, warn};

use super::region::{find_by_extension, process_region, RegionContext};
use crate::config::Settings;
use crate::error::RegionError;
use crate::report::{format_thousands, BatchReport, RegionOutcome};
use crate::reproject::Reprojector;
use crate::reproject_lite::CrsDefinition;

/// Résultat d'une région avant agrégation
struct RegionResult {
    region: String,
    archive: Option<String>,
    outcome: RegionOutcome,
}

/// Liste les archives .zip d'un dossier, triées par nom
pub fn list_archives(zip_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(zip_dir)
        .with_context(|| format!("Cannot read archive directory: {}", zip_dir.display()))?;

    let mut archives = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
        if is_zip && path.is_file() {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}

/// Liste les dossiers de régions extraits, triés par nom
fn list_region_dirs(unzipped_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(unzipped_dir)
        .with_context(|| format!("Cannot read directory: {}", unzipped_dir.display()))?;

    let mut regions = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            regions.push((name.to_string(), path.clone()));
        }
    }
    regions.sort();
    Ok(regions)
}

/// Exécute `f` sur chaque élément, séquentiellement ou sur un pool rayon
fn run_jobs<T, R, F>(jobs: usize, items: &[T], f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if jobs <= 1 {
        return Ok(items.iter().map(f).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to build thread pool")?;
    // `collect` sur un par_iter indexé conserve l'ordre d'entrée
    Ok(pool.install(|| items.par_iter().map(&f).collect()))
}

/// Traite toutes les archives: extraction, conversion, écriture
pub fn process_all(settings: &Settings) -> Result<BatchReport> {
    let start = Instant::now();
    let crs = settings.source_crs()?;
    let archives = list_archives(&settings.zip_dir())?;

    info!(
        archives = archives.len(),
        jobs = settings.jobs,
        source = crs.epsg,
        "Processing archives"
    );

    let results = run_jobs(settings.jobs, &archives, |archive| {
        process_archive(archive, settings, &crs)
    })?;

    let mut report = BatchReport::new("process");
    for result in results {
        report.record(&result.region, result.archive, result.outcome);
    }
    report.set_duration(start.elapsed());
    report.finalize();

    info!(summary = %report.summary(), "All archives processed");
    Ok(report)
}

/// Extrait une archive puis exécute le pipeline de sa région
fn process_archive(archive: &Path, settings: &Settings, crs: &CrsDefinition) -> RegionResult {
    let archive_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let result = |region: String, outcome: RegionOutcome| RegionResult {
        region,
        archive: Some(archive_name.clone()),
        outcome,
    };

    let extracted =
        match shp::archive::extract(archive, &settings.unzipped_dir(), &settings.archive_prefix) {
            Ok(extracted) => extracted,
            Err(source) => {
                let region = shp::archive::region_code(archive, &settings.archive_prefix)
                    .unwrap_or_else(|| archive_name.clone());
                let err = RegionError::Parse {
                    path: archive.to_path_buf(),
                    source,
                };
                let outcome = log_outcome(&region, &err);
                return result(region, outcome);
            }
        };
    info!(
        region = %extracted.region,
        archive = %archive_name,
        files = extracted.files,
        "Archive extracted"
    );

    let reprojector = match Reprojector::new(*crs) {
        Ok(reprojector) => reprojector,
        Err(e) => {
            let reason = format!("{:#}", e);
            error!(region = %extracted.region, error = %reason, "Region failed");
            let outcome = RegionOutcome::Failed {
                kind: "projection".to_string(),
                reason,
            };
            return result(extracted.region, outcome);
        }
    };

    let json_dir = settings.json_dir();
    let ctx = RegionContext {
        projector: &reprojector,
        crs,
        json_dir: &json_dir,
    };

    let outcome = match process_region(&extracted.region, &extracted.dir, &ctx) {
        Ok(output) => RegionOutcome::Success {
            features: output.features,
            output: Some(output.path),
        },
        Err(err) => log_outcome(&extracted.region, &err),
    };
    result(extracted.region, outcome)
}

/// Journalise une région ignorée ou en échec et construit son résultat
fn log_outcome(region: &str, err: &RegionError) -> RegionOutcome {
    let outcome = RegionOutcome::from_error(err);
    match &outcome {
        RegionOutcome::Skipped { reason } => warn!(region, reason = %reason, "Region skipped"),
        RegionOutcome::Failed { kind, reason } => {
            error!(region, kind = %kind, error = %reason, "Region failed")
        }
        RegionOutcome::Success { .. } => {}
    }
    outcome
}

/// Compte les géométries de chaque région extraite (lecture seule)
pub fn count_all(settings: &Settings) -> Result<BatchReport> {
    let start = Instant::now();
    let regions = list_region_dirs(&settings.unzipped_dir())?;

    info!(regions = regions.len(), "Counting features");

    let results = run_jobs(settings.jobs, &regions, |(region, dir)| {
        let outcome = match count_region(dir) {
            Ok(features) => {
                info!(region = %region, features = %format_thousands(features), "Shapefile read");
                RegionOutcome::Success {
                    features,
                    output: None,
                }
            }
            Err(err) => log_outcome(region, &err),
        };
        RegionResult {
            region: region.clone(),
            archive: None,
            outcome,
        }
    })?;

    let mut report = BatchReport::new("count");
    for result in results {
        report.record(&result.region, result.archive, result.outcome);
    }
    report.set_duration(start.elapsed());
    report.finalize();

    info!(
        total = %format_thousands(report.total_features),
        regions = report.regions_succeeded,
        "Count complete"
    );
    Ok(report)
}

/// Compte les enregistrements du .shp d'une région (géométries seules)
fn count_region(dir: &Path) -> Result<usize, RegionError> {
    let shp_path = find_by_extension(dir, "shp")?;
    shp::count_records(&shp_path).map_err(|source| RegionError::Parse {
        path: shp_path,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_archives_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "LSMD_CONT_LDREG_11140.zip",
            "LSMD_CONT_LDREG_11110.ZIP",
            "readme.txt",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.zip")).unwrap();

        let archives = list_archives(dir.path()).unwrap();
        let names: Vec<String> = archives
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["LSMD_CONT_LDREG_11110.ZIP", "LSMD_CONT_LDREG_11140.zip"]);
    }

    #[test]
    fn test_list_archives_missing_dir() {
        assert!(list_archives(Path::new("no/such/dir")).is_err());
    }

    #[test]
    fn test_run_jobs_keeps_order() {
        let items: Vec<usize> = (0..50).collect();
        let sequential = run_jobs(1, &items, |i| i * 2).unwrap();
        let parallel = run_jobs(4, &items, |i| i * 2).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(parallel[49], 98);
    }

    #[test]
    fn test_count_region_missing_shp() {
        let dir = tempfile::tempdir().unwrap();
        let err = count_region(dir.path()).unwrap_err();
        assert!(err.is_skip());
    }
}

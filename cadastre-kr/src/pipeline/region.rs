//! Pipeline d'une région: Locate → Extract → Transform → Assemble → Persist
//!
//! La FeatureCollection est construite entièrement en mémoire avant
//! l'écriture: au moindre échec d'une feature, aucun fichier n'est produit.

use std::path::{Path, PathBuf};

use geojson::{Feature, FeatureCollection};
use shp::{FeatureReader, Record};
use tracing::{debug, info, warn};

use crate::encoding::repair_properties;
use crate::error::RegionError;
use crate::export::write_feature_collection;
use crate::geometry::Geometry;
use crate::reproject::Projector;
use crate::reproject_lite::CrsDefinition;

/// Fichiers shapefile d'une région
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSources {
    /// Fichier géométrique principal (.shp)
    pub shp: PathBuf,
    /// Métadonnées de projection (.prj)
    pub prj: PathBuf,
}

/// Résultat d'une région convertie
#[derive(Debug, Clone)]
pub struct RegionOutput {
    pub features: usize,
    pub path: PathBuf,
}

/// Contexte partagé par les régions d'un lot
pub struct RegionContext<'a, P: Projector> {
    pub projector: &'a P,
    /// CRS attendu pour les coordonnées source
    pub crs: &'a CrsDefinition,
    /// Dossier de sortie des FeatureCollections
    pub json_dir: &'a Path,
}

/// Cherche le .shp et le .prj dans le dossier d'une région (sans récursion)
///
/// Un composant absent donne `MissingInput` (région ignorée). S'il y a
/// plusieurs candidats, le premier par ordre alphabétique est retenu.
pub fn locate(dir: &Path) -> Result<RegionSources, RegionError> {
    let shp = find_by_extension(dir, "shp")?;
    let prj = find_by_extension(dir, "prj")?;
    Ok(RegionSources { shp, prj })
}

/// Premier fichier (ordre alphabétique) ayant l'extension donnée
pub(crate) fn find_by_extension(dir: &Path, extension: &'static str) -> Result<PathBuf, RegionError> {
    let missing = || RegionError::MissingInput {
        dir: dir.to_path_buf(),
        extension,
    };

    let entries = std::fs::read_dir(dir).map_err(|_| missing())?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    candidates.sort();

    if candidates.len() > 1 {
        warn!(
            dir = %dir.display(),
            extension,
            count = candidates.len(),
            "Several candidates, using the first one"
        );
    }
    candidates.into_iter().next().ok_or_else(missing)
}

/// Compare le .prj au CRS attendu (un écart n'est qu'un avertissement)
fn check_projection(prj: &Path, crs: &CrsDefinition) {
    let info = match shp::read_prj(prj) {
        Ok(info) => info,
        Err(e) => {
            warn!(path = %prj.display(), error = %e, "Cannot read projection metadata");
            return;
        }
    };

    let matches = match (info.epsg, info.transverse_mercator) {
        (Some(epsg), _) if epsg == crs.epsg => true,
        (_, Some(params)) => crs.matches(&params),
        (Some(_), None) => false,
        (None, None) => {
            debug!(path = %prj.display(), "Projection metadata not recognised");
            return;
        }
    };

    if !matches {
        warn!(
            path = %prj.display(),
            expected = crs.epsg,
            found = ?info.epsg,
            name = info.name.as_deref().unwrap_or(""),
            "Projection metadata differs from the configured source CRS"
        );
    }
}

/// Transforme un enregistrement brut en Feature WGS84
pub fn transform_record<P: Projector>(
    index: usize,
    record: Record,
    projector: &P,
) -> Result<Feature, RegionError> {
    let geometry = match record.geometry.as_ref().and_then(Geometry::from_geo) {
        Some(geometry) => {
            let projected = projector
                .project_geometry(&geometry)
                .map_err(|source| RegionError::Projection { index, source })?;
            Some(geojson::Geometry::from(&projected))
        }
        None => None,
    };

    let properties = repair_properties(record.properties)
        .map_err(|(key, source)| RegionError::Decoding { index, key, source })?;

    Ok(Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Lit et transforme tous les enregistrements, dans l'ordre du fichier
pub fn convert<P: Projector>(
    sources: &RegionSources,
    ctx: &RegionContext<'_, P>,
) -> Result<FeatureCollection, RegionError> {
    check_projection(&sources.prj, ctx.crs);

    let parse_error = |source| RegionError::Parse {
        path: sources.shp.clone(),
        source,
    };

    let reader = FeatureReader::open(&sources.shp).map_err(parse_error)?;
    let mut features = Vec::new();
    for (index, record) in reader.enumerate() {
        let record = record.map_err(parse_error)?;
        features.push(transform_record(index, record, ctx.projector)?);
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Exécute le pipeline complet pour une région extraite
pub fn process_region<P: Projector>(
    region: &str,
    dir: &Path,
    ctx: &RegionContext<'_, P>,
) -> Result<RegionOutput, RegionError> {
    let sources = locate(dir)?;
    debug!(region, shp = %sources.shp.display(), "Shapefile located");

    let collection = convert(&sources, ctx)?;
    let features = collection.features.len();

    let path = write_feature_collection(ctx.json_dir, region, &collection).map_err(|source| {
        RegionError::Persistence {
            path: crate::export::output_path(ctx.json_dir, region),
            source,
        }
    })?;

    info!(region, features, path = %path.display(), "Region converted");
    Ok(RegionOutput { features, path })
}

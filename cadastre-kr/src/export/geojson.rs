//! Export GeoJSON: un fichier par région (`<region>-4326.json`)

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use geojson::FeatureCollection;
use tracing::debug;

/// Suffixe indiquant le CRS cible dans le nom du fichier
pub const TARGET_SUFFIX: &str = "-4326";

/// Chemin du fichier de sortie d'une région
pub fn output_path(json_dir: &Path, region: &str) -> PathBuf {
    json_dir.join(format!("{}{}.json", region, TARGET_SUFFIX))
}

/// Écrit une FeatureCollection (JSON indenté) pour une région
///
/// Le dossier est créé s'il n'existe pas. L'écriture passe par un fichier
/// `.tmp` renommé à la fin: un fichier de sortie n'est jamais partiel.
pub fn write_feature_collection(
    json_dir: &Path,
    region: &str,
    collection: &FeatureCollection,
) -> io::Result<PathBuf> {
    std::fs::create_dir_all(json_dir)?;

    let path = output_path(json_dir, region);
    let tmp_path = path.with_extension("json.tmp");

    let result = write_pretty(&tmp_path, collection);
    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    std::fs::rename(&tmp_path, &path)?;

    debug!(
        region,
        features = collection.features.len(),
        path = %path.display(),
        "FeatureCollection written"
    );
    Ok(path)
}

fn write_pretty(path: &Path, collection: &FeatureCollection) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, collection)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

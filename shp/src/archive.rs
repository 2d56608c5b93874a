//! Extraction des archives shapefile (.zip)

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::ShpError;

/// Résultat de l'extraction d'une archive
#[derive(Debug, Clone)]
pub struct ExtractedArchive {
    /// Dossier contenant les fichiers extraits
    pub dir: PathBuf,

    /// Code région déduit du nom de l'archive
    pub region: String,

    /// Nombre de fichiers écrits
    pub files: usize,
}

/// Code région: nom de base de l'archive sans extension ni préfixe
///
/// `LSMD_CONT_LDREG_11110.zip` avec le préfixe `LSMD_CONT_LDREG_` donne `11110`.
/// Un nom sans le préfixe est conservé tel quel.
pub fn region_code(archive_path: &Path, prefix: &str) -> Option<String> {
    let stem = archive_path.file_stem()?.to_str()?;
    Some(stem.strip_prefix(prefix).unwrap_or(stem).to_string())
}

/// Extrait une archive dans `<unzipped_root>/<region>/`
///
/// Le dossier est créé s'il n'existe pas; les fichiers déjà présents sont écrasés.
/// Une archive illisible ne laisse aucun dossier derrière elle.
pub fn extract(
    archive_path: &Path,
    unzipped_root: &Path,
    prefix: &str,
) -> Result<ExtractedArchive, ShpError> {
    let region = region_code(archive_path, prefix).ok_or_else(|| ShpError::InvalidArchive {
        path: archive_path.display().to_string(),
        reason: "archive name is not valid UTF-8".into(),
    })?;

    let file = File::open(archive_path)?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| zip_error(archive_path, e))?;

    // Créé seulement une fois l'archive reconnue
    let dir = unzipped_root.join(&region);
    std::fs::create_dir_all(&dir)?;

    let mut files = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| zip_error(archive_path, e))?;

        // Les chemins sortant du dossier cible (../, absolus) sont ignorés
        let Some(relative) = entry.enclosed_name() else {
            warn!(entry = entry.name(), "Skipping archive entry with unsafe path");
            continue;
        };
        let target = dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        files += 1;
    }

    debug!(region = %region, files, dir = %dir.display(), "Archive extracted");

    Ok(ExtractedArchive { dir, region, files })
}

fn zip_error(path: &Path, err: ZipError) -> ShpError {
    match err {
        ZipError::Io(io) => ShpError::Io(io),
        other => ShpError::InvalidArchive {
            path: path.display().to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_code() {
        assert_eq!(
            region_code(Path::new("data/zip/LSMD_CONT_LDREG_11110.zip"), "LSMD_CONT_LDREG_"),
            Some("11110".to_string())
        );
        assert_eq!(
            region_code(Path::new("OTHER_41135.zip"), "LSMD_CONT_LDREG_"),
            Some("OTHER_41135".to_string())
        );
    }

    #[test]
    fn test_extract_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("LSMD_CONT_LDREG_99999.zip");
        std::fs::write(&bogus, b"definitely not a zip").unwrap();

        let unzipped = dir.path().join("unzipped");
        let result = extract(&bogus, &unzipped, "LSMD_CONT_LDREG_");
        assert!(matches!(result, Err(ShpError::InvalidArchive { .. })));
        assert!(!unzipped.join("99999").exists());
    }

    #[test]
    fn test_extract_missing_file_creates_nothing() {
        let out = tempfile::tempdir().unwrap();
        let result = extract(Path::new("LSMD_CONT_LDREG_11110.zip"), out.path(), "LSMD_CONT_LDREG_");
        assert!(matches!(result, Err(ShpError::Io(_))));
        assert!(!out.path().join("11110").exists());
    }
}

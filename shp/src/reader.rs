//! Lecture en flux d'un shapefile complet (.shp + .dbf)
//!
//! Deux modes: géométries seules (inventaire) ou enregistrements complets.
//! Les fichiers sont ouverts en `BufReader` et libérés au drop de l'itérateur.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use geo::Geometry;

use crate::parser::dbf::DbfReader;
use crate::parser::shp::ShapeReader;
use crate::types::Record;
use crate::ShpError;

/// Itérateur sur les géométries d'un .shp
pub type GeometryReader = ShapeReader<BufReader<File>>;

/// Ouvre un .shp en mode géométries seules
pub fn open_geometries(shp_path: &Path) -> Result<GeometryReader, ShpError> {
    let file = File::open(shp_path)?;
    ShapeReader::new(BufReader::new(file), display_name(shp_path))
}

/// Itérateur sur les enregistrements complets (géométrie + attributs)
pub struct FeatureReader {
    shapes: ShapeReader<BufReader<File>>,
    attributes: Option<DbfReader<BufReader<File>>>,
    shp_name: String,
    dbf_name: String,
    failed: bool,
}

impl FeatureReader {
    /// Ouvre un .shp et le .dbf voisin (même nom de base) s'il existe
    pub fn open(shp_path: &Path) -> Result<Self, ShpError> {
        let shapes = open_geometries(shp_path)?;
        let dbf_path = sibling(shp_path, "dbf");

        let attributes = match dbf_path {
            Some(ref path) => {
                let file = File::open(path)?;
                Some(DbfReader::new(BufReader::new(file), display_name(path))?)
            }
            None => {
                tracing::debug!(path = %shp_path.display(), "No .dbf found, records without attributes");
                None
            }
        };

        Ok(Self {
            shapes,
            attributes,
            shp_name: display_name(shp_path),
            dbf_name: dbf_path.as_deref().map(display_name).unwrap_or_default(),
            failed: false,
        })
    }

    /// Noms des champs attributaires, dans l'ordre du .dbf
    pub fn field_names(&self) -> Vec<&str> {
        self.attributes
            .as_ref()
            .map(|dbf| dbf.fields().iter().map(|f| f.name.as_str()).collect())
            .unwrap_or_default()
    }

    fn read_record(&mut self, geometry: Option<Geometry>) -> Result<Record, ShpError> {
        let properties = match self.attributes.as_mut() {
            Some(dbf) => match dbf.next() {
                Some(properties) => properties?,
                None => {
                    return Err(ShpError::RecordMismatch {
                        shp: self.shp_name.clone(),
                        dbf: self.dbf_name.clone(),
                    })
                }
            },
            None => Vec::new(),
        };

        Ok(Record {
            geometry,
            properties,
        })
    }
}

impl Iterator for FeatureReader {
    type Item = Result<Record, ShpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let record = match self.shapes.next()? {
            Ok(geometry) => self.read_record(geometry),
            Err(e) => Err(e),
        };
        // Pas de lecture après une erreur
        self.failed = record.is_err();
        Some(record)
    }
}

/// Cherche un fichier voisin avec une autre extension (insensible à la casse)
pub fn sibling(path: &Path, extension: &str) -> Option<PathBuf> {
    let stem = path.file_stem()?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|candidate| {
            candidate.file_stem() == Some(stem)
                && candidate
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

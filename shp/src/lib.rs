//! # shp
//!
//! Lecture en flux des shapefiles ESRI utilisés par le cadastre coréen
//! (`LSMD_CONT_LDREG_*.zip`).
//!
//! ## Features
//!
//! - Lecture séquentielle du `.shp` (Point, PolyLine, Polygon, MultiPoint, variantes Z/M)
//! - Table attributaire `.dbf` avec textes bruts (un octet = un caractère)
//! - Détection de la projection depuis le `.prj`
//! - Extraction des archives `.zip`
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! let extracted = shp::archive::extract(
//!     Path::new("data/zip/LSMD_CONT_LDREG_11110.zip"),
//!     Path::new("data/unzipped"),
//!     "LSMD_CONT_LDREG_",
//! )?;
//!
//! for record in shp::FeatureReader::open(&extracted.dir.join("11110.shp"))? {
//!     let record = record?;
//!     println!("{:?} {:?}", record.geometry, record.properties);
//! }
//! ```

pub mod archive;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod parser;
pub mod reader;
pub mod topology;
pub mod types;

pub use error::ShpError;
pub use reader::{open_geometries, FeatureReader, GeometryReader};
pub use types::{FieldValue, PrjInfo, Properties, Record, TmParameters};

use std::path::Path;

/// Compte les enregistrements d'un .shp sans lire les attributs
pub fn count_records(shp_path: &Path) -> Result<usize, ShpError> {
    let mut count = 0;
    for geometry in open_geometries(shp_path)? {
        geometry?;
        count += 1;
    }
    Ok(count)
}

/// Lit et analyse un fichier .prj
pub fn read_prj(prj_path: &Path) -> Result<PrjInfo, ShpError> {
    let data = std::fs::read(prj_path)?;
    Ok(parser::prj::parse(&data))
}

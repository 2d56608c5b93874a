//! Erreurs du pipeline de conversion

use std::path::PathBuf;

use thiserror::Error;

/// Échec de reprojection d'une coordonnée
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    /// Coordonnée NaN ou infinie
    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    /// Coordonnée hors du domaine de la projection source
    #[error("coordinate ({x}, {y}) outside the domain of EPSG:{epsg}")]
    OutOfDomain { x: f64, y: f64, epsg: u32 },

    /// Erreur de la bibliothèque PROJ
    #[error("PROJ transformation failed: {0}")]
    Proj(String),
}

/// Texte non décodable dans l'encodage attendu
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodingError {
    /// Caractère au-delà de U+00FF: le texte n'est pas une suite d'octets mal décodée
    #[error("character {ch:?} at index {index} is not a raw byte")]
    NotRawBytes { ch: char, index: usize },

    /// Suite d'octets invalide en CP949/EUC-KR
    #[error("invalid {encoding} byte sequence in {value:?}")]
    Malformed {
        encoding: &'static str,
        value: String,
    },
}

/// Erreur de traitement d'une région
///
/// `MissingInput` correspond à une région ignorée (SKIPPED), les autres à un échec (FAILED).
#[derive(Debug, Error)]
pub enum RegionError {
    /// Composant shapefile manquant (.shp ou .prj)
    #[error("missing {extension} file in {}", .dir.display())]
    MissingInput { dir: PathBuf, extension: &'static str },

    /// Shapefile illisible ou corrompu
    #[error("cannot read {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: shp::ShpError,
    },

    /// Échec de reprojection d'une feature
    #[error("feature #{index}: {source}")]
    Projection {
        index: usize,
        #[source]
        source: ProjectionError,
    },

    /// Attribut texte non décodable
    #[error("feature #{index}, property {key:?}: {source}")]
    Decoding {
        index: usize,
        key: String,
        #[source]
        source: DecodingError,
    },

    /// Échec d'écriture du fichier de sortie
    #[error("cannot write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegionError {
    /// Vrai si la région doit être ignorée plutôt que comptée en échec
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::MissingInput { .. })
    }

    /// Nom court du type d'erreur (pour les logs et le rapport)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingInput { .. } => "missing_input",
            Self::Parse { .. } => "parse",
            Self::Projection { .. } => "projection",
            Self::Decoding { .. } => "decoding",
            Self::Persistence { .. } => "persistence",
        }
    }
}

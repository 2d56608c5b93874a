//! Types d'erreurs pour le crate shp

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture d'un shapefile
#[derive(Debug, Error)]
pub enum ShpError {
    /// Erreur d'I/O lors de la lecture des fichiers
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// En-tête invalide (.shp ou .dbf)
    #[error("Invalid header in {file}: {reason}")]
    InvalidHeader { file: String, reason: String },

    /// Erreur de parsing d'un enregistrement
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// Type de géométrie non supporté (MultiPatch, code inconnu)
    #[error("Unsupported shape type: {0}")]
    UnsupportedShapeType(i32),

    /// Le .dbf contient moins d'enregistrements que le .shp
    #[error("Record mismatch: {shp} has more records than {dbf}")]
    RecordMismatch { shp: String, dbf: String },

    /// Archive zip corrompue ou illisible
    #[error("Invalid archive {path}: {reason}")]
    InvalidArchive { path: String, reason: String },
}

impl ShpError {
    /// Crée une erreur de parsing avec contexte
    pub fn parse_error(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur d'en-tête avec contexte
    pub fn invalid_header(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

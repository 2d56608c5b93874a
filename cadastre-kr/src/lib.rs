//! # cadastre-kr
//!
//! Conversion du cadastre coréen (archives shapefile `LSMD_CONT_LDREG_*.zip`)
//! en GeoJSON WGS84, une FeatureCollection par région.
//!
//! ## Features
//!
//! - Reprojection Korea 2000 (EPSG:5186 par défaut) → WGS84, en Rust pur ou via PROJ
//! - Réparation des attributs CP949/EUC-KR lus en Latin-1
//! - Isolation des régions: une région en échec n'interrompt pas le lot
//! - Rapport agrégé (SUCCESS / SKIPPED / FAILED par région)
//!
//! ## Usage CLI
//!
//! ```bash
//! # Convertir toutes les archives de data/zip vers data/json
//! cadastre-kr process
//! cadastre-kr --data-dir /srv/cadastre --jobs 4 process --report report.json
//!
//! # Compter les parcelles des régions déjà extraites
//! cadastre-kr count
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod export;
pub mod geometry;
pub mod pipeline;
pub mod report;
pub mod reproject;
pub mod reproject_lite;

pub use config::{Settings, SettingsOverrides};
pub use error::{DecodingError, ProjectionError, RegionError};
pub use geometry::{Coords, Geometry, GeometryKind};
pub use report::{BatchReport, BatchStatus, RegionOutcome};
pub use reproject::{Projector, Reprojector};
pub use reproject_lite::{CrsDefinition, ReprojectorLite};

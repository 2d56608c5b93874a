//! Projection des coordonnées source vers WGS84
//!
//! Deux backends:
//! - `ReprojectorLite` (défaut): Transverse Mercator en Rust pur
//! - PROJ via le crate `proj` (feature `proj`)

use crate::error::ProjectionError;
use crate::geometry::{Coords, Geometry};
use crate::reproject_lite::{CrsDefinition, ReprojectorLite};

/// Projette une paire [x, y] source en [lon, lat] WGS84
pub trait Projector {
    fn project_point(&self, xy: [f64; 2]) -> Result<[f64; 2], ProjectionError>;

    /// Projette récursivement des coordonnées imbriquées (structure et ordre conservés)
    fn project(&self, coords: &Coords) -> Result<Coords, ProjectionError> {
        match coords {
            Coords::Leaf(xy) => self.project_point(*xy).map(Coords::Leaf),
            Coords::Nested(items) => items
                .iter()
                .map(|item| self.project(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Coords::Nested),
        }
    }

    fn project_geometry(&self, geometry: &Geometry) -> Result<Geometry, ProjectionError> {
        Ok(Geometry {
            kind: geometry.kind,
            coordinates: self.project(&geometry.coordinates)?,
        })
    }
}

impl Projector for ReprojectorLite {
    fn project_point(&self, [x, y]: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
        let (lon, lat) = self.transform_point(x, y)?;
        Ok([lon, lat])
    }
}

/// Backend de reprojection sélectionné à la compilation
pub enum Reprojector {
    Lite(ReprojectorLite),
    #[cfg(feature = "proj")]
    Proj(ProjReprojector),
}

impl Reprojector {
    /// PROJ si la feature `proj` est active, sinon le backend Rust pur
    pub fn new(crs: CrsDefinition) -> anyhow::Result<Self> {
        #[cfg(feature = "proj")]
        {
            Ok(Self::Proj(ProjReprojector::new(&crs)?))
        }
        #[cfg(not(feature = "proj"))]
        {
            Ok(Self::Lite(ReprojectorLite::new(crs)))
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Lite(_) => "lite",
            #[cfg(feature = "proj")]
            Self::Proj(_) => "proj",
        }
    }
}

impl Projector for Reprojector {
    fn project_point(&self, xy: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
        match self {
            Self::Lite(lite) => lite.project_point(xy),
            #[cfg(feature = "proj")]
            Self::Proj(proj) => proj.project_point(xy),
        }
    }
}

/// Vérifie si le backend PROJ est disponible
pub fn is_proj_available() -> bool {
    cfg!(feature = "proj")
}

#[cfg(feature = "proj")]
pub use with_proj::ProjReprojector;

#[cfg(feature = "proj")]
mod with_proj {
    use anyhow::{Context, Result};
    use proj::Proj;

    use super::Projector;
    use crate::error::ProjectionError;
    use crate::reproject_lite::CrsDefinition;

    /// Reprojection via la bibliothèque PROJ
    pub struct ProjReprojector {
        proj: Proj,
    }

    impl ProjReprojector {
        pub fn new(crs: &CrsDefinition) -> Result<Self> {
            let source = format!("{} +type=crs", crs.to_proj_string());
            let proj = Proj::new_known_crs(&source, "EPSG:4326", None).context(format!(
                "Failed to create projection from EPSG:{} to EPSG:4326",
                crs.epsg
            ))?;
            Ok(Self { proj })
        }
    }

    impl Projector for ProjReprojector {
        fn project_point(&self, [x, y]: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
            if !x.is_finite() || !y.is_finite() {
                return Err(ProjectionError::NonFinite { x, y });
            }
            let (lon, lat) = self
                .proj
                .convert((x, y))
                .map_err(|e| ProjectionError::Proj(e.to_string()))?;
            if !lon.is_finite() || !lat.is_finite() {
                return Err(ProjectionError::Proj(format!(
                    "({}, {}) has no finite image",
                    x, y
                )));
            }
            Ok([lon, lat])
        }
    }

}

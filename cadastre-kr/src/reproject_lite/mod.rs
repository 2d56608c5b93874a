//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Supporte les projections Transverse Mercator du cadastre coréen (Korea 2000, GRS80) :
//! - EPSG:5185 à 5188 - bandes Ouest, Centre, Est, Est-mer (y0 = 600 000 m)
//! - EPSG:5180 à 5184 - anciennes bandes (y0 = 500 000 m, Jeju 550 000 m)
//! - EPSG:5179 - UTM-K
//!
//! Cible: WGS84 géographique (EPSG:4326), en degrés.

mod crs;
mod ellipsoid;
mod tmerc;

pub use crs::{CrsDefinition, KOREA_2000_CENTRAL_BELT_2010};
pub use ellipsoid::{Ellipsoid, GRS80, WGS84};
pub use tmerc::TransverseMercator;

use anyhow::{bail, Result};

use crate::error::ProjectionError;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Reprojection légère Korea 2000 → WGS84
///
/// GRS80 et WGS84 sont considérés identiques (écart < 0.1 mm), aucune
/// transformation de datum n'est appliquée.
#[derive(Debug, Clone)]
pub struct ReprojectorLite {
    crs: CrsDefinition,
    tm: TransverseMercator,
}

impl ReprojectorLite {
    pub fn new(crs: CrsDefinition) -> Self {
        Self {
            tm: TransverseMercator::new(&crs),
            crs,
        }
    }

    /// Crée un reprojector depuis un EPSG coréen
    pub fn from_epsg(source_epsg: u32) -> Result<Self> {
        match CrsDefinition::from_epsg(source_epsg) {
            Some(crs) => Ok(Self::new(crs)),
            None => {
                let supported: Vec<String> =
                    CrsDefinition::supported_epsg().map(|e| e.to_string()).collect();
                bail!(
                    "EPSG:{} not supported. Supported sources: {}",
                    source_epsg,
                    supported.join(", ")
                )
            }
        }
    }

    pub fn crs(&self) -> &CrsDefinition {
        &self.crs
    }

    /// Transforme un point (x, y) projeté en (lon, lat) degrés
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        Ok(self.tm.inverse(x, y)?.to_degrees())
    }
}

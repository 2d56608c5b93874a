//! Définition immuable d'un système de coordonnées Transverse Mercator

use shp::TmParameters;

use super::ellipsoid::{Ellipsoid, GRS80};

/// Transverse Mercator: paramètres complets pour projeter/déprojeter
///
/// Construit une fois au démarrage puis passé explicitement au reprojecteur.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrsDefinition {
    pub epsg: u32,
    pub ellipsoid: Ellipsoid,
    /// Latitude d'origine (degrés)
    pub lat_0: f64,
    /// Méridien central (degrés)
    pub lon_0: f64,
    /// Facteur d'échelle
    pub k_0: f64,
    /// False easting (m)
    pub x_0: f64,
    /// False northing (m)
    pub y_0: f64,
}

/// Korea 2000 / Central Belt 2010, projection du cadastre (LSMD_CONT_LDREG)
pub const KOREA_2000_CENTRAL_BELT_2010: CrsDefinition = korea_2000(5186, 38.0, 127.0, 1.0, 200_000.0, 600_000.0);

const fn korea_2000(epsg: u32, lat_0: f64, lon_0: f64, k_0: f64, x_0: f64, y_0: f64) -> CrsDefinition {
    CrsDefinition {
        epsg,
        ellipsoid: GRS80,
        lat_0,
        lon_0,
        k_0,
        x_0,
        y_0,
    }
}

/// Projections coréennes connues (toutes sur GRS80)
const KNOWN: &[CrsDefinition] = &[
    korea_2000(5179, 38.0, 127.5, 0.9996, 1_000_000.0, 2_000_000.0), // UTM-K
    korea_2000(5180, 38.0, 125.0, 1.0, 200_000.0, 500_000.0),
    korea_2000(5181, 38.0, 127.0, 1.0, 200_000.0, 500_000.0),
    korea_2000(5182, 38.0, 127.0, 1.0, 200_000.0, 550_000.0), // Jeju
    korea_2000(5183, 38.0, 129.0, 1.0, 200_000.0, 500_000.0),
    korea_2000(5184, 38.0, 131.0, 1.0, 200_000.0, 500_000.0),
    korea_2000(5185, 38.0, 125.0, 1.0, 200_000.0, 600_000.0),
    KOREA_2000_CENTRAL_BELT_2010,
    korea_2000(5187, 38.0, 129.0, 1.0, 200_000.0, 600_000.0),
    korea_2000(5188, 38.0, 131.0, 1.0, 200_000.0, 600_000.0),
];

impl CrsDefinition {
    /// Définition d'un EPSG coréen connu
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        KNOWN.iter().find(|crs| crs.epsg == epsg).copied()
    }

    /// Liste des EPSG supportés
    pub fn supported_epsg() -> impl Iterator<Item = u32> {
        KNOWN.iter().map(|crs| crs.epsg)
    }

    /// Chaîne PROJ équivalente (`+proj=tmerc ...`)
    pub fn to_proj_string(&self) -> String {
        let ellps = match self.ellipsoid.proj_name() {
            Some(name) => format!("+ellps={}", name),
            None => format!("+a={} +rf={}", self.ellipsoid.a, 1.0 / self.ellipsoid.f),
        };
        format!(
            "+proj=tmerc +lat_0={} +lon_0={} +k={} +x_0={} +y_0={} {} +units=m +no_defs",
            self.lat_0, self.lon_0, self.k_0, self.x_0, self.y_0, ellps
        )
    }

    /// Vrai si les paramètres lus dans un .prj décrivent cette projection
    pub fn matches(&self, params: &TmParameters) -> bool {
        const ANGLE_TOL: f64 = 1e-9;
        const METRE_TOL: f64 = 1e-3;

        (params.latitude_of_origin - self.lat_0).abs() < ANGLE_TOL
            && (params.central_meridian - self.lon_0).abs() < ANGLE_TOL
            && (params.scale_factor - self.k_0).abs() < ANGLE_TOL
            && (params.false_easting - self.x_0).abs() < METRE_TOL
            && (params.false_northing - self.y_0).abs() < METRE_TOL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_epsg() {
        assert_eq!(CrsDefinition::from_epsg(5186), Some(KOREA_2000_CENTRAL_BELT_2010));
        let utmk = CrsDefinition::from_epsg(5179).unwrap();
        assert_eq!(utmk.k_0, 0.9996);
        assert!(CrsDefinition::from_epsg(2154).is_none());
    }

    #[test]
    fn test_epsg_unique() {
        let mut codes: Vec<u32> = CrsDefinition::supported_epsg().collect();
        let len = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), len);
    }

    #[test]
    fn test_proj_string() {
        assert_eq!(
            KOREA_2000_CENTRAL_BELT_2010.to_proj_string(),
            "+proj=tmerc +lat_0=38 +lon_0=127 +k=1 +x_0=200000 +y_0=600000 +ellps=GRS80 +units=m +no_defs"
        );
    }

    #[test]
    fn test_matches_prj_parameters() {
        let params = TmParameters {
            latitude_of_origin: 38.0,
            central_meridian: 127.0,
            scale_factor: 1.0,
            false_easting: 200000.0,
            false_northing: 600000.0,
        };
        assert!(KOREA_2000_CENTRAL_BELT_2010.matches(&params));

        let central_500k = TmParameters {
            false_northing: 500000.0,
            ..params
        };
        assert!(!KOREA_2000_CENTRAL_BELT_2010.matches(&central_500k));
        assert!(CrsDefinition::from_epsg(5181).unwrap().matches(&central_500k));
    }
}

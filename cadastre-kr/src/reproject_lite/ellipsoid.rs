//! Définitions des ellipsoïdes

/// Ellipsoïde de révolution (demi-grand axe + aplatissement)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Demi-grand axe en mètres
    pub a: f64,
    /// Aplatissement
    pub f: f64,
}

/// Ellipsoïde GRS80 (Korea 2000)
pub const GRS80: Ellipsoid = Ellipsoid {
    a: 6378137.0,
    f: 1.0 / 298.257222101,
};

/// Ellipsoïde WGS84
/// Note: Quasi identique à GRS80, différence < 0.1mm
pub const WGS84: Ellipsoid = Ellipsoid {
    a: 6378137.0,
    f: 1.0 / 298.257223563,
};

impl Ellipsoid {
    /// Première excentricité au carré
    pub fn e2(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// Première excentricité
    pub fn e(&self) -> f64 {
        self.e2().sqrt()
    }

    /// Troisième aplatissement n = f / (2 - f)
    pub fn n(&self) -> f64 {
        self.f / (2.0 - self.f)
    }

    /// Nom PROJ (`+ellps=`) quand il existe
    pub fn proj_name(&self) -> Option<&'static str> {
        if *self == GRS80 {
            Some("GRS80")
        } else if *self == WGS84 {
            Some("WGS84")
        } else {
            None
        }
    }
}

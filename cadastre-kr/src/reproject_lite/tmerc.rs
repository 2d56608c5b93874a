//! Transverse Mercator ellipsoïdal (séries de Krüger à l'ordre 6)
//!
//! Formulation de Karney (2011), identique à `+proj=tmerc` de PROJ :
//! précision sub-millimétrique à plusieurs milliers de km du méridien central.

use std::f64::consts::FRAC_PI_2;

use super::crs::CrsDefinition;
use super::Geographic;
use crate::error::ProjectionError;

/// Limite |η| au-delà de laquelle l'inverse n'est plus défini (même borne que PROJ)
const ETA_MAX: f64 = 2.623395162778;

/// Nombre max d'itérations de Newton pour τ
const MAX_ITERATIONS: usize = 10;

/// Projection Transverse Mercator préparée (coefficients précalculés)
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    epsg: u32,
    lon_0: f64,
    x_0: f64,
    y_0: f64,
    /// k0 × rayon rectifiant
    scale: f64,
    e: f64,
    e2m: f64,
    /// ξ de la latitude d'origine
    xi_0: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
}

impl TransverseMercator {
    pub fn new(crs: &CrsDefinition) -> Self {
        let n = crs.ellipsoid.n();
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        // Rayon rectifiant
        let a = crs.ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);

        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0
                + 7891.0 * n6 / 37800.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0
                - 1983433.0 * n6 / 1935360.0,
            61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0
                + 167603.0 * n6 / 181440.0,
            49561.0 * n4 / 161280.0 - 179.0 * n5 / 168.0 + 6601661.0 * n6 / 7257600.0,
            34729.0 * n5 / 80640.0 - 3418889.0 * n6 / 1995840.0,
            212378941.0 * n6 / 319334400.0,
        ];
        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0 - 81.0 * n5 / 512.0
                + 96199.0 * n6 / 604800.0,
            n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0 + 46.0 * n5 / 105.0
                - 1118711.0 * n6 / 3870720.0,
            17.0 * n3 / 480.0 - 37.0 * n4 / 840.0 - 209.0 * n5 / 4480.0 + 5569.0 * n6 / 90720.0,
            4397.0 * n4 / 161280.0 - 11.0 * n5 / 504.0 - 830251.0 * n6 / 7257600.0,
            4583.0 * n5 / 161280.0 - 108847.0 * n6 / 3991680.0,
            20648693.0 * n6 / 638668800.0,
        ];

        let e = crs.ellipsoid.e();
        let xi_0_prime = conformal_tau(crs.lat_0.to_radians().tan(), e).atan();
        let xi_0 = xi_0_prime
            + alpha
                .iter()
                .enumerate()
                .map(|(j, a)| a * (2.0 * (j + 1) as f64 * xi_0_prime).sin())
                .sum::<f64>();

        Self {
            epsg: crs.epsg,
            lon_0: crs.lon_0.to_radians(),
            x_0: crs.x_0,
            y_0: crs.y_0,
            scale: crs.k_0 * a,
            e,
            e2m: 1.0 - e * e,
            xi_0,
            alpha,
            beta,
        }
    }

    /// Coordonnées projetées (m) → géographiques
    pub fn inverse(&self, x: f64, y: f64) -> Result<Geographic, ProjectionError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::NonFinite { x, y });
        }

        let eta = (x - self.x_0) / self.scale;
        let xi = (y - self.y_0) / self.scale + self.xi_0;
        if eta.abs() > ETA_MAX {
            return Err(self.out_of_domain(x, y));
        }

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_p -= b * (k * xi).sin() * (k * eta).cosh();
            eta_p -= b * (k * xi).cos() * (k * eta).sinh();
        }
        if xi_p.abs() > FRAC_PI_2 {
            return Err(self.out_of_domain(x, y));
        }

        let tau_p = xi_p.sin() / eta_p.sinh().hypot(xi_p.cos());
        let tau = self.tau_from_conformal(tau_p);

        let lat = tau.atan();
        let lon = self.lon_0 + eta_p.sinh().atan2(xi_p.cos());
        Ok(Geographic::new(lon, lat))
    }

    /// Géographiques → coordonnées projetées (m)
    #[cfg(test)]
    pub fn forward(&self, geo: Geographic) -> (f64, f64) {
        let lam = geo.lon - self.lon_0;
        let tau_p = conformal_tau(geo.lat.tan(), self.e);
        let xi_p = tau_p.atan2(lam.cos());
        let eta_p = (lam.sin() / tau_p.hypot(lam.cos())).asinh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += a * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += a * (k * xi_p).cos() * (k * eta_p).sinh();
        }
        (
            self.x_0 + self.scale * eta,
            self.y_0 + self.scale * (xi - self.xi_0),
        )
    }

    /// Résout conformal_tau(τ) = τ' par Newton
    fn tau_from_conformal(&self, tau_p: f64) -> f64 {
        let mut tau = tau_p / self.e2m;
        let tol = f64::EPSILON.sqrt() / 10.0 * tau.abs().max(1.0);
        for _ in 0..MAX_ITERATIONS {
            let tau_i = conformal_tau(tau, self.e);
            let d_tau = (tau_p - tau_i) / tau_i.hypot(1.0) * (1.0 + self.e2m * tau * tau)
                / (self.e2m * tau.hypot(1.0));
            tau += d_tau;
            if d_tau.abs() < tol {
                break;
            }
        }
        tau
    }

    fn out_of_domain(&self, x: f64, y: f64) -> ProjectionError {
        ProjectionError::OutOfDomain {
            x,
            y,
            epsg: self.epsg,
        }
    }
}

/// tan de la latitude conforme à partir de τ = tan(φ)
fn conformal_tau(tau: f64, e: f64) -> f64 {
    let tau1 = tau.hypot(1.0);
    let sig = (e * (e * tau / tau1).atanh()).sinh();
    tau * sig.hypot(1.0) - sig * tau1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reproject_lite::crs::KOREA_2000_CENTRAL_BELT_2010;

    fn central_belt() -> TransverseMercator {
        TransverseMercator::new(&KOREA_2000_CENTRAL_BELT_2010)
    }

    #[test]
    fn test_origin() {
        let (lon, lat) = central_belt().inverse(200000.0, 600000.0).unwrap().to_degrees();
        assert!((lon - 127.0).abs() < 1e-9, "lon={}", lon);
        assert!((lat - 38.0).abs() < 1e-9, "lat={}", lat);
    }

    #[test]
    fn test_reference_points() {
        // Valeurs de référence (série de Snyder indépendante, écart < 1e-9°)
        let cases = [
            (198049.0, 551881.0, 126.97791662657272, 37.56646366899366),
            (250000.0, 450000.0, 127.55914834117705, 36.647138399433736),
            (150000.0, 700000.0, 126.4236258404468, 38.89943753883837),
        ];
        let tm = central_belt();
        for (x, y, ref_lon, ref_lat) in cases {
            let (lon, lat) = tm.inverse(x, y).unwrap().to_degrees();
            assert!((lon - ref_lon).abs() < 1e-8, "({}, {}) lon={}", x, y, lon);
            assert!((lat - ref_lat).abs() < 1e-8, "({}, {}) lat={}", x, y, lat);
        }
    }

    #[test]
    fn test_round_trip() {
        let tm = central_belt();
        // Séoul, Busan, Jeju
        for (lon, lat) in [(126.9779, 37.5663), (129.0756, 35.1796), (126.5312, 33.4996)] {
            let (x, y) = tm.forward(Geographic::from_degrees(lon, lat));
            let (lon2, lat2) = tm.inverse(x, y).unwrap().to_degrees();
            assert!((lon - lon2).abs() < 1e-10, "lon={} -> {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-10, "lat={} -> {}", lat, lat2);
        }
    }

    #[test]
    fn test_seoul_forward() {
        let (x, y) = central_belt().forward(Geographic::from_degrees(126.9779, 37.5663));
        assert!((x - 198047.527).abs() < 0.01, "x={}", x);
        assert!((y - 551862.835).abs() < 0.01, "y={}", y);
    }

    #[test]
    fn test_non_finite() {
        let tm = central_belt();
        assert!(matches!(
            tm.inverse(f64::NAN, 600000.0),
            Err(ProjectionError::NonFinite { .. })
        ));
        assert!(matches!(
            tm.inverse(200000.0, f64::INFINITY),
            Err(ProjectionError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_out_of_domain() {
        let tm = central_belt();
        assert!(matches!(
            tm.inverse(1e9, 600000.0),
            Err(ProjectionError::OutOfDomain { epsg: 5186, .. })
        ));
        assert!(matches!(
            tm.inverse(200000.0, 1e8),
            Err(ProjectionError::OutOfDomain { .. })
        ));
    }
}

//! Modèle de géométrie GeoJSON à coordonnées imbriquées

use geo::{Coord, LineString, Polygon};

/// Coordonnées imbriquées: une paire [x, y] ou une séquence de coordonnées
///
/// Profondeur 0 pour un Point, jusqu'à 3 pour un MultiPolygon.
#[derive(Debug, Clone, PartialEq)]
pub enum Coords {
    Leaf([f64; 2]),
    Nested(Vec<Coords>),
}

impl Coords {
    /// Nombre de paires [x, y]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Nested(items) => items.iter().map(Coords::leaf_count).sum(),
        }
    }

    /// Paires [x, y] dans l'ordre de parcours
    pub fn leaves(&self) -> Vec<[f64; 2]> {
        let mut out = Vec::with_capacity(self.leaf_count());
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<[f64; 2]>) {
        match self {
            Self::Leaf(xy) => out.push(*xy),
            Self::Nested(items) => items.iter().for_each(|item| item.collect_leaves(out)),
        }
    }
}

impl From<Coord> for Coords {
    fn from(c: Coord) -> Self {
        Self::Leaf([c.x, c.y])
    }
}

impl From<&LineString> for Coords {
    fn from(ls: &LineString) -> Self {
        Self::Nested(ls.0.iter().copied().map(Coords::from).collect())
    }
}

impl From<&Polygon> for Coords {
    fn from(p: &Polygon) -> Self {
        let rings = std::iter::once(p.exterior())
            .chain(p.interiors())
            .map(Coords::from)
            .collect();
        Self::Nested(rings)
    }
}

/// Type de géométrie GeoJSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

/// Géométrie: type + coordonnées imbriquées
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub coordinates: Coords,
}

impl Geometry {
    /// Convertit une géométrie `geo` (types non représentables: `None`)
    pub fn from_geo(geom: &geo::Geometry) -> Option<Self> {
        let (kind, coordinates) = match geom {
            geo::Geometry::Point(p) => (GeometryKind::Point, Coords::from(p.0)),
            geo::Geometry::MultiPoint(mp) => (
                GeometryKind::MultiPoint,
                Coords::Nested(mp.0.iter().map(|p| Coords::from(p.0)).collect()),
            ),
            geo::Geometry::LineString(ls) => (GeometryKind::LineString, Coords::from(ls)),
            geo::Geometry::MultiLineString(mls) => (
                GeometryKind::MultiLineString,
                Coords::Nested(mls.0.iter().map(Coords::from).collect()),
            ),
            geo::Geometry::Polygon(p) => (GeometryKind::Polygon, Coords::from(p)),
            geo::Geometry::MultiPolygon(mp) => (
                GeometryKind::MultiPolygon,
                Coords::Nested(mp.0.iter().map(Coords::from).collect()),
            ),
            _ => return None,
        };
        Some(Self { kind, coordinates })
    }
}

impl From<&Geometry> for geojson::Geometry {
    fn from(geometry: &Geometry) -> Self {
        fn position(xy: [f64; 2]) -> Vec<f64> {
            xy.to_vec()
        }
        fn line(c: &Coords) -> Vec<Vec<f64>> {
            c.leaves().into_iter().map(position).collect()
        }
        fn nested(c: &Coords) -> &[Coords] {
            match c {
                Coords::Nested(items) => items,
                Coords::Leaf(_) => std::slice::from_ref(c),
            }
        }
        fn polygon(c: &Coords) -> Vec<Vec<Vec<f64>>> {
            nested(c).iter().map(line).collect()
        }

        let c = &geometry.coordinates;
        let value = match geometry.kind {
            GeometryKind::Point => {
                geojson::Value::Point(c.leaves().first().copied().map(position).unwrap_or_default())
            }
            GeometryKind::MultiPoint => geojson::Value::MultiPoint(line(c)),
            GeometryKind::LineString => geojson::Value::LineString(line(c)),
            GeometryKind::MultiLineString => {
                geojson::Value::MultiLineString(nested(c).iter().map(line).collect())
            }
            GeometryKind::Polygon => geojson::Value::Polygon(polygon(c)),
            GeometryKind::MultiPolygon => {
                geojson::Value::MultiPolygon(nested(c).iter().map(polygon).collect())
            }
        };
        geojson::Geometry::new(value)
    }
}

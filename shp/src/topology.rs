//! Organisation des rings d'un shape Polygon (extérieurs, trous, multipolygones)

use geo::{Contains, LineString, Polygon, Winding};

/// Organise les rings en polygones avec trous
///
/// Convention ESRI: un ring horaire est un extérieur, un ring anti-horaire
/// est un trou. Chaque trou est rattaché au premier extérieur qui le contient;
/// un trou orphelin devient un polygone à part entière.
pub fn organize_rings(rings: Vec<LineString>) -> Vec<Polygon> {
    let mut exteriors: Vec<(LineString, Vec<LineString>)> = Vec::new();
    let mut holes: Vec<LineString> = Vec::new();

    for ring in rings {
        if ring.is_cw() {
            exteriors.push((ring, Vec::new()));
        } else {
            holes.push(ring);
        }
    }

    for hole in holes {
        let owner = exteriors
            .iter_mut()
            .find(|(exterior, _)| ring_contains_some(exterior, &hole));

        match owner {
            Some((_, interiors)) => interiors.push(hole),
            None => exteriors.push((hole, Vec::new())),
        }
    }

    exteriors
        .into_iter()
        .map(|(exterior, interiors)| Polygon::new(exterior, interiors))
        .collect()
}

/// Vrai si au moins un sommet de `ring` est strictement dans `exterior`
fn ring_contains_some(exterior: &LineString, ring: &LineString) -> bool {
    let outer = Polygon::new(exterior.clone(), vec![]);
    ring.points().any(|p| outer.contains(&p))
}

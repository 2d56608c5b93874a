//! Parser pour les fichiers .prj (WKT ESRI / OGC)

use memchr::memmem;

use crate::types::{PrjInfo, TmParameters};

/// Fragments de noms PROJCS (normalisés) vers EPSG, testés dans l'ordre
const PROJECTIONS: &[(&str, u32)] = &[
    ("westbelt2010", 5185),
    ("centralbelt2010", 5186),
    ("eastseabelt2010", 5188),
    ("eastbelt2010", 5187),
    ("unifiedcoordinatesystem", 5179),
    ("westbelt", 5180),
    ("centralbelt", 5181),
    ("jejubelt", 5182),
    ("eastseabelt", 5184),
    ("eastbelt", 5183),
];

/// Parse le contenu d'un .prj
///
/// Ne retourne jamais d'erreur: un WKT illisible donne un `PrjInfo` vide.
pub fn parse(data: &[u8]) -> PrjInfo {
    let content = match simdutf8::basic::from_utf8(data) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(data).into_owned(),
    };
    let lower = content.to_ascii_lowercase();

    let name = quoted_after(&content, &lower, "projcs[");
    let epsg = authority_code(&lower).or_else(|| name.as_deref().and_then(epsg_from_name));
    let transverse_mercator = memmem::find(lower.as_bytes(), b"transverse_mercator")
        .map(|_| tm_parameters(&lower));

    PrjInfo {
        name,
        epsg,
        transverse_mercator,
    }
}

/// Chaîne entre guillemets qui suit `key` (recherche insensible à la casse)
fn quoted_after(content: &str, lower: &str, key: &str) -> Option<String> {
    let pos = memmem::find(lower.as_bytes(), key.as_bytes())? + key.len();
    let rest = &content[pos..];
    let start = rest.find('"')? + 1;
    let end = start + rest[start..].find('"')?;
    Some(rest[start..end].to_string())
}

/// Dernier AUTHORITY["EPSG","xxxx"] du WKT (celui du PROJCS)
fn authority_code(lower: &str) -> Option<u32> {
    let pos = memmem::rfind(lower.as_bytes(), b"authority[\"epsg\"")?;
    let rest = &lower[pos + "authority[\"epsg\"".len()..];
    let start = rest.find(|c: char| c.is_ascii_digit())?;
    let end = rest[start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(rest.len(), |e| start + e);
    rest[start..end].parse().ok()
}

/// Déduit l'EPSG depuis le nom PROJCS (ex: "Korea_2000_Korea_Central_Belt_2010")
fn epsg_from_name(name: &str) -> Option<u32> {
    let normalized: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if !normalized.contains("korea") {
        return None;
    }

    PROJECTIONS
        .iter()
        .find(|(fragment, _)| normalized.contains(fragment))
        .map(|&(_, epsg)| epsg)
}

fn tm_parameters(lower: &str) -> TmParameters {
    TmParameters {
        latitude_of_origin: parameter(lower, "latitude_of_origin").unwrap_or(0.0),
        central_meridian: parameter(lower, "central_meridian").unwrap_or(0.0),
        scale_factor: parameter(lower, "scale_factor").unwrap_or(1.0),
        false_easting: parameter(lower, "false_easting").unwrap_or(0.0),
        false_northing: parameter(lower, "false_northing").unwrap_or(0.0),
    }
}

/// Valeur numérique de PARAMETER["name",value]
fn parameter(lower: &str, name: &str) -> Option<f64> {
    let key = format!("parameter[\"{}\"", name);
    let pos = memmem::find(lower.as_bytes(), key.as_bytes())? + key.len();
    let rest = lower[pos..].trim_start_matches([',', ' ']);
    let end = rest.find([']', ','])?;
    fast_float::parse(rest[..end].trim()).ok()
}

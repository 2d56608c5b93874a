//! Écriture de shapefiles minimaux pour les tests
//!
//! Compilé pour les tests du crate et avec la feature `fixtures`
//! (activée par les dev-dependencies du workspace).

use std::io;
use std::path::{Path, PathBuf};

/// WKT ESRI de Korea 2000 / Central Belt 2010 (EPSG:5186)
pub const PRJ_5186: &str = r#"PROJCS["Korea_2000_Korea_Central_Belt_2010",GEOGCS["GCS_Korea_2000",DATUM["D_Korea_2000",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",200000.0],PARAMETER["False_Northing",600000.0],PARAMETER["Central_Meridian",127.0],PARAMETER["Scale_Factor",1.0],PARAMETER["Latitude_Of_Origin",38.0],UNIT["Meter",1.0]]"#;

/// Shape à écrire
#[derive(Debug, Clone)]
pub enum Shape {
    Null,
    Point(f64, f64),
    PolyLine(Vec<Vec<(f64, f64)>>),
    Polygon(Vec<Vec<(f64, f64)>>),
}

impl Shape {
    /// Contenu de l'enregistrement (sans l'en-tête big-endian)
    pub fn content(&self) -> Vec<u8> {
        match self {
            Self::Null => 0i32.to_le_bytes().to_vec(),
            Self::Point(x, y) => point_content(*x, *y),
            Self::PolyLine(parts) | Self::Polygon(parts) => {
                let code = if matches!(self, Self::PolyLine(_)) { 3 } else { 5 };
                let mut starts = Vec::with_capacity(parts.len());
                let mut start = 0i32;
                for part in parts {
                    starts.push(start);
                    start += part.len() as i32;
                }
                let points: Vec<(f64, f64)> = parts.iter().flatten().copied().collect();
                poly_content(code, &starts, &points)
            }
        }
    }
}

/// Contenu d'un enregistrement Point
pub fn point_content(x: f64, y: f64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(20);
    buf.extend_from_slice(&1i32.to_le_bytes());
    buf.extend_from_slice(&x.to_le_bytes());
    buf.extend_from_slice(&y.to_le_bytes());
    buf
}

/// Contenu brut d'un enregistrement PolyLine/Polygon; les index de parties
/// ne sont pas vérifiés
pub fn poly_content(code: i32, parts: &[i32], points: &[(f64, f64)]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&code.to_le_bytes());
    buf.extend_from_slice(&[0u8; 32]);
    buf.extend_from_slice(&(parts.len() as i32).to_le_bytes());
    buf.extend_from_slice(&(points.len() as i32).to_le_bytes());
    for p in parts {
        buf.extend_from_slice(&p.to_le_bytes());
    }
    for (x, y) in points {
        buf.extend_from_slice(&x.to_le_bytes());
        buf.extend_from_slice(&y.to_le_bytes());
    }
    buf
}

/// Contenu d'un .shp
pub fn shp_bytes(shape_type: i32, shapes: &[Shape]) -> Vec<u8> {
    let mut records = Vec::new();
    for (i, shape) in shapes.iter().enumerate() {
        let content = shape.content();
        records.extend_from_slice(&(i as i32 + 1).to_be_bytes());
        records.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
        records.extend_from_slice(&content);
    }

    let mut buf = Vec::with_capacity(100 + records.len());
    buf.extend_from_slice(&9994i32.to_be_bytes());
    buf.extend_from_slice(&[0u8; 20]);
    buf.extend_from_slice(&(((100 + records.len()) / 2) as i32).to_be_bytes());
    buf.extend_from_slice(&1000i32.to_le_bytes());
    buf.extend_from_slice(&shape_type.to_le_bytes());
    buf.extend_from_slice(&[0u8; 64]);
    buf.extend_from_slice(&records);
    buf
}

/// Champ du .dbf: (nom, type dBASE, longueur)
pub type Field<'a> = (&'a str, u8, usize);

/// Contenu d'un .dbf; chaque cellule est écrite brute puis complétée d'espaces
pub fn dbf_bytes(fields: &[Field], records: &[Vec<Vec<u8>>]) -> Vec<u8> {
    let header_length = 32 + fields.len() * 32 + 1;
    let record_length = 1 + fields.iter().map(|f| f.2).sum::<usize>();

    let mut buf = vec![0x03, 124, 1, 1];
    buf.extend_from_slice(&(records.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(header_length as u16).to_le_bytes());
    buf.extend_from_slice(&(record_length as u16).to_le_bytes());
    buf.extend_from_slice(&[0u8; 20]);

    for (name, kind, length) in fields {
        let mut desc = [0u8; 32];
        let n = name.len().min(11);
        desc[..n].copy_from_slice(&name.as_bytes()[..n]);
        desc[11] = *kind;
        desc[16] = *length as u8;
        buf.extend_from_slice(&desc);
    }
    buf.push(0x0D);

    for record in records {
        buf.push(b' ');
        for ((_, _, length), value) in fields.iter().zip(record) {
            let mut cell = vec![b' '; *length];
            let n = value.len().min(*length);
            cell[..n].copy_from_slice(&value[..n]);
            buf.extend_from_slice(&cell);
        }
    }
    buf.push(0x1A);
    buf
}

/// Écrit `<dir>/<name>.shp`, `.dbf` (si des champs sont fournis) et `.prj`
pub fn write_shapefile(
    dir: &Path,
    name: &str,
    shape_type: i32,
    shapes: &[Shape],
    fields: &[Field],
    records: &[Vec<Vec<u8>>],
) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let shp_path = dir.join(format!("{}.shp", name));
    std::fs::write(&shp_path, shp_bytes(shape_type, shapes))?;
    if !fields.is_empty() {
        std::fs::write(dir.join(format!("{}.dbf", name)), dbf_bytes(fields, records))?;
    }
    std::fs::write(dir.join(format!("{}.prj", name)), PRJ_5186)?;
    Ok(shp_path)
}

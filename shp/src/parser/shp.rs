//! Parser pour le fichier principal .shp (géométries)
//!
//! En-tête de 100 octets puis enregistrements: en-tête big-endian
//! (numéro, longueur en mots de 16 bits), contenu little-endian.

use std::io::{self, Read};

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, Point};

use crate::topology::organize_rings;
use crate::ShpError;

/// Code magique en tête de tout fichier .shp
pub const FILE_CODE: i32 = 9994;

/// Version du format
pub const VERSION: i32 = 1000;

/// Taille de l'en-tête principal
pub const HEADER_LEN: usize = 100;

/// Types de shapes ESRI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl ShapeType {
    /// Décode le code numérique du format
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Null,
            1 => Self::Point,
            3 => Self::PolyLine,
            5 => Self::Polygon,
            8 => Self::MultiPoint,
            11 => Self::PointZ,
            13 => Self::PolyLineZ,
            15 => Self::PolygonZ,
            18 => Self::MultiPointZ,
            21 => Self::PointM,
            23 => Self::PolyLineM,
            25 => Self::PolygonM,
            28 => Self::MultiPointM,
            31 => Self::MultiPatch,
            _ => return None,
        })
    }

    /// Type 2D équivalent (les ordonnées Z/M sont ignorées)
    pub fn planar(self) -> Self {
        match self {
            Self::PointZ | Self::PointM => Self::Point,
            Self::PolyLineZ | Self::PolyLineM => Self::PolyLine,
            Self::PolygonZ | Self::PolygonM => Self::Polygon,
            Self::MultiPointZ | Self::MultiPointM => Self::MultiPoint,
            other => other,
        }
    }
}

/// En-tête du fichier .shp
#[derive(Debug, Clone, Copy)]
pub struct ShpHeader {
    /// Longueur totale du fichier en octets
    pub file_length: usize,
}

/// Parse l'en-tête de 100 octets
pub fn parse_header(buf: &[u8; HEADER_LEN], file: &str) -> Result<ShpHeader, ShpError> {
    let file_code = i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if file_code != FILE_CODE {
        return Err(ShpError::invalid_header(
            file,
            format!("bad file code {} (expected {})", file_code, FILE_CODE),
        ));
    }

    let version = i32::from_le_bytes([buf[28], buf[29], buf[30], buf[31]]);
    if version != VERSION {
        return Err(ShpError::invalid_header(
            file,
            format!("unsupported version {}", version),
        ));
    }

    let words = i32::from_be_bytes([buf[24], buf[25], buf[26], buf[27]]);
    if words < (HEADER_LEN / 2) as i32 {
        return Err(ShpError::invalid_header(
            file,
            format!("invalid file length {}", words),
        ));
    }

    let code = i32::from_le_bytes([buf[32], buf[33], buf[34], buf[35]]);
    // Chaque enregistrement porte son propre type; seul le code déclaré est validé
    ShapeType::from_code(code).ok_or(ShpError::UnsupportedShapeType(code))?;

    Ok(ShpHeader {
        file_length: words as usize * 2,
    })
}

/// Lecteur séquentiel des géométries d'un .shp
pub struct ShapeReader<R> {
    reader: R,
    header: ShpHeader,
    file: String,
    offset: usize,
    done: bool,
}

impl<R: Read> ShapeReader<R> {
    /// Lit l'en-tête et prépare la lecture des enregistrements
    pub fn new(mut reader: R, file: impl Into<String>) -> Result<Self, ShpError> {
        let file = file.into();
        let mut buf = [0u8; HEADER_LEN];
        reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => ShpError::invalid_header(&file, "file too short"),
            _ => ShpError::Io(e),
        })?;
        let header = parse_header(&buf, &file)?;

        Ok(Self {
            reader,
            header,
            file,
            offset: HEADER_LEN,
            done: false,
        })
    }

    /// Lit l'enregistrement suivant (`None` en fin de fichier)
    fn read_record(&mut self) -> Result<Option<Option<Geometry>>, ShpError> {
        if self.offset >= self.header.file_length {
            return Ok(None);
        }

        let mut record_header = [0u8; 8];
        if !fill_or_eof(&mut self.reader, &mut record_header)? {
            return Ok(None);
        }

        let words = i32::from_be_bytes([
            record_header[4],
            record_header[5],
            record_header[6],
            record_header[7],
        ]);
        if words < 2 {
            return Err(ShpError::parse_error(
                &self.file,
                format!("invalid record length {}", words),
            ));
        }

        // Borne la taille annoncée par ce qui reste selon l'en-tête
        let length = words as usize * 2;
        let remaining = self.header.file_length - self.offset;
        if 8 + length > remaining {
            return Err(ShpError::parse_error(
                &self.file,
                format!(
                    "record length {} exceeds remaining file length {}",
                    length,
                    remaining.saturating_sub(8)
                ),
            ));
        }

        let mut content = vec![0u8; length];
        self.reader.read_exact(&mut content).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => ShpError::parse_error(&self.file, "truncated record"),
            _ => ShpError::Io(e),
        })?;
        self.offset += 8 + content.len();

        parse_shape(&content, &self.file).map(Some)
    }
}

impl<R: Read> Iterator for ShapeReader<R> {
    type Item = Result<Option<Geometry>, ShpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(geometry)) => Some(Ok(geometry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Remplit `buf`, ou retourne `false` si la fin de fichier tombe pile avant
fn fill_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) if read == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated record header",
                ))
            }
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Curseur little-endian sur le contenu d'un enregistrement
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    file: &'a str,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ShpError> {
        if self.buf.len() - self.pos < n {
            return Err(ShpError::parse_error(self.file, "record content too short"));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn i32(&mut self) -> Result<i32, ShpError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f64(&mut self) -> Result<f64, ShpError> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(f64::from_le_bytes(raw))
    }

    fn count(&mut self, what: &str) -> Result<usize, ShpError> {
        let n = self.i32()?;
        usize::try_from(n)
            .map_err(|_| ShpError::parse_error(self.file, format!("negative {} count", what)))
    }

    fn coord(&mut self) -> Result<Coord, ShpError> {
        let x = self.f64()?;
        let y = self.f64()?;
        Ok(Coord { x, y })
    }

    fn coords(&mut self, n: usize) -> Result<Vec<Coord>, ShpError> {
        if (self.buf.len() - self.pos) / 16 < n {
            return Err(ShpError::parse_error(
                self.file,
                format!("{} points declared, record too short", n),
            ));
        }
        (0..n).map(|_| self.coord()).collect()
    }
}

/// Décode le contenu d'un enregistrement en géométrie `geo`
pub fn parse_shape(content: &[u8], file: &str) -> Result<Option<Geometry>, ShpError> {
    let mut cur = Cursor {
        buf: content,
        pos: 0,
        file,
    };

    let code = cur.i32()?;
    let shape_type = ShapeType::from_code(code).ok_or(ShpError::UnsupportedShapeType(code))?;

    match shape_type.planar() {
        ShapeType::Null => Ok(None),
        ShapeType::Point => {
            let c = cur.coord()?;
            Ok(Some(Geometry::Point(Point::from(c))))
        }
        ShapeType::MultiPoint => {
            cur.take(32)?; // bbox
            let num_points = cur.count("point")?;
            let mut points: Vec<Point> = cur.coords(num_points)?.into_iter().map(Point::from).collect();
            if points.len() == 1 {
                Ok(Some(Geometry::Point(points.remove(0))))
            } else {
                Ok(Some(Geometry::MultiPoint(MultiPoint::new(points))))
            }
        }
        kind @ (ShapeType::PolyLine | ShapeType::Polygon) => {
            cur.take(32)?; // bbox
            let num_parts = cur.count("part")?;
            let num_points = cur.count("point")?;
            if (content.len() - cur.pos) / 4 < num_parts {
                return Err(ShpError::parse_error(file, "part index table truncated"));
            }
            let parts = (0..num_parts)
                .map(|_| cur.count("part index"))
                .collect::<Result<Vec<usize>, _>>()?;
            let points = cur.coords(num_points)?;
            let mut lines = split_parts(&parts, &points)
                .map_err(|reason| ShpError::parse_error(file, reason))?;

            if kind == ShapeType::Polygon {
                let mut polygons = organize_rings(lines.into_iter().map(LineString::new).collect());
                if polygons.len() == 1 {
                    Ok(Some(Geometry::Polygon(polygons.remove(0))))
                } else {
                    Ok(Some(Geometry::MultiPolygon(polygons.into())))
                }
            } else if lines.len() == 1 {
                Ok(Some(Geometry::LineString(LineString::new(lines.remove(0)))))
            } else {
                Ok(Some(Geometry::MultiLineString(MultiLineString::new(
                    lines.into_iter().map(LineString::new).collect(),
                ))))
            }
        }
        _ => Err(ShpError::UnsupportedShapeType(code)),
    }
}

/// Découpe la liste de points selon les index de début de partie
fn split_parts(parts: &[usize], points: &[Coord]) -> Result<Vec<Vec<Coord>>, String> {
    let mut lines = Vec::with_capacity(parts.len());
    for (i, &start) in parts.iter().enumerate() {
        let end = parts.get(i + 1).copied().unwrap_or(points.len());
        if start > end || end > points.len() {
            return Err(format!("invalid part index {} (points: {})", start, points.len()));
        }
        lines.push(points[start..end].to_vec());
    }
    Ok(lines)
}

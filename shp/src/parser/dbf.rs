//! Parser pour la table attributaire .dbf (dBASE III)
//!
//! Les champs texte sont décodés octet par octet (Latin-1): l'encodage réel
//! des données (souvent CP949 pour le cadastre coréen) est laissé à l'appelant.

use std::io::{self, Read};

use crate::types::{FieldDescriptor, FieldValue, Properties};
use crate::ShpError;

/// Taille de l'en-tête fixe et d'un descripteur de champ
const BLOCK_LEN: usize = 32;

/// Fin de la liste des descripteurs
const FIELD_TERMINATOR: u8 = 0x0D;

/// Marqueur de fin de fichier
const EOF_MARKER: u8 = 0x1A;

/// En-tête du fichier .dbf
#[derive(Debug, Clone)]
pub struct DbfHeader {
    pub num_records: u32,
    pub header_length: usize,
    pub record_length: usize,
    pub fields: Vec<FieldDescriptor>,
}

/// Lecteur séquentiel des enregistrements d'un .dbf
pub struct DbfReader<R> {
    reader: R,
    header: DbfHeader,
    file: String,
    remaining: u32,
    buf: Vec<u8>,
}

impl<R: Read> DbfReader<R> {
    /// Lit l'en-tête et les descripteurs de champs
    pub fn new(mut reader: R, file: impl Into<String>) -> Result<Self, ShpError> {
        let file = file.into();
        let header = read_header(&mut reader, &file)?;

        Ok(Self {
            reader,
            remaining: header.num_records,
            buf: vec![0u8; header.record_length],
            header,
            file,
        })
    }

    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.header.fields
    }

    fn read_record(&mut self) -> Result<Option<Properties>, ShpError> {
        if self.remaining == 0 {
            return Ok(None);
        }

        self.reader.read_exact(&mut self.buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                ShpError::parse_error(&self.file, "truncated attribute record")
            }
            _ => ShpError::Io(e),
        })?;
        self.remaining -= 1;

        if self.buf.first() == Some(&EOF_MARKER) {
            self.remaining = 0;
            return Ok(None);
        }

        // Octet 0: marqueur de suppression (ignoré, l'alignement avec le .shp prime)
        let mut offset = 1;
        let mut properties = Vec::with_capacity(self.header.fields.len());
        for field in &self.header.fields {
            let raw = &self.buf[offset..offset + field.length];
            properties.push((field.name.clone(), decode_field(field, raw)));
            offset += field.length;
        }

        Ok(Some(properties))
    }
}

impl<R: Read> Iterator for DbfReader<R> {
    type Item = Result<Properties, ShpError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(properties)) => Some(Ok(properties)),
            Ok(None) => None,
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

fn read_header<R: Read>(reader: &mut R, file: &str) -> Result<DbfHeader, ShpError> {
    let mut head = [0u8; BLOCK_LEN];
    reader.read_exact(&mut head).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ShpError::invalid_header(file, "file too short"),
        _ => ShpError::Io(e),
    })?;

    let num_records = u32::from_le_bytes([head[4], head[5], head[6], head[7]]);
    let header_length = u16::from_le_bytes([head[8], head[9]]) as usize;
    let record_length = u16::from_le_bytes([head[10], head[11]]) as usize;

    if header_length <= BLOCK_LEN {
        return Err(ShpError::invalid_header(
            file,
            format!("invalid header length {}", header_length),
        ));
    }

    let mut descriptors = vec![0u8; header_length - BLOCK_LEN];
    reader.read_exact(&mut descriptors).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ShpError::invalid_header(file, "truncated field descriptors"),
        _ => ShpError::Io(e),
    })?;

    let mut fields = Vec::new();
    for chunk in descriptors.chunks(BLOCK_LEN) {
        if chunk[0] == FIELD_TERMINATOR || chunk.len() < BLOCK_LEN {
            break;
        }
        fields.push(parse_descriptor(chunk));
    }

    let fields_length: usize = fields.iter().map(|f| f.length).sum();
    if fields_length + 1 > record_length {
        return Err(ShpError::invalid_header(
            file,
            format!(
                "record length {} smaller than declared fields ({})",
                record_length,
                fields_length + 1
            ),
        ));
    }

    Ok(DbfHeader {
        num_records,
        header_length,
        record_length,
        fields,
    })
}

fn parse_descriptor(chunk: &[u8]) -> FieldDescriptor {
    let name_end = chunk[..11].iter().position(|&b| b == 0).unwrap_or(11);
    FieldDescriptor {
        name: latin1(&chunk[..name_end]).trim().to_string(),
        field_type: chunk[11],
        length: chunk[16] as usize,
        decimals: chunk[17],
    }
}

/// Décode la valeur brute d'un champ selon son type dBASE
pub fn decode_field(field: &FieldDescriptor, raw: &[u8]) -> FieldValue {
    match field.field_type {
        b'N' | b'F' => decode_number(raw, field.decimals),
        b'L' => decode_logical(raw),
        b'D' => decode_date(raw),
        _ => decode_text(raw),
    }
}

/// Un octet = un caractère (U+0000..U+00FF)
pub fn latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| char::from(b)).collect()
}

fn trim_padding(raw: &[u8]) -> &[u8] {
    let is_pad = |b: &u8| *b == b' ' || *b == 0;
    let start = raw.iter().position(|b| !is_pad(b)).unwrap_or(raw.len());
    let end = raw.iter().rposition(|b| !is_pad(b)).map_or(start, |p| p + 1);
    &raw[start..end]
}

fn decode_text(raw: &[u8]) -> FieldValue {
    let trimmed = trim_padding(raw);
    if trimmed.is_empty() {
        FieldValue::Null
    } else {
        FieldValue::Text(latin1(trimmed))
    }
}

fn decode_number(raw: &[u8], decimals: u8) -> FieldValue {
    let Ok(s) = simdutf8::basic::from_utf8(trim_padding(raw)) else {
        return FieldValue::Null;
    };
    if s.is_empty() || s.bytes().all(|b| b == b'*') {
        return FieldValue::Null;
    }

    if decimals == 0 {
        if let Ok(i) = s.parse::<i64>() {
            return FieldValue::Integer(i);
        }
    }

    match fast_float::parse::<f64, _>(s) {
        Ok(n) if n.is_finite() => FieldValue::Number(n),
        _ => FieldValue::Null,
    }
}

fn decode_logical(raw: &[u8]) -> FieldValue {
    match trim_padding(raw).first() {
        Some(b'Y' | b'y' | b'T' | b't') => FieldValue::Logical(true),
        Some(b'N' | b'n' | b'F' | b'f') => FieldValue::Logical(false),
        _ => FieldValue::Null,
    }
}

fn decode_date(raw: &[u8]) -> FieldValue {
    let trimmed = trim_padding(raw);
    if trimmed.len() != 8 || !trimmed.iter().all(u8::is_ascii_digit) {
        return FieldValue::Null;
    }
    let s = latin1(trimmed);
    FieldValue::Text(format!("{}-{}-{}", &s[..4], &s[4..6], &s[6..]))
}

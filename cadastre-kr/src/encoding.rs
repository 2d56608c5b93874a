//! Réparation des textes CP949/EUC-KR décodés à tort en Latin-1
//!
//! Les attributs texte du `.dbf` sont lus octet par caractère: chaque `char`
//! vaut un octet brut. On reconstitue les octets puis on les décode en EUC-KR
//! (encoding_rs implémente EUC-KR comme CP949/UHC).

use encoding_rs::EUC_KR;
use serde_json::{Map, Value};
use shp::{FieldValue, Properties};

use crate::error::DecodingError;

/// Répare une valeur d'attribut: texte re-décodé et trimé, autres valeurs inchangées
pub fn repair(value: &Value) -> Result<Value, DecodingError> {
    match value {
        Value::String(text) => repair_text(text).map(Value::String),
        other => Ok(other.clone()),
    }
}

/// Re-décode un texte dont chaque caractère représente un octet CP949
pub fn repair_text(text: &str) -> Result<String, DecodingError> {
    let bytes = raw_bytes(text)?;
    let (decoded, had_errors) = EUC_KR.decode_without_bom_handling(&bytes);
    if had_errors {
        return Err(DecodingError::Malformed {
            encoding: EUC_KR.name(),
            value: text.to_string(),
        });
    }
    Ok(decoded.trim().to_string())
}

/// Octets bruts d'un texte décodé en Latin-1 (U+0000..U+00FF)
fn raw_bytes(text: &str) -> Result<Vec<u8>, DecodingError> {
    text.chars()
        .enumerate()
        .map(|(index, ch)| u8::try_from(ch).map_err(|_| DecodingError::NotRawBytes { ch, index }))
        .collect()
}

/// Valeur JSON brute (non réparée) d'un champ dBASE
pub fn field_to_json(value: FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::String(s),
        FieldValue::Integer(i) => Value::from(i),
        FieldValue::Number(n) => Value::from(n),
        FieldValue::Logical(b) => Value::Bool(b),
        FieldValue::Null => Value::Null,
    }
}

/// Répare toutes les propriétés d'un enregistrement, dans l'ordre des champs
///
/// En cas d'échec, retourne le nom du champ fautif avec l'erreur.
pub fn repair_properties(
    properties: Properties,
) -> Result<Map<String, Value>, (String, DecodingError)> {
    let mut repaired = Map::with_capacity(properties.len());
    for (key, value) in properties {
        let value = match repair(&field_to_json(value)) {
            Ok(v) => v,
            Err(e) => return Err((key, e)),
        };
        repaired.insert(key, value);
    }
    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Simule la lecture Latin-1 d'octets EUC-KR
    fn misdecode(bytes: &[u8]) -> String {
        bytes.iter().map(|&b| char::from(b)).collect()
    }

    #[test]
    fn test_repair_korean() {
        let seoul = misdecode(&[0xBC, 0xAD, 0xBF, 0xEF]);
        assert_eq!(repair_text(&seoul).unwrap(), "서울");

        let parcel = misdecode(&[0x31, 0xB4, 0xEB]);
        assert_eq!(repair_text(&parcel).unwrap(), "1대");
    }

    #[test]
    fn test_repair_address_and_trim() {
        let mut bytes = vec![0x20, 0x20];
        bytes.extend_from_slice(&[
            0xBC, 0xAD, 0xBF, 0xEF, 0xC6, 0xAF, 0xBA, 0xB0, 0xBD, 0xC3, 0x20, 0xC1, 0xBE, 0xB7,
            0xCE, 0xB1, 0xB8, 0x20, 0xC3, 0xBB, 0xBF, 0xEE, 0xB5, 0xBF,
        ]);
        bytes.extend_from_slice(b"   ");
        let value = json!(misdecode(&bytes));
        assert_eq!(repair(&value).unwrap(), json!("서울특별시 종로구 청운동"));
    }

    #[test]
    fn test_ascii_unchanged() {
        assert_eq!(repair_text("11110-1234").unwrap(), "11110-1234");
        assert_eq!(repair_text("").unwrap(), "");
    }

    #[test]
    fn test_clean_korean_fails() {
        // Texte déjà correct: les caractères ne sont pas des octets bruts
        let err = repair_text("서울").unwrap_err();
        assert_eq!(err, DecodingError::NotRawBytes { ch: '서', index: 0 });
        // Déterministe
        assert_eq!(repair_text("서울").unwrap_err(), err);
    }

    #[test]
    fn test_malformed_sequence_fails() {
        // Octet de tête sans octet de queue
        let truncated = misdecode(&[0x41, 0xBC]);
        assert!(matches!(
            repair_text(&truncated),
            Err(DecodingError::Malformed { encoding: "EUC-KR", .. })
        ));
        assert!(repair_text(&misdecode(&[0xFF])).is_err());
    }

    #[test]
    fn test_non_string_passthrough() {
        for value in [json!(42), json!(-1.5), json!(null), json!(true), json!(1e300)] {
            assert_eq!(repair(&value).unwrap(), value);
        }
        let f = json!(0.1 + 0.2);
        assert_eq!(
            repair(&f).unwrap().as_f64().unwrap().to_bits(),
            f.as_f64().unwrap().to_bits()
        );
    }

    #[test]
    fn test_repair_properties_keeps_order() {
        let properties: Properties = vec![
            ("PNU".to_string(), FieldValue::Text("1111010100".to_string())),
            ("JIBUN".to_string(), FieldValue::Text(misdecode(&[0x31, 0xB4, 0xEB]))),
            ("AREA".to_string(), FieldValue::Number(12.5)),
            ("CNT".to_string(), FieldValue::Integer(3)),
            ("NOTE".to_string(), FieldValue::Null),
        ];
        let repaired = repair_properties(properties).unwrap();
        let keys: Vec<&str> = repaired.keys().map(String::as_str).collect();
        assert_eq!(keys, ["PNU", "JIBUN", "AREA", "CNT", "NOTE"]);
        assert_eq!(repaired["JIBUN"], json!("1대"));
        assert_eq!(repaired["AREA"], json!(12.5));
        assert_eq!(repaired["CNT"], json!(3));
        assert_eq!(repaired["NOTE"], Value::Null);
    }

    #[test]
    fn test_repair_properties_reports_key() {
        let properties: Properties = vec![
            ("OK".to_string(), FieldValue::Text("a".to_string())),
            ("BAD".to_string(), FieldValue::Text(misdecode(&[0xFF]))),
        ];
        let (key, _) = repair_properties(properties).unwrap_err();
        assert_eq!(key, "BAD");
    }
}

//! Windows-1252 transcoding.
//!
//! DATEV files are declared as ISO-8859-1, which in practice (and in the
//! WHATWG encoding standard) means Windows-1252. The five byte values that
//! Windows-1252 leaves unassigned are rejected in both directions.

use encoding_rs::WINDOWS_1252;

use crate::core::DatevError;

const UNASSIGNED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Decode file content.
pub fn decode(bytes: &[u8]) -> Result<String, DatevError> {
    if let Some(offset) = bytes.iter().position(|b| UNASSIGNED.contains(b)) {
        return Err(DatevError::Encoding(format!(
            "byte 0x{:02X} at offset {offset} is not assigned in {}",
            bytes[offset],
            WINDOWS_1252.name()
        )));
    }
    WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| DatevError::Encoding(format!("input is not valid {}", WINDOWS_1252.name())))
}

/// Encode text for writing.
pub fn encode(text: &str) -> Result<Vec<u8>, DatevError> {
    let (bytes, _, had_errors) = WINDOWS_1252.encode(text);
    if had_errors || bytes.iter().any(|b| UNASSIGNED.contains(b)) {
        let offending = text.chars().find(|c| !is_encodable(*c)).unwrap_or('\u{FFFD}');
        return Err(DatevError::Encoding(format!(
            "character '{offending}' (U+{:04X}) cannot be represented in {}",
            offending as u32,
            WINDOWS_1252.name()
        )));
    }
    Ok(bytes.into_owned())
}

/// Check that a field value survives encoding.
pub fn ensure_encodable(field: &str, text: &str) -> Result<(), DatevError> {
    match text.chars().find(|c| !is_encodable(*c)) {
        Some(c) => Err(DatevError::Encoding(format!(
            "character '{c}' (U+{:04X}) in field '{field}' cannot be represented in {}",
            c as u32,
            WINDOWS_1252.name()
        ))),
        None => Ok(()),
    }
}

fn is_encodable(c: char) -> bool {
    let mut buf = [0u8; 4];
    let (bytes, _, had_errors) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
    !had_errors && !bytes.iter().any(|b| UNASSIGNED.contains(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umlauts_and_euro() {
        let bytes = encode("Gegenkonto (ohne BU-Schlüssel) 5€").unwrap();
        assert!(bytes.contains(&0xFC));
        assert!(bytes.contains(&0x80));
        assert_eq!(decode(&bytes).unwrap(), "Gegenkonto (ohne BU-Schlüssel) 5€");
    }

    #[test]
    fn unassigned_bytes_rejected() {
        assert!(matches!(decode(b"ab\x81cd"), Err(DatevError::Encoding(_))));
    }

    #[test]
    fn unrepresentable_characters_rejected() {
        assert!(matches!(encode("Zürich → Köln"), Err(DatevError::Encoding(_))));
        assert!(ensure_encodable("Buchungstext", "Ärger").is_ok());
        assert!(ensure_encodable("Buchungstext", "\u{81}").is_err());
    }
}

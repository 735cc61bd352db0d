// Text encoding support for ID3 frames

use encoding_rs::{UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

use crate::Error;

/// Text encoding selectors used by ID3v2 frame payloads.
///
/// The selector byte also fixes the width of the string terminator:
/// one NUL byte for the single-byte encodings, a zero 16-bit code unit
/// for the UTF-16 variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Iso8859_1 = 0,
    Utf16 = 1,
    Utf16BE = 2,
    Utf8 = 3,
}

impl TextEncoding {
    /// Resolve an encoding selector byte.
    pub fn from_byte(byte: u8) -> Result<Self, Error> {
        match byte {
            0 => Ok(TextEncoding::Iso8859_1),
            1 => Ok(TextEncoding::Utf16),
            2 => Ok(TextEncoding::Utf16BE),
            3 => Ok(TextEncoding::Utf8),
            other => Err(Error::UnsupportedEncoding(other)),
        }
    }

    /// Width in bytes of this encoding's string terminator.
    pub fn terminator_width(self) -> usize {
        match self {
            TextEncoding::Iso8859_1 | TextEncoding::Utf8 => 1,
            TextEncoding::Utf16 | TextEncoding::Utf16BE => 2,
        }
    }

    /// The terminator byte sequence itself.
    pub fn terminator(self) -> &'static [u8] {
        match self.terminator_width() {
            1 => &[0],
            _ => &[0, 0],
        }
    }
}

/// Decode text with the specified encoding.
pub fn decode_text(data: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Iso8859_1 => WINDOWS_1252.decode(data).0.to_string(),
        TextEncoding::Utf16 => {
            // Detect BOM
            if data.len() >= 2 {
                if data[0..2] == [0xFF, 0xFE] {
                    UTF_16LE.decode(&data[2..]).0.to_string()
                } else if data[0..2] == [0xFE, 0xFF] {
                    UTF_16BE.decode(&data[2..]).0.to_string()
                } else {
                    UTF_16LE.decode(data).0.to_string()
                }
            } else {
                String::new()
            }
        }
        TextEncoding::Utf16BE => UTF_16BE.decode(data).0.to_string(),
        TextEncoding::Utf8 => UTF_8.decode(data).0.to_string(),
    }
}

/// Encode text with the specified encoding.
///
/// The UTF-16 variant is written little-endian with a leading BOM;
/// UTF-16BE is written without one. No terminator is appended.
pub fn encode_text(text: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Iso8859_1 => WINDOWS_1252.encode(text).0.to_vec(),
        TextEncoding::Utf16 => {
            let mut encoded = vec![0xFF, 0xFE];
            for unit in text.encode_utf16() {
                encoded.extend_from_slice(&unit.to_le_bytes());
            }
            encoded
        }
        TextEncoding::Utf16BE => {
            let mut encoded = Vec::with_capacity(text.len() * 2);
            for unit in text.encode_utf16() {
                encoded.extend_from_slice(&unit.to_be_bytes());
            }
            encoded
        }
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
    }
}

/// Locate the string terminator for `encoding` in `data`.
///
/// Returns the byte index where the terminator starts. The two-byte
/// encodings are scanned one code unit at a time from the start of the
/// field, so a high or low zero byte inside a UTF-16 character does not
/// terminate the string.
pub fn find_terminator(data: &[u8], encoding: TextEncoding) -> Option<usize> {
    if encoding.terminator_width() == 1 {
        return data.iter().position(|&b| b == 0);
    }
    let mut at = 0;
    while at + 1 < data.len() {
        if data[at] == 0 && data[at + 1] == 0 {
            return Some(at);
        }
        at += 2;
    }
    None
}

/// Split `data` at its terminator, yielding the field bytes and the
/// remainder after the terminator.
pub fn split_terminated(data: &[u8], encoding: TextEncoding) -> Option<(&[u8], &[u8])> {
    let at = find_terminator(data, encoding)?;
    Some((&data[..at], &data[at + encoding.terminator_width()..]))
}

/// Trim the NUL/space padding ID3 writers leave around text fields.
pub fn trim_padding(text: &str) -> &str {
    text.trim_matches(|c| c == '\0' || c == ' ')
}

//! Target encoding set and codecs
//!
//! encoding_rs supplies the UTF-8 and Korean code page codecs; it decodes
//! UTF-16 but does not encode it, and has no UTF-32 support at all, so those
//! codecs live here.

use crate::{ConvError, Result};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF32LE_BOM: [u8; 4] = [0xFF, 0xFE, 0x00, 0x00];
const UTF32BE_BOM: [u8; 4] = [0x00, 0x00, 0xFE, 0xFF];

/// The closed set of target encodings the converter can write.
///
/// UTF-16 and UTF-32 writers always emit a BOM; `Utf8Bom` emits the UTF-8
/// signature while `Utf8` does not. CP949 and EUC-KR share the windows-949
/// codec but stay distinct variants with distinct display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingSpec {
    Utf8Bom,
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
    Cp949,
    EucKr,
}

impl EncodingSpec {
    pub const ALL: [EncodingSpec; 8] = [
        EncodingSpec::Utf8Bom,
        EncodingSpec::Utf8,
        EncodingSpec::Utf16Le,
        EncodingSpec::Utf16Be,
        EncodingSpec::Utf32Le,
        EncodingSpec::Utf32Be,
        EncodingSpec::Cp949,
        EncodingSpec::EucKr,
    ];

    /// Stable display name, as shown to the host.
    pub fn name(&self) -> &'static str {
        match self {
            EncodingSpec::Utf8Bom => "UTF-8 With Bom",
            EncodingSpec::Utf8 => "UTF-8",
            EncodingSpec::Utf16Le => "UTF-16LE",
            EncodingSpec::Utf16Be => "UTF-16BE",
            EncodingSpec::Utf32Le => "UTF-32LE",
            EncodingSpec::Utf32Be => "UTF-32BE",
            EncodingSpec::Cp949 => "CP949",
            EncodingSpec::EucKr => "EUC-KR",
        }
    }

    /// Look up a variant by its display name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|spec| spec.name().eq_ignore_ascii_case(name))
    }

    /// Encode text to bytes in this encoding.
    ///
    /// Fails for the legacy code pages when the text contains characters
    /// they cannot represent.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            EncodingSpec::Utf8Bom => {
                let mut out = Vec::with_capacity(text.len() + UTF8_BOM.len());
                out.extend_from_slice(&UTF8_BOM);
                out.extend_from_slice(text.as_bytes());
                Ok(out)
            }
            EncodingSpec::Utf8 => Ok(text.as_bytes().to_vec()),
            EncodingSpec::Utf16Le => Ok(encode_utf16(text, false)),
            EncodingSpec::Utf16Be => Ok(encode_utf16(text, true)),
            EncodingSpec::Utf32Le => Ok(encode_utf32(text, false)),
            EncodingSpec::Utf32Be => Ok(encode_utf32(text, true)),
            EncodingSpec::Cp949 | EncodingSpec::EucKr => {
                let (out, _, had_errors) = encoding_rs::EUC_KR.encode(text);
                if had_errors {
                    return Err(ConvError::Unmappable {
                        encoding: self.name(),
                    });
                }
                Ok(out.into_owned())
            }
        }
    }

    /// Decode bytes to text, stripping a matching BOM and replacing invalid
    /// sequences with U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            EncodingSpec::Utf8Bom | EncodingSpec::Utf8 => {
                let bytes = strip_prefix(bytes, &UTF8_BOM);
                String::from_utf8_lossy(bytes).into_owned()
            }
            EncodingSpec::Utf16Le => decode_utf16(strip_prefix(bytes, &UTF16LE_BOM), false),
            EncodingSpec::Utf16Be => decode_utf16(strip_prefix(bytes, &UTF16BE_BOM), true),
            EncodingSpec::Utf32Le => decode_utf32(strip_prefix(bytes, &UTF32LE_BOM), false),
            EncodingSpec::Utf32Be => decode_utf32(strip_prefix(bytes, &UTF32BE_BOM), true),
            EncodingSpec::Cp949 | EncodingSpec::EucKr => {
                let (out, _, _) = encoding_rs::EUC_KR.decode(bytes);
                out.into_owned()
            }
        }
    }
}

/// Identify an encoding by its BOM, if the bytes start with one.
///
/// The UTF-32 signatures are checked before UTF-16 because the UTF-32LE BOM
/// begins with the UTF-16LE one.
pub fn sniff_bom(bytes: &[u8]) -> Option<EncodingSpec> {
    if bytes.starts_with(&UTF32LE_BOM) {
        Some(EncodingSpec::Utf32Le)
    } else if bytes.starts_with(&UTF32BE_BOM) {
        Some(EncodingSpec::Utf32Be)
    } else if bytes.starts_with(&UTF8_BOM) {
        Some(EncodingSpec::Utf8Bom)
    } else if bytes.starts_with(&UTF16BE_BOM) {
        Some(EncodingSpec::Utf16Be)
    } else if bytes.starts_with(&UTF16LE_BOM) {
        Some(EncodingSpec::Utf16Le)
    } else {
        None
    }
}

fn strip_prefix<'a>(bytes: &'a [u8], bom: &[u8]) -> &'a [u8] {
    bytes.strip_prefix(bom).unwrap_or(bytes)
}

fn encode_utf16(text: &str, big_endian: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + text.len() * 2);
    out.extend_from_slice(if big_endian { &UTF16BE_BOM } else { &UTF16LE_BOM });
    for unit in text.encode_utf16() {
        let b = if big_endian {
            unit.to_be_bytes()
        } else {
            unit.to_le_bytes()
        };
        out.extend_from_slice(&b);
    }
    out
}

fn encode_utf32(text: &str, big_endian: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + text.len() * 4);
    out.extend_from_slice(if big_endian { &UTF32BE_BOM } else { &UTF32LE_BOM });
    for ch in text.chars() {
        let b = if big_endian {
            (ch as u32).to_be_bytes()
        } else {
            (ch as u32).to_le_bytes()
        };
        out.extend_from_slice(&b);
    }
    out
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> String {
    let mut units = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        units.push(if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        });
    }
    let mut out = String::from_utf16_lossy(&units);
    if bytes.len() % 2 != 0 {
        out.push(char::REPLACEMENT_CHARACTER);
    }
    out
}

fn decode_utf32(bytes: &[u8], big_endian: bool) -> String {
    let mut out = String::with_capacity(bytes.len() / 4);
    for quad in bytes.chunks_exact(4) {
        let value = if big_endian {
            u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]])
        } else {
            u32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]])
        };
        out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    if bytes.len() % 4 != 0 {
        out.push(char::REPLACEMENT_CHARACTER);
    }
    out
}

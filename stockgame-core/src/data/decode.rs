//! Text decoding with a single fallback encoding.
//!
//! Corpus files are UTF-8 (optionally with a BOM) or GBK. UTF-8 is tried
//! first; GBK only when the bytes are not valid UTF-8.

use encoding_rs::GBK;
use serde::Serialize;
use std::borrow::Cow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Which decoder accepted the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Utf8,
    Gbk,
}

impl TextEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf8",
            TextEncoding::Gbk => "gbk",
        }
    }
}

/// Decode file bytes, or `None` if neither encoding accepts them.
pub fn decode(bytes: &[u8]) -> Option<(Cow<'_, str>, TextEncoding)> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return Some((Cow::Borrowed(text), TextEncoding::Utf8));
    }
    GBK.decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| (text, TextEncoding::Gbk))
}

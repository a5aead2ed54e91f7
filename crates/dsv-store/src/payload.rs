//! Data payloads and the text encodings they may be given in.

use std::fmt;
use std::str::FromStr;

use crate::error::{StoreError, StoreResult};

/// Encoding used to turn a text payload into stored bytes and back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    /// ISO-8859-1: every char up to U+00FF maps to one byte.
    Latin1,
}

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    pub fn encode(&self, text: &str) -> StoreResult<Vec<u8>> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Ascii => text
                .chars()
                .map(|c| {
                    if c.is_ascii() {
                        Ok(c as u8)
                    } else {
                        Err(self.unmappable(c))
                    }
                })
                .collect(),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| self.unmappable(c)))
                .collect(),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> StoreResult<String> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| StoreError::Encoding {
                encoding: *self,
                reason: e.to_string(),
            }),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(StoreError::Encoding {
                    encoding: *self,
                    reason: format!("byte 0x{:02x} at offset {pos} is not ascii", bytes[pos]),
                }),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    fn unmappable(&self, c: char) -> StoreError {
        StoreError::Encoding {
            encoding: *self,
            reason: format!("character {c:?} is not representable"),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            _ => Err(StoreError::Encoding {
                encoding: TextEncoding::Utf8,
                reason: format!("unknown encoding: {s}"),
            }),
        }
    }
}

/// A data payload as handed to [`FsStore::store_data`](crate::FsStore::store_data).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Raw bytes, stored unchanged.
    Bytes(Vec<u8>),
    /// Text, encoded with `encoding` before it is stored.
    Text { text: String, encoding: TextEncoding },
}

impl Payload {
    pub fn text(text: impl Into<String>, encoding: TextEncoding) -> Self {
        Payload::Text {
            text: text.into(),
            encoding,
        }
    }

    /// The bytes written to the version file.
    pub fn into_bytes(self) -> StoreResult<Vec<u8>> {
        match self {
            Payload::Bytes(bytes) => Ok(bytes),
            Payload::Text { text, encoding } => encoding.encode(&text),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Payload {
    fn from(bytes: &[u8; N]) -> Self {
        Payload::Bytes(bytes.to_vec())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::text(text, TextEncoding::Utf8)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::text(text, TextEncoding::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_labels() {
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("utf_8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("us-ascii".parse::<TextEncoding>().unwrap(), TextEncoding::Ascii);
        assert_eq!("ISO-8859-1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert!("ebcdic".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn latin1_single_byte_per_char() {
        let bytes = TextEncoding::Latin1.encode("café").unwrap();
        assert_eq!(bytes, vec![b'c', b'a', b'f', 0xe9]);
        assert_eq!(TextEncoding::Latin1.decode(&bytes).unwrap(), "café");
    }

    #[test]
    fn utf8_and_latin1_differ() {
        let utf8 = TextEncoding::Utf8.encode("café").unwrap();
        assert_eq!(utf8.len(), 5);
        assert!(TextEncoding::Utf8.decode(&[0xe9]).is_err());
    }

    #[test]
    fn ascii_rejects_non_ascii() {
        let err = TextEncoding::Ascii.encode("naïve").unwrap_err();
        assert!(matches!(err, StoreError::Encoding { encoding: TextEncoding::Ascii, .. }));
        assert!(TextEncoding::Ascii.decode(&[b'o', 0xff]).is_err());
        assert!(TextEncoding::Latin1.encode("€").is_err());
    }

    #[test]
    fn payload_conversions() {
        assert_eq!(Payload::from(b"raw").into_bytes().unwrap(), b"raw");
        assert_eq!(Payload::from("text").into_bytes().unwrap(), b"text");
        let latin = Payload::text("é", TextEncoding::Latin1);
        assert_eq!(latin.into_bytes().unwrap(), vec![0xe9]);
    }
}

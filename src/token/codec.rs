//! Compact-serialization helpers: JOSE header, base64url JSON and payload compression.

use super::{Error, ALGORITHM, MAX_PAYLOAD_LEN};
use base64ct::{Base64UrlUnpadded, Encoding};
use flate2::{
    read::{GzDecoder, ZlibDecoder},
    write::{GzEncoder, ZlibEncoder},
    Compression as Level,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

impl Header {
    pub fn hs512(compression: Compression) -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            zip: compression.header_value().map(str::to_string),
        }
    }
}

/// Payload compression, named in the `zip` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// No `zip` header; the payload is plain JSON.
    None,
    /// `"zip":"GZIP"`.
    #[default]
    Gzip,
    /// `"zip":"DEF"`, zlib-wrapped deflate.
    Deflate,
}

impl Compression {
    #[must_use]
    pub const fn header_value(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gzip => Some("GZIP"),
            Self::Deflate => Some("DEF"),
        }
    }

    pub(crate) fn from_header(zip: Option<&str>) -> Result<Self, Error> {
        match zip {
            None => Ok(Self::None),
            Some("GZIP") => Ok(Self::Gzip),
            Some("DEF") => Ok(Self::Deflate),
            Some(other) => Err(Error::UnsupportedCompression(other.to_string())),
        }
    }

    pub(crate) fn compress(self, data: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Level::default());
                encoder.write_all(data).map_err(Error::Compression)?;
                encoder.finish().map_err(Error::Compression)
            }
            Self::Deflate => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Level::default());
                encoder.write_all(data).map_err(Error::Compression)?;
                encoder.finish().map_err(Error::Compression)
            }
        }
    }

    pub(crate) fn decompress(self, data: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Gzip => read_capped(GzDecoder::new(data)),
            Self::Deflate => read_capped(ZlibDecoder::new(data)),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        };
        f.write_str(s)
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "gzip" => Ok(Self::Gzip),
            "deflate" | "def" => Ok(Self::Deflate),
            _ => Err(format!("unknown compression: {s}")),
        }
    }
}

// A decompressed payload larger than the cap is rejected before it is fully inflated.
fn read_capped(reader: impl Read) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    reader
        .take(MAX_PAYLOAD_LEN as u64 + 1)
        .read_to_end(&mut out)
        .map_err(Error::Compression)?;
    if out.len() > MAX_PAYLOAD_LEN {
        return Err(Error::PayloadTooLarge);
    }
    Ok(out)
}

pub fn b64e(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

pub fn b64d(s: &str) -> Result<Vec<u8>, Error> {
    Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)
}

pub fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(b64e(&json))
}

pub fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = b64d(s)?;
    Ok(serde_json::from_slice(&bytes)?)
}

//! Content digests
//!
//! Tickets declare the MD5 of the bytes they authorize. Clients may write the
//! digest as 32 hex characters or as standard base64 (the `Content-MD5` form);
//! both decode to the same 16 raw bytes, which is what gets compared.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use md5::{Digest, Md5};
use std::fmt;
use std::str::FromStr;

const MD5_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestParseError {
    #[error("digest is empty")]
    Empty,

    #[error("digest is neither 32 hex characters nor base64 of 16 bytes")]
    Malformed,
}

/// A 128-bit MD5 content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; MD5_LEN]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; MD5_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a hex or base64 encoded digest.
    pub fn parse(encoded: &str) -> Result<Self, DigestParseError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(DigestParseError::Empty);
        }

        let raw = if encoded.len() == MD5_LEN * 2 && encoded.chars().all(|c| c.is_ascii_hexdigit())
        {
            hex::decode(encoded).map_err(|_| DigestParseError::Malformed)?
        } else {
            STANDARD
                .decode(encoded)
                .map_err(|_| DigestParseError::Malformed)?
        };

        let bytes: [u8; MD5_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| DigestParseError::Malformed)?;
        Ok(Self(bytes))
    }

    /// Digest of an in-memory buffer.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = DigestHasher::new();
        hasher.update(data);
        hasher.finalize()
    }

    pub fn as_bytes(&self) -> &[u8; MD5_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl FromStr for ContentDigest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Displays as base64, the form used on the wire.
impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

/// Running MD5 accumulator for streamed content.
#[derive(Default, Clone)]
pub struct DigestHasher {
    inner: Md5,
}

impl DigestHasher {
    pub fn new() -> Self {
        Self { inner: Md5::new() }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    pub fn finalize(self) -> ContentDigest {
        let out = self.inner.finalize();
        let mut bytes = [0u8; MD5_LEN];
        bytes.copy_from_slice(&out);
        ContentDigest(bytes)
    }
}

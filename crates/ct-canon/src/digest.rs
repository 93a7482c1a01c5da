//! Fixed-size digests over canonical bytes.

use serde::{Deserialize, Serialize};
use sha2::Digest as _;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when building or naming a digest.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("Unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Hash length {actual} does not match {algorithm} ({expected} bytes).")]
    Length {
        algorithm: HashAlgorithm,
        expected: usize,
        actual: usize,
    },
}

/// Hash algorithms a signature may be computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA3-256")]
    Sha3_256,
    #[serde(rename = "BLAKE3")]
    Blake3,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 3] = [Self::Sha256, Self::Sha3_256, Self::Blake3];

    /// Stable identifier, as written into signature blobs.
    pub fn id(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha3_256 => "SHA3-256",
            Self::Blake3 => "BLAKE3",
        }
    }

    pub fn output_len(self) -> usize {
        32
    }

    pub fn digest(self, data: &[u8]) -> Digest {
        let bytes = match self {
            Self::Sha256 => sha2::Sha256::digest(data).to_vec(),
            Self::Sha3_256 => sha3::Sha3_256::digest(data).to_vec(),
            Self::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        };
        Digest {
            algorithm: self,
            bytes,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for HashAlgorithm {
    type Err = DigestError;

    /// Accepts the identifier in any case, with or without the hyphen.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.id().replace('-', "") == wanted)
            .ok_or_else(|| DigestError::UnknownAlgorithm(s.to_string()))
    }
}

/// A digest paired with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    algorithm: HashAlgorithm,
    bytes: Vec<u8>,
}

impl Digest {
    /// Hash `data` with `algorithm`.
    pub fn compute(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        algorithm.digest(data)
    }

    /// Wrap a digest computed elsewhere, checking its length.
    pub fn from_raw(algorithm: HashAlgorithm, bytes: Vec<u8>) -> Result<Self, DigestError> {
        if bytes.len() != algorithm.output_len() {
            return Err(DigestError::Length {
                algorithm,
                expected: algorithm.output_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self { algorithm, bytes })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

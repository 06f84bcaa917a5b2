use crate::error::{NotarizerError, NotarizerResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Read size used when streaming a file through the digest
pub const HASH_CHUNK_SIZE: usize = 4096;

/// Supported digest functions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    pub fn identifier(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    fn hasher(&self) -> Hasher {
        match self {
            HashAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => Hasher::Sha512(Sha512::new()),
            HashAlgorithm::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for HashAlgorithm {
    type Err = NotarizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "blake3" => Ok(HashAlgorithm::Blake3),
            _ => Err(NotarizerError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

enum Hasher {
    Sha256(Sha256),
    Sha512(Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
            Hasher::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Sha256(h) => hex::encode(h.finalize()),
            Hasher::Sha512(h) => hex::encode(h.finalize()),
            Hasher::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Digest of a file's content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDigest {
    pub algorithm: HashAlgorithm,
    /// Lowercase hex
    pub hex_value: String,
}

impl FileDigest {
    /// Stream a file through the digest in fixed-size chunks
    pub fn from_file<P: AsRef<Path>>(path: P, algorithm: HashAlgorithm) -> NotarizerResult<Self> {
        let path = path.as_ref();
        let hashing_failed = |e: io::Error| NotarizerError::HashingFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let file = File::open(path).map_err(hashing_failed)?;
        Self::from_reader(file, algorithm).map_err(hashing_failed)
    }

    pub fn from_reader<R: Read>(mut reader: R, algorithm: HashAlgorithm) -> io::Result<Self> {
        let mut hasher = algorithm.hasher();
        let mut buffer = [0u8; HASH_CHUNK_SIZE];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Self {
            algorithm,
            hex_value: hasher.finalize_hex(),
        })
    }

    /// Digest of an in-memory buffer in a single pass
    pub fn from_bytes(data: &[u8], algorithm: HashAlgorithm) -> Self {
        let mut hasher = algorithm.hasher();
        hasher.update(data);
        Self {
            algorithm,
            hex_value: hasher.finalize_hex(),
        }
    }

    /// Check that the file at `path` still has this digest
    pub fn verify<P: AsRef<Path>>(&self, path: P) -> NotarizerResult<bool> {
        let computed = Self::from_file(path, self.algorithm)?;
        Ok(computed.hex_value == self.hex_value)
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex_value)
    }
}

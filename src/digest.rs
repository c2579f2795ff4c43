use std::fmt::{self, Display};

use sha2::Digest as _;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestError {
  #[error("invalid hex digest {0:?}")]
  InvalidHex(String),
}

/// Lowercase hexadecimal rendering of a hash output.
///
/// Parent values are computed over the concatenation of the children's hex
/// text, so the hex form is the canonical one and the raw bytes are derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(String);

impl Digest {
  pub fn from_bytes(bytes: &[u8]) -> Self {
    Digest(hex::encode(bytes))
  }

  pub fn from_hex(text: &str) -> Result<Self, DigestError> {
    let bytes = hex::decode(text).map_err(|_| DigestError::InvalidHex(text.to_string()))?;
    Ok(Self::from_bytes(&bytes))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn as_bytes(&self) -> &[u8] {
    self.0.as_bytes()
  }

  /// Raw digest bytes, half the length of the hex text.
  pub fn to_bytes(&self) -> Vec<u8> {
    // the inner text is always produced by hex::encode
    hex::decode(&self.0).unwrap_or_default()
  }
}

impl Display for Digest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for Digest {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl PartialEq<str> for Digest {
  fn eq(&self, other: &str) -> bool {
    self.0 == other
  }
}

impl PartialEq<&str> for Digest {
  fn eq(&self, other: &&str) -> bool {
    self.0 == *other
  }
}

impl PartialEq<String> for Digest {
  fn eq(&self, other: &String) -> bool {
    &self.0 == other
  }
}

impl From<Digest> for String {
  fn from(digest: Digest) -> Self {
    digest.0
  }
}

/// One-way digest function used to build and verify trees.
pub trait Hasher {
  const NAME: &'static str;

  /// Digest of the concatenation of all `parts`.
  fn digest_parts(parts: &[&[u8]]) -> Digest;

  fn digest(data: &[u8]) -> Digest {
    Self::digest_parts(&[data])
  }

  /// Parent value: the digest of the left hex text followed by the right one.
  fn combine(left: &Digest, right: &Digest) -> Digest {
    Self::digest_parts(&[left.as_bytes(), right.as_bytes()])
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256;

impl Hasher for Sha256 {
  const NAME: &'static str = "sha256";

  fn digest_parts(parts: &[&[u8]]) -> Digest {
    let mut hasher = sha2::Sha256::new();
    for part in parts {
      hasher.update(part);
    }
    Digest::from_bytes(&hasher.finalize())
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3;

impl Hasher for Blake3 {
  const NAME: &'static str = "blake3";

  fn digest_parts(parts: &[&[u8]]) -> Digest {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
      hasher.update(part);
    }
    Digest::from_bytes(hasher.finalize().as_bytes())
  }
}

/// SHA-256 of the given bytes (text is hashed as UTF-8) as lowercase hex.
pub fn hash<V: AsRef<[u8]> + ?Sized>(value: &V) -> Digest {
  Sha256::digest(value.as_ref())
}

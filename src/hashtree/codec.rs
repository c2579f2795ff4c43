//! Compact binary encoding of [`MerkleProof`] for transport.
//!
//! All integers are little-endian.
//!
//! ```text
//! u64   number of leaves
//! u64   leaf index
//! u32   leaf content length, then the content bytes
//! u32   audit node count
//! per audit node:
//!   u8  side (1 = left, 0 = right)
//!   u8  digest length, then the raw digest bytes
//! ```

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use crate::digest::Digest;
use crate::hashtree::binary::MerkleProof;
use crate::hashtree::node::{Node, Side};

const SIDE_RIGHT: u8 = 0;
const SIDE_LEFT: u8 = 1;

#[derive(Debug, Error)]
pub enum CodecError {
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error("invalid side marker {0}")]
  InvalidSide(u8),
  #[error("leaf index {index} is not below the leaf count {num_of_leaves}")]
  InvalidLeafIndex { index: u64, num_of_leaves: u64 },
  #[error("length {0} does not fit in its field")]
  Oversize(u64),
  #[error("expected {expected} bytes but the input ended after {actual}")]
  Truncated { expected: u64, actual: u64 },
}

fn narrow<T: TryFrom<u64>>(n: u64) -> Result<T, CodecError> {
  T::try_from(n).map_err(|_| CodecError::Oversize(n))
}

/// Read a length-prefixed field without trusting the length for allocation.
fn read_field<R: Read>(r: &mut R, len: u64) -> Result<Vec<u8>, CodecError> {
  let mut buffer = Vec::new();
  r.take(len).read_to_end(&mut buffer)?;
  if buffer.len() as u64 != len {
    return Err(CodecError::Truncated { expected: len, actual: buffer.len() as u64 });
  }
  Ok(buffer)
}

impl<L: AsRef<[u8]>> MerkleProof<L> {
  /// Encode this proof into `w` and return the number of bytes written.
  pub fn write<W: Write>(&self, w: &mut W) -> Result<usize, CodecError> {
    let content = self.leaf_content.as_ref();
    w.write_u64::<LittleEndian>(self.num_of_leaves as u64)?;
    w.write_u64::<LittleEndian>(self.leaf_index as u64)?;
    w.write_u32::<LittleEndian>(narrow(content.len() as u64)?)?;
    w.write_all(content)?;
    w.write_u32::<LittleEndian>(narrow(self.hashes.len() as u64)?)?;
    let mut size = 8 + 8 + 4 + content.len() + 4;

    for (side, value) in self.audit_path() {
      let bytes = value.to_bytes();
      w.write_u8(if side.is_left() { SIDE_LEFT } else { SIDE_RIGHT })?;
      w.write_u8(narrow(bytes.len() as u64)?)?;
      w.write_all(&bytes)?;
      size += 1 + 1 + bytes.len();
    }
    Ok(size)
  }

  pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::new();
    self.write(&mut buffer)?;
    Ok(buffer)
  }
}

impl MerkleProof<Vec<u8>> {
  /// Decode a proof written by [`MerkleProof::write`]. Audit nodes come back
  /// as detached nodes carrying only their value and side.
  pub fn read<R: Read>(r: &mut R) -> Result<Self, CodecError> {
    let num_of_leaves = r.read_u64::<LittleEndian>()?;
    let index = r.read_u64::<LittleEndian>()?;
    if index >= num_of_leaves {
      return Err(CodecError::InvalidLeafIndex { index, num_of_leaves });
    }

    let content_len = r.read_u32::<LittleEndian>()?;
    let leaf_content = read_field(r, content_len as u64)?;

    let count = r.read_u32::<LittleEndian>()?;
    let mut hashes = Vec::with_capacity(count.min(64) as usize);
    for _ in 0..count {
      let side = match r.read_u8()? {
        SIDE_LEFT => Side::Left,
        SIDE_RIGHT => Side::Right,
        other => return Err(CodecError::InvalidSide(other)),
      };
      let len = r.read_u8()?;
      let bytes = read_field(r, len as u64)?;
      hashes.push(Node::new_detached(Digest::from_bytes(&bytes), side));
    }

    Ok(MerkleProof { hashes, num_of_leaves: narrow(num_of_leaves)?, leaf_index: narrow(index)?, leaf_content })
  }

  pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
    Self::read(&mut Cursor::new(bytes))
  }
}

#[cfg(test)]
mod tests {
  use std::fs::File;
  use std::io::{BufReader, BufWriter};

  use tempfile::NamedTempFile;

  use super::*;
  use crate::{merkle_proof, merkle_root, verify_proof};

  fn leaves(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("leaf-{i}")).collect()
  }

  #[test]
  fn decoded_proof_verifies() {
    for n in 1..=12 {
      let leaves = leaves(n);
      let root = merkle_root(&leaves).unwrap();
      for i in 0..n {
        let proof = merkle_proof(&leaves, i).unwrap();
        let bytes = proof.to_bytes().unwrap();
        assert_eq!(bytes.len(), proof.write(&mut Vec::new()).unwrap());

        let decoded = MerkleProof::from_slice(&bytes).unwrap();
        assert_eq!(n, decoded.num_of_leaves);
        assert_eq!(i, decoded.leaf_index);
        assert_eq!(leaves[i].as_bytes(), decoded.leaf_content.as_slice());
        assert_eq!(proof.audit_path().collect::<Vec<_>>(), decoded.audit_path().collect::<Vec<_>>());
        assert!(verify_proof(&root, &decoded), "n={n}, i={i}");
      }
    }
  }

  #[test]
  fn file_round_trip() {
    let leaves = leaves(7);
    let root = merkle_root(&leaves).unwrap();
    let proof = merkle_proof(&leaves, 6).unwrap();

    let temp_file = NamedTempFile::new().unwrap();
    {
      let mut w = BufWriter::new(File::create(temp_file.path()).unwrap());
      proof.write(&mut w).unwrap();
    }
    let mut r = BufReader::new(File::open(temp_file.path()).unwrap());
    let mut decoded = MerkleProof::read(&mut r).unwrap();
    assert!(verify_proof(&root, &decoded));

    decoded.leaf_content.extend_from_slice(b"tainted");
    assert!(!verify_proof(&root, &decoded));
  }

  #[test]
  fn truncated_input_is_rejected() {
    let proof = merkle_proof(&leaves(5), 1).unwrap();
    let bytes = proof.to_bytes().unwrap();
    for len in [0, 7, 16] {
      assert!(matches!(MerkleProof::from_slice(&bytes[..len]), Err(CodecError::Io(_))), "len={len}");
    }
    assert!(matches!(MerkleProof::from_slice(&bytes[..20]), Err(CodecError::Truncated { expected: 6, actual: 0 })));
    assert!(matches!(
      MerkleProof::from_slice(&bytes[..bytes.len() - 1]),
      Err(CodecError::Truncated { expected: 32, actual: 31 })
    ));
  }

  #[test]
  fn oversized_content_length_is_rejected() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2u64.to_le_bytes());
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    bytes.extend_from_slice(b"short");
    assert!(matches!(
      MerkleProof::from_slice(&bytes),
      Err(CodecError::Truncated { expected, actual: 5 }) if expected == u32::MAX as u64
    ));
  }

  #[test]
  fn invalid_side_is_rejected() {
    let proof = merkle_proof(&leaves(2), 0).unwrap();
    let mut bytes = proof.to_bytes().unwrap();
    let side_at = 8 + 8 + 4 + "leaf-0".len() + 4;
    bytes[side_at] = 7;
    assert!(matches!(MerkleProof::from_slice(&bytes), Err(CodecError::InvalidSide(7))));
  }

  #[test]
  fn invalid_leaf_index_is_rejected() {
    let proof = merkle_proof(&leaves(3), 2).unwrap();
    let mut bytes = proof.to_bytes().unwrap();
    bytes[8..16].copy_from_slice(&3u64.to_le_bytes());
    assert!(matches!(
      MerkleProof::from_slice(&bytes),
      Err(CodecError::InvalidLeafIndex { index: 3, num_of_leaves: 3 })
    ));
  }
}

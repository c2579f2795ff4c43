//! Binary hash (merkle) trees over ordered leaves, with membership proofs
//! for a single leaf at a given position.
//!
//! ```
//! let leaves = ["abc", "bcd", "cde", "def", "efg"];
//! let root = merkle_tree::merkle_root(&leaves).unwrap();
//! assert_eq!(root.value(), "b12bb480c5d29242ab22fe53c199c26a5a5bd1ac66ac2702099855ceaf006073");
//!
//! let proof = merkle_tree::merkle_proof(&leaves, 1).unwrap();
//! assert!(merkle_tree::verify_proof(&root, &proof));
//! ```
use std::rc::Rc;

pub mod digest;
pub mod hashtree;

pub use digest::{Blake3, Digest, DigestError, Hasher, Sha256, hash};
pub use hashtree::binary::{MerkleProof, MerkleTree};
pub use hashtree::codec::CodecError;
pub use hashtree::node::{Node, Side};
pub use hashtree::{MerkleError, Result};

/// Root node of the SHA-256 tree over `leaves`.
pub fn merkle_root<L: AsRef<[u8]>>(leaves: &[L]) -> Result<Rc<Node>> {
  MerkleTree::<Sha256>::root(leaves)
}

/// SHA-256 membership proof for the leaf at `leaf_index`.
pub fn merkle_proof<L: AsRef<[u8]> + Clone>(leaves: &[L], leaf_index: usize) -> Result<MerkleProof<L>> {
  MerkleTree::<Sha256>::proof(leaves, leaf_index)
}

/// Whether the SHA-256 proof recomputes `root`; a mismatch is `false`, not an error.
pub fn verify_proof<L: AsRef<[u8]>>(root: &Node, proof: &MerkleProof<L>) -> bool {
  MerkleTree::<Sha256>::verify(root, proof)
}

#[inline]
pub fn splitmix64(x: u64) -> u64 {
  let mut z = x.wrapping_add(0x9e3779b97f4a7c15);
  z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
  z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
  z ^ (z >> 31)
}

/// Deterministic pseudo-random leaves for benchmarks.
pub fn workload(n: u64) -> Vec<String> {
  (0..n).map(|i| format!("{:016x}", splitmix64(i))).collect()
}

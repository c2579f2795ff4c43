use thiserror::Error;

pub mod binary;
pub mod codec;
pub mod node;

pub type Result<T> = std::result::Result<T, MerkleError>;

/// Invalid arguments to tree construction or proof generation.
///
/// A proof that does not match a root is not an error; verification reports
/// it as `false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
  #[error("a merkle tree needs at least one leaf")]
  EmptyLeaves,
  #[error("leaf index {index} is out of range for {len} leaves")]
  LeafIndexOutOfRange { index: usize, len: usize },
}

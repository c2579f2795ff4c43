use std::marker::PhantomData;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::digest::{Digest, Hasher, Sha256};
use crate::hashtree::node::{Node, Side};
use crate::hashtree::{MerkleError, Result};


/// Information needed to verify that one leaf belongs to a merkle tree.
#[derive(Debug, Clone)]
pub struct MerkleProof<L> {
  /// Audit nodes from the bottom-most level up to the one right below the root.
  pub hashes: Vec<Rc<Node>>,
  /// Number of leaves in the tree the proof was generated from.
  pub num_of_leaves: usize,
  /// 0-based index of the proven leaf.
  pub leaf_index: usize,
  /// Unhashed content of the proven leaf.
  pub leaf_content: L,
}

impl<L> MerkleProof<L> {
  /// Side and value of each audit node, bottom-up.
  pub fn audit_path(&self) -> impl Iterator<Item = (Side, &Digest)> {
    self.hashes.iter().map(|node| (if node.is_left() { Side::Left } else { Side::Right }, node.value()))
  }
}

/// Builds binary hash trees bottom-up with the digest function `H`.
///
/// Nodes are paired left to right on each level. When a level has an odd
/// number of nodes the last one is carried up unchanged instead of being
/// paired with itself.
#[derive(Debug)]
pub struct MerkleTree<H: Hasher = Sha256> {
  _hasher: PhantomData<H>,
}

impl<H: Hasher> MerkleTree<H> {
  fn leaf_nodes<L: AsRef<[u8]>>(leaves: &[L]) -> Vec<Rc<Node>> {
    leaves.iter().map(|leaf| Node::new_leaf::<H>(leaf.as_ref())).collect()
  }

  /// Join sibling pairs of one level into the next level up.
  fn next_level(nodes: Vec<Rc<Node>>) -> Vec<Rc<Node>> {
    let mut parents = Vec::with_capacity(nodes.len().div_ceil(2));
    let mut nodes = nodes.into_iter();
    while let Some(left) = nodes.next() {
      match nodes.next() {
        Some(right) => parents.push(Node::new_internal::<H>(left, right)),
        None => parents.push(left), // last node has no sibling
      }
    }
    parents
  }

  /// Build the tree over `leaves` and return its root node.
  pub fn root<L: AsRef<[u8]>>(leaves: &[L]) -> Result<Rc<Node>> {
    if leaves.is_empty() {
      return Err(MerkleError::EmptyLeaves);
    }
    let mut nodes = Self::leaf_nodes(leaves);
    let mut depth = 0;
    while nodes.len() > 1 {
      debug!(hasher = H::NAME, depth, width = nodes.len(), "joining level");
      nodes = Self::next_level(nodes);
      depth += 1;
    }
    nodes.pop().ok_or(MerkleError::EmptyLeaves)
  }

  /// Build the tree over `leaves` and collect the audit path of the leaf at
  /// `leaf_index`.
  ///
  /// At each level the sibling of the tracked node is recorded, then the
  /// tracked index moves to its parent's position. A tracked node carried up
  /// from the end of an odd level has no sibling and contributes nothing on
  /// that level.
  pub fn proof<L: AsRef<[u8]> + Clone>(leaves: &[L], leaf_index: usize) -> Result<MerkleProof<L>> {
    if leaf_index >= leaves.len() {
      return Err(MerkleError::LeafIndexOutOfRange { index: leaf_index, len: leaves.len() });
    }
    let mut nodes = Self::leaf_nodes(leaves);
    let mut tracked = leaf_index;
    let mut hashes = Vec::new();
    while nodes.len() > 1 {
      let sibling = if tracked % 2 == 0 { tracked + 1 } else { tracked - 1 };
      if let Some(node) = nodes.get(sibling) {
        trace!(tracked, sibling, value = %node.value(), "audit node");
        hashes.push(node.clone());
      }
      tracked /= 2;
      nodes = Self::next_level(nodes);
    }
    debug!(hasher = H::NAME, leaf_index, audit_nodes = hashes.len(), "proof generated");
    Ok(MerkleProof { hashes, num_of_leaves: leaves.len(), leaf_index, leaf_content: leaves[leaf_index].clone() })
  }

  /// Root value implied by the proof's leaf content and audit path.
  pub fn compute_root<L: AsRef<[u8]>>(proof: &MerkleProof<L>) -> Digest {
    let mut result = H::digest(proof.leaf_content.as_ref());
    for audit in &proof.hashes {
      result = if audit.is_left() { H::combine(audit.value(), &result) } else { H::combine(&result, audit.value()) };
    }
    result
  }

  /// Whether the proof recomputes the value of `root`.
  pub fn verify<L: AsRef<[u8]>>(root: &Node, proof: &MerkleProof<L>) -> bool {
    let verified = Self::compute_root(proof) == *root.value();
    debug!(hasher = H::NAME, leaf_index = proof.leaf_index, verified, "proof verified");
    verified
  }
}

use std::cell::OnceCell;
use std::rc::{Rc, Weak};

use crate::digest::{Digest, Hasher};

/// Which child of its parent a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
  Left,
  Right,
}

impl Side {
  pub fn is_left(self) -> bool {
    self == Side::Left
  }
}

/// Node representation in the hash tree.
///
/// Children are owned top-down. The parent link is a [`Weak`] back-reference
/// so dropping the root releases the whole tree. `parent` and `side` are
/// written once, when the node is joined under a new parent.
///
/// Nodes are only built by [`MerkleTree`](crate::MerkleTree), so a node
/// already in a tree cannot be joined under another parent:
///
/// ```compile_fail
/// use merkle_tree::{Node, Sha256, merkle_proof};
///
/// let proof = merkle_proof(&["a", "b", "c", "d"], 0).unwrap();
/// let leaf = Node::new_leaf::<Sha256>(b"z");
/// Node::new_internal::<Sha256>(proof.hashes[0].clone(), leaf);
/// ```
#[derive(Debug)]
pub struct Node {
  value: Digest,
  children: Option<(Rc<Node>, Rc<Node>)>,
  parent: OnceCell<Weak<Node>>,
  side: OnceCell<Side>,
  leaves: u64,
}

impl Node {
  pub(crate) fn new_leaf<H: Hasher>(content: &[u8]) -> Rc<Self> {
    Rc::new(Node { value: H::digest(content), children: None, parent: OnceCell::new(), side: OnceCell::new(), leaves: 1 })
  }

  /// Create the parent of `left` and `right` and link both children to it.
  pub(crate) fn new_internal<H: Hasher>(left: Rc<Node>, right: Rc<Node>) -> Rc<Self> {
    let value = H::combine(&left.value, &right.value);
    let leaves = left.leaves + right.leaves;
    Rc::new_cyclic(|parent| {
      left.link(parent, Side::Left);
      right.link(parent, Side::Right);
      Node { value, children: Some((left, right)), parent: OnceCell::new(), side: OnceCell::new(), leaves }
    })
  }

  /// A node outside any tree that only carries an audit value and its side,
  /// as restored from an encoded proof.
  pub(crate) fn new_detached(value: Digest, side: Side) -> Rc<Self> {
    let node = Node { value, children: None, parent: OnceCell::new(), side: OnceCell::new(), leaves: 1 };
    let _ = node.side.set(side);
    Rc::new(node)
  }

  fn link(&self, parent: &Weak<Node>, side: Side) {
    let linked = self.parent.set(parent.clone()).is_ok() && self.side.set(side).is_ok();
    debug_assert!(linked, "node joined under a second parent");
  }

  pub fn value(&self) -> &Digest {
    &self.value
  }

  pub fn left(&self) -> Option<&Rc<Node>> {
    self.children.as_ref().map(|(left, _)| left)
  }

  pub fn right(&self) -> Option<&Rc<Node>> {
    self.children.as_ref().map(|(_, right)| right)
  }

  pub fn is_leaf(&self) -> bool {
    self.children.is_none()
  }

  /// The parent node, if this node was joined and the parent is still alive.
  pub fn parent(&self) -> Option<Rc<Node>> {
    self.parent.get().and_then(Weak::upgrade)
  }

  pub fn side(&self) -> Option<Side> {
    self.side.get().copied()
  }

  /// Unlinked nodes (the root) report left.
  pub fn is_left(&self) -> bool {
    self.side().is_none_or(Side::is_left)
  }

  /// Number of leaves under this node.
  pub fn leaf_count(&self) -> u64 {
    self.leaves
  }
}

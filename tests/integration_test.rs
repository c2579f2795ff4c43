use merkle_tree::{MerkleError, MerkleProof, hash, merkle_proof, merkle_root, verify_proof};

const ROOT: &str = "b12bb480c5d29242ab22fe53c199c26a5a5bd1ac66ac2702099855ceaf006073";

fn data() -> Vec<String> {
  ["abc", "bcd", "cde", "def", "efg"].iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_integration() {
  let data = data();
  let root = merkle_root(&data).unwrap();
  assert_eq!(root.value(), ROOT);

  let mut proof = merkle_proof(&data, 1).unwrap();
  assert!(verify_proof(&root, &proof));
  proof.leaf_content += "tainted";
  assert!(!verify_proof(&root, &proof));
}

#[test]
fn test_every_leaf_of_known_tree() {
  let data = data();
  let root = merkle_root(&data).unwrap();
  for i in 0..data.len() {
    let proof = merkle_proof(&data, i).unwrap();
    assert!(verify_proof(&root, &proof), "{i}");
  }
}

#[test]
fn test_str_and_byte_leaves_agree() {
  let strs = ["abc", "bcd", "cde", "def", "efg"];
  let bytes = strs.iter().map(|s| s.as_bytes().to_vec()).collect::<Vec<_>>();
  assert_eq!(merkle_root(&strs).unwrap().value(), ROOT);
  assert_eq!(merkle_root(&bytes).unwrap().value(), ROOT);
}

#[test]
fn test_single_leaf() {
  let root = merkle_root(&["solo"]).unwrap();
  assert_eq!(*root.value(), hash("solo"));
  let proof = merkle_proof(&["solo"], 0).unwrap();
  assert!(proof.hashes.is_empty());
  assert!(verify_proof(&root, &proof));
}

#[test]
fn test_encoded_proof_against_known_root() {
  let data = data();
  let root = merkle_root(&data).unwrap();
  let bytes = merkle_proof(&data, 3).unwrap().to_bytes().unwrap();
  let proof = MerkleProof::from_slice(&bytes).unwrap();
  assert!(verify_proof(&root, &proof));
}

#[test]
fn test_invalid_arguments() {
  let empty: [&str; 0] = [];
  assert!(matches!(merkle_root(&empty), Err(MerkleError::EmptyLeaves)));
  assert!(matches!(merkle_proof(&data(), 5), Err(MerkleError::LeafIndexOutOfRange { index: 5, len: 5 })));
}

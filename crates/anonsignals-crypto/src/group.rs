//! Incremental Poseidon Merkle tree over member commitments.
//!
//! Leaves are appended left to right; empty positions hash as the zero value
//! of their level (`zeros[0] = 0`, `zeros[i + 1] = H(zeros[i], zeros[i])`).
//! The root depends on insertion order, so callers must supply members in
//! the order the membership list grew.

use crate::poseidon_canonical::{element_from_fr, fr_from_element, poseidon_hash2_fields};
use anonsignals_types::{AnonError, AnonResult, FieldElement, GROUP_TREE_DEPTH};
use ark_bn254::Fr;
use ark_ff::Zero;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct Group {
    depth: usize,
    zeros: Vec<Fr>,
    /// `nodes[level]` holds the non-empty prefix of that level.
    nodes: Vec<Vec<Fr>>,
    members: Vec<FieldElement>,
}

/// Sibling path for one leaf. `path_indices[i]` is true when the node at
/// level `i` is a right child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf: FieldElement,
    pub index: usize,
    pub siblings: Vec<FieldElement>,
    pub path_indices: Vec<bool>,
    pub root: FieldElement,
}

impl MerkleProof {
    pub fn verify(&self) -> bool {
        let mut current = fr_from_element(&self.leaf);
        for (sibling, is_right) in self.siblings.iter().zip(&self.path_indices) {
            let sibling = fr_from_element(sibling);
            current = if *is_right {
                poseidon_hash2_fields(sibling, current)
            } else {
                poseidon_hash2_fields(current, sibling)
            };
        }
        element_from_fr(&current) == self.root
    }
}

/// Flat, serializable form of a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    pub members: Vec<FieldElement>,
    pub depth: usize,
    pub size: usize,
    pub root: FieldElement,
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

impl Group {
    pub fn new() -> Self {
        Self::with_depth(GROUP_TREE_DEPTH)
    }

    pub fn with_depth(depth: usize) -> Self {
        let mut zeros = Vec::with_capacity(depth + 1);
        let mut current = Fr::zero();
        zeros.push(current);
        for _ in 0..depth {
            current = poseidon_hash2_fields(current, current);
            zeros.push(current);
        }

        Self {
            depth,
            zeros,
            nodes: vec![Vec::new(); depth + 1],
            members: Vec::new(),
        }
    }

    /// Inserts `members` one at a time, in the order given.
    pub fn rebuild(members: &[FieldElement]) -> AnonResult<Self> {
        Self::rebuild_with_depth(members, GROUP_TREE_DEPTH)
    }

    pub fn rebuild_with_depth(members: &[FieldElement], depth: usize) -> AnonResult<Self> {
        let mut group = Self::with_depth(depth);
        for member in members {
            group.insert(*member)?;
        }
        debug!("Rebuilt group: {} members, root {}", group.size(), group.root());
        Ok(group)
    }

    pub fn capacity(&self) -> usize {
        u32::try_from(self.depth)
            .ok()
            .and_then(|depth| 1usize.checked_shl(depth))
            .unwrap_or(usize::MAX)
    }

    pub fn insert(&mut self, commitment: FieldElement) -> AnonResult<usize> {
        let index = self.members.len();
        if index >= self.capacity() {
            return Err(AnonError::GroupFull {
                capacity: self.capacity(),
            });
        }

        let mut node = fr_from_element(&commitment);
        self.nodes[0].push(node);

        let mut position = index;
        for level in 0..self.depth {
            node = if position % 2 == 0 {
                poseidon_hash2_fields(node, self.zeros[level])
            } else {
                poseidon_hash2_fields(self.nodes[level][position - 1], node)
            };
            position /= 2;

            let parents = &mut self.nodes[level + 1];
            if position < parents.len() {
                parents[position] = node;
            } else {
                parents.push(node);
            }
        }

        self.members.push(commitment);
        Ok(index)
    }

    pub fn root(&self) -> FieldElement {
        let top = self.nodes[self.depth]
            .first()
            .copied()
            .unwrap_or(self.zeros[self.depth]);
        element_from_fr(&top)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[FieldElement] {
        &self.members
    }

    pub fn index_of(&self, commitment: &FieldElement) -> Option<usize> {
        self.members.iter().position(|m| m == commitment)
    }

    pub fn proof(&self, index: usize) -> AnonResult<MerkleProof> {
        let leaf = *self.members.get(index).ok_or_else(|| {
            AnonError::Internal(format!(
                "Leaf index {} out of range for group of {}",
                index,
                self.size()
            ))
        })?;

        let mut siblings = Vec::with_capacity(self.depth);
        let mut path_indices = Vec::with_capacity(self.depth);
        let mut position = index;
        for level in 0..self.depth {
            let sibling = self.nodes[level]
                .get(position ^ 1)
                .copied()
                .unwrap_or(self.zeros[level]);
            siblings.push(element_from_fr(&sibling));
            path_indices.push(position % 2 == 1);
            position /= 2;
        }

        Ok(MerkleProof {
            leaf,
            index,
            siblings,
            path_indices,
            root: self.root(),
        })
    }

    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            members: self.members.clone(),
            depth: self.depth,
            size: self.size(),
            root: self.root(),
        }
    }

    /// Re-inserts the snapshot's members and checks the recorded root.
    pub fn from_snapshot(snapshot: &GroupSnapshot) -> AnonResult<Self> {
        if snapshot.size != snapshot.members.len() {
            return Err(AnonError::Serialization(format!(
                "Group snapshot size {} does not match {} members",
                snapshot.size,
                snapshot.members.len()
            )));
        }
        if snapshot.depth != GROUP_TREE_DEPTH {
            return Err(AnonError::Serialization(format!(
                "Group snapshot depth {} is not the membership tree depth {}",
                snapshot.depth, GROUP_TREE_DEPTH
            )));
        }
        let group = Self::rebuild_with_depth(&snapshot.members, snapshot.depth)?;
        if group.root() != snapshot.root {
            return Err(AnonError::Crypto(format!(
                "Group snapshot root {} does not match rebuilt root {}",
                snapshot.root,
                group.root()
            )));
        }
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poseidon_canonical::poseidon_hash;

    fn c(n: u64) -> FieldElement {
        FieldElement::from_u64(n)
    }

    #[test]
    fn test_empty_root_is_top_zero() {
        let group = Group::with_depth(3);
        let mut expected = FieldElement::zero();
        for _ in 0..3 {
            expected = poseidon_hash(&[expected, expected]);
        }
        assert_eq!(group.root(), expected);
    }

    #[test]
    fn test_root_matches_full_recomputation() {
        let group = Group::rebuild_with_depth(&[c(1), c(2), c(3)], 2).unwrap();
        let zero = FieldElement::zero();
        let left = poseidon_hash(&[c(1), c(2)]);
        let right = poseidon_hash(&[c(3), zero]);
        assert_eq!(group.root(), poseidon_hash(&[left, right]));
    }

    #[test]
    fn test_rebuild_is_order_dependent() {
        let ab = Group::rebuild(&[c(10), c(20)]).unwrap();
        let ba = Group::rebuild(&[c(20), c(10)]).unwrap();
        assert_ne!(ab.root(), ba.root());

        let again = Group::rebuild(&[c(10), c(20)]).unwrap();
        assert_eq!(ab.root(), again.root());
    }

    #[test]
    fn test_every_member_proof_verifies() {
        let members: Vec<_> = (1..=5).map(c).collect();
        let group = Group::rebuild(&members).unwrap();
        for (i, member) in members.iter().enumerate() {
            let proof = group.proof(i).unwrap();
            assert_eq!(&proof.leaf, member);
            assert_eq!(proof.siblings.len(), GROUP_TREE_DEPTH);
            assert!(proof.verify(), "proof for member {} failed", i);
        }
        assert!(!group.proof(0).unwrap().path_indices[0]);
        assert!(group.proof(1).unwrap().path_indices[0]);
        assert!(group.proof(5).is_err());
    }

    #[test]
    fn test_tampered_proof_fails() {
        let group = Group::rebuild(&[c(1), c(2), c(3)]).unwrap();
        let mut proof = group.proof(2).unwrap();
        proof.siblings[0] = c(99);
        assert!(!proof.verify());
    }

    #[test]
    fn test_capacity_enforced() {
        let mut group = Group::with_depth(2);
        for n in 0..4 {
            group.insert(c(n + 1)).unwrap();
        }
        let err = group.insert(c(5)).unwrap_err();
        assert!(matches!(err, AnonError::GroupFull { capacity: 4 }));
        assert_eq!(group.size(), 4);
    }

    #[test]
    fn test_index_of() {
        let group = Group::rebuild(&[c(7), c(8)]).unwrap();
        assert_eq!(group.index_of(&c(8)), Some(1));
        assert_eq!(group.index_of(&c(9)), None);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let group = Group::rebuild(&[c(1), c(2), c(3)]).unwrap();
        let json = serde_json::to_string(&group.snapshot()).unwrap();
        let snapshot: GroupSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot.size, 3);
        let restored = Group::from_snapshot(&snapshot).unwrap();
        assert_eq!(restored.root(), group.root());

        let mut tampered = snapshot.clone();
        tampered.members.swap(0, 1);
        assert!(Group::from_snapshot(&tampered).is_err());
    }

    #[test]
    fn test_snapshot_with_foreign_depth_is_rejected() {
        let snapshot: GroupSnapshot = serde_json::from_value(serde_json::json!({
            "members": ["1"],
            "depth": 64,
            "size": 1,
            "root": "0",
        }))
        .unwrap();
        assert!(matches!(
            Group::from_snapshot(&snapshot),
            Err(AnonError::Serialization(_))
        ));
    }

    #[test]
    fn test_capacity_saturates_for_oversized_depth() {
        let group = Group {
            depth: 64,
            zeros: Vec::new(),
            nodes: Vec::new(),
            members: Vec::new(),
        };
        assert_eq!(group.capacity(), usize::MAX);
        assert_eq!(Group::with_depth(3).capacity(), 8);
    }
}

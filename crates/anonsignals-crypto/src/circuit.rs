use ark_bn254::Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_r1cs_std::{
    alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::fp::FpVar, fields::FieldVar,
    select::CondSelectGadget,
};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::poseidon_canonical::{canonical_config, poseidon_hash_fields};

/// Group membership relation.
///
/// Witness: identity secret and the Merkle path of its commitment.
/// Public inputs, in allocation order: merkle root, nullifier, signal hash,
/// external nullifier. Verifiers read them positionally.
#[derive(Clone)]
pub struct MembershipCircuit {
    secret: Option<Fr>,
    siblings: Vec<Option<Fr>>,
    path_indices: Vec<Option<bool>>,
    merkle_root: Option<Fr>,
    nullifier: Option<Fr>,
    signal_hash: Option<Fr>,
    external_nullifier: Option<Fr>,
}

impl MembershipCircuit {
    pub fn new(
        secret: Fr,
        siblings: Vec<Fr>,
        path_indices: Vec<bool>,
        merkle_root: Fr,
        signal_hash: Fr,
        external_nullifier: Fr,
    ) -> Self {
        let nullifier = poseidon_hash_fields(&[external_nullifier, secret]);

        Self {
            secret: Some(secret),
            siblings: siblings.into_iter().map(Some).collect(),
            path_indices: path_indices.into_iter().map(Some).collect(),
            merkle_root: Some(merkle_root),
            nullifier: Some(nullifier),
            signal_hash: Some(signal_hash),
            external_nullifier: Some(external_nullifier),
        }
    }

    /// Shape-only instance for key generation.
    pub fn empty(depth: usize) -> Self {
        Self {
            secret: None,
            siblings: vec![None; depth],
            path_indices: vec![None; depth],
            merkle_root: None,
            nullifier: None,
            signal_hash: None,
            external_nullifier: None,
        }
    }

    pub fn nullifier(&self) -> Option<Fr> {
        self.nullifier
    }

    /// Public inputs in verifier order, when the instance is fully assigned.
    pub fn public_inputs(&self) -> Option<Vec<Fr>> {
        Some(vec![
            self.merkle_root?,
            self.nullifier?,
            self.signal_hash?,
            self.external_nullifier?,
        ])
    }
}

impl ConstraintSynthesizer<Fr> for MembershipCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let secret = FpVar::new_witness(cs.clone(), || {
            self.secret.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let mut siblings = Vec::with_capacity(self.siblings.len());
        for sibling in &self.siblings {
            siblings.push(FpVar::new_witness(cs.clone(), || {
                sibling.ok_or(SynthesisError::AssignmentMissing)
            })?);
        }

        let mut path_indices = Vec::with_capacity(self.path_indices.len());
        for is_right in &self.path_indices {
            path_indices.push(Boolean::new_witness(cs.clone(), || {
                is_right.ok_or(SynthesisError::AssignmentMissing)
            })?);
        }

        let merkle_root = FpVar::new_input(cs.clone(), || {
            self.merkle_root.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let nullifier = FpVar::new_input(cs.clone(), || {
            self.nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let signal_hash = FpVar::new_input(cs.clone(), || {
            self.signal_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let external_nullifier = FpVar::new_input(cs.clone(), || {
            self.external_nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let commitment = poseidon_hash_circuit(cs.clone(), &[secret.clone()])?;

        let computed_root =
            compute_merkle_root_circuit(cs.clone(), &commitment, &siblings, &path_indices)?;
        computed_root.enforce_equal(&merkle_root)?;

        let computed_nullifier = poseidon_hash_circuit(cs, &[external_nullifier, secret])?;
        computed_nullifier.enforce_equal(&nullifier)?;

        // Ties the signal hash into the constraint system so the proof cannot
        // be replayed with a different message.
        let _signal_square = signal_hash.square()?;

        Ok(())
    }
}

pub fn poseidon_hash_circuit(
    cs: ConstraintSystemRef<Fr>,
    inputs: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::new(cs, canonical_config());
    sponge.absorb(&inputs)?;

    let output = sponge.squeeze_field_elements(1)?;
    Ok(output[0].clone())
}

pub fn compute_merkle_root_circuit(
    cs: ConstraintSystemRef<Fr>,
    leaf: &FpVar<Fr>,
    path: &[FpVar<Fr>],
    indices: &[Boolean<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut current = leaf.clone();

    for (sibling, is_right) in path.iter().zip(indices.iter()) {
        let left = FpVar::conditionally_select(is_right, sibling, &current)?;
        let right = FpVar::conditionally_select(is_right, &current, sibling)?;

        current = poseidon_hash_circuit(cs.clone(), &[left, right])?;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Group;
    use crate::identity::derive_identity;
    use crate::poseidon_canonical::fr_from_element;
    use ark_relations::r1cs::ConstraintSystem;
    use anonsignals_types::FieldElement;

    fn assigned_circuit(group: &Group, user_id: &str) -> MembershipCircuit {
        let identity = derive_identity(user_id);
        let index = group.index_of(identity.commitment()).unwrap();
        let proof = group.proof(index).unwrap();
        MembershipCircuit::new(
            fr_from_element(identity.secret()),
            proof.siblings.iter().map(fr_from_element).collect(),
            proof.path_indices.clone(),
            fr_from_element(&group.root()),
            Fr::from(11u64),
            Fr::from(22u64),
        )
    }

    fn small_group() -> Group {
        let members: Vec<FieldElement> = ["alice", "bob", "carol"]
            .iter()
            .map(|u| *derive_identity(u).commitment())
            .collect();
        Group::rebuild_with_depth(&members, 4).unwrap()
    }

    #[test]
    fn test_member_satisfies_constraints() {
        let group = small_group();
        let cs = ConstraintSystem::<Fr>::new_ref();
        assigned_circuit(&group, "bob")
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_instance_variables(), 5);
    }

    #[test]
    fn test_wrong_root_is_unsatisfied() {
        let group = small_group();
        let mut circuit = assigned_circuit(&group, "carol");
        circuit.merkle_root = Some(Fr::from(1u64));
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_wrong_nullifier_is_unsatisfied() {
        let group = small_group();
        let mut circuit = assigned_circuit(&group, "alice");
        circuit.nullifier = Some(Fr::from(5u64));
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_circuit_nullifier_matches_identity() {
        let group = small_group();
        let circuit = assigned_circuit(&group, "alice");
        let expected = derive_identity("alice").nullifier(&FieldElement::from_u64(22));
        assert_eq!(circuit.nullifier(), Some(fr_from_element(&expected)));
    }
}

use anonsignals_types::{AnonError, AnonResult, ProofBundle, Signal};
use tracing::{info, warn};

use crate::group::Group;
use crate::hasher::hash_signal;
use crate::identity::Identity;
use crate::prover::MembershipProver;

/// Binds an identity, a group and a (message, scope) pair into a
/// submit-ready [`ProofBundle`].
///
/// The public signal and external nullifier are recomputed with the
/// canonical hasher and must agree with what the circuit committed to;
/// a disagreement means the bundle would never verify.
pub struct ProofGenerator<P> {
    prover: P,
}

impl<P: MembershipProver> ProofGenerator<P> {
    pub fn new(prover: P) -> Self {
        Self { prover }
    }

    pub fn prover(&self) -> &P {
        &self.prover
    }

    pub fn generate(
        &self,
        identity: &Identity,
        group: &Group,
        message: &Signal,
        scope: &Signal,
    ) -> AnonResult<ProofBundle> {
        let proof = self
            .prover
            .prove(identity, group, message, scope)
            .map_err(|e| match e {
                AnonError::ProofGenerationFailed(_) => e,
                other => AnonError::ProofGenerationFailed(other.to_string()),
            })?;

        let signal_hash = hash_signal(message);
        let external_nullifier = hash_signal(scope);

        if proof.signal_hash != signal_hash {
            warn!("Circuit signal hash {} differs from canonical {}", proof.signal_hash, signal_hash);
            return Err(AnonError::ProofGenerationFailed(
                "Circuit signal hash does not match the canonical message hash".into(),
            ));
        }
        if proof.external_nullifier != external_nullifier {
            warn!(
                "Circuit external nullifier {} differs from canonical {}",
                proof.external_nullifier, external_nullifier
            );
            return Err(AnonError::ProofGenerationFailed(
                "Circuit external nullifier does not match the canonical scope hash".into(),
            ));
        }
        if proof.merkle_tree_root != group.root() {
            return Err(AnonError::ProofGenerationFailed(format!(
                "Proof root {} does not match group root {}",
                proof.merkle_tree_root,
                group.root()
            )));
        }

        let bundle = ProofBundle::new(
            proof.points,
            proof.merkle_tree_depth,
            proof.merkle_tree_root,
            proof.nullifier,
            signal_hash,
            external_nullifier,
        );

        info!(
            "Generated proof bundle: root {}, nullifier {}",
            bundle.merkle_tree_root, bundle.nullifier
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::MembershipCircuit;
    use crate::identity::derive_identity;
    use crate::poseidon_canonical::fr_from_element;
    use crate::prover::{Groth16MembershipProver, MembershipProof};
    use anonsignals_types::{FieldElement, Groth16Points, GROUP_TREE_DEPTH};
    use ark_bn254::Fr;
    use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};

    fn dummy_points() -> Groth16Points {
        Groth16Points {
            pi_a: vec!["1".into(), "2".into(), "1".into()],
            pi_b: vec![
                vec!["0".into(), "0".into()],
                vec!["1".into(), "0".into()],
                vec!["0".into(), "0".into()],
            ],
            pi_c: vec!["1".into(), "2".into(), "1".into()],
            protocol: "groth16".into(),
            curve: "bn128".into(),
        }
    }

    /// Synthesizes the real circuit and checks satisfiability instead of
    /// running the Groth16 prover.
    struct ConstraintCheckingProver;

    impl MembershipProver for ConstraintCheckingProver {
        fn prove(
            &self,
            identity: &Identity,
            group: &Group,
            message: &Signal,
            scope: &Signal,
        ) -> AnonResult<MembershipProof> {
            let index = group
                .index_of(identity.commitment())
                .ok_or_else(|| AnonError::ProofGenerationFailed("not a member".into()))?;
            let path = group.proof(index)?;
            let signal_hash = hash_signal(message);
            let external_nullifier = hash_signal(scope);
            let circuit = MembershipCircuit::new(
                fr_from_element(identity.secret()),
                path.siblings.iter().map(fr_from_element).collect(),
                path.path_indices.clone(),
                fr_from_element(&path.root),
                fr_from_element(&signal_hash),
                fr_from_element(&external_nullifier),
            );
            let cs = ConstraintSystem::<Fr>::new_ref();
            circuit
                .generate_constraints(cs.clone())
                .map_err(|e| AnonError::Crypto(e.to_string()))?;
            if !cs.is_satisfied().map_err(|e| AnonError::Crypto(e.to_string()))? {
                return Err(AnonError::Crypto("constraints unsatisfied".into()));
            }
            Ok(MembershipProof {
                points: dummy_points(),
                merkle_tree_root: path.root,
                merkle_tree_depth: group.depth(),
                nullifier: identity.nullifier(&external_nullifier),
                signal_hash,
                external_nullifier,
            })
        }
    }

    /// A prover that encodes the message its own way.
    struct DivergentProver;

    impl MembershipProver for DivergentProver {
        fn prove(
            &self,
            identity: &Identity,
            group: &Group,
            _message: &Signal,
            scope: &Signal,
        ) -> AnonResult<MembershipProof> {
            let external_nullifier = hash_signal(scope);
            Ok(MembershipProof {
                points: dummy_points(),
                merkle_tree_root: group.root(),
                merkle_tree_depth: group.depth(),
                nullifier: identity.nullifier(&external_nullifier),
                signal_hash: FieldElement::from_u64(1),
                external_nullifier,
            })
        }
    }

    fn three_member_group() -> (Vec<Identity>, Group) {
        let identities: Vec<Identity> = ["anon_c1", "anon_c2", "anon_c3"]
            .iter()
            .map(|u| derive_identity(u))
            .collect();
        let members: Vec<FieldElement> = identities.iter().map(|i| *i.commitment()).collect();
        let group = Group::rebuild(&members).unwrap();
        (identities, group)
    }

    #[test]
    fn test_scope_is_group_root() {
        let (identities, group) = three_member_group();
        let generator = ProofGenerator::new(ConstraintCheckingProver);
        let scope = Signal::Number(group.root());

        let bundle = generator
            .generate(&identities[1], &group, &Signal::text("post-1:yes"), &scope)
            .unwrap();

        assert_eq!(bundle.merkle_tree_root, group.root());
        assert_eq!(bundle.public_signals[0], group.root());
        assert_eq!(bundle.merkle_tree_depth, GROUP_TREE_DEPTH);
        assert_eq!(bundle.external_nullifier, hash_signal(&scope));
        assert!(bundle.is_consistent());
    }

    #[test]
    fn test_nullifier_stable_per_scope() {
        let (identities, group) = three_member_group();
        let generator = ProofGenerator::new(ConstraintCheckingProver);
        let scope = Signal::text("group-42");

        let first = generator
            .generate(&identities[0], &group, &Signal::text("hello"), &scope)
            .unwrap();
        let second = generator
            .generate(&identities[0], &group, &Signal::text("another message"), &scope)
            .unwrap();
        let other_scope = generator
            .generate(&identities[0], &group, &Signal::text("hello"), &Signal::text("group-43"))
            .unwrap();

        assert_eq!(first.nullifier, second.nullifier);
        assert_ne!(first.nullifier, other_scope.nullifier);
    }

    #[test]
    fn test_non_member_fails() {
        let (_, group) = three_member_group();
        let outsider = derive_identity("anon_outsider");
        let generator = ProofGenerator::new(ConstraintCheckingProver);
        let err = generator
            .generate(&outsider, &group, &Signal::text("hi"), &Signal::text("scope"))
            .unwrap_err();
        assert!(matches!(err, AnonError::ProofGenerationFailed(_)));
    }

    #[test]
    fn test_prover_errors_become_generation_failures() {
        let (identities, _) = three_member_group();
        let other_group = Group::rebuild(&[*identities[0].commitment()]).unwrap();
        // identity 1 is not in `other_group`
        let err = ProofGenerator::new(ConstraintCheckingProver)
            .generate(&identities[1], &other_group, &Signal::text("x"), &Signal::text("y"))
            .unwrap_err();
        assert!(matches!(err, AnonError::ProofGenerationFailed(_)));
    }

    #[test]
    fn test_hash_disagreement_is_rejected() {
        let (identities, group) = three_member_group();
        let err = ProofGenerator::new(DivergentProver)
            .generate(&identities[0], &group, &Signal::text("hi"), &Signal::text("scope"))
            .unwrap_err();
        assert!(matches!(err, AnonError::ProofGenerationFailed(_)));
    }

    #[test]
    #[ignore] // Groth16 setup over depth 20 takes minutes in debug builds
    fn test_full_groth16_proof_round_trip() {
        let mut rng = ark_std::rand::thread_rng();
        let prover = Groth16MembershipProver::setup(&mut rng).unwrap();
        let (identities, group) = three_member_group();
        let generator = ProofGenerator::new(prover);
        let scope = Signal::Number(group.root());

        let bundle = generator
            .generate(&identities[2], &group, &Signal::text("vote"), &scope)
            .unwrap();

        assert_eq!(bundle.merkle_tree_root, group.root());
        assert!(generator.prover().verify(&bundle).unwrap());

        let mut forged = bundle.clone();
        forged.public_signals[2] = FieldElement::from_u64(7);
        forged.signal_hash = FieldElement::from_u64(7);
        assert!(!generator.prover().verify(&forged).unwrap());

        let vk = generator.prover().verifying_key_json();
        assert_eq!(vk["nPublic"], 4);
        assert_eq!(vk["IC"].as_array().unwrap().len(), 5);

        let bytes = generator.prover().to_bytes().unwrap();
        let restored = Groth16MembershipProver::from_bytes(&bytes).unwrap();
        assert!(restored.verify(&bundle).unwrap());
    }
}

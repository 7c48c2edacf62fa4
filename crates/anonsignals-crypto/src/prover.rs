use anonsignals_types::{
    AnonError, AnonResult, FieldElement, Groth16Points, ProofBundle, Signal, GROUP_TREE_DEPTH,
};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use ark_std::rand::{thread_rng, CryptoRng, RngCore};
use tracing::{debug, info};

use crate::circuit::MembershipCircuit;
use crate::group::Group;
use crate::hasher::hash_signal;
use crate::identity::Identity;
use crate::poseidon_canonical::fr_from_element;
use crate::snarkjs::{points_to_proof, proof_to_points, verifying_key_json};

/// Output of the membership circuit: proof points plus the public values
/// the circuit committed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipProof {
    pub points: Groth16Points,
    pub merkle_tree_root: FieldElement,
    pub merkle_tree_depth: usize,
    pub nullifier: FieldElement,
    pub signal_hash: FieldElement,
    pub external_nullifier: FieldElement,
}

/// The membership-proof circuit as seen by the pipeline. `message` and
/// `scope` are passed raw; the prover encodes them itself.
pub trait MembershipProver: Send + Sync {
    fn prove(
        &self,
        identity: &Identity,
        group: &Group,
        message: &Signal,
        scope: &Signal,
    ) -> AnonResult<MembershipProof>;
}

pub struct Groth16MembershipProver {
    proving_key: ProvingKey<Bn254>,
    prepared_vk: PreparedVerifyingKey<Bn254>,
}

impl Groth16MembershipProver {
    /// Circuit-specific setup for depth-20 groups. Slow; run once and keep
    /// the serialized proving key.
    pub fn setup<R: RngCore + CryptoRng>(rng: &mut R) -> AnonResult<Self> {
        info!("Generating membership proving/verifying keys (this may take a while)...");
        let circuit = MembershipCircuit::empty(GROUP_TREE_DEPTH);
        let (pk, _vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, rng)
            .map_err(|e| AnonError::Crypto(format!("Failed to generate keys: {}", e)))?;
        Self::from_proving_key(pk)
    }

    pub fn from_proving_key(proving_key: ProvingKey<Bn254>) -> AnonResult<Self> {
        let prepared_vk = Groth16::<Bn254>::process_vk(&proving_key.vk)
            .map_err(|e| AnonError::Crypto(format!("Failed to prepare VK: {}", e)))?;
        Ok(Self {
            proving_key,
            prepared_vk,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> AnonResult<Self> {
        let pk = ProvingKey::<Bn254>::deserialize_compressed(bytes)
            .map_err(|e| AnonError::Crypto(format!("Failed to deserialize proving key: {}", e)))?;
        Self::from_proving_key(pk)
    }

    pub fn to_bytes(&self) -> AnonResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| AnonError::Crypto(format!("Failed to serialize proving key: {}", e)))?;
        Ok(bytes)
    }

    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.proving_key.vk
    }

    /// Verifying key in the snarkjs JSON layout used for relayer registration.
    pub fn verifying_key_json(&self) -> serde_json::Value {
        verifying_key_json(self.verifying_key())
    }

    /// Checks a bundle locally against this key.
    pub fn verify(&self, bundle: &ProofBundle) -> AnonResult<bool> {
        if !bundle.is_consistent() {
            return Ok(false);
        }
        let proof = points_to_proof(&bundle.proof)?;
        let inputs: Vec<Fr> = bundle.public_signals.iter().map(fr_from_element).collect();
        Groth16::<Bn254>::verify_with_processed_vk(&self.prepared_vk, &inputs, &proof)
            .map_err(|e| AnonError::Crypto(format!("Proof verification error: {}", e)))
    }
}

impl MembershipProver for Groth16MembershipProver {
    fn prove(
        &self,
        identity: &Identity,
        group: &Group,
        message: &Signal,
        scope: &Signal,
    ) -> AnonResult<MembershipProof> {
        if group.depth() != GROUP_TREE_DEPTH {
            return Err(AnonError::ProofGenerationFailed(format!(
                "Group depth {} does not match circuit depth {}",
                group.depth(),
                GROUP_TREE_DEPTH
            )));
        }

        let index = group.index_of(identity.commitment()).ok_or_else(|| {
            AnonError::ProofGenerationFailed("Identity commitment is not a member of the group".into())
        })?;
        let path = group
            .proof(index)
            .map_err(|e| AnonError::ProofGenerationFailed(e.to_string()))?;

        let signal_hash = hash_signal(message);
        let external_nullifier = hash_signal(scope);
        let nullifier = identity.nullifier(&external_nullifier);

        let circuit = MembershipCircuit::new(
            fr_from_element(identity.secret()),
            path.siblings.iter().map(fr_from_element).collect(),
            path.path_indices.clone(),
            fr_from_element(&path.root),
            fr_from_element(&signal_hash),
            fr_from_element(&external_nullifier),
        );

        let mut rng = thread_rng();
        let proof = Groth16::<Bn254>::prove(&self.proving_key, circuit, &mut rng)
            .map_err(|e| AnonError::ProofGenerationFailed(format!("Failed to generate proof: {}", e)))?;

        debug!("Generated membership proof for leaf {}", index);
        Ok(MembershipProof {
            points: proof_to_points(&proof),
            merkle_tree_root: path.root,
            merkle_tree_depth: group.depth(),
            nullifier,
            signal_hash,
            external_nullifier,
        })
    }
}

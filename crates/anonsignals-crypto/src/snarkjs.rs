//! Conversions between arkworks Groth16 types and the snarkjs JSON layout
//! the relayer accepts: decimal coordinates, projective `"1"` suffix, G2
//! coordinates as `[c0, c1]` pairs.

use anonsignals_types::{
    AnonError, AnonResult, FieldElement, Groth16Points, FIELD_BYTES, PROOF_CURVE_BN128,
    PROOF_TYPE_GROTH16,
};
use ark_bn254::{Bn254, Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::{Proof, VerifyingKey};
use serde_json::{json, Value};

fn fq_to_decimal(value: &Fq) -> String {
    let be = value.into_bigint().to_bytes_be();
    let mut bytes = [0u8; FIELD_BYTES];
    bytes[FIELD_BYTES - be.len()..].copy_from_slice(&be);
    FieldElement::from_be_bytes(bytes).to_string()
}

fn fq_from_decimal(s: &str) -> AnonResult<Fq> {
    let value = FieldElement::from_dec_str(s.trim())
        .map_err(|e| AnonError::Serialization(format!("Bad curve coordinate: {}", e)))?;
    let fq = Fq::from_be_bytes_mod_order(&value.to_be_bytes());
    if fq_to_decimal(&fq) != value.to_string() {
        return Err(AnonError::Serialization(format!(
            "Curve coordinate {} exceeds the base field",
            value
        )));
    }
    Ok(fq)
}

fn coordinate<'a, T>(items: &'a [T], i: usize, what: &str) -> AnonResult<&'a T> {
    items
        .get(i)
        .ok_or_else(|| AnonError::Serialization(format!("{} is missing coordinate {}", what, i)))
}

pub fn g1_to_json(point: &G1Affine) -> Vec<String> {
    if point.infinity {
        return vec!["0".into(), "1".into(), "0".into()];
    }
    vec![fq_to_decimal(&point.x), fq_to_decimal(&point.y), "1".into()]
}

pub fn g2_to_json(point: &G2Affine) -> Vec<Vec<String>> {
    if point.infinity {
        return vec![
            vec!["0".into(), "0".into()],
            vec!["1".into(), "0".into()],
            vec!["0".into(), "0".into()],
        ];
    }
    vec![
        vec![fq_to_decimal(&point.x.c0), fq_to_decimal(&point.x.c1)],
        vec![fq_to_decimal(&point.y.c0), fq_to_decimal(&point.y.c1)],
        vec!["1".into(), "0".into()],
    ]
}

pub fn g1_from_json(coords: &[String]) -> AnonResult<G1Affine> {
    if coords.get(2).map(|z| z.trim() == "0").unwrap_or(false) {
        return Ok(G1Affine::zero());
    }
    let x = fq_from_decimal(coordinate(coords, 0, "G1 point")?)?;
    let y = fq_from_decimal(coordinate(coords, 1, "G1 point")?)?;
    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(AnonError::Serialization("G1 point is not on the curve".into()));
    }
    Ok(point)
}

pub fn g2_from_json(coords: &[Vec<String>]) -> AnonResult<G2Affine> {
    let pair = |i: usize| -> AnonResult<Fq2> {
        let c = coordinate(coords, i, "G2 point")?;
        Ok(Fq2::new(
            fq_from_decimal(coordinate(c, 0, "G2 coordinate")?)?,
            fq_from_decimal(coordinate(c, 1, "G2 coordinate")?)?,
        ))
    };
    let z = pair(2)?;
    if z == Fq2::from(0u64) {
        return Ok(G2Affine::zero());
    }
    let point = G2Affine::new_unchecked(pair(0)?, pair(1)?);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(AnonError::Serialization("G2 point is not on the curve".into()));
    }
    Ok(point)
}

pub fn proof_to_points(proof: &Proof<Bn254>) -> Groth16Points {
    Groth16Points {
        pi_a: g1_to_json(&proof.a),
        pi_b: g2_to_json(&proof.b),
        pi_c: g1_to_json(&proof.c),
        protocol: PROOF_TYPE_GROTH16.into(),
        curve: PROOF_CURVE_BN128.into(),
    }
}

pub fn points_to_proof(points: &Groth16Points) -> AnonResult<Proof<Bn254>> {
    if points.protocol != PROOF_TYPE_GROTH16 {
        return Err(AnonError::Serialization(format!(
            "Unsupported proof protocol {:?}",
            points.protocol
        )));
    }
    Ok(Proof {
        a: g1_from_json(&points.pi_a)?,
        b: g2_from_json(&points.pi_b)?,
        c: g1_from_json(&points.pi_c)?,
    })
}

pub fn verifying_key_json(vk: &VerifyingKey<Bn254>) -> Value {
    let ic: Vec<Vec<String>> = vk.gamma_abc_g1.iter().map(g1_to_json).collect();
    json!({
        "protocol": PROOF_TYPE_GROTH16,
        "curve": PROOF_CURVE_BN128,
        "nPublic": vk.gamma_abc_g1.len().saturating_sub(1),
        "vk_alpha_1": g1_to_json(&vk.alpha_g1),
        "vk_beta_2": g2_to_json(&vk.beta_g2),
        "vk_gamma_2": g2_to_json(&vk.gamma_g2),
        "vk_delta_2": g2_to_json(&vk.delta_g2),
        "IC": ic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::CurveGroup;
    use ark_std::UniformRand;

    #[test]
    fn test_g1_generator_layout() {
        let g = G1Affine::generator();
        let json = g1_to_json(&g);
        // BN254 G1 generator is (1, 2)
        assert_eq!(json, vec!["1", "2", "1"]);
        assert_eq!(g1_from_json(&json).unwrap(), g);
    }

    #[test]
    fn test_points_survive_json() {
        let mut rng = ark_std::test_rng();
        let proof = Proof::<Bn254> {
            a: (G1Affine::generator() * ark_bn254::Fr::rand(&mut rng)).into_affine(),
            b: (G2Affine::generator() * ark_bn254::Fr::rand(&mut rng)).into_affine(),
            c: (G1Affine::generator() * ark_bn254::Fr::rand(&mut rng)).into_affine(),
        };
        let points = proof_to_points(&proof);
        assert_eq!(points.pi_b[2], vec!["1", "0"]);
        assert_eq!(points_to_proof(&points).unwrap(), proof);
    }

    #[test]
    fn test_rejects_off_curve_point() {
        let bad = vec!["1".to_string(), "3".to_string(), "1".to_string()];
        assert!(g1_from_json(&bad).is_err());
        assert!(g1_from_json(&["1".to_string()]).is_err());
    }

    #[test]
    fn test_rejects_oversized_coordinate() {
        let modulus_plus = "21888242871839275222246405745257275088696311157297823662689037894645226208584";
        assert!(fq_from_decimal(modulus_plus).is_err());
    }
}

use crate::bfv::batch_encoder::BatchEncoder;
use crate::bfv::bfv_keygen::{BfvParams, BfvPublicKey, NOISE_ETA};
use crate::bfv::poly_ring::RingPoly;
use crate::psi_error::psi_error::PsiError;

// ---------------------------------------------------------------------------
// Chiffré BFV à deux composantes (toujours relinéarisé)
// ---------------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext {
    pub c0: RingPoly,
    pub c1: RingPoly,
}

// ---------------------------------------------------------------------------
// Chiffrement batché : c = (pk0·u + e1 + Delta·m, pk1·u + e2)
//
// Retourne Err si le vecteur de slots n'a pas la longueur N ou contient
// une valeur >= t (validation faite par l'encodeur).
// ---------------------------------------------------------------------------
pub fn bfv_encrypt(
    params: &BfvParams,
    pk: &BfvPublicKey,
    encoder: &BatchEncoder,
    slots: &[u64],
) -> Result<Ciphertext, PsiError> {
    let encoded = encoder.encode(slots)?;
    Ok(encrypt_encoded(params, pk, &encoded))
}

/// Chiffre un polynôme plaintext déjà encodé (coefficients mod t).
pub fn encrypt_encoded(params: &BfvParams, pk: &BfvPublicKey, encoded: &[u64]) -> Ciphertext {
    let q = &params.q;
    let n = params.n;

    let u = RingPoly::sample_ternary(n, q);
    let e1 = RingPoly::sample_noise(n, q, NOISE_ETA);
    let e2 = RingPoly::sample_noise(n, q, NOISE_ETA);

    let delta_m = RingPoly::from_u64_coeffs(encoded).mul_scalar(&params.delta, q);
    let c0 = pk.pk0.mul(&u, q).add(&e1, q).add(&delta_m, q);
    let c1 = pk.pk1.mul(&u, q).add(&e2, q);

    Ciphertext { c0, c1 }
}

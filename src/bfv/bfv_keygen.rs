// ============================================================================
// Paramètres et clés du schéma BFV
//
// Anneau plaintext R_t (t premier, t = 1 mod 2N), anneau de chiffrés R_q
// avec q = 2^255 - 19 : marge de bruit très large pour la profondeur du
// protocole (reconstruction des puissances ≤ 2 multiplications chiffré ×
// chiffré, puis un produit par plaintext et B/alpha additions).
//
// Clés : secrète ternaire, publique (-(a·s + e), a), relinéarisation par
// décomposition en base 2^32. Pas de clés de rotation : l'évaluation du
// protocole n'en a pas besoin.
// ============================================================================

use num_bigint::BigUint;
use num_traits::One;
use zeroize::Zeroize;

use crate::bfv::poly_ring::RingPoly;
use crate::psi_error::psi_error::PsiError;

/// Largeur des chiffres de la décomposition de relinéarisation
pub const RELIN_DECOMP_BITS: u32 = 32;

/// Paramètre du bruit binomial centré
pub const NOISE_ETA: u32 = 4;

/// Module des chiffrés : 2^255 - 19
pub fn coeff_modulus() -> BigUint {
    (BigUint::one() << 255u32) - BigUint::from(19u32)
}

// ============================================================================
// Paramètres dérivés du schéma
// ============================================================================
#[derive(Clone, Debug)]
pub struct BfvParams {
    pub n:             usize,
    pub t:             u64,
    pub q:             BigUint,
    /// Delta = floor(q / t), facteur d'échelle des plaintexts
    pub delta:         BigUint,
    pub decomp_bits:   u32,
    /// Nombre de chiffres de la décomposition : ceil(log2(q) / decomp_bits)
    pub decomp_digits: usize,
}

impl BfvParams {
    pub fn new(n: usize, t: u64) -> Result<Self, PsiError> {
        if !n.is_power_of_two() || n < 2 {
            return Err(PsiError::InvalidParameter(
                "le degré N doit être une puissance de deux".into(),
            ));
        }
        let q = coeff_modulus();
        // t doit laisser une marge de bruit substantielle sous q
        let t_big = BigUint::from(t);
        if &t_big * &t_big * &t_big >= q {
            return Err(PsiError::InvalidParameter(
                "module plaintext trop grand devant le module des chiffrés".into(),
            ));
        }
        let delta = &q / &t_big;
        let decomp_digits = q.bits().div_ceil(RELIN_DECOMP_BITS as u64) as usize;
        Ok(BfvParams { n, t, q, delta, decomp_bits: RELIN_DECOMP_BITS, decomp_digits })
    }
}

// ============================================================================
// Clé secrète BFV — ZEROISÉE À LA DESTRUCTION
// ============================================================================
#[derive(Clone, Debug)]
pub struct BfvSecretKey {
    pub s: RingPoly,
}

impl Zeroize for BfvSecretKey {
    fn zeroize(&mut self) {
        for coeff in &mut self.s.coeffs {
            let bits = coeff.bits() as usize;
            if bits > 0 {
                *coeff = BigUint::from_bytes_be(&vec![0u8; (bits + 7) / 8]);
            }
            *coeff = BigUint::default();
        }
    }
}

impl Drop for BfvSecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

// ============================================================================
// Clé publique et clé de relinéarisation
// ============================================================================
#[derive(Clone, Debug)]
pub struct BfvPublicKey {
    pub pk0: RingPoly,
    pub pk1: RingPoly,
}

#[derive(Clone, Debug)]
pub struct BfvRelinKey {
    /// rows[i] = (-(a_i·s + e_i) + 2^(32·i)·s², a_i)
    pub rows: Vec<(RingPoly, RingPoly)>,
}

// ============================================================================
// Génération des clés
// ============================================================================
pub fn bfv_keygen(params: &BfvParams) -> Result<(BfvSecretKey, BfvPublicKey, BfvRelinKey), PsiError> {
    let q = &params.q;
    let n = params.n;

    let s = RingPoly::sample_ternary(n, q);

    // pk = (-(a·s + e), a)
    let a = RingPoly::sample_uniform(n, q);
    let e = RingPoly::sample_noise(n, q, NOISE_ETA);
    let pk0 = a.mul(&s, q).add(&e, q).neg(q);
    let pk1 = a;

    // Clé de relinéarisation : une ligne par chiffre de la décomposition
    let s_squared = s.mul(&s, q);
    let mut rows = Vec::with_capacity(params.decomp_digits);
    let mut power = BigUint::one(); // 2^(32·i) mod q
    for _ in 0..params.decomp_digits {
        let a_i = RingPoly::sample_uniform(n, q);
        let e_i = RingPoly::sample_noise(n, q, NOISE_ETA);
        let row0 = a_i
            .mul(&s, q)
            .add(&e_i, q)
            .neg(q)
            .add(&s_squared.mul_scalar(&power, q), q);
        rows.push((row0, a_i));
        power = (&power << params.decomp_bits) % q;
    }

    Ok((BfvSecretKey { s }, BfvPublicKey { pk0, pk1 }, BfvRelinKey { rows }))
}

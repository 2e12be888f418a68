// ============================================================================
// Évaluation homomorphe
//
// Le protocole n'utilise que quatre opérations :
//   - add        : somme de deux chiffrés (produit scalaire en ligne)
//   - add_plain  : ajout du coefficient constant (plaintext encodé)
//   - mul_plain  : chiffré × plaintext — pas de relinéarisation nécessaire,
//                  le bruit ne croît qu'additivement en ||plaintext||
//   - mul        : chiffré × chiffré avec produit tensoriel exact sur Z,
//                  remise à l'échelle round(t/q · ·) et relinéarisation —
//                  seule la reconstruction des puissances y recourt
// ============================================================================

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::Zero;

use crate::bfv::bfv_encrypt::Ciphertext;
use crate::bfv::bfv_keygen::{BfvParams, BfvRelinKey};
use crate::bfv::poly_ring::RingPoly;
use crate::psi_error::psi_error::PsiError;

/// Somme de deux chiffrés (slot à slot).
pub fn add(params: &BfvParams, lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
    Ciphertext {
        c0: lhs.c0.add(&rhs.c0, &params.q),
        c1: lhs.c1.add(&rhs.c1, &params.q),
    }
}

/// Ajout d'un plaintext encodé : c0 += Delta·m.
pub fn add_plain(params: &BfvParams, ct: &Ciphertext, encoded: &[u64]) -> Ciphertext {
    let delta_m = RingPoly::from_u64_coeffs(encoded).mul_scalar(&params.delta, &params.q);
    Ciphertext { c0: ct.c0.add(&delta_m, &params.q), c1: ct.c1.clone() }
}

/// Produit chiffré × plaintext encodé : les deux composantes sont
/// multipliées par le polynôme plaintext dans R_q.
pub fn mul_plain(params: &BfvParams, ct: &Ciphertext, encoded: &[u64]) -> Ciphertext {
    let m = RingPoly::from_u64_coeffs(encoded);
    Ciphertext { c0: ct.c0.mul(&m, &params.q), c1: ct.c1.mul(&m, &params.q) }
}

/// Produit chiffré × chiffré, relinéarisé vers deux composantes.
pub fn mul(
    params: &BfvParams,
    rlk: &BfvRelinKey,
    lhs: &Ciphertext,
    rhs: &Ciphertext,
) -> Result<Ciphertext, PsiError> {
    if rlk.rows.len() != params.decomp_digits {
        return Err(PsiError::RelinDigitMismatch {
            expected: params.decomp_digits,
            actual:   rlk.rows.len(),
        });
    }

    let q = &params.q;

    // Produit tensoriel exact sur Z avec représentants centrés
    let a0 = lhs.c0.to_centered(q);
    let a1 = lhs.c1.to_centered(q);
    let b0 = rhs.c0.to_centered(q);
    let b1 = rhs.c1.to_centered(q);

    let d0 = poly_mul_int(&a0, &b0);
    let d1 = poly_add_int(&poly_mul_int(&a0, &b1), &poly_mul_int(&a1, &b0));
    let d2 = poly_mul_int(&a1, &b1);

    // Remise à l'échelle round(t/q · d_i), retour dans R_q
    let e0 = scale_round(&d0, params.t, q);
    let e1 = scale_round(&d1, params.t, q);
    let e2 = scale_round(&d2, params.t, q);

    // Relinéarisation : e2 décomposé en chiffres de 2^32, chaque chiffre
    // multiplié par la ligne correspondante de la clé
    let mask = (BigUint::from(1u32) << params.decomp_bits) - 1u32;
    let mut acc0 = e0;
    let mut acc1 = e1;
    for (i, (row0, row1)) in rlk.rows.iter().enumerate() {
        let shift = params.decomp_bits as usize * i;
        let digit = RingPoly {
            coeffs: e2.coeffs.iter().map(|c| (c >> shift) & &mask).collect(),
        };
        acc0 = acc0.add(&row0.mul(&digit, q), q);
        acc1 = acc1.add(&row1.mul(&digit, q), q);
    }

    Ok(Ciphertext { c0: acc0, c1: acc1 })
}

// Produit négacyclique sur Z (coefficients exacts, pas de module)
fn poly_mul_int(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let n = a.len();
    let mut acc = vec![BigInt::zero(); n];
    for (i, ai) in a.iter().enumerate() {
        if ai.is_zero() {
            continue;
        }
        for (j, bj) in b.iter().enumerate() {
            if bj.is_zero() {
                continue;
            }
            let p = ai * bj;
            let k = i + j;
            if k < n {
                acc[k] += p;
            } else {
                acc[k - n] -= p;
            }
        }
    }
    acc
}

fn poly_add_int(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

// round(t·x / q) mod q, coefficient par coefficient
fn scale_round(values: &[BigInt], t: u64, q: &BigUint) -> RingPoly {
    let t_big = BigInt::from(t);
    let q_big = BigInt::from(q.clone());
    let two_q = &q_big * 2;
    let coeffs = values
        .iter()
        .map(|x| {
            let rounded = (&t_big * x * BigInt::from(2) + &q_big).div_floor(&two_q);
            let reduced = rounded.mod_floor(&q_big);
            // mod_floor garantit un résultat dans [0, q)
            reduced.to_biguint().unwrap_or_default()
        })
        .collect();
    RingPoly { coeffs }
}

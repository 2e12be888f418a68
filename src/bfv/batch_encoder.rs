// Encodage SIMD batché de l'anneau plaintext BFV R_t = Z_t[x]/(x^N + 1).
//
// Le slot j contient l'évaluation du polynôme plaintext en psi^(2j+1), où
// psi est une racine primitive 2N-ième de l'unité mod t (elle existe car
// t = 1 mod 2N, vérifié à la dérivation des paramètres). La multiplication
// dans l'anneau mod x^N + 1 agit donc slot à slot — c'est ce sur quoi
// repose le produit scalaire de la phase en ligne.
//
// Transformées directe et inverse : la NTT itérative radix-2 classique
// (permutation bit-reverse + papillons de Cooley-Tukey) sur omega = psi².

use crate::math::{mulmod_u64, powmod_u64};
use crate::psi_error::psi_error::PsiError;

pub struct BatchEncoder {
    n: usize,
    t: u64,
    omega: u64,
    omega_inv: u64,
    n_inv: u64,
    psi_powers: Vec<u64>,
    psi_inv_powers: Vec<u64>,
}

impl BatchEncoder {
    pub fn new(n: usize, t: u64) -> Result<Self, PsiError> {
        if !n.is_power_of_two() || n < 2 {
            return Err(PsiError::InvalidParameter(
                "le degré N doit être une puissance de deux".into(),
            ));
        }
        let two_n = 2 * n as u64;
        if (t - 1) % two_n != 0 {
            return Err(PsiError::PlainModulusNotNttFriendly { value: t, required_divisor: two_n });
        }

        // Recherche déterministe de psi : candidat^((t-1)/2N) est une racine
        // 2N-ième de l'unité ; elle est primitive ssi psi^N = -1 mod t.
        let exponent = (t - 1) / two_n;
        let mut psi = 0u64;
        for candidate in 2..=u64::min(t - 1, 1 << 20) {
            let root = powmod_u64(candidate, exponent, t);
            if powmod_u64(root, n as u64, t) == t - 1 {
                psi = root;
                break;
            }
        }
        if psi == 0 {
            return Err(PsiError::PlainModulusNotNttFriendly { value: t, required_divisor: two_n });
        }

        let omega = mulmod_u64(psi, psi, t);
        let psi_inv = powmod_u64(psi, t - 2, t);
        let omega_inv = powmod_u64(omega, t - 2, t);
        let n_inv = powmod_u64(n as u64, t - 2, t);

        let mut psi_powers = Vec::with_capacity(n);
        let mut psi_inv_powers = Vec::with_capacity(n);
        let (mut p, mut pi) = (1u64, 1u64);
        for _ in 0..n {
            psi_powers.push(p);
            psi_inv_powers.push(pi);
            p = mulmod_u64(p, psi, t);
            pi = mulmod_u64(pi, psi_inv, t);
        }

        Ok(BatchEncoder { n, t, omega, omega_inv, n_inv, psi_powers, psi_inv_powers })
    }

    pub fn slot_count(&self) -> usize {
        self.n
    }

    /// Slots -> coefficients du polynôme plaintext (mod t).
    pub fn encode(&self, slots: &[u64]) -> Result<Vec<u64>, PsiError> {
        if slots.len() != self.n {
            return Err(PsiError::SlotCountMismatch { expected: self.n, actual: slots.len() });
        }
        if slots.iter().any(|&v| v >= self.t) {
            return Err(PsiError::PlaintextSlotOutOfRange);
        }

        let mut values = slots.to_vec();
        ntt_in_place(&mut values, self.omega_inv, self.t);
        for (i, v) in values.iter_mut().enumerate() {
            *v = mulmod_u64(mulmod_u64(*v, self.n_inv, self.t), self.psi_inv_powers[i], self.t);
        }
        Ok(values)
    }

    /// Coefficients (mod t) -> slots.
    pub fn decode(&self, coeffs: &[u64]) -> Result<Vec<u64>, PsiError> {
        if coeffs.len() != self.n {
            return Err(PsiError::SlotCountMismatch { expected: self.n, actual: coeffs.len() });
        }
        let mut values: Vec<u64> = coeffs
            .iter()
            .enumerate()
            .map(|(i, &c)| mulmod_u64(c % self.t, self.psi_powers[i], self.t))
            .collect();
        ntt_in_place(&mut values, self.omega, self.t);
        Ok(values)
    }
}

fn bit_reverse_permute(values: &mut [u64]) {
    let n = values.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            values.swap(i, j);
        }
    }
}

// DFT sur Z_t : values[j] <- somme_i values[i] * root^(i*j), root d'ordre n.
fn ntt_in_place(values: &mut [u64], root: u64, t: u64) {
    let n = values.len();
    bit_reverse_permute(values);

    let mut len = 2usize;
    while len <= n {
        let w_len = powmod_u64(root, (n / len) as u64, t);
        for start in (0..n).step_by(len) {
            let mut w = 1u64;
            for j in 0..len / 2 {
                let u = values[start + j];
                let v = mulmod_u64(values[start + j + len / 2], w, t);
                values[start + j] = (u + v) % t;
                values[start + j + len / 2] = (u + t - v) % t;
                w = mulmod_u64(w, w_len, t);
            }
        }
        len <<= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 536903681;

    // Produit négacyclique mod t — référence pour la propriété slot à slot
    fn negacyclic_mul_mod_t(a: &[u64], b: &[u64], t: u64) -> Vec<u64> {
        let n = a.len();
        let mut acc = vec![0u64; n];
        for i in 0..n {
            for j in 0..n {
                let p = mulmod_u64(a[i], b[j], t);
                let k = i + j;
                if k < n {
                    acc[k] = (acc[k] + p) % t;
                } else {
                    acc[k - n] = (acc[k - n] + t - p) % t;
                }
            }
        }
        acc
    }

    #[test]
    fn test_aller_retour() {
        let encoder = BatchEncoder::new(16, T).unwrap();
        let slots: Vec<u64> = (0..16).map(|i| (i * i * 7 + 3) as u64).collect();
        let coeffs = encoder.encode(&slots).unwrap();
        assert_eq!(encoder.decode(&coeffs).unwrap(), slots);
    }

    #[test]
    fn test_encodage_constante() {
        // Un polynôme constant met la même valeur dans tous les slots
        let encoder = BatchEncoder::new(8, T).unwrap();
        let mut coeffs = vec![0u64; 8];
        coeffs[0] = 42;
        assert_eq!(encoder.decode(&coeffs).unwrap(), vec![42u64; 8]);
    }

    #[test]
    fn test_produit_slot_a_slot() {
        let encoder = BatchEncoder::new(16, T).unwrap();
        let u: Vec<u64> = (0..16).map(|i| (i * 31 + 5) as u64).collect();
        let v: Vec<u64> = (0..16).map(|i| (i * 17 + 11) as u64).collect();

        let pu = encoder.encode(&u).unwrap();
        let pv = encoder.encode(&v).unwrap();
        let product = negacyclic_mul_mod_t(&pu, &pv, T);

        let expected: Vec<u64> = u.iter().zip(&v).map(|(a, b)| mulmod_u64(*a, *b, T)).collect();
        assert_eq!(encoder.decode(&product).unwrap(), expected);
    }

    #[test]
    fn test_rejet_slot_hors_domaine() {
        let encoder = BatchEncoder::new(8, T).unwrap();
        let mut slots = vec![0u64; 8];
        slots[3] = T;
        assert_eq!(encoder.encode(&slots), Err(PsiError::PlaintextSlotOutOfRange));
    }

    #[test]
    fn test_rejet_module_non_ntt() {
        // 97 - 1 = 96 n'est pas divisible par 2N = 256
        assert!(matches!(
            BatchEncoder::new(128, 97),
            Err(PsiError::PlainModulusNotNttFriendly { .. })
        ));
    }
}

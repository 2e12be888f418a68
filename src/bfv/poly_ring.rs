// ============================================================================
// Anneau de chiffrés R_q = Z_q[x] / (x^N + 1)
//
// Coefficients BigUint dans [0, q), produit négacyclique en convolution
// directe. Toutes les opérations prennent q en paramètre plutôt que de le
// stocker dans chaque polynôme : les BfvParams sont la seule source de
// vérité des modules.
// ============================================================================

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::Zero;
use rand_core::{OsRng, RngCore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingPoly {
    pub coeffs: Vec<BigUint>,
}

impl RingPoly {
    pub fn zero(n: usize) -> Self {
        RingPoly { coeffs: vec![BigUint::zero(); n] }
    }

    pub fn degree_bound(&self) -> usize {
        self.coeffs.len()
    }

    /// Polynôme à coefficients u64 (plaintexts encodés mod t)
    pub fn from_u64_coeffs(values: &[u64]) -> Self {
        RingPoly { coeffs: values.iter().map(|&v| BigUint::from(v)).collect() }
    }

    // ── Arithmétique mod q ───────────────────────────────────────────────

    pub fn add(&self, other: &RingPoly, q: &BigUint) -> RingPoly {
        let coeffs = self
            .coeffs
            .iter()
            .zip(&other.coeffs)
            .map(|(a, b)| (a + b) % q)
            .collect();
        RingPoly { coeffs }
    }

    pub fn sub(&self, other: &RingPoly, q: &BigUint) -> RingPoly {
        let coeffs = self
            .coeffs
            .iter()
            .zip(&other.coeffs)
            .map(|(a, b)| ((a + q) - b) % q)
            .collect();
        RingPoly { coeffs }
    }

    pub fn neg(&self, q: &BigUint) -> RingPoly {
        let coeffs = self
            .coeffs
            .iter()
            .map(|a| if a.is_zero() { BigUint::zero() } else { q - a })
            .collect();
        RingPoly { coeffs }
    }

    /// Multiplication par un scalaire (mod q)
    pub fn mul_scalar(&self, scalar: &BigUint, q: &BigUint) -> RingPoly {
        let coeffs = self.coeffs.iter().map(|a| (a * scalar) % q).collect();
        RingPoly { coeffs }
    }

    /// Produit négacyclique : x^N = -1
    pub fn mul(&self, other: &RingPoly, q: &BigUint) -> RingPoly {
        let n = self.coeffs.len();
        let mut acc = vec![BigUint::zero(); n];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                if b.is_zero() {
                    continue;
                }
                let product = (a * b) % q;
                let k = i + j;
                if k < n {
                    acc[k] = (&acc[k] + product) % q;
                } else {
                    // repli négacyclique
                    acc[k - n] = ((&acc[k - n] + q) - product) % q;
                }
            }
        }
        RingPoly { coeffs: acc }
    }

    /// Représentants centrés dans (-q/2, q/2] — pour le déchiffrement et le
    /// produit tensoriel exact.
    pub fn to_centered(&self, q: &BigUint) -> Vec<BigInt> {
        let half = q >> 1;
        self.coeffs
            .iter()
            .map(|c| {
                if c > &half {
                    BigInt::from(c.clone()) - BigInt::from(q.clone())
                } else {
                    BigInt::from(c.clone())
                }
            })
            .collect()
    }

    // ── Échantillonnage ──────────────────────────────────────────────────

    /// Coefficients uniformes dans [0, q)
    pub fn sample_uniform(n: usize, q: &BigUint) -> RingPoly {
        let mut rng = OsRng;
        let coeffs = (0..n).map(|_| rng.gen_biguint_below(q)).collect();
        RingPoly { coeffs }
    }

    /// Coefficients ternaires {-1, 0, 1} (représentés mod q)
    pub fn sample_ternary(n: usize, q: &BigUint) -> RingPoly {
        let mut rng = OsRng;
        let minus_one = q - 1u32;
        let coeffs = (0..n)
            .map(|_| match rng.next_u32() % 3 {
                0 => BigUint::zero(),
                1 => BigUint::from(1u32),
                _ => minus_one.clone(),
            })
            .collect();
        RingPoly { coeffs }
    }

    /// Bruit binomial centré de paramètre eta : somme de eta bits moins
    /// somme de eta bits, borné par |eta|.
    pub fn sample_noise(n: usize, q: &BigUint, eta: u32) -> RingPoly {
        let mut rng = OsRng;
        let coeffs = (0..n)
            .map(|_| {
                let mut value: i64 = 0;
                for _ in 0..eta {
                    let bits = rng.next_u32();
                    value += (bits & 1) as i64;
                    value -= ((bits >> 1) & 1) as i64;
                }
                if value >= 0 {
                    BigUint::from(value as u64)
                } else {
                    q - BigUint::from((-value) as u64)
                }
            })
            .collect();
        RingPoly { coeffs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    fn q() -> BigUint {
        BigUint::from(97u32)
    }

    #[test]
    fn test_addition_soustraction() {
        let a = RingPoly::from_u64_coeffs(&[1, 2, 3, 96]);
        let b = RingPoly::from_u64_coeffs(&[96, 95, 1, 2]);
        let s = a.add(&b, &q());
        assert_eq!(s.coeffs, RingPoly::from_u64_coeffs(&[0, 0, 4, 1]).coeffs);
        let d = s.sub(&b, &q());
        assert_eq!(d, a);
    }

    #[test]
    fn test_repli_negacyclique() {
        // (x^3) * (x) = x^4 = -1 dans Z_97[x]/(x^4+1)
        let a = RingPoly::from_u64_coeffs(&[0, 0, 0, 1]);
        let b = RingPoly::from_u64_coeffs(&[0, 1, 0, 0]);
        let p = a.mul(&b, &q());
        assert_eq!(p.coeffs, RingPoly::from_u64_coeffs(&[96, 0, 0, 0]).coeffs);
    }

    #[test]
    fn test_produit_constant() {
        let a = RingPoly::from_u64_coeffs(&[5, 6, 7, 8]);
        let one = RingPoly::from_u64_coeffs(&[1, 0, 0, 0]);
        assert_eq!(a.mul(&one, &q()), a);
    }

    #[test]
    fn test_representants_centres() {
        let a = RingPoly::from_u64_coeffs(&[0, 1, 48, 49, 96]);
        let centered = a.to_centered(&q());
        let expected: Vec<i64> = vec![0, 1, 48, -48, -1];
        assert_eq!(centered, expected.into_iter().map(BigInt::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_bruit_borne() {
        let q = (BigUint::one() << 64u32) - 1u32;
        let noise = RingPoly::sample_noise(256, &q, 4);
        let half = &q >> 1;
        for c in &noise.coeffs {
            let magnitude = if c > &half { &q - c } else { c.clone() };
            assert!(magnitude <= BigUint::from(4u32));
        }
    }
}

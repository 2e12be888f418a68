use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::ToPrimitive;

use crate::bfv::batch_encoder::BatchEncoder;
use crate::bfv::bfv_encrypt::Ciphertext;
use crate::bfv::bfv_keygen::{BfvParams, BfvSecretKey};
use crate::psi_error::psi_error::PsiError;

// ---------------------------------------------------------------------------
// Déchiffrement batché : m_i = round(t·(c0 + c1·s)_i / q) mod t, puis
// décodage NTT vers les slots.
// ---------------------------------------------------------------------------
pub fn bfv_decrypt(
    params: &BfvParams,
    sk: &BfvSecretKey,
    encoder: &BatchEncoder,
    ct: &Ciphertext,
) -> Result<Vec<u64>, PsiError> {
    let q = &params.q;

    // v = c0 + c1·s, représentants centrés dans (-q/2, q/2]
    let v = ct.c0.add(&ct.c1.mul(&sk.s, q), q);
    let centered = v.to_centered(q);

    let t_big = BigInt::from(params.t);
    let q_big = BigInt::from(q.clone());
    let two_q = &q_big * 2;

    let coeffs: Vec<u64> = centered
        .into_iter()
        .map(|x| {
            // round(t·x / q) = floor((2·t·x + q) / 2q), correct pour x négatif
            let rounded = (&t_big * x * BigInt::from(2) + &q_big).div_floor(&two_q);
            rounded.mod_floor(&t_big).to_u64().unwrap_or(0)
        })
        .collect();

    encoder.decode(&coeffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bfv::batch_encoder::BatchEncoder;
    use crate::bfv::bfv_encrypt::bfv_encrypt;
    use crate::bfv::bfv_keygen::bfv_keygen;

    const T: u64 = 536903681;

    #[test]
    fn test_chiffrement_dechiffrement() {
        let params = BfvParams::new(16, T).unwrap();
        let encoder = BatchEncoder::new(16, T).unwrap();
        let (sk, pk, _rlk) = bfv_keygen(&params).unwrap();

        let slots: Vec<u64> = (0..16).map(|i| (i * 1000 + 7) as u64).collect();
        let ct = bfv_encrypt(&params, &pk, &encoder, &slots).unwrap();
        assert_eq!(bfv_decrypt(&params, &sk, &encoder, &ct).unwrap(), slots);
    }

    #[test]
    fn test_valeurs_extremes_des_slots() {
        let params = BfvParams::new(8, T).unwrap();
        let encoder = BatchEncoder::new(8, T).unwrap();
        let (sk, pk, _rlk) = bfv_keygen(&params).unwrap();

        let slots = vec![0u64, T - 1, 0, T - 1, 1, 2, 3, T - 2];
        let ct = bfv_encrypt(&params, &pk, &encoder, &slots).unwrap();
        assert_eq!(bfv_decrypt(&params, &sk, &encoder, &ct).unwrap(), slots);
    }
}

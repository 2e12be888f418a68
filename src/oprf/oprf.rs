// ============================================================================
// OPRF sur courbe elliptique
//
// F_k(item) = troncature de (k · item · G).x sur sigma_max bits.
//
// Déroulé du protocole :
//   hors-ligne client : A_i = k_c · c_i · G          (aveuglement)
//   en ligne serveur  : B_i = k_s · A_i              (la clé ne sort jamais)
//   en ligne client   : Q_i = k_c^{-1} · B_i = k_s · c_i · G, puis extraction
//   hors-ligne serveur: sigma_j = extract(k_s · s_j · G)
//
// Chaque phase est parallélisée par chunks disjoints ; la seule opération
// coûteuse par item est la multiplication scalaire.
// ============================================================================

use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand_core::OsRng;
use rayon::prelude::*;
use rayon::ThreadPool;
use zeroize::Zeroize;

use crate::oprf::curve::{CurveP192, EcPoint, CURVE_LOG_P};
use crate::parallel::chunk_size;
use crate::psi_error::psi_error::PsiError;

// ============================================================================
// Clé OPRF — ZEROISÉE À LA DESTRUCTION
// ============================================================================

#[derive(Clone, Debug)]
pub struct OprfKey {
    pub scalar: BigUint,
}

// Efface les octets internes d'un BigUint
fn zeroize_biguint(n: &mut BigUint) {
    let bits = n.bits() as usize;
    if bits > 0 {
        *n = BigUint::from_bytes_be(&vec![0u8; (bits + 7) / 8]);
    }
    *n = BigUint::default();
}

impl Zeroize for OprfKey {
    fn zeroize(&mut self) {
        zeroize_biguint(&mut self.scalar);
    }
}

impl Drop for OprfKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl OprfKey {
    /// Tire un scalaire uniforme dans [1, q)
    pub fn generate(curve: &CurveP192) -> Self {
        let mut rng = OsRng;
        let scalar = rng.gen_biguint_range(&BigUint::one(), &curve.order);
        OprfKey { scalar }
    }

    /// Point précalculé k·G (les items sont ensuite multipliés par ce point)
    pub fn key_point(&self, curve: &CurveP192) -> Result<EcPoint, PsiError> {
        curve.scalar_mul(&self.scalar, &curve.generator())
    }

    /// k^{-1} mod q — finalisation OPRF côté client
    pub fn inverse(&self, curve: &CurveP192) -> Result<BigUint, PsiError> {
        crate::math::mod_inverse(&self.scalar, &curve.order)
    }
}

// ─────────────────────────────────────────────────────────
// Primitives
// ─────────────────────────────────────────────────────────

/// encode(item) = item · G. Échoue si item >= q.
pub fn encode_item(item: &BigUint, curve: &CurveP192) -> Result<EcPoint, PsiError> {
    if item >= &curve.order {
        return Err(PsiError::ItemOutsideCurveOrder);
    }
    curve.scalar_mul(item, &curve.generator())
}

/// apply_key(P, k) = k · P
pub fn apply_key(point: &EcPoint, key: &BigUint, curve: &CurveP192) -> Result<EcPoint, PsiError> {
    curve.scalar_mul(key, point)
}

/// extract(Q) = (Q.x >> (log2(p) - sigma_max - 10)) & (2^sigma_max - 1)
///
/// Le décalage de 10 bits supplémentaires écarte les bits de poids fort de
/// la coordonnée x (non uniformes) avant le masquage.
pub fn extract_prf(point: &EcPoint, sigma_max: u32) -> u64 {
    let shift = CURVE_LOG_P - sigma_max - 10;
    let mask = (BigUint::one() << sigma_max) - BigUint::one();
    let truncated = (point.x_coordinate() >> shift) & mask;
    truncated.to_u64_digits().first().copied().unwrap_or(0)
}

// ─────────────────────────────────────────────────────────
// Phases parallèles — chunks disjoints, fusion dans l'ordre
// ─────────────────────────────────────────────────────────

/// Hors-ligne client : encode chaque item en A_i = item · (k_c·G).
pub fn client_prf_offline_parallel(
    items: &[u64],
    key_point: &EcPoint,
    curve: &CurveP192,
    pool: &ThreadPool,
) -> Result<Vec<EcPoint>, PsiError> {
    let chunk = chunk_size(items.len(), pool.current_num_threads());
    pool.install(|| {
        items
            .par_chunks(chunk)
            .map(|part| {
                part.iter()
                    .map(|item| curve.scalar_mul(&BigUint::from(*item), key_point))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .map(|chunks| chunks.into_iter().flatten().collect())
}

/// Hors-ligne serveur : sigma_j = extract(s_j · (k_s·G)).
pub fn server_prf_offline_parallel(
    items: &[u64],
    key_point: &EcPoint,
    curve: &CurveP192,
    sigma_max: u32,
    pool: &ThreadPool,
) -> Result<Vec<u64>, PsiError> {
    let chunk = chunk_size(items.len(), pool.current_num_threads());
    pool.install(|| {
        items
            .par_chunks(chunk)
            .map(|part| {
                part.iter()
                    .map(|item| {
                        let q = curve.scalar_mul(&BigUint::from(*item), key_point)?;
                        Ok(extract_prf(&q, sigma_max))
                    })
                    .collect::<Result<Vec<_>, PsiError>>()
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .map(|chunks| chunks.into_iter().flatten().collect())
}

/// En ligne serveur : B_i = k_s · A_i. Les points reçus du client sont
/// validés sur la courbe avant toute multiplication.
pub fn server_prf_online_parallel(
    key: &OprfKey,
    points: &[EcPoint],
    curve: &CurveP192,
    pool: &ThreadPool,
) -> Result<Vec<EcPoint>, PsiError> {
    let chunk = chunk_size(points.len(), pool.current_num_threads());
    pool.install(|| {
        points
            .par_chunks(chunk)
            .map(|part| {
                part.iter()
                    .map(|p| {
                        if !curve.is_on_curve(p) {
                            return Err(PsiError::PointNotOnCurve);
                        }
                        curve.scalar_mul(&key.scalar, p)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .map(|chunks| chunks.into_iter().flatten().collect())
}

/// En ligne client : Q_i = k_c^{-1} · B_i puis extraction PRF.
pub fn client_prf_online_parallel(
    key_inverse: &BigUint,
    points: &[EcPoint],
    curve: &CurveP192,
    sigma_max: u32,
    pool: &ThreadPool,
) -> Result<Vec<u64>, PsiError> {
    let chunk = chunk_size(points.len(), pool.current_num_threads());
    pool.install(|| {
        points
            .par_chunks(chunk)
            .map(|part| {
                part.iter()
                    .map(|p| {
                        if !curve.is_on_curve(p) {
                            return Err(PsiError::PointNotOnCurve);
                        }
                        let q = curve.scalar_mul(key_inverse, p)?;
                        Ok(extract_prf(&q, sigma_max))
                    })
                    .collect::<Result<Vec<_>, PsiError>>()
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .map(|chunks| chunks.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::build_pool;

    #[test]
    fn test_oprf_aller_retour() {
        // extract(k_c^{-1} · k_s · k_c · x · G) = extract(k_s · x · G)
        let curve = CurveP192::new();
        let pool = build_pool(2).unwrap();
        let server_key = OprfKey { scalar: BigUint::from(1234567891011121314u64) };
        let client_key = OprfKey { scalar: BigUint::from(987654321098765432u64) };
        let sigma_max = 40;

        let items: Vec<u64> = vec![11, 22, 33, 0, (1u64 << 40) - 1];

        // Chemin client : aveuglement, clé serveur, dé-aveuglement
        let client_point = client_key.key_point(&curve).unwrap();
        let blinded = client_prf_offline_parallel(&items, &client_point, &curve, &pool).unwrap();
        let keyed = server_prf_online_parallel(&server_key, &blinded, &curve, &pool).unwrap();
        let key_inverse = client_key.inverse(&curve).unwrap();
        let client_view =
            client_prf_online_parallel(&key_inverse, &keyed, &curve, sigma_max, &pool).unwrap();

        // Chemin serveur : calcul direct
        let server_point = server_key.key_point(&curve).unwrap();
        let server_view =
            server_prf_offline_parallel(&items, &server_point, &curve, sigma_max, &pool).unwrap();

        assert_eq!(client_view, server_view);
    }

    #[test]
    fn test_item_zero_extrait_zero() {
        // 0 · G = infini, qui s'extrait vers 0 des deux côtés
        let curve = CurveP192::new();
        let key = OprfKey { scalar: BigUint::from(42u64) };
        let kp = key.key_point(&curve).unwrap();
        let q = curve.scalar_mul(&BigUint::from(0u64), &kp).unwrap();
        assert!(q.is_infinity());
        assert_eq!(extract_prf(&q, 40), 0);
    }

    #[test]
    fn test_encode_item_hors_domaine() {
        let curve = CurveP192::new();
        let too_big = curve.order.clone();
        assert_eq!(encode_item(&too_big, &curve), Err(PsiError::ItemOutsideCurveOrder));
    }

    #[test]
    fn test_point_recu_hors_courbe() {
        let curve = CurveP192::new();
        let pool = build_pool(1).unwrap();
        let key = OprfKey { scalar: BigUint::from(7u64) };
        let bogus = vec![EcPoint::affine(BigUint::from(1u32), BigUint::from(2u32))];
        assert_eq!(
            server_prf_online_parallel(&key, &bogus, &curve, &pool),
            Err(PsiError::PointNotOnCurve)
        );
    }

    #[test]
    fn test_idempotence_hors_ligne() {
        // Deux exécutions hors-ligne sur la même entrée donnent les mêmes points
        let curve = CurveP192::new();
        let pool = build_pool(2).unwrap();
        let key = OprfKey { scalar: BigUint::from(555555555u64) };
        let kp = key.key_point(&curve).unwrap();
        let items: Vec<u64> = (1..50).collect();
        let run1 = client_prf_offline_parallel(&items, &kp, &curve, &pool).unwrap();
        let run2 = client_prf_offline_parallel(&items, &kp, &curve, &pool).unwrap();
        assert_eq!(run1, run2);
    }
}

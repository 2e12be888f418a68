// ============================================================================
// Structures wire — tout ce qui traverse la socket ou le disque
//
// Les grands entiers voyagent en octets big-endian (format indépendant du
// langage, rejouable depuis n'importe quelle implémentation). Le point à
// l'infini est encodé (0, 0) : cette paire n'appartient jamais à la courbe
// (b != 0), elle est donc sans ambiguïté.
//
// Séquence des messages :
//   1. Client -> Serveur : Vec<PointWire>            (items encodés)
//   2. Serveur -> Client : Vec<PointWire>            (items PRF-és)
//   3. Client -> Serveur : QueryMessage              (contexte FHE + requête)
//   4. Serveur -> Client : ReplyMessage              (alpha chiffrés)
// ============================================================================

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::bfv::bfv_encrypt::Ciphertext;
use crate::bfv::bfv_keygen::{coeff_modulus, BfvParams, BfvPublicKey, BfvRelinKey};
use crate::bfv::poly_ring::RingPoly;
use crate::oprf::curve::EcPoint;
use crate::params::params::PsiParams;
use crate::psi_error::psi_error::PsiError;

// ─────────────────────────────────────────────────────────
// Points de courbe
// ─────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PointWire {
    pub x: Vec<u8>,
    pub y: Vec<u8>,
}

impl PointWire {
    pub fn from_point(point: &EcPoint) -> Self {
        match point {
            EcPoint::Infinity => PointWire { x: Vec::new(), y: Vec::new() },
            EcPoint::Affine { x, y } => {
                PointWire { x: x.to_bytes_be(), y: y.to_bytes_be() }
            }
        }
    }

    /// Conversion pure : la validation d'appartenance à la courbe est faite
    /// par la phase OPRF qui consomme les points.
    pub fn to_point(&self) -> EcPoint {
        let x = BigUint::from_bytes_be(&self.x);
        let y = BigUint::from_bytes_be(&self.y);
        if x.is_zero() && y.is_zero() {
            EcPoint::Infinity
        } else {
            EcPoint::Affine { x, y }
        }
    }
}

pub fn points_to_wire(points: &[EcPoint]) -> Vec<PointWire> {
    points.iter().map(PointWire::from_point).collect()
}

pub fn wire_to_points(wire: &[PointWire]) -> Vec<EcPoint> {
    wire.iter().map(PointWire::to_point).collect()
}

// ─────────────────────────────────────────────────────────
// Polynômes et chiffrés BFV
// ─────────────────────────────────────────────────────────

fn poly_to_wire(poly: &RingPoly) -> Vec<Vec<u8>> {
    poly.coeffs.iter().map(|c| c.to_bytes_be()).collect()
}

fn wire_to_poly(wire: &[Vec<u8>], params: &BfvParams) -> Result<RingPoly, PsiError> {
    if wire.len() != params.n {
        return Err(PsiError::MalformedFheContext(format!(
            "polynôme de {} coefficients, attendu {}",
            wire.len(),
            params.n
        )));
    }
    let mut coeffs = Vec::with_capacity(wire.len());
    for bytes in wire {
        let c = BigUint::from_bytes_be(bytes);
        if c >= params.q {
            return Err(PsiError::MalformedFheContext(
                "coefficient hors du domaine [0, q)".into(),
            ));
        }
        coeffs.push(c);
    }
    Ok(RingPoly { coeffs })
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CiphertextWire {
    pub c0: Vec<Vec<u8>>,
    pub c1: Vec<Vec<u8>>,
}

impl CiphertextWire {
    pub fn from_ciphertext(ct: &Ciphertext) -> Self {
        CiphertextWire { c0: poly_to_wire(&ct.c0), c1: poly_to_wire(&ct.c1) }
    }

    pub fn to_ciphertext(&self, params: &BfvParams) -> Result<Ciphertext, PsiError> {
        Ok(Ciphertext {
            c0: wire_to_poly(&self.c0, params)?,
            c1: wire_to_poly(&self.c1, params)?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PublicKeyWire {
    pub pk0: Vec<Vec<u8>>,
    pub pk1: Vec<Vec<u8>>,
}

impl PublicKeyWire {
    pub fn from_key(pk: &BfvPublicKey) -> Self {
        PublicKeyWire { pk0: poly_to_wire(&pk.pk0), pk1: poly_to_wire(&pk.pk1) }
    }

    pub fn to_key(&self, params: &BfvParams) -> Result<BfvPublicKey, PsiError> {
        Ok(BfvPublicKey {
            pk0: wire_to_poly(&self.pk0, params)?,
            pk1: wire_to_poly(&self.pk1, params)?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RelinKeyWire {
    pub rows: Vec<(Vec<Vec<u8>>, Vec<Vec<u8>>)>,
}

impl RelinKeyWire {
    pub fn from_key(rlk: &BfvRelinKey) -> Self {
        RelinKeyWire {
            rows: rlk.rows.iter().map(|(r0, r1)| (poly_to_wire(r0), poly_to_wire(r1))).collect(),
        }
    }

    pub fn to_key(&self, params: &BfvParams) -> Result<BfvRelinKey, PsiError> {
        if self.rows.len() != params.decomp_digits {
            return Err(PsiError::RelinDigitMismatch {
                expected: params.decomp_digits,
                actual:   self.rows.len(),
            });
        }
        let mut rows = Vec::with_capacity(self.rows.len());
        for (r0, r1) in &self.rows {
            rows.push((wire_to_poly(r0, params)?, wire_to_poly(r1, params)?));
        }
        Ok(BfvRelinKey { rows })
    }
}

// ─────────────────────────────────────────────────────────
// Contexte FHE et messages du protocole
// ─────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FheContextWire {
    pub poly_modulus_degree: u64,
    pub plain_modulus:       u64,
    pub coeff_modulus:       Vec<u8>,
}

impl FheContextWire {
    pub fn from_params(params: &BfvParams) -> Self {
        FheContextWire {
            poly_modulus_degree: params.n as u64,
            plain_modulus:       params.t,
            coeff_modulus:       params.q.to_bytes_be(),
        }
    }
}

/// Message 3 : contexte, clés publiques et matrice fenêtrée chiffrée.
/// query[i][j] = chiffré des slots W_b[i][j], None quand l'exposant
/// (i+1)·base^j dépasse B/alpha.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QueryMessage {
    pub context:    FheContextWire,
    pub public_key: PublicKeyWire,
    pub relin_key:  RelinKeyWire,
    pub query:      Vec<Vec<Option<CiphertextWire>>>,
}

/// Message 4 : les alpha polynômes évalués, chiffrés.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReplyMessage {
    pub ciphertexts: Vec<CiphertextWire>,
}

/// Vérifie que le contexte FHE annoncé par le client coïncide avec les
/// paramètres dérivés du serveur, et reconstruit les BfvParams.
pub fn validate_context(params: &PsiParams, context: &FheContextWire) -> Result<BfvParams, PsiError> {
    if context.poly_modulus_degree as usize != params.number_of_bins {
        return Err(PsiError::MalformedFheContext(format!(
            "degré N = {} annoncé, {} attendu",
            context.poly_modulus_degree, params.number_of_bins
        )));
    }
    if context.plain_modulus != params.config.plain_modulus {
        return Err(PsiError::MalformedFheContext(format!(
            "module plaintext {} annoncé, {} attendu",
            context.plain_modulus, params.config.plain_modulus
        )));
    }
    if BigUint::from_bytes_be(&context.coeff_modulus) != coeff_modulus() {
        return Err(PsiError::MalformedFheContext(
            "module des chiffrés inattendu".into(),
        ));
    }
    BfvParams::new(params.number_of_bins, params.config.plain_modulus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oprf::curve::CurveP192;

    #[test]
    fn test_point_aller_retour() {
        let curve = CurveP192::new();
        let g = curve.generator();
        let wire = PointWire::from_point(&g);
        assert_eq!(wire.to_point(), g);
    }

    #[test]
    fn test_infini_encode_zero_zero() {
        let wire = PointWire::from_point(&EcPoint::Infinity);
        assert!(wire.x.is_empty() && wire.y.is_empty());
        assert_eq!(wire.to_point(), EcPoint::Infinity);
    }

    #[test]
    fn test_chiffre_aller_retour() {
        let params = BfvParams::new(8, 536903681).unwrap();
        let ct = Ciphertext {
            c0: RingPoly::from_u64_coeffs(&[1, 2, 3, 4, 5, 6, 7, 8]),
            c1: RingPoly::from_u64_coeffs(&[8, 7, 6, 5, 4, 3, 2, 1]),
        };
        let wire = CiphertextWire::from_ciphertext(&ct);
        assert_eq!(wire.to_ciphertext(&params).unwrap(), ct);
    }

    #[test]
    fn test_rejet_coefficient_hors_domaine() {
        let params = BfvParams::new(2, 536903681).unwrap();
        let big = (params.q.clone() + 1u32).to_bytes_be();
        let wire = CiphertextWire { c0: vec![big, vec![0]], c1: vec![vec![0], vec![0]] };
        assert!(matches!(
            wire.to_ciphertext(&params),
            Err(PsiError::MalformedFheContext(_))
        ));
    }

    #[test]
    fn test_validation_contexte() {
        let psi = PsiParams::reduced().unwrap();
        let bfv = BfvParams::new(psi.number_of_bins, psi.config.plain_modulus).unwrap();
        let mut context = FheContextWire::from_params(&bfv);
        assert!(validate_context(&psi, &context).is_ok());

        context.poly_modulus_degree = 8192;
        assert!(matches!(
            validate_context(&psi, &context),
            Err(PsiError::MalformedFheContext(_))
        ));
    }
}

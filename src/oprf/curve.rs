// ============================================================================
// Courbe elliptique NIST P-192 — arithmétique affine sur BigUint
//
// Courbe de Weierstrass courte y² = x³ + ax + b sur F_p, d'ordre premier q.
// C'est le support de l'OPRF : les items sont encodés par multiplication
// scalaire item·G et les clés des deux parties agissent par k·P.
//
// Le point à l'infini est une variante explicite : il n'apparaît que quand
// le scalaire est ≡ 0 (mod q) et son extraction PRF vaut 0, ce qui permet à
// l'item frontière 0 de traverser le protocole. Toute autre paire (x, y)
// hors courbe est une erreur fatale (transport corrompu).
// ============================================================================

use num_bigint::BigUint;
use num_traits::{Num, Zero};

use crate::math::mod_inverse;
use crate::psi_error::psi_error::PsiError;

/// Nombre de bits du module p de la courbe (p < 2^192)
pub const CURVE_LOG_P: u32 = 192;

// Constantes NIST P-192 (SP 800-186, §4.2.1)
const P_HEX:  &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFFFFFFFFFFFF";
const B_HEX:  &str = "64210519E59C80E70FA7E9AB72243049FEB8DEECC146B9B1";
const GX_HEX: &str = "188DA80EB03090F67CBF20EB43A18800F4FF0AFD82FF1012";
const GY_HEX: &str = "07192B95FFC8DA78631011ED6B24CDD573F977A11E794811";
const Q_HEX:  &str = "FFFFFFFFFFFFFFFFFFFFFFFF99DEF836146BC9B1B4D22831";

// ─────────────────────────────────────────────────────────
// Points
// ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EcPoint {
    /// Élément neutre du groupe
    Infinity,
    /// Point affine (x, y), coordonnées dans [0, p)
    Affine { x: BigUint, y: BigUint },
}

impl EcPoint {
    pub fn affine(x: BigUint, y: BigUint) -> Self {
        EcPoint::Affine { x, y }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, EcPoint::Infinity)
    }

    /// Coordonnée x pour l'extraction PRF — l'infini extrait vers 0
    pub fn x_coordinate(&self) -> BigUint {
        match self {
            EcPoint::Infinity => BigUint::zero(),
            EcPoint::Affine { x, .. } => x.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Paramètres de la courbe
// ─────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct CurveP192 {
    pub p:     BigUint,
    pub a:     BigUint,
    pub b:     BigUint,
    /// Ordre q du générateur (premier)
    pub order: BigUint,
    gx:        BigUint,
    gy:        BigUint,
}

impl Default for CurveP192 {
    fn default() -> Self {
        Self::new()
    }
}

impl CurveP192 {
    pub fn new() -> Self {
        // Constantes hexadécimales figées : le parsing ne peut pas échouer
        let p = BigUint::from_str_radix(P_HEX, 16).expect("constante p invalide");
        let a = &p - BigUint::from(3u32); // a = -3 mod p
        let b = BigUint::from_str_radix(B_HEX, 16).expect("constante b invalide");
        let gx = BigUint::from_str_radix(GX_HEX, 16).expect("constante gx invalide");
        let gy = BigUint::from_str_radix(GY_HEX, 16).expect("constante gy invalide");
        let order = BigUint::from_str_radix(Q_HEX, 16).expect("constante q invalide");
        CurveP192 { p, a, b, order, gx, gy }
    }

    pub fn generator(&self) -> EcPoint {
        EcPoint::affine(self.gx.clone(), self.gy.clone())
    }

    /// Vérifie y² = x³ + ax + b (mod p). L'infini appartient à la courbe.
    pub fn is_on_curve(&self, point: &EcPoint) -> bool {
        match point {
            EcPoint::Infinity => true,
            EcPoint::Affine { x, y } => {
                if x >= &self.p || y >= &self.p {
                    return false;
                }
                let lhs = (y * y) % &self.p;
                let rhs = (x * x * x + &self.a * x + &self.b) % &self.p;
                lhs == rhs
            }
        }
    }

    // Soustraction dans F_p sans passer par des signés
    fn field_sub(&self, lhs: &BigUint, rhs: &BigUint) -> BigUint {
        ((lhs + &self.p) - rhs) % &self.p
    }

    /// Addition de points (cas général + cas dégénérés)
    pub fn add(&self, lhs: &EcPoint, rhs: &EcPoint) -> Result<EcPoint, PsiError> {
        let (x1, y1) = match lhs {
            EcPoint::Infinity => return Ok(rhs.clone()),
            EcPoint::Affine { x, y } => (x, y),
        };
        let (x2, y2) = match rhs {
            EcPoint::Infinity => return Ok(lhs.clone()),
            EcPoint::Affine { x, y } => (x, y),
        };

        if x1 == x2 {
            if (y1 + y2) % &self.p == BigUint::zero() {
                // P + (-P) = infini
                return Ok(EcPoint::Infinity);
            }
            return self.double(lhs);
        }

        // lambda = (y2 - y1) / (x2 - x1)
        let num = self.field_sub(y2, y1);
        let den = self.field_sub(x2, x1);
        let lambda = (num * mod_inverse(&den, &self.p)?) % &self.p;

        let x3 = self.field_sub(&((&lambda * &lambda) % &self.p), &((x1 + x2) % &self.p));
        let y3 = self.field_sub(&((&lambda * self.field_sub(x1, &x3)) % &self.p), y1);
        Ok(EcPoint::affine(x3, y3))
    }

    /// Doublement de point
    pub fn double(&self, point: &EcPoint) -> Result<EcPoint, PsiError> {
        let (x, y) = match point {
            EcPoint::Infinity => return Ok(EcPoint::Infinity),
            EcPoint::Affine { x, y } => (x, y),
        };
        if y.is_zero() {
            return Ok(EcPoint::Infinity);
        }

        // lambda = (3x² + a) / 2y
        let num = (BigUint::from(3u32) * x * x + &self.a) % &self.p;
        let den = (BigUint::from(2u32) * y) % &self.p;
        let lambda = (num * mod_inverse(&den, &self.p)?) % &self.p;

        let two_x = (x + x) % &self.p;
        let x3 = self.field_sub(&((&lambda * &lambda) % &self.p), &two_x);
        let y3 = self.field_sub(&((&lambda * self.field_sub(x, &x3)) % &self.p), y);
        Ok(EcPoint::affine(x3, y3))
    }

    /// Multiplication scalaire par double-and-add (MSB vers LSB).
    /// k ≡ 0 (mod q) donne le point à l'infini.
    pub fn scalar_mul(&self, k: &BigUint, point: &EcPoint) -> Result<EcPoint, PsiError> {
        let k = k % &self.order;
        let mut acc = EcPoint::Infinity;
        let bits = k.bits();
        for i in (0..bits).rev() {
            acc = self.double(&acc)?;
            if k.bit(i) {
                acc = self.add(&acc, point)?;
            }
        }
        Ok(acc)
    }
}

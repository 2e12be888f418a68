// ---------------------------------------------------------------------------
// Polynômes annulateurs des minibins
//
// Pour un minibin de racines r_0, …, r_{k-1}, calcule les coefficients de
// Π (x - r_i) mod t par convolution directe, en partant de [1] et en
// réduisant mod t après chaque étape (jamais de coefficient négatif).
// Les coefficients sont rangés degré décroissant : coeffs[0] = 1 (unitaire),
// coeffs[k] = terme constant.
// ---------------------------------------------------------------------------

use crate::math::mulmod_u64;

pub fn vanishing_coefficients(roots: &[u64], t: u64) -> Vec<u64> {
    let mut coefficients = vec![1u64];

    for &root in roots {
        let root = root % t;
        let mut new_coeffs = vec![0u64; coefficients.len() + 1];
        for (i, &c) in coefficients.iter().enumerate() {
            // convolution par (x - root)
            new_coeffs[i] = (new_coeffs[i] + c) % t;
            let product = mulmod_u64(root, c, t);
            new_coeffs[i + 1] = (new_coeffs[i + 1] + t - product) % t;
        }
        coefficients = new_coeffs;
    }

    coefficients
}

/// Évaluation de Horner d'un polynôme rangé degré décroissant.
pub fn evaluate_descending(coefficients: &[u64], x: u64, t: u64) -> u64 {
    let mut acc = 0u64;
    for &c in coefficients {
        acc = (mulmod_u64(acc, x % t, t) + c) % t;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 536903681;

    #[test]
    fn test_annulation_aux_racines() {
        let roots = [11u64, 22, 33, 44];
        let coeffs = vanishing_coefficients(&roots, T);
        assert_eq!(coeffs.len(), roots.len() + 1);
        assert_eq!(coeffs[0], 1);
        for &r in &roots {
            assert_eq!(evaluate_descending(&coeffs, r, T), 0);
        }
    }

    #[test]
    fn test_non_annulation_hors_racines() {
        let roots = [11u64, 22, 33, 44];
        let coeffs = vanishing_coefficients(&roots, T);
        for x in [0u64, 1, 12, 55, 536903680] {
            assert_ne!(evaluate_descending(&coeffs, x, T), 0);
        }
    }

    #[test]
    fn test_petit_exemple_explicite() {
        // (x - 2)(x - 3) = x² - 5x + 6
        let coeffs = vanishing_coefficients(&[2, 3], 97);
        assert_eq!(coeffs, vec![1, 97 - 5, 6]);
    }

    #[test]
    fn test_minibin_vide() {
        // Produit vide : polynôme constant 1
        assert_eq!(vanishing_coefficients(&[], T), vec![1]);
    }
}

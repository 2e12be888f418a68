// ============================================================================
// Fenêtrage et reconstruction des puissances
//
// Pour une valeur de bin y et une borne B/alpha, la matrice fenêtrée
// W[i-1][j] = y^(i·base^j) mod t (quand l'exposant est dans [1, B/alpha])
// permet d'envoyer O(log(B/alpha)) chiffrés au lieu de B/alpha. Le serveur
// reconstruit toute puissance manquante en décomposant l'exposant en base
// `base` et en multipliant les facteurs par paires (profondeur log2).
//
// La combinaison par paires est paramétrée par l'opération de produit :
// la même routine sert aux entiers mod t (tests, référence) et aux
// chiffrés BFV (serveur en ligne).
// ============================================================================

use crate::math::powmod_u64;
use crate::params::params::PsiParams;
use crate::psi_error::psi_error::PsiError;

/// Matrice fenêtrée d'une valeur de bin : (base-1) lignes, log_b_ell
/// colonnes, None quand l'exposant i·base^j sort de [1, bound].
pub fn windowing(y: u64, bound: usize, params: &PsiParams) -> Vec<Vec<Option<u64>>> {
    let t = params.config.plain_modulus;
    let base = params.base as u64;
    let mut matrix = Vec::with_capacity(params.base - 1);

    for i in 1..params.base as u64 {
        let mut row = Vec::with_capacity(params.log_b_ell);
        for j in 0..params.log_b_ell {
            let exponent = base
                .checked_pow(j as u32)
                .and_then(|p| p.checked_mul(i))
                .filter(|&e| e <= bound as u64);
            row.push(exponent.map(|e| powmod_u64(y % t, e, t)));
        }
        matrix.push(row);
    }

    matrix
}

/// Fenêtrage de tous les bins Cuckoo (borne B/alpha).
pub fn window_all_bins(bins: &[u64], params: &PsiParams) -> Vec<Vec<Vec<Option<u64>>>> {
    bins.iter()
        .map(|&y| windowing(y, params.minibin_capacity, params))
        .collect()
}

/// Chiffres de n en base `base`, poids faible en tête.
pub fn base_digits(mut n: usize, base: usize) -> Vec<usize> {
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(n % base);
        n /= base;
    }
    digits
}

/// Produit d'une liste par combinaisons deux à deux : la profondeur
/// multiplicative est ceil(log2(longueur)) au lieu de longueur - 1.
pub fn low_depth_multiplication<T, F>(values: Vec<T>, mut multiply: F) -> Result<T, PsiError>
where
    F: FnMut(&T, &T) -> Result<T, PsiError>,
{
    if values.is_empty() {
        return Err(PsiError::InvalidParameter(
            "produit de puissances vide — exposant nul".into(),
        ));
    }

    let mut layer = values;
    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len() / 2 + 1);
        let mut iter = layer.into_iter();
        while let Some(left) = iter.next() {
            match iter.next() {
                Some(right) => next.push(multiply(&left, &right)?),
                None => next.push(left), // élément impair reporté tel quel
            }
        }
        layer = next;
    }

    layer
        .into_iter()
        .next()
        .ok_or_else(|| PsiError::InvalidParameter("produit de puissances vide".into()))
}

/// Reconstruit y^exponent depuis la matrice fenêtrée (plaintext ou chiffrés).
/// Tous les facteurs requis existent par construction : les chiffres de
/// l'exposant pointent vers des entrées d'exposant ≤ exponent ≤ bound.
pub fn reconstruct_power<T, F>(
    matrix: &[Vec<Option<T>>],
    exponent: usize,
    base: usize,
    multiply: F,
) -> Result<T, PsiError>
where
    T: Clone,
    F: FnMut(&T, &T) -> Result<T, PsiError>,
{
    let digits = base_digits(exponent, base);
    let mut factors = Vec::with_capacity(digits.len());
    for (j, &digit) in digits.iter().enumerate() {
        if digit >= 1 {
            let entry = matrix
                .get(digit - 1)
                .and_then(|row| row.get(j))
                .and_then(|cell| cell.as_ref())
                .ok_or_else(|| {
                    PsiError::InvalidParameter(format!(
                        "entrée fenêtrée manquante pour l'exposant {exponent}"
                    ))
                })?;
            factors.push(entry.clone());
        }
    }
    low_depth_multiplication(factors, multiply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::mulmod_u64;
    use crate::params::params::PsiParams;

    #[test]
    fn test_dimensions_matrice() {
        let params = PsiParams::reduced().unwrap();
        let w = windowing(7, params.minibin_capacity, &params);
        assert_eq!(w.len(), params.base - 1);
        assert!(w.iter().all(|row| row.len() == params.log_b_ell));
        // W[0][0] = y^1
        assert_eq!(w[0][0], Some(7));
    }

    #[test]
    fn test_chiffres_en_base() {
        assert_eq!(base_digits(0, 4), Vec::<usize>::new());
        assert_eq!(base_digits(6, 4), vec![2, 1]);
        assert_eq!(base_digits(34, 4), vec![2, 0, 2]);
    }

    #[test]
    fn test_reconstruction_toutes_puissances() {
        let params = PsiParams::production().unwrap();
        let t = params.config.plain_modulus;
        let y = 123456u64;
        let bound = params.minibin_capacity;
        let w = windowing(y, bound, &params);

        for e in 1..=bound {
            let got = reconstruct_power(&w, e, params.base, |a, b| Ok(mulmod_u64(*a, *b, t))).unwrap();
            assert_eq!(got, powmod_u64(y, e as u64, t), "exposant {e}");
        }
    }

    #[test]
    fn test_profondeur_du_produit() {
        // 5 facteurs : 3 niveaux de produit (ceil(log2 5)), pas 4
        let mut depth_per_value = vec![0u32; 5];
        let values: Vec<usize> = (0..5).collect();
        let mut max_depth = 0u32;
        let _ = low_depth_multiplication(values, |a, b| {
            let d = depth_per_value[*a].max(depth_per_value[*b]) + 1;
            max_depth = max_depth.max(d);
            depth_per_value[*a] = d;
            Ok(*a)
        })
        .unwrap();
        assert_eq!(max_depth, 3);
    }

    #[test]
    fn test_produit_vide_rejete() {
        let empty: Vec<u64> = vec![];
        assert!(low_depth_multiplication(empty, |a, b| Ok(a * b)).is_err());
    }
}

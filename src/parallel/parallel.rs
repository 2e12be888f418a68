// ---------------------------------------------------------------------------
// Pool de workers et découpage des entrées
//
// Le protocole est strictement séquentiel entre les étapes ; seul
// l'intérieur des étapes coûteuses (multiplications scalaires OPRF,
// évaluation des minibins) est parallélisé. Les chunks sont possédés par le
// thread principal et les résultats fusionnés dans l'ordre de soumission.
// ---------------------------------------------------------------------------

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::psi_error::psi_error::PsiError;

/// Construit un pool rayon à taille fixe.
pub fn build_pool(workers: usize) -> Result<ThreadPool, PsiError> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| PsiError::InvalidParameter(format!("pool de workers : {e}")))
}

/// Taille de chunk arrondie vers le haut : couvre toujours toute l'entrée,
/// au plus `parts` chunks, jamais zéro.
pub fn chunk_size(len: usize, parts: usize) -> usize {
    if len == 0 {
        1
    } else {
        len.div_ceil(parts.max(1))
    }
}

/// Découpe `items` en au plus `parts` chunks contigus de taille égale
/// (arrondi supérieur), dans l'ordre d'origine.
pub fn split_into_chunks<T: Clone>(items: &[T], parts: usize) -> Vec<Vec<T>> {
    items
        .chunks(chunk_size(items.len(), parts))
        .map(|c| c.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_arrondi_superieur() {
        let items: Vec<u32> = (0..10).collect();
        let chunks = split_into_chunks(&items, 3);
        // ceil(10/3) = 4 : chunks de 4, 4, 2 — jamais n+1 chunks
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], vec![0, 1, 2, 3]);
        assert_eq!(chunks[2], vec![8, 9]);
    }

    #[test]
    fn test_chunks_division_exacte() {
        let items: Vec<u32> = (0..9).collect();
        let chunks = split_into_chunks(&items, 3);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 3));
    }

    #[test]
    fn test_chunks_entree_vide() {
        let items: Vec<u32> = vec![];
        assert!(split_into_chunks(&items, 4).is_empty());
    }

    #[test]
    fn test_pool() {
        let pool = build_pool(2).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}

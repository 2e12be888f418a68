// ============================================================================
// Table de hachage Cuckoo — côté client
//
// m = 2^ob bins, h graines Murmur, au plus une entrée par bin. L'insertion
// déplace l'occupant précédent et le réinsère sous une autre graine ;
// au-delà de d = 8·log2(m) déplacements, l'insertion échoue (paramètres
// sous-dimensionnés pour |C|).
//
// On stocke (item_left ∥ indice de graine) : avec l'emplacement du bin et la
// graine, cela suffit à reconstruire l'item complet (voir reconstruct_item),
// ce qui est exactement ce dont la récupération d'intersection a besoin.
// ============================================================================

use rand::Rng;
use rand_core::OsRng;

use crate::hashing::murmur::murmur3_32;
use crate::params::params::PsiParams;
use crate::psi_error::psi_error::PsiError;

// ─────────────────────────────────────────────────────────
// Helpers partagés avec le hachage simple
// ─────────────────────────────────────────────────────────

/// loc(seed, item) = (murmur32(item_left, seed) >> (32 - ob)) XOR item_right
///
/// L'entrée du hachage est la représentation décimale d'item_left, et la
/// graine est tronquée à 32 bits (compatibilité mmh3).
pub fn location(seed: u64, item: u64, params: &PsiParams) -> usize {
    let item_left = item >> params.config.output_bits;
    let item_right = item & params.right_mask();
    let hashed =
        (murmur3_32(item_left.to_string().as_bytes(), seed as u32) >> (32 - params.config.output_bits)) as u64;
    (hashed ^ item_right) as usize
}

/// (item_left ∥ index) — la valeur réellement stockée dans les bins
pub fn left_and_index(item: u64, index: usize, params: &PsiParams) -> u64 {
    ((item >> params.config.output_bits) << params.log_no_hashes) + index as u64
}

/// Indice de graine encodé dans une valeur stockée
pub fn extract_index(stored: u64, params: &PsiParams) -> usize {
    (stored & params.index_mask()) as usize
}

/// Reconstruit l'item complet depuis (valeur stockée, bin, graine)
pub fn reconstruct_item(stored: u64, current_location: usize, seed: u64, params: &PsiParams) -> u64 {
    let item_left = stored >> params.log_no_hashes;
    let hashed =
        (murmur3_32(item_left.to_string().as_bytes(), seed as u32) >> (32 - params.config.output_bits)) as u64;
    let item_right = hashed ^ current_location as u64;
    (item_left << params.config.output_bits) + item_right
}

// Indice uniforme dans [0, bound) distinct de `excluded`
fn random_index_excluding(bound: usize, excluded: usize) -> usize {
    let mut rng = OsRng;
    loop {
        let value = rng.gen_range(0..bound);
        if value != excluded {
            return value;
        }
    }
}

// ─────────────────────────────────────────────────────────
// Table
// ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CuckooTable {
    bins: Vec<Option<u64>>,
}

impl CuckooTable {
    pub fn new(params: &PsiParams) -> Self {
        CuckooTable { bins: vec![None; params.number_of_bins] }
    }

    /// Insère un item PRF-é (boucle de déplacement, indice initial aléatoire).
    pub fn insert(&mut self, item: u64, params: &PsiParams) -> Result<(), PsiError> {
        let seeds = &params.config.hash_seeds;
        let mut rng = OsRng;
        let mut current_item = item;
        let mut insert_index = rng.gen_range(0..params.config.number_of_hashes);
        let mut depth = 0usize;

        loop {
            let loc = location(seeds[insert_index], current_item, params);
            let displaced = self.bins[loc].replace(left_and_index(current_item, insert_index, params));

            match displaced {
                None => return Ok(()),
                Some(stored) => {
                    depth += 1;
                    if depth >= params.cuckoo_depth {
                        return Err(PsiError::CuckooDepthExceeded { depth: params.cuckoo_depth });
                    }
                    // L'occupant délogé repart sous une graine différente
                    let unwanted_index = extract_index(stored, params);
                    current_item = reconstruct_item(stored, loc, seeds[unwanted_index], params);
                    insert_index = random_index_excluding(params.config.number_of_hashes, unwanted_index);
                }
            }
        }
    }

    /// Insère une liste d'items (déjà dédupliquée par l'appelant).
    pub fn insert_items(&mut self, items: &[u64], params: &PsiParams) -> Result<(), PsiError> {
        for &item in items {
            self.insert(item, params)?;
        }
        Ok(())
    }

    pub fn occupied(&self) -> usize {
        self.bins.iter().filter(|b| b.is_some()).count()
    }

    /// Vue gelée : les bins vides reçoivent la sentinelle dummy_client.
    /// Après cet appel la table n'est plus mutable.
    pub fn into_bins(self, params: &PsiParams) -> Vec<u64> {
        self.bins
            .into_iter()
            .map(|slot| slot.unwrap_or(params.dummy_client))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::params::PsiParams;

    #[test]
    fn test_aller_retour_reconstruction() {
        // reconstruct(stored, loc, seed_i) = item pour chaque graine i
        let params = PsiParams::reduced().unwrap();
        let item = 0x1_2345u64 & params.item_mask;
        for i in 0..params.config.number_of_hashes {
            let seed = params.config.hash_seeds[i];
            let loc = location(seed, item, &params);
            let stored = left_and_index(item, i, &params);
            assert_eq!(extract_index(stored, &params), i);
            assert_eq!(reconstruct_item(stored, loc, seed, &params), item);
        }
    }

    #[test]
    fn test_insertion_et_occupation() {
        let params = PsiParams::reduced().unwrap();
        let items: Vec<u64> = vec![3, 17, 291, 1025];
        let mut table = CuckooTable::new(&params);
        table.insert_items(&items, &params).unwrap();
        assert_eq!(table.occupied(), items.len());

        let bins = table.into_bins(&params);
        assert_eq!(bins.len(), params.number_of_bins);

        // Chaque item doit être reconstructible depuis son bin
        let mut recovered: Vec<u64> = Vec::new();
        for (loc, &stored) in bins.iter().enumerate() {
            if stored == params.dummy_client {
                continue;
            }
            let index = extract_index(stored, &params);
            recovered.push(reconstruct_item(stored, loc, params.config.hash_seeds[index], &params));
        }
        recovered.sort_unstable();
        let mut expected = items.clone();
        expected.sort_unstable();
        assert_eq!(recovered, expected);
    }

    #[test]
    fn test_debordement_profondeur() {
        // Plus d'items que de bins : l'insertion doit finir par échouer
        let params = PsiParams::reduced().unwrap();
        let mut table = CuckooTable::new(&params);
        let mut result = Ok(());
        for item in 0..2 * params.number_of_bins as u64 {
            result = table.insert(item << params.config.output_bits, &params);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(PsiError::CuckooDepthExceeded { .. })));
    }
}

// ============================================================================
// Table de hachage simple — côté serveur
//
// Chaque item PRF-é du serveur est inséré dans son bin sous CHACUNE des h
// graines (il apparaît donc h fois dans la table). Dépasser la capacité B
// d'un bin est fatal : le dimensionnement de B en fonction de |S| garantit
// que cela n'arrive pas pour les tailles prévues.
//
// Après insertion, chaque bin est complété à alpha·ceil(B/alpha) entrées
// avec la sentinelle dummy_server, puis découpé en alpha minibins pleins
// dont on calcule les polynômes annulateurs.
// ============================================================================

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::batching::poly_coeffs::vanishing_coefficients;
use crate::hashing::cuckoo_hash::{left_and_index, location};
use crate::params::params::PsiParams;
use crate::psi_error::psi_error::PsiError;

#[derive(Debug)]
pub struct SimpleTable {
    bins: Vec<Vec<u64>>,
}

impl SimpleTable {
    pub fn new(params: &PsiParams) -> Self {
        SimpleTable {
            bins: vec![Vec::with_capacity(params.padded_bin_capacity); params.number_of_bins],
        }
    }

    // Insère l'item sous la graine d'indice i
    fn insert(&mut self, item: u64, hash_index: usize, params: &PsiParams) -> Result<(), PsiError> {
        let loc = location(params.config.hash_seeds[hash_index], item, params);
        if self.bins[loc].len() >= params.config.bin_capacity {
            return Err(PsiError::BinOverflow { bin: loc, capacity: params.config.bin_capacity });
        }
        self.bins[loc].push(left_and_index(item, hash_index, params));
        Ok(())
    }

    /// Insère l'ensemble PRF-é du serveur : chaque item sous chacune des h graines.
    pub fn insert_entries(&mut self, items: &[u64], params: &PsiParams) -> Result<(), PsiError> {
        for &item in items {
            for i in 0..params.config.number_of_hashes {
                self.insert(item, i, params)?;
            }
        }
        Ok(())
    }

    pub fn max_occupancy(&self) -> usize {
        self.bins.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Vue gelée : chaque bin complété à alpha·ceil(B/alpha) avec dummy_server.
    pub fn into_padded_bins(self, params: &PsiParams) -> Vec<Vec<u64>> {
        let mut bins = self.bins;
        for bin in &mut bins {
            bin.resize(params.padded_bin_capacity, params.dummy_server);
        }
        bins
    }
}

/// Partitionne chaque bin en alpha minibins et concatène les coefficients de
/// leurs polynômes annulateurs : une ligne de alpha·(B/alpha + 1) entiers
/// mod t par bin. C'est l'artefact préprocessé du serveur.
pub fn partition_into_coefficients(
    padded_bins: &[Vec<u64>],
    params: &PsiParams,
    pool: &ThreadPool,
) -> Vec<Vec<u64>> {
    let t = params.config.plain_modulus;
    let minibin = params.minibin_capacity;
    pool.install(|| {
        padded_bins
            .par_iter()
            .map(|bin| {
                let mut row = Vec::with_capacity(params.config.alpha * (minibin + 1));
                for minibin_roots in bin.chunks(minibin) {
                    row.extend(vanishing_coefficients(minibin_roots, t));
                }
                row
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::build_pool;
    use crate::params::params::PsiParams;

    #[test]
    fn test_chaque_item_present_h_fois() {
        let params = PsiParams::reduced().unwrap();
        let items: Vec<u64> = vec![3, 17, 291];
        let mut table = SimpleTable::new(&params);
        table.insert_entries(&items, &params).unwrap();

        let total: usize = table.bins.iter().map(Vec::len).sum();
        assert_eq!(total, items.len() * params.config.number_of_hashes);
    }

    #[test]
    fn test_remplissage() {
        let params = PsiParams::reduced().unwrap();
        let mut table = SimpleTable::new(&params);
        table.insert_entries(&[42], &params).unwrap();
        let bins = table.into_padded_bins(&params);
        assert!(bins.iter().all(|b| b.len() == params.padded_bin_capacity));
        assert!(bins.iter().flatten().filter(|&&v| v == params.dummy_server).count() > 0);
    }

    #[test]
    fn test_debordement_de_bin() {
        // Des items partageant item_left = 0 et item_right = 0 atterrissent
        // tous dans le même bin sous la même graine
        let params = PsiParams::reduced().unwrap();
        let mut table = SimpleTable::new(&params);
        let mut result = Ok(());
        for _ in 0..=params.config.bin_capacity {
            result = table.insert(0, 0, &params);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(PsiError::BinOverflow { .. })));
    }

    #[test]
    fn test_dimensions_des_coefficients() {
        let params = PsiParams::reduced().unwrap();
        let pool = build_pool(2).unwrap();
        let mut table = SimpleTable::new(&params);
        table.insert_entries(&[3, 17, 291], &params).unwrap();
        let bins = table.into_padded_bins(&params);
        let coeffs = partition_into_coefficients(&bins, &params, &pool);
        assert_eq!(coeffs.len(), params.number_of_bins);
        let expected_row = params.config.alpha * (params.minibin_capacity + 1);
        assert!(coeffs.iter().all(|row| row.len() == expected_row));
        // Le coefficient dominant de chaque minibin vaut 1 (polynôme unitaire)
        assert!(coeffs.iter().all(|row| row[0] == 1));
    }
}

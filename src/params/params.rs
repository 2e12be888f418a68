// ===========================================================================
// Paramètres du protocole PSI
//
// Une seule valeur immuable (PsiParams) est dérivée au démarrage depuis la
// configuration de base (PsiConfig). Toutes les constantes dérivées et tous
// les invariants de cohérence sont calculés/vérifiés ici — aucune autre
// partie du code ne recalcule sigma_max, les dummies ou les capacités.
// ===========================================================================

use crate::math::is_prime_u64;
use crate::oprf::curve::CURVE_LOG_P;
use crate::psi_error::psi_error::PsiError;

// Budget de profondeur multiplicative du schéma BFV tel que paramétré
// (q = 2^255 - 19, t ~ 2^29) : la reconstruction des puissances doit tenir
// dedans, marge comprise.
pub const FHE_DEPTH_BUDGET: u32 = 3;

// ─────────────────────────────────────────────────────────
// Configuration de base (choisie par l'opérateur)
// ─────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct PsiConfig {
    pub server_size:        usize,
    pub client_size:        usize,
    pub intersection_size:  usize,

    /// Graines des fonctions de hachage Murmur, partagées par les deux parties
    pub hash_seeds:         Vec<u64>,

    /// ob : largeur de sortie des hachages — 2^ob bins
    pub output_bits:        u32,

    /// Module plaintext t du schéma BFV (premier, t = 1 mod 2N)
    pub plain_modulus:      u64,

    /// Degré N du polynôme de modulation BFV (doit valoir 2^ob)
    pub poly_modulus_degree: usize,

    /// h : nombre de fonctions de hachage simple/Cuckoo
    pub number_of_hashes:   usize,

    /// B : capacité d'un bin du hachage simple (voir bin_capacity_for_log_size)
    pub bin_capacity:       usize,

    /// alpha : nombre de minibins par bin
    pub alpha:              usize,

    /// ell : paramètre de fenêtrage — base = 2^ell
    pub ell:                u32,

    /// Nombre de workers du pool de calcul
    pub workers:            usize,
}

impl PsiConfig {
    /// Paramètres de production : |S| = 2^20, |C| = 4000.
    pub fn production() -> Self {
        PsiConfig {
            server_size:         1 << 20,
            client_size:         4000,
            intersection_size:   3500,
            hash_seeds:          vec![123456789, 10111213141516, 17181920212223],
            output_bits:         13,
            plain_modulus:       536903681,
            poly_modulus_degree: 1 << 13,
            number_of_hashes:    3,
            bin_capacity:        536,
            alpha:               16,
            ell:                 2,
            workers:             8,
        }
    }

    /// Paramètres réduits pour la démo locale et les tests : 2^4 bins.
    pub fn reduced() -> Self {
        PsiConfig {
            server_size:         8,
            client_size:         4,
            intersection_size:   2,
            hash_seeds:          vec![123456789, 10111213141516, 17181920212223],
            output_bits:         4,
            plain_modulus:       536903681,
            poly_modulus_degree: 1 << 4,
            number_of_hashes:    3,
            bin_capacity:        8,
            alpha:               2,
            ell:                 2,
            workers:             2,
        }
    }
}

/// Capacité de bin B recommandée en fonction de log2(|S|). None hors de la
/// plage couverte par la table de dimensionnement.
pub fn bin_capacity_for_log_size(log2_server_size: u32) -> Option<usize> {
    match log2_server_size {
        16 => Some(68),
        18 => Some(176),
        20 => Some(536),
        22 => Some(1832),
        24 => Some(6727),
        _  => None,
    }
}

// ─────────────────────────────────────────────────────────
// Paramètres dérivés — gelés après dérivation
// ─────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct PsiParams {
    pub config:             PsiConfig,

    /// m = 2^ob : nombre de bins (= N par construction)
    pub number_of_bins:     usize,

    /// Nombre de bits pour stocker un indice de hachage : floor(log2 h) + 1
    pub log_no_hashes:      u32,

    /// Largeur des valeurs PRF tronquées
    pub sigma_max:          u32,

    /// Masque 2^sigma_max - 1
    pub item_mask:          u64,

    /// Sentinelle des bins Cuckoo vides : 2^(sigma_max - ob + log_no_hashes)
    pub dummy_client:       u64,

    /// Sentinelle de remplissage serveur : dummy_client + 1
    pub dummy_server:       u64,

    /// base = 2^ell
    pub base:               usize,

    /// Capacité d'un minibin : ceil(B / alpha)
    pub minibin_capacity:   usize,

    /// Capacité d'un bin après remplissage : alpha * minibin_capacity
    pub padded_bin_capacity: usize,

    /// Nombre de colonnes de la matrice de fenêtrage : floor(log2(B/alpha)) + 1
    pub log_b_ell:          usize,

    /// Profondeur maximale de la récursion Cuckoo : 8 * log2(m)
    pub cuckoo_depth:       usize,
}

impl PsiParams {
    pub fn production() -> Result<Self, PsiError> {
        Self::derive(PsiConfig::production())
    }

    pub fn reduced() -> Result<Self, PsiError> {
        Self::derive(PsiConfig::reduced())
    }

    /// Dérive toutes les constantes et vérifie les invariants de cohérence.
    /// Chaque échec est une erreur de paramètres distincte, fatale au démarrage.
    pub fn derive(config: PsiConfig) -> Result<Self, PsiError> {
        if config.number_of_hashes < 2 {
            return Err(PsiError::InvalidParameter(
                "au moins 2 fonctions de hachage sont requises".into(),
            ));
        }
        if config.hash_seeds.len() != config.number_of_hashes {
            return Err(PsiError::HashSeedCountMismatch {
                seeds:  config.hash_seeds.len(),
                hashes: config.number_of_hashes,
            });
        }
        if config.output_bits == 0 || config.output_bits > 30 {
            return Err(PsiError::InvalidParameter(
                "output_bits doit être dans [1, 30]".into(),
            ));
        }
        if config.alpha == 0 || config.bin_capacity == 0 {
            return Err(PsiError::InvalidParameter(
                "alpha et bin_capacity doivent être non nuls".into(),
            ));
        }
        if config.ell == 0 {
            return Err(PsiError::InvalidParameter("ell doit être non nul".into()));
        }
        if config.workers == 0 {
            return Err(PsiError::InvalidParameter("au moins un worker est requis".into()));
        }

        let number_of_bins = 1usize << config.output_bits;
        if number_of_bins != config.poly_modulus_degree {
            return Err(PsiError::BinCountMismatch {
                bins:        number_of_bins,
                poly_degree: config.poly_modulus_degree,
            });
        }

        let t = config.plain_modulus;
        if !is_prime_u64(t) {
            return Err(PsiError::PlainModulusNotPrime { value: t });
        }
        let two_n = 2 * config.poly_modulus_degree as u64;
        if (t - 1) % two_n != 0 {
            return Err(PsiError::PlainModulusNotNttFriendly {
                value:            t,
                required_divisor: two_n,
            });
        }

        // floor(log2 h) + 1 bits pour stocker un indice dans [0, h)
        let log_no_hashes = 64 - (config.number_of_hashes as u64).leading_zeros();
        let log2_t = 63 - t.leading_zeros();

        // sigma_max = floor(log2 t) + ob - log_no_hashes
        let sigma_max = log2_t + config.output_bits - log_no_hashes;
        if sigma_max > 63 {
            return Err(PsiError::SigmaMaxTooLarge { sigma_max, maximum: 63 });
        }
        if sigma_max <= config.output_bits {
            return Err(PsiError::InvalidParameter(
                "sigma_max doit dépasser output_bits (item_left vide sinon)".into(),
            ));
        }
        if sigma_max + 10 > CURVE_LOG_P {
            return Err(PsiError::TruncationOutOfRange { sigma_max, log_p: CURVE_LOG_P });
        }

        let item_mask = (1u64 << sigma_max) - 1;

        // Les valeurs stockées dans les bins font sigma_max - ob + log_no_hashes
        // bits ; les sentinelles vivent juste au-dessus, sous t.
        let dummy_client = 1u64 << (sigma_max - config.output_bits + log_no_hashes);
        let dummy_server = dummy_client + 1;
        if dummy_server >= t {
            return Err(PsiError::InvalidParameter(
                "la sentinelle serveur déborde le domaine plaintext [0, t)".into(),
            ));
        }

        let base = 1usize << config.ell;
        let minibin_capacity = config.bin_capacity.div_ceil(config.alpha);
        if minibin_capacity < 2 {
            return Err(PsiError::InvalidParameter(
                "capacité de minibin < 2 : alpha trop grand pour B".into(),
            ));
        }
        let padded_bin_capacity = config.alpha * minibin_capacity;
        let log_b_ell = (usize::BITS - minibin_capacity.leading_zeros()) as usize;

        // Profondeur de la reconstruction des puissances : ceil(log2 du
        // nombre de chiffres de minibin_capacity en base 2^ell)
        let digits = base_digit_count(minibin_capacity, base);
        let required_depth = ceil_log2(digits);
        if required_depth > FHE_DEPTH_BUDGET {
            return Err(PsiError::DepthBudgetExceeded {
                required: required_depth,
                budget:   FHE_DEPTH_BUDGET,
            });
        }

        let cuckoo_depth = 8 * config.output_bits as usize;

        Ok(PsiParams {
            config,
            number_of_bins,
            log_no_hashes,
            sigma_max,
            item_mask,
            dummy_client,
            dummy_server,
            base,
            minibin_capacity,
            padded_bin_capacity,
            log_b_ell,
            cuckoo_depth,
        })
    }

    /// Masque extrayant l'indice de hachage d'une valeur stockée
    pub fn index_mask(&self) -> u64 {
        (1u64 << self.log_no_hashes) - 1
    }

    /// Masque extrayant item_right (les ob bits bas d'un item)
    pub fn right_mask(&self) -> u64 {
        (1u64 << self.config.output_bits) - 1
    }
}

/// Nombre de chiffres de `value` en base `base` (au moins 1).
fn base_digit_count(mut value: usize, base: usize) -> u32 {
    let mut digits = 0u32;
    while value > 0 {
        value /= base;
        digits += 1;
    }
    digits.max(1)
}

fn ceil_log2(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        32 - (n - 1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_production() {
        let p = PsiParams::production().unwrap();
        assert_eq!(p.number_of_bins, 8192);
        assert_eq!(p.log_no_hashes, 2);
        assert_eq!(p.sigma_max, 40);
        assert_eq!(p.item_mask, (1u64 << 40) - 1);
        assert_eq!(p.dummy_client, 1u64 << 29);
        assert_eq!(p.dummy_server, (1u64 << 29) + 1);
        assert_eq!(p.base, 4);
        assert_eq!(p.minibin_capacity, 34); // ceil(536 / 16)
        assert_eq!(p.padded_bin_capacity, 544);
        assert_eq!(p.log_b_ell, 6);
        assert_eq!(p.cuckoo_depth, 104);
    }

    #[test]
    fn test_table_bin_capacity() {
        assert_eq!(bin_capacity_for_log_size(20), Some(536));
        assert_eq!(bin_capacity_for_log_size(24), Some(6727));
        assert_eq!(bin_capacity_for_log_size(17), None);
    }

    #[test]
    fn test_rejet_bins_degre_different() {
        let mut cfg = PsiConfig::production();
        cfg.poly_modulus_degree = 1 << 12;
        assert!(matches!(
            PsiParams::derive(cfg),
            Err(PsiError::BinCountMismatch { bins: 8192, poly_degree: 4096 })
        ));
    }

    #[test]
    fn test_rejet_module_compose() {
        let mut cfg = PsiConfig::reduced();
        cfg.plain_modulus = 536903685;
        assert!(matches!(
            PsiParams::derive(cfg),
            Err(PsiError::PlainModulusNotPrime { .. })
        ));
    }

    #[test]
    fn test_rejet_graines_manquantes() {
        let mut cfg = PsiConfig::reduced();
        cfg.hash_seeds = vec![1, 2];
        assert!(matches!(
            PsiParams::derive(cfg),
            Err(PsiError::HashSeedCountMismatch { seeds: 2, hashes: 3 })
        ));
    }

    #[test]
    fn test_rejet_profondeur_excessive() {
        // ell = 1 et un minibin de 4096 : 13 chiffres binaires,
        // profondeur ceil(log2 13) = 4 > budget
        let mut cfg = PsiConfig::production();
        cfg.ell = 1;
        cfg.alpha = 1;
        cfg.bin_capacity = 4096;
        assert!(matches!(
            PsiParams::derive(cfg),
            Err(PsiError::DepthBudgetExceeded { required: 4, budget: FHE_DEPTH_BUDGET })
        ));
    }
}

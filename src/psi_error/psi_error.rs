// ===========================================================================
// Gestion centralisée des erreurs du protocole PSI
//
// Tous les modules utilisent ce type au lieu de panic!/assert!/unwrap().
// Chaque famille d'erreur correspond à un code de sortie distinct pour les
// binaires (voir exit_code) : une erreur fatale interrompt la partie en
// cours, il n'y a ni reprise ni retry à l'intérieur d'une exécution.
// ===========================================================================

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PsiError {
    // --- Incohérences de paramètres (fatales au démarrage) ---
    /// Le nombre de bins 2^ob ne coïncide pas avec le degré N du polynôme BFV
    BinCountMismatch { bins: usize, poly_degree: usize },
    /// Le module plaintext t n'est pas premier
    PlainModulusNotPrime { value: u64 },
    /// t != 1 mod 2N : le batching par NTT négacyclique est impossible
    PlainModulusNotNttFriendly { value: u64, required_divisor: u64 },
    /// sigma_max dépasse la largeur représentable pour un item (u64)
    SigmaMaxTooLarge { sigma_max: u32, maximum: u32 },
    /// La troncature PRF déborde la coordonnée x (sigma_max + 10 > log2 p)
    TruncationOutOfRange { sigma_max: u32, log_p: u32 },
    /// La reconstruction des puissances demande plus de profondeur
    /// multiplicative que le budget du schéma BFV
    DepthBudgetExceeded { required: u32, budget: u32 },
    /// Le nombre de graines ne correspond pas au nombre de fonctions de hachage
    HashSeedCountMismatch { seeds: usize, hashes: usize },
    /// Paramètre invalide (cas génériques : h < 2, alpha = 0, B = 0…)
    InvalidParameter(String),

    // --- Débordements de hachage ---
    /// L'insertion Cuckoo a dépassé la profondeur de récursion d
    CuckooDepthExceeded { depth: usize },
    /// Un bin du hachage simple dépasse la capacité B
    BinOverflow { bin: usize, capacity: usize },

    // --- Erreurs de courbe elliptique ---
    /// L'item est hors du domaine scalaire [0, q)
    ItemOutsideCurveOrder,
    /// Paire (x, y) décodée qui n'appartient pas à la courbe
    PointNotOnCurve,
    /// L'inverse modulaire n'existe pas (gcd != 1)
    NoModularInverse,

    // --- Erreurs FHE ---
    /// Le vecteur de slots n'a pas la longueur N
    SlotCountMismatch { expected: usize, actual: usize },
    /// Une valeur de slot est >= t (hors domaine plaintext BFV)
    PlaintextSlotOutOfRange,
    /// Contexte FHE reçu incohérent avec les paramètres dérivés
    MalformedFheContext(String),
    /// La clé de relinéarisation n'a pas le bon nombre de lignes de décomposition
    RelinDigitMismatch { expected: usize, actual: usize },

    // --- Erreurs de transport / protocole ---
    /// Préfixe de longueur non décimal ou vide
    FrameLengthMalformed,
    /// Fin de flux avant d'avoir reçu la charge utile annoncée
    UnexpectedEof { expected: usize, received: usize },
    /// Erreur d'E/S sur la socket ou le disque pendant un échange
    Io(String),
    /// Échec de (dé)sérialisation bincode d'une charge utile
    Serialization(String),
    /// Message reçu hors séquence par la machine à états du protocole
    ProtocolStateMismatch { expected: &'static str, state: &'static str },
}

impl fmt::Display for PsiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PsiError::BinCountMismatch { bins, poly_degree } =>
                write!(f, "Nombre de bins ({bins}) différent du degré du polynôme BFV ({poly_degree})"),
            PsiError::PlainModulusNotPrime { value } =>
                write!(f, "Le module plaintext t = {value} n'est pas premier"),
            PsiError::PlainModulusNotNttFriendly { value, required_divisor } =>
                write!(f, "t = {value} incompatible avec le batching : t - 1 doit être divisible par {required_divisor}"),
            PsiError::SigmaMaxTooLarge { sigma_max, maximum } =>
                write!(f, "sigma_max = {sigma_max} bits dépasse le maximum représentable ({maximum})"),
            PsiError::TruncationOutOfRange { sigma_max, log_p } =>
                write!(f, "Troncature PRF impossible : sigma_max + 10 = {} > log2(p) = {log_p}", sigma_max + 10),
            PsiError::DepthBudgetExceeded { required, budget } =>
                write!(f, "Profondeur multiplicative requise {required} > budget du schéma {budget}"),
            PsiError::HashSeedCountMismatch { seeds, hashes } =>
                write!(f, "{seeds} graine(s) fournie(s) pour {hashes} fonction(s) de hachage"),
            PsiError::InvalidParameter(msg) =>
                write!(f, "Paramètre invalide : {msg}"),
            PsiError::CuckooDepthExceeded { depth } =>
                write!(f, "Hachage Cuckoo échoué : profondeur de récursion {depth} atteinte (bin plein)"),
            PsiError::BinOverflow { bin, capacity } =>
                write!(f, "Hachage simple interrompu : bin {bin} dépasse la capacité {capacity}"),
            PsiError::ItemOutsideCurveOrder =>
                write!(f, "L'item doit être dans [0, q) — q l'ordre du générateur de la courbe"),
            PsiError::PointNotOnCurve =>
                write!(f, "Point décodé hors de la courbe : transport corrompu ou mauvais paramètres"),
            PsiError::NoModularInverse =>
                write!(f, "Impossible de calculer l'inverse modulaire (gcd != 1)"),
            PsiError::SlotCountMismatch { expected, actual } =>
                write!(f, "Vecteur de slots de longueur {actual}, attendu {expected}"),
            PsiError::PlaintextSlotOutOfRange =>
                write!(f, "Valeur de slot hors du domaine plaintext [0, t)"),
            PsiError::MalformedFheContext(msg) =>
                write!(f, "Contexte FHE reçu incohérent : {msg}"),
            PsiError::RelinDigitMismatch { expected, actual } =>
                write!(f, "Clé de relinéarisation : {actual} ligne(s) de décomposition, attendu {expected}"),
            PsiError::FrameLengthMalformed =>
                write!(f, "Préfixe de longueur de trame malformé (10 octets ASCII décimaux attendus)"),
            PsiError::UnexpectedEof { expected, received } =>
                write!(f, "Flux interrompu : {received} octet(s) reçu(s) sur {expected} annoncés"),
            PsiError::Io(msg) =>
                write!(f, "Erreur d'E/S : {msg}"),
            PsiError::Serialization(msg) =>
                write!(f, "Erreur de sérialisation : {msg}"),
            PsiError::ProtocolStateMismatch { expected, state } =>
                write!(f, "Message hors séquence : étape « {expected} » demandée depuis l'état « {state} »"),
        }
    }
}

impl std::error::Error for PsiError {}

impl From<std::io::Error> for PsiError {
    fn from(e: std::io::Error) -> Self {
        PsiError::Io(e.to_string())
    }
}

impl From<bincode::Error> for PsiError {
    fn from(e: bincode::Error) -> Self {
        PsiError::Serialization(e.to_string())
    }
}

impl PsiError {
    /// Code de sortie du processus pour chaque famille d'erreur.
    /// Les binaires l'utilisent via std::process::exit.
    pub fn exit_code(&self) -> i32 {
        match self {
            PsiError::BinCountMismatch { .. }
            | PsiError::PlainModulusNotPrime { .. }
            | PsiError::PlainModulusNotNttFriendly { .. }
            | PsiError::SigmaMaxTooLarge { .. }
            | PsiError::TruncationOutOfRange { .. }
            | PsiError::DepthBudgetExceeded { .. }
            | PsiError::HashSeedCountMismatch { .. }
            | PsiError::InvalidParameter(_) => 2,

            PsiError::CuckooDepthExceeded { .. }
            | PsiError::BinOverflow { .. } => 3,

            PsiError::ItemOutsideCurveOrder
            | PsiError::PointNotOnCurve
            | PsiError::NoModularInverse => 4,

            PsiError::SlotCountMismatch { .. }
            | PsiError::PlaintextSlotOutOfRange
            | PsiError::MalformedFheContext(_)
            | PsiError::RelinDigitMismatch { .. } => 5,

            PsiError::FrameLengthMalformed
            | PsiError::UnexpectedEof { .. }
            | PsiError::Io(_)
            | PsiError::Serialization(_)
            | PsiError::ProtocolStateMismatch { .. } => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_par_famille() {
        assert_eq!(PsiError::BinCountMismatch { bins: 8192, poly_degree: 4096 }.exit_code(), 2);
        assert_eq!(PsiError::CuckooDepthExceeded { depth: 104 }.exit_code(), 3);
        assert_eq!(PsiError::PointNotOnCurve.exit_code(), 4);
        assert_eq!(PsiError::PlaintextSlotOutOfRange.exit_code(), 5);
        assert_eq!(PsiError::FrameLengthMalformed.exit_code(), 6);
    }

    #[test]
    fn test_conversion_io() {
        let e: PsiError = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof").into();
        assert_eq!(e.exit_code(), 6);
    }
}

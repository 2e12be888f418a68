// Réexporte les fonctions arithmétiques partagées (courbe, BFV, paramètres)

mod math;

pub use math::{gcd, mod_inverse, mulmod_u64, powmod_u64, is_prime_u64};

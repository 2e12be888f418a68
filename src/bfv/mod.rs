pub mod poly_ring;
pub mod batch_encoder;
pub mod bfv_keygen;
pub mod bfv_encrypt;
pub mod bfv_decrypt;
pub mod bfv_eval;

// Réexportations anneau et encodage
pub use poly_ring::RingPoly;
pub use batch_encoder::BatchEncoder;

// Réexportations clés et chiffrement
pub use bfv_keygen::{BfvParams, BfvSecretKey, BfvPublicKey, BfvRelinKey, bfv_keygen};
pub use bfv_encrypt::{Ciphertext, bfv_encrypt};
pub use bfv_decrypt::bfv_decrypt;
pub use bfv_eval::{add, add_plain, mul_plain, mul};

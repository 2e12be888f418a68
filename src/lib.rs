// Déclaration des modules
pub mod psi_error;
pub mod math;
pub mod params;
pub mod oprf;
pub mod hashing;
pub mod batching;
pub mod bfv;
pub mod transport;
pub mod parallel;
pub mod protocol;
pub mod set_gen;

// Paramètres dérivés et configuration
pub use params::{PsiConfig, PsiParams, bin_capacity_for_log_size};

// Primitives principales
pub use oprf::{CurveP192, EcPoint, OprfKey};
pub use hashing::{CuckooTable, SimpleTable};
pub use bfv::{BatchEncoder, BfvParams, Ciphertext};

// Drivers du protocole
pub use protocol::{
    run_client_offline, run_client_online, run_server_offline, run_server_online,
    run_local_protocol,
};

// Erreur centralisée
pub use psi_error::PsiError;

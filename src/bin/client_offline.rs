// =========================================================
// client-offline — préprocessing du client
// Encodage des items sur la courbe, aveuglés par k_c.
// Usage : client-offline [workers]
// =========================================================

use std::path::Path;
use std::process;

use psi_crypto::params::params::{PsiConfig, PsiParams};
use psi_crypto::protocol::client::run_client_offline;
use psi_crypto::psi_error::psi_error::PsiError;

fn main() {
    if let Err(e) = run() {
        eprintln!("[FATAL] {}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), PsiError> {
    let mut config = PsiConfig::production();
    if let Some(workers) = std::env::args().nth(1) {
        config.workers = workers
            .parse()
            .map_err(|_| PsiError::InvalidParameter("nombre de workers invalide".into()))?;
    }
    let params = PsiParams::derive(config)?;
    run_client_offline(&params, Path::new("."))
}

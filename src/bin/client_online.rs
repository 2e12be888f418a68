// =========================================================
// client-online — phase en ligne du client
// Échange OPRF, requête BFV, récupération de l'intersection
// (imprimée sur stdout, un item par ligne).
// Usage : client-online [host] [port] [workers]
// =========================================================

use std::path::Path;
use std::process;

use psi_crypto::params::params::{PsiConfig, PsiParams};
use psi_crypto::protocol::client::run_client_online;
use psi_crypto::psi_error::psi_error::PsiError;
use psi_crypto::transport::transport::{DEFAULT_HOST, DEFAULT_PORT};

fn main() {
    if let Err(e) = run() {
        eprintln!("[FATAL] {}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), PsiError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let host = args.first().cloned().unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port: u16 = match args.get(1) {
        Some(p) => p
            .parse()
            .map_err(|_| PsiError::InvalidParameter("port invalide".into()))?,
        None => DEFAULT_PORT,
    };

    let mut config = PsiConfig::production();
    if let Some(workers) = args.get(2) {
        config.workers = workers
            .parse()
            .map_err(|_| PsiError::InvalidParameter("nombre de workers invalide".into()))?;
    }
    let params = PsiParams::derive(config)?;

    let intersection = run_client_online(&params, Path::new("."), &host, port)?;
    println!("  [Client] Intersection ({} item(s)) :", intersection.len());
    for item in &intersection {
        println!("{item}");
    }
    Ok(())
}

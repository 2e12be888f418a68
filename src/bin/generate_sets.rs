// =========================================================
// generate-sets — jeux de données synthétiques
// Écrit server_set, client_set et intersection dans le
// répertoire courant (un entier décimal par ligne).
// =========================================================

use std::path::Path;
use std::process;
use std::time::Instant;

use psi_crypto::params::params::PsiConfig;
use psi_crypto::psi_error::psi_error::PsiError;
use psi_crypto::set_gen::set_gen::{generate_data_sets, write_data_sets};

fn main() {
    if let Err(e) = run() {
        eprintln!("[FATAL] {}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), PsiError> {
    let config = PsiConfig::production();
    println!(
        "  [Génération] |S| = {}, |C| = {}, intersection = {}...",
        config.server_size, config.client_size, config.intersection_size
    );

    let t0 = Instant::now();
    let (client_set, server_set, intersection) = generate_data_sets(
        config.server_size,
        config.client_size,
        config.intersection_size,
    )?;
    write_data_sets(Path::new("."), &client_set, &server_set, &intersection)?;

    println!("  [Génération] Fichiers écrits en {:.3?}.", t0.elapsed());
    Ok(())
}

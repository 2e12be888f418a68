// ---------------------------------------------------------------------------
// Exécution locale des deux parties — démo et tests d'intégration
//
// Le serveur en ligne tourne dans un thread dédié ; le client se connecte
// en boucle (le temps que l'écoute soit établie) puis déroule sa session
// sur la même machine.
// ---------------------------------------------------------------------------

use std::net::TcpStream;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::params::params::PsiParams;
use crate::protocol::client::{client_session, run_client_offline};
use crate::protocol::server::{run_server_offline, run_server_online};
use crate::psi_error::psi_error::PsiError;

/// Déroule hors-ligne + en ligne pour les deux parties sur la boucle locale.
/// Les jeux de données doivent déjà être en place dans chaque répertoire.
/// Retourne l'intersection vue par le client.
pub fn run_local_protocol(
    params: &PsiParams,
    server_dir: &Path,
    client_dir: &Path,
    host: &str,
    port: u16,
) -> Result<Vec<u64>, PsiError> {
    run_server_offline(params, server_dir)?;
    run_client_offline(params, client_dir)?;

    let server_params = params.clone();
    let server_data = server_dir.to_path_buf();
    let server_host = host.to_string();
    let server_thread =
        thread::spawn(move || run_server_online(&server_params, &server_data, &server_host, port));

    // La socket d'écoute peut mettre quelques instants à s'ouvrir
    let mut stream = {
        let mut attempts = 0;
        loop {
            match TcpStream::connect((host, port)) {
                Ok(stream) => break stream,
                Err(e) => {
                    attempts += 1;
                    if attempts > 50 {
                        return Err(e.into());
                    }
                    thread::sleep(Duration::from_millis(100));
                }
            }
        }
    };

    let intersection = client_session(params, client_dir, &mut stream);

    match server_thread.join() {
        Ok(server_result) => server_result?,
        Err(_) => return Err(PsiError::Io("le thread serveur a paniqué".into())),
    }

    intersection
}

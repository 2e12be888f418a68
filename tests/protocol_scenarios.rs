// ============================================================================
// Tests de bout en bout du protocole PSI — les deux parties sur la boucle
// locale, paramètres réduits (2^4 bins, B = 4, alpha = 2).
//
// Les clés OPRF sont figées (fichiers JSON écrits avant les phases
// hors-ligne) : les valeurs PRF, donc les placements dans les bins, sont
// déterministes d'une exécution à l'autre. Seul le chemin de déplacement
// Cuckoo dépend de l'aléa, et il n'affecte pas l'intersection retrouvée.
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use psi_crypto::params::params::{PsiConfig, PsiParams};
use psi_crypto::protocol::files::{
    write_set_file, CLIENT_SET_FILE, INTERSECTION_FILE, SERVER_SET_FILE,
};
use psi_crypto::protocol::local::run_local_protocol;
use psi_crypto::protocol::client::run_client_offline;
use psi_crypto::set_gen::set_gen::generate_data_sets;

// Scalaires OPRF figés (hexadécimal, format des fichiers de clés)
const CLIENT_KEY_HEX: &str = "2447DB450992946077E745BEA02AD3B38E";
const SERVER_KEY_HEX: &str = "F951A9FD3C158AFDFF08AB8E1";

fn scenario_params() -> PsiParams {
    PsiParams::derive(PsiConfig {
        server_size:         8,
        client_size:         4,
        intersection_size:   2,
        hash_seeds:          vec![123456789, 10111213141516, 17181920212223],
        output_bits:         4,
        plain_modulus:       536903681,
        poly_modulus_degree: 1 << 4,
        number_of_hashes:    3,
        bin_capacity:        4,
        alpha:               2,
        ell:                 2,
        workers:             2,
    })
    .unwrap()
}

fn setup_dirs(name: &str) -> (PathBuf, PathBuf, PathBuf) {
    let mut base = std::env::temp_dir();
    base.push(format!("psi_crypto_e2e_{}_{}", name, std::process::id()));
    fs::remove_dir_all(&base).ok();
    let server_dir = base.join("server");
    let client_dir = base.join("client");
    fs::create_dir_all(server_dir.join("keys")).unwrap();
    fs::create_dir_all(client_dir.join("keys")).unwrap();
    (base, server_dir, client_dir)
}

fn write_fixed_keys(server_dir: &Path, client_dir: &Path) {
    fs::write(
        server_dir.join("keys/oprf_server.json"),
        format!("{{ \"scalar\": \"{SERVER_KEY_HEX}\" }}"),
    )
    .unwrap();
    fs::write(
        client_dir.join("keys/oprf_client.json"),
        format!("{{ \"scalar\": \"{CLIENT_KEY_HEX}\" }}"),
    )
    .unwrap();
}

fn run_scenario(name: &str, port: u16, server_set: &[u64], client_set: &[u64], expected: &[u64]) {
    let params = scenario_params();
    let (base, server_dir, client_dir) = setup_dirs(name);
    write_fixed_keys(&server_dir, &client_dir);

    write_set_file(&server_dir.join(SERVER_SET_FILE), server_set).unwrap();
    write_set_file(&client_dir.join(CLIENT_SET_FILE), client_set).unwrap();
    let expected_sorted: Vec<u64> = expected.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    write_set_file(&client_dir.join(INTERSECTION_FILE), &expected_sorted).unwrap();

    let recovered =
        run_local_protocol(&params, &server_dir, &client_dir, "127.0.0.1", port).unwrap();
    assert_eq!(recovered, expected_sorted, "scénario {name}");

    fs::remove_dir_all(&base).ok();
}

#[test]
fn test_intersection_partielle() {
    run_scenario(
        "partielle",
        4481,
        &[11, 22, 33, 44, 55, 66, 77, 88],
        &[11, 22, 99, 100],
        &[11, 22],
    );
}

#[test]
fn test_intersection_vide() {
    run_scenario("vide", 4482, &[1, 2, 3], &[4, 5, 6], &[]);
}

#[test]
fn test_client_inclus_dans_serveur() {
    run_scenario(
        "incluse",
        4483,
        &[10, 20, 30, 40, 50, 60],
        &[10, 20, 30],
        &[10, 20, 30],
    );
}

#[test]
fn test_doublons_cote_client() {
    // Le client déduplique avant l'insertion Cuckoo
    run_scenario("doublons", 4484, &[7, 8, 9], &[7, 7, 8], &[7, 8]);
}

#[test]
fn test_items_frontiere() {
    // item = 0 (point à l'infini) et item = 2^sigma_max - 1
    let params = scenario_params();
    let max_item = params.item_mask; // 2^31 - 1 pour ces paramètres
    run_scenario(
        "frontiere",
        4485,
        &[0, max_item, 123, 456],
        &[0, max_item, 999],
        &[0, max_item],
    );
}

#[test]
fn test_reconstruction_de_puissances_chiffrees() {
    // alpha = 1 et B = 6 : les puissances y^5 et y^6 ne sont pas dans la
    // fenêtre et doivent être reconstruites par produits chiffré × chiffré
    let params = PsiParams::derive(PsiConfig {
        server_size:         3,
        client_size:         2,
        intersection_size:   1,
        hash_seeds:          vec![123456789, 10111213141516, 17181920212223],
        output_bits:         4,
        plain_modulus:       536903681,
        poly_modulus_degree: 1 << 4,
        number_of_hashes:    3,
        bin_capacity:        6,
        alpha:               1,
        ell:                 2,
        workers:             2,
    })
    .unwrap();
    assert_eq!(params.minibin_capacity, 6);

    let (base, server_dir, client_dir) = setup_dirs("reconstruction");
    write_fixed_keys(&server_dir, &client_dir);
    write_set_file(&server_dir.join(SERVER_SET_FILE), &[11, 22, 33]).unwrap();
    write_set_file(&client_dir.join(CLIENT_SET_FILE), &[11, 99]).unwrap();
    write_set_file(&client_dir.join(INTERSECTION_FILE), &[11]).unwrap();

    let recovered =
        run_local_protocol(&params, &server_dir, &client_dir, "127.0.0.1", 4486).unwrap();
    assert_eq!(recovered, vec![11]);

    fs::remove_dir_all(&base).ok();
}

#[test]
fn test_hors_ligne_client_idempotent() {
    // Deux exécutions hors-ligne produisent un artefact identique à l'octet
    let params = scenario_params();
    let (base, server_dir, client_dir) = setup_dirs("idempotence");
    write_fixed_keys(&server_dir, &client_dir);
    write_set_file(&client_dir.join(CLIENT_SET_FILE), &[11, 22, 99, 100]).unwrap();

    run_client_offline(&params, &client_dir).unwrap();
    let first = fs::read(client_dir.join("client_preprocessed")).unwrap();
    run_client_offline(&params, &client_dir).unwrap();
    let second = fs::read(client_dir.join("client_preprocessed")).unwrap();
    assert_eq!(first, second);

    fs::remove_dir_all(&base).ok();
}

// Montée en charge intermédiaire : 2^11 items serveur, 2^8 bins. Le backend
// R_q en convolution directe rend le cas de production (N = 2^13) trop lent
// pour la CI, d'où l'échelle intermédiaire et le #[ignore].
#[test]
#[ignore]
fn test_stress_intermediaire() {
    use std::time::Instant;

    let params = PsiParams::derive(PsiConfig {
        server_size:         1 << 11,
        client_size:         100,
        intersection_size:   80,
        hash_seeds:          vec![123456789, 10111213141516, 17181920212223],
        output_bits:         8,
        plain_modulus:       536903681,
        poly_modulus_degree: 1 << 8,
        number_of_hashes:    3,
        bin_capacity:        100,
        alpha:               4,
        ell:                 2,
        workers:             4,
    })
    .unwrap();

    let (base, server_dir, client_dir) = setup_dirs("stress");
    write_fixed_keys(&server_dir, &client_dir);

    let (client_set, server_set, intersection) = generate_data_sets(
        params.config.server_size,
        params.config.client_size,
        params.config.intersection_size,
    )
    .unwrap();
    write_set_file(&server_dir.join(SERVER_SET_FILE), &server_set).unwrap();
    write_set_file(&client_dir.join(CLIENT_SET_FILE), &client_set).unwrap();
    write_set_file(&client_dir.join(INTERSECTION_FILE), &intersection).unwrap();

    let t0 = Instant::now();
    let recovered =
        run_local_protocol(&params, &server_dir, &client_dir, "127.0.0.1", 4490).unwrap();
    let elapsed = t0.elapsed();

    let expected: BTreeSet<u64> = intersection.into_iter().collect();
    assert_eq!(recovered.into_iter().collect::<BTreeSet<_>>(), expected);
    // Budget de temps dépendant des paramètres : généreux pour la CI
    assert!(elapsed.as_secs() < 600, "phase en ligne trop lente : {elapsed:?}");

    fs::remove_dir_all(&base).ok();
}

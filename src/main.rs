// =========================================================
// PSI non équilibré — démonstration locale & métriques
// OPRF (P-192) + hachage Cuckoo + évaluation BFV batchée
// =========================================================

// ── Protocole ─────────────────────────────────────────────
use psi_crypto::params::params::PsiParams;
use psi_crypto::protocol::local::run_local_protocol;
use psi_crypto::protocol::files::{write_set_file, CLIENT_SET_FILE, INTERSECTION_FILE, SERVER_SET_FILE};
use psi_crypto::set_gen::set_gen::generate_data_sets;

// ── Primitives (métriques) ────────────────────────────────
use psi_crypto::bfv::batch_encoder::BatchEncoder;
use psi_crypto::bfv::bfv_decrypt::bfv_decrypt;
use psi_crypto::bfv::bfv_encrypt::bfv_encrypt;
use psi_crypto::bfv::bfv_eval::{mul, mul_plain};
use psi_crypto::bfv::bfv_keygen::{bfv_keygen, BfvParams};
use psi_crypto::oprf::curve::CurveP192;
use psi_crypto::oprf::oprf::{client_prf_offline_parallel, OprfKey};
use psi_crypto::parallel::build_pool;

// ── Types et erreurs ──────────────────────────────────────
use psi_crypto::psi_error::psi_error::PsiError;

// ── Stdlib ────────────────────────────────────────────────
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::time::Instant;

/// Port de la démo locale (hors du port par défaut du protocole)
const DEMO_PORT: u16 = 4471;

// ─────────────────────────────────────────────────────────
// Erreur applicative centrale
//
// Unifie PsiError et io::Error pour propager toutes les
// erreurs via ? sans conversion manuelle — plus aucun panic!
// ─────────────────────────────────────────────────────────

#[derive(Debug)]
enum AppError {
    Psi(PsiError),
    Io(std::io::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Psi(e) => write!(f, "Erreur du protocole : {}", e),
            AppError::Io(e)  => write!(f, "Erreur I/O : {}", e),
        }
    }
}

impl From<PsiError> for AppError {
    fn from(e: PsiError) -> Self { AppError::Psi(e) }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self { AppError::Io(e) }
}

// ─────────────────────────────────────────────────────────
// Point d'entrée
// ─────────────────────────────────────────────────────────

fn main() {
    loop {
        afficher_menu();
        let choix = lire_choix();

        let res = match choix.as_str() {
            "1" => demonstration_locale(),
            "2" => metriques_primitives(),
            "3" => { println!("\nAu revoir !\n"); break; }
            _   => { println!("\nChoix invalide. Veuillez choisir 1, 2 ou 3.\n"); continue; }
        };

        if let Err(e) = res {
            eprintln!("\n[ERREUR] {}\n", e);
        }

        println!("\nAppuyez sur Entrée pour continuer...");
        let mut pause = String::new();
        io::stdin().read_line(&mut pause).ok();
    }
}

// ─────────────────────────────────────────────────────────
// Menu
// ─────────────────────────────────────────────────────────

fn afficher_menu() {
    println!("\n╔═══════════════════════════════════════════════╗");
    println!("║   PSI NON ÉQUILIBRÉ — MENU                    ║");
    println!("╚═══════════════════════════════════════════════╝");
    println!("\n  [1] Démonstration locale (paramètres réduits)");
    println!("  [2] Métriques des primitives (OPRF, BFV)");
    println!("  [3] Quitter\n");
    print!("Votre choix : ");
    io::stdout().flush().ok();
}

fn lire_choix() -> String {
    let mut input = String::new();
    io::stdin().read_line(&mut input).ok();
    input.trim().to_string()
}

// ─────────────────────────────────────────────────────────
// [1] Démonstration : protocole complet sur la boucle locale
// ─────────────────────────────────────────────────────────

fn demonstration_locale() -> Result<(), AppError> {
    let params = PsiParams::reduced()?;
    println!("\n═══ Démo PSI — {} bins, B = {}, alpha = {} ═══",
        params.number_of_bins, params.config.bin_capacity, params.config.alpha);

    // Répertoires de travail jetables pour les deux parties
    let mut base = std::env::temp_dir();
    base.push(format!("psi_crypto_demo_{}", std::process::id()));
    let server_dir = base.join("server");
    let client_dir = base.join("client");
    std::fs::create_dir_all(&server_dir)?;
    std::fs::create_dir_all(&client_dir)?;

    let (client_set, server_set, intersection) = generate_data_sets(
        params.config.server_size,
        params.config.client_size,
        params.config.intersection_size,
    )?;
    write_set_file(&server_dir.join(SERVER_SET_FILE), &server_set)?;
    write_set_file(&client_dir.join(CLIENT_SET_FILE), &client_set)?;
    write_set_file(&client_dir.join(INTERSECTION_FILE), &intersection)?;

    let t_total = Instant::now();
    let recovered = run_local_protocol(&params, &server_dir, &client_dir, "127.0.0.1", DEMO_PORT)?;

    let expected: BTreeSet<u64> = intersection.iter().copied().collect();
    let got: BTreeSet<u64> = recovered.iter().copied().collect();

    println!("\n╔═══════════════════════════════════════════════╗");
    println!("║                RÉSULTAT FINAL                 ║");
    println!("╠═══════════════════════════════════════════════╣");
    println!("║  Intersection retrouvée : {} item(s)", got.len());
    if expected == got {
        println!("║  Résultat correct (attendu : {} item(s))", expected.len());
    } else {
        println!("║  Résultat incorrect (attendu : {} item(s))", expected.len());
    }
    println!("║  Temps total protocole : {:.3?}", t_total.elapsed());
    println!("╚═══════════════════════════════════════════════╝");

    std::fs::remove_dir_all(&base).ok();
    Ok(())
}

// ─────────────────────────────────────────────────────────
// [2] Métriques : primitives isolées
// ─────────────────────────────────────────────────────────

fn metriques_primitives() -> Result<(), AppError> {
    println!("\n═══ Métriques OPRF (P-192) ═══");
    let curve = CurveP192::new();
    let pool = build_pool(4)?;
    let key = OprfKey::generate(&curve);

    let t = Instant::now();
    let key_point = key.key_point(&curve)?;
    println!("  Multiplication scalaire k·G : {:.3?}", t.elapsed());

    let items: Vec<u64> = (1..=200).collect();
    let t = Instant::now();
    let encoded = client_prf_offline_parallel(&items, &key_point, &curve, &pool)?;
    let elapsed = t.elapsed();
    println!(
        "  Encodage de {} items : {:.3?} ({:.3?} / item, 4 workers)",
        encoded.len(),
        elapsed,
        elapsed / encoded.len() as u32
    );

    println!("\n═══ Métriques BFV (N = 16, t = 536903681) ═══");
    let params = BfvParams::new(16, 536903681)?;
    let encoder = BatchEncoder::new(params.n, params.t)?;

    let t = Instant::now();
    let (sk, pk, rlk) = bfv_keygen(&params)?;
    println!("  Génération des clés (sk, pk, relin) : {:.3?}", t.elapsed());

    let slots: Vec<u64> = (0..16u64).map(|i| i * 12345 + 6).collect();
    let t = Instant::now();
    let ct = bfv_encrypt(&params, &pk, &encoder, &slots)?;
    println!("  Chiffrement batché : {:.3?}", t.elapsed());

    let t = Instant::now();
    let _ = bfv_decrypt(&params, &sk, &encoder, &ct)?;
    println!("  Déchiffrement : {:.3?}", t.elapsed());

    let encoded = encoder.encode(&slots)?;
    let t = Instant::now();
    let _ = mul_plain(&params, &ct, &encoded);
    println!("  Produit chiffré × plaintext : {:.3?}", t.elapsed());

    let t = Instant::now();
    let _ = mul(&params, &rlk, &ct, &ct)?;
    println!("  Produit chiffré × chiffré + relinéarisation : {:.3?}", t.elapsed());

    Ok(())
}

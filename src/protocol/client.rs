// ============================================================================
// Driver client — phases hors-ligne et en ligne
//
// Hors-ligne : déduplication du jeu, encodage de chaque item sur la courbe
// (aveuglé par k_c), persistance de client_preprocessed.
//
// En ligne : échange OPRF avec le serveur, finalisation par k_c^{-1},
// table Cuckoo, fenêtrage, requête BFV batchée, déchiffrement des alpha
// réponses et récupération de l'intersection par test de zéro.
// ============================================================================

use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::Instant;

use crate::bfv::batch_encoder::BatchEncoder;
use crate::bfv::bfv_decrypt::bfv_decrypt;
use crate::bfv::bfv_encrypt::bfv_encrypt;
use crate::bfv::bfv_keygen::{bfv_keygen, BfvParams};
use crate::hashing::cuckoo_hash::{reconstruct_item, CuckooTable};
use crate::batching::windowing::window_all_bins;
use crate::oprf::curve::CurveP192;
use crate::oprf::key_storage::{load_oprf_key_json, load_or_generate_oprf_key};
use crate::oprf::oprf::{client_prf_offline_parallel, client_prf_online_parallel};
use crate::parallel::build_pool;
use crate::params::params::PsiParams;
use crate::protocol::files::{
    dedup_preserving_order, load_client_preprocessed, read_set_file, save_client_preprocessed,
    CLIENT_KEY_FILE, CLIENT_PREPROCESSED_FILE, CLIENT_SET_FILE, INTERSECTION_FILE,
};
use crate::protocol::state::{ClientState, ClientStateMachine};
use crate::psi_error::psi_error::PsiError;
use crate::transport::messages::{
    points_to_wire, wire_to_points, CiphertextWire, FheContextWire, PointWire, PublicKeyWire,
    QueryMessage, RelinKeyWire, ReplyMessage,
};
use crate::transport::transport::{recv_message, send_message};

// ─────────────────────────────────────────────────────────
// Phase hors-ligne
// ─────────────────────────────────────────────────────────

pub fn run_client_offline(params: &PsiParams, data_dir: &Path) -> Result<(), PsiError> {
    let t0 = Instant::now();
    let curve = CurveP192::new();
    let pool = build_pool(params.config.workers)?;

    let key = load_or_generate_oprf_key(&data_dir.join(CLIENT_KEY_FILE), &curve)?;
    let raw_set = read_set_file(&data_dir.join(CLIENT_SET_FILE))?;
    let items = dedup_preserving_order(&raw_set);
    println!(
        "  [Client hors-ligne] {} item(s) chargé(s) ({} après déduplication).",
        raw_set.len(),
        items.len()
    );

    // A_i = item_i · (k_c · G)
    let key_point = key.key_point(&curve)?;
    let encoded = client_prf_offline_parallel(&items, &key_point, &curve, &pool)?;
    println!("  [Client hors-ligne] Items encodés sur la courbe en {:.3?}.", t0.elapsed());

    save_client_preprocessed(&data_dir.join(CLIENT_PREPROCESSED_FILE), &encoded)?;
    println!("  [Client hors-ligne] Terminé — temps total : {:.3?}.", t0.elapsed());
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Phase en ligne
// ─────────────────────────────────────────────────────────

/// Se connecte au serveur et déroule la session. Retourne l'intersection.
pub fn run_client_online(
    params: &PsiParams,
    data_dir: &Path,
    host: &str,
    port: u16,
) -> Result<Vec<u64>, PsiError> {
    let mut stream = TcpStream::connect((host, port))?;
    client_session(params, data_dir, &mut stream)
}

/// Session client sur un flux déjà établi (testable sans socket).
pub fn client_session<S: Read + Write>(
    params: &PsiParams,
    data_dir: &Path,
    stream: &mut S,
) -> Result<Vec<u64>, PsiError> {
    let t0 = Instant::now();
    let curve = CurveP192::new();
    let pool = build_pool(params.config.workers)?;
    let mut sm = ClientStateMachine::new();

    // Contexte BFV : clés fraîches à chaque session
    let bfv_params = BfvParams::new(params.number_of_bins, params.config.plain_modulus)?;
    let encoder = BatchEncoder::new(bfv_params.n, bfv_params.t)?;
    let (sk, pk, rlk) = bfv_keygen(&bfv_params)?;
    println!("  [Client] Contexte FHE prêt (N = {}, t = {}).", bfv_params.n, bfv_params.t);

    // 1. Envoi des items encodés
    let encoded_points = load_client_preprocessed(&data_dir.join(CLIENT_PREPROCESSED_FILE))?;
    let sent_oprf = send_message(stream, &points_to_wire(&encoded_points))?;
    sm.transition(ClientState::SentOprfQuery)?;
    println!("  [Client] {} point(s) encodé(s) envoyés au serveur.", encoded_points.len());

    // 2. Réception des points multipliés par la clé serveur
    let (reply_wire, recv_oprf): (Vec<PointWire>, usize) = recv_message(stream)?;
    sm.transition(ClientState::ReceivedOprfReply)?;
    if reply_wire.len() != encoded_points.len() {
        return Err(PsiError::Serialization(format!(
            "réponse OPRF : {} point(s) reçus, {} attendus",
            reply_wire.len(),
            encoded_points.len()
        )));
    }

    // Finalisation OPRF : Q_i = k_c^{-1} · B_i puis extraction
    let key = load_oprf_key_json(&data_dir.join(CLIENT_KEY_FILE), &curve)?;
    let key_inverse = key.inverse(&curve)?;
    let keyed_points = wire_to_points(&reply_wire);
    let prf_set =
        client_prf_online_parallel(&key_inverse, &keyed_points, &curve, params.sigma_max, &pool)?;
    println!("  [Client] Traitement OPRF terminé.");

    // Alignement PRF -> item d'origine (même déduplication qu'en hors-ligne)
    let originals = dedup_preserving_order(&read_set_file(&data_dir.join(CLIENT_SET_FILE))?);
    if originals.len() != prf_set.len() {
        return Err(PsiError::InvalidParameter(
            "client_set a changé depuis la phase hors-ligne".into(),
        ));
    }
    let prf_to_item: HashMap<u64, u64> =
        prf_set.iter().copied().zip(originals.iter().copied()).collect();

    // Table Cuckoo sur les valeurs PRF puis fenêtrage
    let mut cuckoo = CuckooTable::new(params);
    cuckoo.insert_items(&dedup_preserving_order(&prf_set), params)?;
    let bins = cuckoo.into_bins(params);
    let windows = window_all_bins(&bins, params);
    println!("  [Client] Items insérés dans la table Cuckoo et fenêtrés.");

    // 3. Requête batchée : un chiffré par entrée valide de la fenêtre
    let mut query: Vec<Vec<Option<CiphertextWire>>> = Vec::with_capacity(params.base - 1);
    for i in 0..params.base - 1 {
        let mut row = Vec::with_capacity(params.log_b_ell);
        for j in 0..params.log_b_ell {
            let in_range = (params.base as u64)
                .checked_pow(j as u32)
                .and_then(|p| p.checked_mul((i + 1) as u64))
                .map(|e| e <= params.minibin_capacity as u64)
                .unwrap_or(false);
            if !in_range {
                row.push(None);
                continue;
            }
            let slots = windows
                .iter()
                .map(|w| {
                    w[i][j].ok_or_else(|| {
                        PsiError::InvalidParameter("fenêtre incomplète pour un exposant valide".into())
                    })
                })
                .collect::<Result<Vec<u64>, _>>()?;
            let ct = bfv_encrypt(&bfv_params, &pk, &encoder, &slots)?;
            row.push(Some(CiphertextWire::from_ciphertext(&ct)));
        }
        query.push(row);
    }

    let message = QueryMessage {
        context:    FheContextWire::from_params(&bfv_params),
        public_key: PublicKeyWire::from_key(&pk),
        relin_key:  RelinKeyWire::from_key(&rlk),
        query,
    };
    let sent_query = send_message(stream, &message)?;
    sm.transition(ClientState::SentFheQuery)?;
    println!("  [Client] Requête chiffrée envoyée, en attente de la réponse.");

    // 4. Réception et déchiffrement des alpha réponses
    let (reply, recv_reply): (ReplyMessage, usize) = recv_message(stream)?;
    sm.transition(ClientState::ReceivedReply)?;
    if reply.ciphertexts.len() != params.config.alpha {
        return Err(PsiError::MalformedFheContext(format!(
            "{} chiffré(s) reçus, {} attendus",
            reply.ciphertexts.len(),
            params.config.alpha
        )));
    }

    let mut decryptions = Vec::with_capacity(reply.ciphertexts.len());
    for wire in &reply.ciphertexts {
        let ct = wire.to_ciphertext(&bfv_params)?;
        decryptions.push(bfv_decrypt(&bfv_params, &sk, &encoder, &ct)?);
    }
    println!("  [Client] Réponses déchiffrées.");

    let intersection = recover_intersection(&decryptions, &bins, &prf_to_item, params);
    sm.transition(ClientState::Done)?;

    // Vérification de cohérence (tests uniquement — fichier optionnel)
    let reference_path = data_dir.join(INTERSECTION_FILE);
    if reference_path.exists() {
        let expected: BTreeSet<u64> = read_set_file(&reference_path)?.into_iter().collect();
        let got: BTreeSet<u64> = intersection.iter().copied().collect();
        println!("  [Client] Intersection correctement retrouvée : {}", expected == got);
    }

    println!(
        "  [Client] Terminé en {:.3?} — intersection de {} item(s).",
        t0.elapsed(),
        intersection.len()
    );
    println!(
        "  [Client] Communication : -> {:.2} Mo, <- {:.2} Mo.",
        (sent_oprf + sent_query) as f64 / (1 << 20) as f64,
        (recv_oprf + recv_reply) as f64 / (1 << 20) as f64
    );

    Ok(intersection)
}

/// Test de zéro sur les slots déchiffrés : le bin b contient un item commun
/// ssi une des alpha réponses s'annule en b. L'item PRF-é est reconstruit
/// depuis la structure Cuckoo, puis ramené à l'item d'origine par la table
/// PRF -> item. Un zéro dont la reconstruction ne correspond à aucun item
/// connu est ignoré.
pub fn recover_intersection(
    decryptions: &[Vec<u64>],
    bins: &[u64],
    prf_to_item: &HashMap<u64, u64>,
    params: &PsiParams,
) -> Vec<u64> {
    let mut found = BTreeSet::new();
    for slots in decryptions {
        for (bin_index, &value) in slots.iter().enumerate() {
            if value != 0 {
                continue;
            }
            let stored = bins[bin_index];
            if stored == params.dummy_client {
                continue;
            }
            let hash_index = (stored & params.index_mask()) as usize;
            if hash_index >= params.config.number_of_hashes {
                continue;
            }
            let prf_value = reconstruct_item(
                stored,
                bin_index,
                params.config.hash_seeds[hash_index],
                params,
            );
            if let Some(&original) = prf_to_item.get(&prf_value) {
                found.insert(original);
            }
        }
    }
    found.into_iter().collect()
}

// ============================================================================
// Driver serveur — phases hors-ligne et en ligne
//
// Hors-ligne : PRF de tout l'ensemble S (offline, clé jamais transmise),
// hachage simple en m bins, partition en minibins et calcul des polynômes
// annulateurs ; l'artefact est persisté pour la phase en ligne.
//
// En ligne : application de k_s aux points aveuglés du client, puis
// évaluation homomorphe des alpha produits scalaires sur les coefficients
// transposés. Les coefficients sont en lecture seule et partagés par les
// workers.
// ============================================================================

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;

use crate::batching::windowing::reconstruct_power;
use crate::bfv::batch_encoder::BatchEncoder;
use crate::bfv::bfv_encrypt::Ciphertext;
use crate::bfv::bfv_eval::{add, add_plain, mul, mul_plain};
use crate::hashing::simple_hash::{partition_into_coefficients, SimpleTable};
use crate::oprf::curve::CurveP192;
use crate::oprf::key_storage::{load_oprf_key_json, load_or_generate_oprf_key};
use crate::oprf::oprf::{server_prf_offline_parallel, server_prf_online_parallel};
use crate::parallel::build_pool;
use crate::params::params::PsiParams;
use crate::protocol::files::{
    load_server_preprocessed, read_set_file, save_server_preprocessed, SERVER_KEY_FILE,
    SERVER_PREPROCESSED_FILE, SERVER_SET_FILE,
};
use crate::protocol::state::{ServerState, ServerStateMachine};
use crate::psi_error::psi_error::PsiError;
use crate::transport::messages::{
    points_to_wire, validate_context, wire_to_points, PointWire, QueryMessage, ReplyMessage,
};
use crate::transport::transport::{recv_message, send_message};

// ─────────────────────────────────────────────────────────
// Phase hors-ligne
// ─────────────────────────────────────────────────────────

pub fn run_server_offline(params: &PsiParams, data_dir: &Path) -> Result<(), PsiError> {
    let t0 = Instant::now();
    let curve = CurveP192::new();
    let pool = build_pool(params.config.workers)?;

    let key = load_or_generate_oprf_key(&data_dir.join(SERVER_KEY_FILE), &curve)?;
    let server_set = read_set_file(&data_dir.join(SERVER_SET_FILE))?;
    println!("  [Serveur hors-ligne] {} item(s) chargé(s).", server_set.len());

    // sigma_j = extract(s_j · (k_s · G)), en parallèle
    let key_point = key.key_point(&curve)?;
    let prf_values =
        server_prf_offline_parallel(&server_set, &key_point, &curve, params.sigma_max, &pool)?;
    let mut prf_set: Vec<u64> = prf_values;
    prf_set.sort_unstable();
    prf_set.dedup();
    let t1 = Instant::now();
    println!(
        "  [Serveur hors-ligne] OPRF terminé ({} valeur(s) distincte(s)) en {:.3?}.",
        prf_set.len(),
        t1 - t0
    );

    // Hachage simple : chaque valeur sous chacune des h graines
    let mut table = SimpleTable::new(params);
    table.insert_entries(&prf_set, params)?;
    println!(
        "  [Serveur hors-ligne] Hachage simple terminé (occupation max : {}/{}) en {:.3?}.",
        table.max_occupancy(),
        params.config.bin_capacity,
        t1.elapsed()
    );

    let t2 = Instant::now();
    let padded_bins = table.into_padded_bins(params);
    let coefficients = partition_into_coefficients(&padded_bins, params, &pool);
    save_server_preprocessed(&data_dir.join(SERVER_PREPROCESSED_FILE), &coefficients)?;
    println!(
        "  [Serveur hors-ligne] Partition et coefficients des minibins en {:.3?}.",
        t2.elapsed()
    );
    println!("  [Serveur hors-ligne] Terminé — temps total : {:.3?}.", t0.elapsed());
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Phase en ligne
// ─────────────────────────────────────────────────────────

/// Attend une connexion du client et déroule la session.
pub fn run_server_online(
    params: &PsiParams,
    data_dir: &Path,
    host: &str,
    port: u16,
) -> Result<(), PsiError> {
    let listener = TcpListener::bind((host, port))?;
    println!("  [Serveur] En écoute sur {host}:{port}, en attente du client.");
    let (mut stream, peer) = listener.accept()?;
    println!("  [Serveur] Connexion acceptée depuis {peer}.");
    server_session(params, data_dir, &mut stream)
}

/// Session serveur sur un flux déjà établi (testable sans socket).
pub fn server_session<S: Read + Write>(
    params: &PsiParams,
    data_dir: &Path,
    stream: &mut S,
) -> Result<(), PsiError> {
    let t0 = Instant::now();
    let curve = CurveP192::new();
    let pool = build_pool(params.config.workers)?;
    let mut sm = ServerStateMachine::new();

    // Artefact préprocessé chargé avant tout échange
    let coefficients = load_server_preprocessed(&data_dir.join(SERVER_PREPROCESSED_FILE))?;
    let row_len = params.config.alpha * (params.minibin_capacity + 1);
    if coefficients.len() != params.number_of_bins
        || coefficients.iter().any(|row| row.len() != row_len)
    {
        return Err(PsiError::InvalidParameter(
            "artefact préprocessé incohérent avec les paramètres".into(),
        ));
    }
    let key = load_oprf_key_json(&data_dir.join(SERVER_KEY_FILE), &curve)?;

    // 1. Points aveuglés du client (le serveur n'apprend que |C|)
    let (wire_points, recv_oprf): (Vec<PointWire>, usize) = recv_message(stream)?;
    sm.transition(ServerState::ReceivedOprfQuery)?;
    println!("  [Serveur] {} point(s) encodé(s) reçus du client.", wire_points.len());

    // 2. B_i = k_s · A_i (validation sur courbe incluse)
    let t1 = Instant::now();
    let points = wire_to_points(&wire_points);
    let keyed = server_prf_online_parallel(&key, &points, &curve, &pool)?;
    let sent_oprf = send_message(stream, &points_to_wire(&keyed))?;
    sm.transition(ServerState::SentOprfReply)?;
    println!("  [Serveur] Items du client multipliés par k_s en {:.3?} et renvoyés.", t1.elapsed());

    // 3. Contexte FHE et requête fenêtrée
    let (query_message, recv_query): (QueryMessage, usize) = recv_message(stream)?;
    sm.transition(ServerState::ReceivedFheQuery)?;
    let bfv_params = validate_context(params, &query_message.context)?;
    let encoder = BatchEncoder::new(bfv_params.n, bfv_params.t)?;
    // La clé publique n'est pas utilisée par l'évaluation : validée puis ignorée
    let _public_key = query_message.public_key.to_key(&bfv_params)?;
    let relin_key = query_message.relin_key.to_key(&bfv_params)?;

    // Désérialisation de la matrice fenêtrée, motif Some/None vérifié
    if query_message.query.len() != params.base - 1 {
        return Err(PsiError::MalformedFheContext(format!(
            "matrice fenêtrée de {} ligne(s), {} attendue(s)",
            query_message.query.len(),
            params.base - 1
        )));
    }
    let mut matrix: Vec<Vec<Option<Ciphertext>>> = Vec::with_capacity(params.base - 1);
    for (i, wire_row) in query_message.query.iter().enumerate() {
        if wire_row.len() != params.log_b_ell {
            return Err(PsiError::MalformedFheContext(format!(
                "ligne fenêtrée de {} colonne(s), {} attendue(s)",
                wire_row.len(),
                params.log_b_ell
            )));
        }
        let mut row = Vec::with_capacity(params.log_b_ell);
        for (j, cell) in wire_row.iter().enumerate() {
            let expected = windowed_exponent(i, j, params).is_some();
            match (cell, expected) {
                (Some(wire), true) => row.push(Some(wire.to_ciphertext(&bfv_params)?)),
                (None, false) => row.push(None),
                _ => {
                    return Err(PsiError::MalformedFheContext(
                        "motif de la matrice fenêtrée inattendu".into(),
                    ))
                }
            }
        }
        matrix.push(row);
    }
    println!("  [Serveur] Requête désérialisée ({} octets).", recv_query);

    // Reconstruction de toutes les puissances Enc(y), …, Enc(y^{B/alpha})
    let t2 = Instant::now();
    let minibin = params.minibin_capacity;
    let mut powers: Vec<Option<Ciphertext>> = vec![None; minibin];
    for (i, row) in matrix.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            if let (Some(ct), Some(exponent)) = (cell, windowed_exponent(i, j, params)) {
                powers[exponent - 1] = Some(ct.clone());
            }
        }
    }
    for k in 0..minibin {
        if powers[k].is_none() {
            powers[k] = Some(reconstruct_power(&matrix, k + 1, params.base, |a, b| {
                mul(&bfv_params, &relin_key, a, b)
            })?);
        }
    }
    let mut powers: Vec<Ciphertext> = powers
        .into_iter()
        .map(|p| {
            p.ok_or_else(|| PsiError::InvalidParameter("puissance chiffrée manquante".into()))
        })
        .collect::<Result<_, _>>()?;
    // powers[0] devient y^{B/alpha} (coefficient dominant unitaire)
    powers.reverse();
    println!("  [Serveur] Puissances chiffrées reconstruites en {:.3?}.", t2.elapsed());

    // Transposition : la k-ième colonne de coefficients, encodée en un
    // plaintext de m slots. Lecture seule, partagée entre workers.
    let t3 = Instant::now();
    let mut encoded_rows: Vec<Option<Vec<u64>>> = vec![None; row_len];
    for a in 0..params.config.alpha {
        for k in 1..=minibin {
            let index = a * (minibin + 1) + k;
            let slots: Vec<u64> =
                (0..params.number_of_bins).map(|b| coefficients[b][index]).collect();
            encoded_rows[index] = Some(encoder.encode(&slots)?);
        }
    }

    // Produit scalaire homomorphe par minibin, en parallèle sur alpha
    let evaluated: Vec<Ciphertext> = pool.install(|| {
        (0..params.config.alpha)
            .into_par_iter()
            .map(|a| -> Result<Ciphertext, PsiError> {
                let base_index = a * (minibin + 1);
                // Le terme dominant (coefficient 1) est powers[0] lui-même
                let mut dot = powers[0].clone();
                for k in 1..minibin {
                    let row = encoded_rows[base_index + k].as_ref().ok_or_else(|| {
                        PsiError::InvalidParameter("ligne de coefficients manquante".into())
                    })?;
                    dot = add(&bfv_params, &dot, &mul_plain(&bfv_params, &powers[k], row));
                }
                let constant = encoded_rows[base_index + minibin].as_ref().ok_or_else(|| {
                    PsiError::InvalidParameter("coefficient constant manquant".into())
                })?;
                Ok(add_plain(&bfv_params, &dot, constant))
            })
            .collect::<Result<Vec<_>, _>>()
    })?;
    println!(
        "  [Serveur] {} polynôme(s) évalués homomorphiquement en {:.3?}.",
        evaluated.len(),
        t3.elapsed()
    );

    // 4. Réponse : alpha chiffrés
    let reply = ReplyMessage {
        ciphertexts: evaluated.iter().map(crate::transport::messages::CiphertextWire::from_ciphertext).collect(),
    };
    let sent_reply = send_message(stream, &reply)?;
    sm.transition(ServerState::SentReply)?;
    sm.transition(ServerState::Done)?;

    println!("  [Serveur] Terminé en {:.3?}.", t0.elapsed());
    println!(
        "  [Serveur] Communication : <- {:.2} Mo, -> {:.2} Mo.",
        (recv_oprf + recv_query) as f64 / (1 << 20) as f64,
        (sent_oprf + sent_reply) as f64 / (1 << 20) as f64
    );
    Ok(())
}

/// Exposant (i+1)·base^j de la cellule (i, j), si ≤ B/alpha.
fn windowed_exponent(i: usize, j: usize, params: &PsiParams) -> Option<usize> {
    (params.base as u64)
        .checked_pow(j as u32)
        .and_then(|p| p.checked_mul((i + 1) as u64))
        .filter(|&e| e <= params.minibin_capacity as u64)
        .map(|e| e as usize)
}

// ---------------------------------------------------------------------------
// Génération des jeux de données synthétiques
//
// Tire server_size + client_size - intersection_size entiers distincts dans
// [0, 2^63 - 1), puis répartit : les intersection_size premiers sont communs
// aux deux parties, le reste est disjoint.
// ---------------------------------------------------------------------------

use std::collections::HashSet;
use std::path::Path;

use rand::Rng;
use rand_core::OsRng;

use crate::protocol::files::{
    write_set_file, CLIENT_SET_FILE, INTERSECTION_FILE, SERVER_SET_FILE,
};
use crate::psi_error::psi_error::PsiError;

/// Borne supérieure (exclusive) des items : 2^63 - 1
const ITEM_BOUND: u64 = (1u64 << 63) - 1;

/// Retourne (client_set, server_set, intersection).
pub fn generate_data_sets(
    server_size: usize,
    client_size: usize,
    intersection_size: usize,
) -> Result<(Vec<u64>, Vec<u64>, Vec<u64>), PsiError> {
    if intersection_size > server_size.min(client_size) {
        return Err(PsiError::InvalidParameter(
            "la taille d'intersection dépasse la taille d'un des jeux".into(),
        ));
    }

    let total = server_size + client_size - intersection_size;
    let mut rng = OsRng;
    let mut seen = HashSet::with_capacity(total);
    let mut disjoint_union = Vec::with_capacity(total);
    while disjoint_union.len() < total {
        let candidate = rng.gen_range(0..ITEM_BOUND);
        if seen.insert(candidate) {
            disjoint_union.push(candidate);
        }
    }

    let intersection = disjoint_union[..intersection_size].to_vec();
    let mut server_set = intersection.clone();
    server_set.extend_from_slice(&disjoint_union[intersection_size..server_size]);
    let mut client_set = intersection.clone();
    client_set.extend_from_slice(&disjoint_union[server_size..total]);

    Ok((client_set, server_set, intersection))
}

/// Écrit les trois fichiers canoniques dans un répertoire.
pub fn write_data_sets(
    data_dir: &Path,
    client_set: &[u64],
    server_set: &[u64],
    intersection: &[u64],
) -> Result<(), PsiError> {
    write_set_file(&data_dir.join(CLIENT_SET_FILE), client_set)?;
    write_set_file(&data_dir.join(SERVER_SET_FILE), server_set)?;
    write_set_file(&data_dir.join(INTERSECTION_FILE), intersection)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Fichiers persistés du protocole
//
// Jeux de données : UTF-8, un entier décimal par ligne (items < 2^63 - 1).
// Artefacts préprocessés : bincode — liste de paires (x, y) en octets
// big-endian pour le client, table m × alpha·(B/alpha + 1) d'entiers mod t
// pour le serveur.
// ---------------------------------------------------------------------------

use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::oprf::curve::EcPoint;
use crate::psi_error::psi_error::PsiError;
use crate::transport::messages::{points_to_wire, wire_to_points, PointWire};

pub const SERVER_SET_FILE:          &str = "server_set";
pub const CLIENT_SET_FILE:          &str = "client_set";
pub const INTERSECTION_FILE:        &str = "intersection";
pub const CLIENT_PREPROCESSED_FILE: &str = "client_preprocessed";
pub const SERVER_PREPROCESSED_FILE: &str = "server_preprocessed";
pub const CLIENT_KEY_FILE:          &str = "keys/oprf_client.json";
pub const SERVER_KEY_FILE:          &str = "keys/oprf_server.json";

pub fn read_set_file(path: &Path) -> Result<Vec<u64>, PsiError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut items = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: u64 = trimmed.parse().map_err(|_| {
            PsiError::InvalidParameter(format!(
                "{} : ligne {} non numérique",
                path.display(),
                line_number + 1
            ))
        })?;
        items.push(value);
    }
    Ok(items)
}

pub fn write_set_file(path: &Path, items: &[u64]) -> Result<(), PsiError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    for item in items {
        writeln!(writer, "{item}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Déduplication stable : premier exemplaire conservé, ordre inchangé.
/// Requis avant l'insertion Cuckoo et pour aligner PRF et items d'origine.
pub fn dedup_preserving_order(items: &[u64]) -> Vec<u64> {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().copied().filter(|item| seen.insert(*item)).collect()
}

pub fn save_client_preprocessed(path: &Path, points: &[EcPoint]) -> Result<(), PsiError> {
    let wire = points_to_wire(points);
    let payload = bincode::serialize(&wire)?;
    fs::write(path, payload)?;
    Ok(())
}

pub fn load_client_preprocessed(path: &Path) -> Result<Vec<EcPoint>, PsiError> {
    let payload = fs::read(path)?;
    let wire: Vec<PointWire> = bincode::deserialize(&payload)?;
    Ok(wire_to_points(&wire))
}

pub fn save_server_preprocessed(path: &Path, coefficients: &[Vec<u64>]) -> Result<(), PsiError> {
    let payload = bincode::serialize(coefficients)?;
    fs::write(path, payload)?;
    Ok(())
}

pub fn load_server_preprocessed(path: &Path) -> Result<Vec<Vec<u64>>, PsiError> {
    let payload = fs::read(path)?;
    Ok(bincode::deserialize(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("psi_crypto_files_{}_{}", name, std::process::id()));
        dir
    }

    #[test]
    fn test_jeu_de_donnees_aller_retour() {
        let path = temp_path("set");
        let items = vec![0u64, 11, 22, (1 << 62)];
        write_set_file(&path, &items).unwrap();
        assert_eq!(read_set_file(&path).unwrap(), items);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_ligne_invalide() {
        let path = temp_path("badset");
        fs::write(&path, "12\nabc\n").unwrap();
        assert!(read_set_file(&path).is_err());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_deduplication_stable() {
        assert_eq!(dedup_preserving_order(&[7, 7, 8, 7, 9, 8]), vec![7, 8, 9]);
    }

    #[test]
    fn test_points_preprocesses_aller_retour() {
        let path = temp_path("points");
        let points = vec![
            EcPoint::Infinity,
            EcPoint::affine(BigUint::from(123u32), BigUint::from(456u32)),
        ];
        save_client_preprocessed(&path, &points).unwrap();
        assert_eq!(load_client_preprocessed(&path).unwrap(), points);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_coefficients_aller_retour() {
        let path = temp_path("coeffs");
        let coeffs = vec![vec![1u64, 2, 3], vec![4, 5, 6]];
        save_server_preprocessed(&path, &coeffs).unwrap();
        assert_eq!(load_server_preprocessed(&path).unwrap(), coeffs);
        fs::remove_file(&path).ok();
    }
}

// ============================================================================
// Persistance des clés OPRF — JSON hexadécimal sous keys/
//
// Le client réutilise la même clé entre sa phase hors-ligne et sa phase en
// ligne ; le serveur entre son préprocessing et le service en ligne. Les
// champs hex sont bornés AVANT parsing (un fichier de clés contrôlé par un
// attaquant ne doit pas pouvoir déclencher une conversion BigUint géante).
// ============================================================================

use std::fs;
use std::path::Path;

use num_bigint::BigUint;
use num_traits::{Num, Zero};
use serde::{Deserialize, Serialize};

use crate::oprf::curve::CurveP192;
use crate::oprf::oprf::OprfKey;
use crate::psi_error::psi_error::PsiError;

/// Taille maximale d'un fichier de clé JSON en octets
const MAX_KEY_FILE_BYTES: u64 = 4_096;

/// Longueur maximale du champ hexadécimal : un scalaire P-192 fait 48
/// caractères hex, on prend le double en marge.
const MAX_HEX_FIELD_LEN: usize = 96;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OprfKeyJson {
    pub scalar: String,
}

fn biguint_to_hex(value: &BigUint) -> String {
    value.to_str_radix(16).to_uppercase()
}

fn hex_to_biguint(hex_str: &str) -> Result<BigUint, PsiError> {
    if hex_str.len() > MAX_HEX_FIELD_LEN {
        return Err(PsiError::InvalidParameter(format!(
            "champ hexadécimal trop long : {} caractères (maximum {})",
            hex_str.len(),
            MAX_HEX_FIELD_LEN
        )));
    }
    BigUint::from_str_radix(hex_str, 16)
        .map_err(|_| PsiError::InvalidParameter("hexadécimal invalide dans le fichier de clé".into()))
}

pub fn save_oprf_key_json(path: &Path, key: &OprfKey) -> Result<(), PsiError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = OprfKeyJson { scalar: biguint_to_hex(&key.scalar) };
    let contents = serde_json::to_string_pretty(&json)
        .map_err(|e| PsiError::Serialization(e.to_string()))?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn load_oprf_key_json(path: &Path, curve: &CurveP192) -> Result<OprfKey, PsiError> {
    let metadata = fs::metadata(path)?;
    if metadata.len() > MAX_KEY_FILE_BYTES {
        return Err(PsiError::InvalidParameter(format!(
            "fichier de clé de {} octets (maximum {})",
            metadata.len(),
            MAX_KEY_FILE_BYTES
        )));
    }
    let contents = fs::read_to_string(path)?;
    let json: OprfKeyJson =
        serde_json::from_str(&contents).map_err(|e| PsiError::Serialization(e.to_string()))?;
    let scalar = hex_to_biguint(&json.scalar)?;

    // Cohérence : le scalaire doit être dans [1, q)
    if scalar.is_zero() || scalar >= curve.order {
        return Err(PsiError::InvalidParameter(
            "clé OPRF hors du domaine scalaire [1, q)".into(),
        ));
    }
    Ok(OprfKey { scalar })
}

/// Charge la clé si le fichier existe, sinon en génère une et la sauvegarde.
pub fn load_or_generate_oprf_key(path: &Path, curve: &CurveP192) -> Result<OprfKey, PsiError> {
    if path.exists() {
        return load_oprf_key_json(path, curve);
    }
    let key = OprfKey::generate(curve);
    save_oprf_key_json(path, &key)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn temp_key_path(name: &str) -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("psi_crypto_test_{}_{}", name, std::process::id()));
        dir
    }

    #[test]
    fn test_sauvegarde_et_rechargement() {
        let curve = CurveP192::new();
        let path = temp_key_path("roundtrip.json");
        let key = OprfKey { scalar: BigUint::from(123456789101112u64) };
        save_oprf_key_json(&path, &key).unwrap();
        let loaded = load_oprf_key_json(&path, &curve).unwrap();
        assert_eq!(loaded.scalar, key.scalar);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_charge_ou_genere_stable() {
        let curve = CurveP192::new();
        let path = temp_key_path("generate.json");
        std::fs::remove_file(&path).ok();
        let first = load_or_generate_oprf_key(&path, &curve).unwrap();
        let second = load_or_generate_oprf_key(&path, &curve).unwrap();
        assert_eq!(first.scalar, second.scalar);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_rejet_scalaire_hors_domaine() {
        let curve = CurveP192::new();
        let path = temp_key_path("outofrange.json");
        std::fs::write(&path, r#"{ "scalar": "0" }"#).unwrap();
        assert!(load_oprf_key_json(&path, &curve).is_err());
        std::fs::remove_file(&path).ok();
    }
}

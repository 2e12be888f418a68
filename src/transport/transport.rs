// ============================================================================
// Tunnel TCP — framing et (dé)sérialisation des messages
//
// Chaque message est préfixé par sa longueur en ASCII décimal sur 10 octets,
// complétée à droite par des espaces ("1234      "), suivie de la charge
// utile bincode. Les helpers sont génériques sur Read/Write : testables sans
// socket, branchés sur TcpStream par les drivers.
//
// Toute anomalie (préfixe non décimal, EOF prématuré) est fatale : la
// connexion est abandonnée, pas de retry.
// ============================================================================

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::psi_error::psi_error::PsiError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4470;

/// Longueur du préfixe de trame
const FRAME_HEADER_LEN: usize = 10;

/// Garde-fou contre les longueurs annoncées absurdes (1 GiB)
const MAX_FRAME_BYTES: usize = 1 << 30;

fn read_exact_counted<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<(), PsiError> {
    let mut filled = 0usize;
    while filled < buffer.len() {
        let n = reader.read(&mut buffer[filled..])?;
        if n == 0 {
            return Err(PsiError::UnexpectedEof { expected: buffer.len(), received: filled });
        }
        filled += n;
    }
    Ok(())
}

/// Envoie une trame : préfixe de 10 octets puis charge utile.
/// Retourne la taille de la charge utile (comptabilité de communication).
pub fn send_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<usize, PsiError> {
    if payload.len() > MAX_FRAME_BYTES {
        return Err(PsiError::FrameLengthMalformed);
    }
    let header = format!("{:<width$}", payload.len(), width = FRAME_HEADER_LEN);
    writer.write_all(header.as_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(payload.len())
}

/// Reçoit une trame complète (préfixe puis boucle de réception).
pub fn recv_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, PsiError> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    read_exact_counted(reader, &mut header)?;

    let text = std::str::from_utf8(&header).map_err(|_| PsiError::FrameLengthMalformed)?;
    let length: usize = text.trim_end().parse().map_err(|_| PsiError::FrameLengthMalformed)?;
    if length > MAX_FRAME_BYTES {
        return Err(PsiError::FrameLengthMalformed);
    }

    let mut payload = vec![0u8; length];
    read_exact_counted(reader, &mut payload)?;
    Ok(payload)
}

/// Sérialise en bincode et envoie. Retourne la taille envoyée.
pub fn send_message<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<usize, PsiError> {
    let payload = bincode::serialize(value)?;
    send_frame(writer, &payload)
}

/// Reçoit et désérialise. Retourne (valeur, taille reçue).
pub fn recv_message<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<(T, usize), PsiError> {
    let payload = recv_frame(reader)?;
    let value = bincode::deserialize(&payload)?;
    Ok((value, payload.len()))
}

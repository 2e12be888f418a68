pub mod curve;
pub mod oprf;
pub mod key_storage;

// Réexportations courbe
pub use curve::{CurveP192, EcPoint, CURVE_LOG_P};

// Réexportations OPRF
pub use oprf::{
    OprfKey, encode_item, apply_key, extract_prf,
    client_prf_offline_parallel, server_prf_offline_parallel,
    server_prf_online_parallel, client_prf_online_parallel,
};

// Réexportations stockage des clés
pub use key_storage::{
    OprfKeyJson, load_oprf_key_json, save_oprf_key_json, load_or_generate_oprf_key,
};

pub mod state;
pub mod files;
pub mod client;
pub mod server;
pub mod local;

pub use state::{ClientState, ClientStateMachine, ServerState, ServerStateMachine};

pub use files::{
    CLIENT_SET_FILE, SERVER_SET_FILE, INTERSECTION_FILE,
    CLIENT_PREPROCESSED_FILE, SERVER_PREPROCESSED_FILE,
    CLIENT_KEY_FILE, SERVER_KEY_FILE,
    read_set_file, write_set_file, dedup_preserving_order,
    save_client_preprocessed, load_client_preprocessed,
    save_server_preprocessed, load_server_preprocessed,
};

pub use client::{run_client_offline, run_client_online};
pub use server::{run_server_offline, run_server_online};
pub use local::run_local_protocol;

pub mod parallel;

pub use parallel::{build_pool, chunk_size, split_into_chunks};

pub mod set_gen;

pub use set_gen::{generate_data_sets, write_data_sets};

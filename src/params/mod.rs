pub mod params;

pub use params::{PsiConfig, PsiParams, bin_capacity_for_log_size};

pub mod poly_coeffs;
pub mod windowing;

pub use poly_coeffs::{vanishing_coefficients, evaluate_descending};
pub use windowing::{
    windowing, window_all_bins, base_digits, low_depth_multiplication, reconstruct_power,
};

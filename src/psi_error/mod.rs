pub mod psi_error;

pub use psi_error::PsiError;

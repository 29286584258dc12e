//! Concrete bank profiles.

pub mod sisprime;

pub use sisprime::Sisprime;

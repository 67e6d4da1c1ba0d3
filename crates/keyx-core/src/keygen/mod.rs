//! Domain parameter and key pair generation
//!
//! Implements the FIPS 186 (appendix 2.2) style search for `p`, `q` and `g`,
//! followed by a random private exponent.

mod config;
mod params;

pub use config::{
    GeneratorConfig, DEFAULT_MAX_ITERATIONS, MAX_MODULUS_BITS, MIN_MODULUS_BITS,
    MODULUS_STEP_BITS,
};
#[cfg(feature = "background")]
pub use params::generate_in_background;
pub use params::{generate, generate_parameters, generate_with_rng};

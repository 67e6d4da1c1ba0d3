//! Generator configuration

use crate::{Error, Result, DEFAULT_PRIMALITY_ROUNDS};
use serde::{Deserialize, Serialize};

/// Smallest modulus length FIPS 186 allows for 160-bit `q`
pub const MIN_MODULUS_BITS: usize = 512;

/// Largest modulus length FIPS 186 allows for 160-bit `q`
pub const MAX_MODULUS_BITS: usize = 1024;

/// Step between allowed modulus lengths
pub const MODULUS_STEP_BITS: usize = 64;

/// Default bound on iterations of each search loop
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

/// Configuration for domain parameter generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Candidate modulus lengths; one is picked uniformly per generation
    pub modulus_sizes: Vec<usize>,

    /// Probable-prime rounds applied to every candidate
    pub primality_rounds: usize,

    /// Upper bound on iterations of each search loop
    pub max_iterations: usize,
}

impl GeneratorConfig {
    /// Create a new generator configuration
    pub fn new(
        modulus_sizes: Vec<usize>,
        primality_rounds: usize,
        max_iterations: usize,
    ) -> Result<Self> {
        let config = Self {
            modulus_sizes,
            primality_rounds,
            max_iterations,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration that always produces a modulus of `bits` bits
    pub fn with_modulus_bits(bits: usize) -> Result<Self> {
        Self::new(vec![bits], DEFAULT_PRIMALITY_ROUNDS, DEFAULT_MAX_ITERATIONS)
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<()> {
        if self.modulus_sizes.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one modulus size is required".into(),
            ));
        }
        for &bits in &self.modulus_sizes {
            if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits)
                || bits % MODULUS_STEP_BITS != 0
            {
                return Err(Error::InvalidConfig(format!(
                    "Modulus size {} is not a multiple of {} in [{}, {}]",
                    bits, MODULUS_STEP_BITS, MIN_MODULUS_BITS, MAX_MODULUS_BITS
                )));
            }
        }
        if self.primality_rounds == 0 {
            return Err(Error::InvalidConfig(
                "Primality rounds must be at least 1".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "Iteration bound must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            modulus_sizes: (MIN_MODULUS_BITS..=MAX_MODULUS_BITS)
                .step_by(MODULUS_STEP_BITS)
                .collect(),
            primality_rounds: DEFAULT_PRIMALITY_ROUNDS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

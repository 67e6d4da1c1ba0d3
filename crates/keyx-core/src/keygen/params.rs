//! Prime search and generator selection

use super::GeneratorConfig;
use crate::types::{DomainParameters, KeyPair, Q_BITS};
use crate::{Error, Result};
use num_bigint::{prime::probably_prime, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use tracing::{debug, info, instrument};

/// Generate a key pair with the default configuration and the OS RNG
pub fn generate() -> Result<KeyPair> {
    generate_with_rng(&GeneratorConfig::default(), &mut OsRng)
}

/// Generate domain parameters and a key pair
///
/// # Arguments
/// * `config` - Modulus sizes, primality rounds and iteration bound
/// * `rng` - Randomness source for every search step
///
/// # Returns
/// A key pair that has already passed validation
#[instrument(skip(rng))]
pub fn generate_with_rng<R: CryptoRng + RngCore>(
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<KeyPair> {
    let params = generate_parameters(config, rng)?;

    // x uniform in [1, q-1]
    let x = rng.gen_biguint_range(&BigUint::one(), params.q());
    let y = params.g().modpow(&x, params.p());

    let key_pair = KeyPair::from_checked_params(params, x, y).map_err(|e| {
        Error::InternalInvariantError(format!("freshly generated key pair rejected: {}", e))
    })?;

    info!(
        bits = key_pair.params().modulus_bits(),
        q = hex::encode(key_pair.params().q().to_bytes_be()),
        "Key pair generated"
    );

    Ok(key_pair)
}

/// Generate `(p, q, g)` and check the post-conditions
pub fn generate_parameters<R: CryptoRng + RngCore>(
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<DomainParameters> {
    config.validate()?;

    let q = find_q(config, rng)?;

    let bits = config.modulus_sizes[rng.gen_range(0..config.modulus_sizes.len())];
    let p = find_p(config, &q, bits, rng)?;
    let g = find_g(config, &p, &q, rng)?;

    if p.bits() != bits {
        return Err(Error::InternalInvariantError(format!(
            "p has {} bits, expected {}",
            p.bits(),
            bits
        )));
    }

    let params = DomainParameters::from_parts(p, q, g);
    params
        .check(config.primality_rounds)
        .map_err(|e| Error::InternalInvariantError(format!("generated parameters: {}", e)))?;

    Ok(params)
}

fn search_exhausted(stage: &str, iterations: usize) -> Error {
    Error::InternalInvariantError(format!(
        "{} search did not terminate after {} iterations",
        stage, iterations
    ))
}

/// Random odd start in [2^159, 2^160), then walk forward to the next probable prime
fn find_q<R: CryptoRng + RngCore>(config: &GeneratorConfig, rng: &mut R) -> Result<BigUint> {
    let lower = BigUint::one() << (Q_BITS - 1);
    let upper = BigUint::one() << Q_BITS;
    let mut iterations = 0usize;

    loop {
        let mut candidate = rng.gen_biguint_range(&lower, &upper);
        if candidate.is_even() {
            candidate += 1u32;
        }

        while candidate < upper {
            iterations += 1;
            if iterations > config.max_iterations {
                return Err(search_exhausted("q", iterations - 1));
            }
            if candidate > lower && probably_prime(&candidate, config.primality_rounds) {
                debug!(iterations, "Found q");
                return Ok(candidate);
            }
            candidate += 2u32;
        }

        debug!(iterations, "q search ran past 2^160, drawing a new start");
    }
}

/// `p = X - (X mod 2q - 1)`, so every accepted `p` is congruent to 1 mod 2q
fn find_p<R: CryptoRng + RngCore>(
    config: &GeneratorConfig,
    q: &BigUint,
    bits: usize,
    rng: &mut R,
) -> Result<BigUint> {
    let lower = BigUint::one() << (bits - 1);
    let upper = BigUint::one() << bits;
    let two_q = q << 1usize;

    for iteration in 1..=config.max_iterations {
        let x = rng.gen_biguint_range(&lower, &upper);
        let c = &x % &two_q;
        let p = x - c + 1u32;

        if p > lower && probably_prime(&p, config.primality_rounds) {
            debug!(iterations = iteration, bits, "Found p");
            return Ok(p);
        }
    }

    Err(search_exhausted("p", config.max_iterations))
}

/// `g = h^((p-1)/q) mod p` for random `h` in [2, p-2], retried while `g = 1`
fn find_g<R: CryptoRng + RngCore>(
    config: &GeneratorConfig,
    p: &BigUint,
    q: &BigUint,
    rng: &mut R,
) -> Result<BigUint> {
    let p_minus_one = p - 1u32;
    let exponent = &p_minus_one / q;
    let two = BigUint::from(2u32);

    for iteration in 1..=config.max_iterations {
        let h = rng.gen_biguint_range(&two, &p_minus_one);
        let g = h.modpow(&exponent, p);
        if !g.is_one() {
            debug!(iterations = iteration, "Found g");
            return Ok(g);
        }
    }

    Err(search_exhausted("g", config.max_iterations))
}

/// Run [`generate_with_rng`] on a blocking worker thread
///
/// Dropping the returned future does not stop the search; the result is
/// discarded when it completes.
#[cfg(feature = "background")]
#[instrument]
pub async fn generate_in_background(config: GeneratorConfig) -> Result<KeyPair> {
    tokio::task::spawn_blocking(move || generate_with_rng(&config, &mut OsRng))
        .await
        .map_err(|e| Error::InternalInvariantError(format!("generator task failed: {}", e)))?
}

//! DSA signing
//!
//! Every signature is checked against the public key before it is returned.
//! A signature that fails that check means the arithmetic is broken, so it is
//! reported as [`crate::Error::InternalInvariantError`] and never retried.

mod dsa;

pub use dsa::{sign, sign_with_rng, verify};

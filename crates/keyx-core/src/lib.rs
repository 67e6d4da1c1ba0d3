//! # keyx Core
//!
//! DSA host keys and the server half of the SSH `diffie-hellman-group1-sha1`
//! key exchange.
//!
//! This crate provides:
//! - FIPS 186 domain parameter and key pair generation
//! - DSA signing with a mandatory self-verification step
//! - The signed SSH_MSG_KEXDH_REPLY and the HMAC-SHA1 packet MAC keyed with
//!   the shared secret
//!
//! Human-readable key formats are out of scope. Keys cross the crate
//! boundary as raw field buffers (see [`KeyPair::raw_fields`]).
//!
//! ## Example
//!
//! ```rust,ignore
//! use keyx_core::{keygen, kex::{Handshake, KeyExchangeEngine}, HostKey};
//!
//! let host_key = HostKey::Dss(keygen::generate()?);
//! let engine = KeyExchangeEngine::new(host_key)?;
//!
//! let handshake = Handshake::from_kexinit(v_c, v_s, i_c, i_s)?;
//! let outcome = engine.handle_kexdh_init(&kexdh_init_payload, &handshake)?;
//! send(&outcome.reply);
//! ```

pub mod algorithm;
pub mod error;
pub mod kex;
pub mod keygen;
pub mod sign;
pub mod types;
pub mod wire;

#[cfg(test)]
mod test_support;

pub use algorithm::{Algorithm, HostKey};
pub use error::{Error, Result};
pub use types::{DomainParameters, KeyFile, KeyPair, KeyRole, Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Probable-prime rounds used for generation and for loading keys
pub const DEFAULT_PRIMALITY_ROUNDS: usize = 50;

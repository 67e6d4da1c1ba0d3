//! Host key algorithms
//!
//! The supported set is closed: adding an algorithm means adding a variant to
//! [`Algorithm`] and [`HostKey`], and every match below stops compiling until
//! the new variant is handled.

use crate::keygen::{self, GeneratorConfig};
use crate::sign;
use crate::types::{KeyPair, KeyRole, Signature, SSH_DSS};
use crate::{Error, Result};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host key algorithm identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// DSA over FIPS 186 parameters, `ssh-dss` on the wire
    Dss,
}

impl Algorithm {
    /// Every supported algorithm
    pub const ALL: [Algorithm; 1] = [Algorithm::Dss];

    /// Name used in host key and signature blobs
    pub fn ssh_name(&self) -> &'static str {
        match self {
            Algorithm::Dss => SSH_DSS,
        }
    }

    /// Look up an algorithm by its SSH name
    pub fn from_ssh_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.ssh_name() == name)
            .ok_or_else(|| Error::UnsupportedAlgorithm(name.to_string()))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ssh_name())
    }
}

/// A host key of one of the supported algorithms
#[derive(Debug, Clone)]
pub enum HostKey {
    /// DSA key pair
    Dss(KeyPair),
}

impl HostKey {
    /// Generate a fresh host key
    pub fn generate<R: CryptoRng + RngCore>(
        algorithm: Algorithm,
        config: &GeneratorConfig,
        rng: &mut R,
    ) -> Result<Self> {
        match algorithm {
            Algorithm::Dss => Ok(HostKey::Dss(keygen::generate_with_rng(config, rng)?)),
        }
    }

    /// Rebuild a host key from the raw field buffers handed over by the key codec
    pub fn from_raw_fields(
        algorithm: Algorithm,
        public: &[u8],
        private: &[u8],
        rounds: usize,
    ) -> Result<Self> {
        match algorithm {
            Algorithm::Dss => Ok(HostKey::Dss(KeyPair::from_raw_fields(
                public, private, rounds,
            )?)),
        }
    }

    /// Algorithm of this key
    pub fn algorithm(&self) -> Algorithm {
        match self {
            HostKey::Dss(_) => Algorithm::Dss,
        }
    }

    /// Re-check the public/private relationship
    pub fn validate(&self) -> bool {
        match self {
            HostKey::Dss(key) => key.validate(),
        }
    }

    /// Raw field buffer for the key codec
    pub fn raw_fields(&self, role: KeyRole) -> Vec<u8> {
        match self {
            HostKey::Dss(key) => key.raw_fields(role),
        }
    }

    /// Public key blob (`K_S` before the outer length prefix)
    pub fn public_blob(&self) -> Vec<u8> {
        match self {
            HostKey::Dss(key) => key.host_key_blob(),
        }
    }

    /// Sign `digest` and return the SSH signature blob
    pub fn sign(&self, digest: &[u8], nonce: &BigUint) -> Result<Vec<u8>> {
        match self {
            HostKey::Dss(key) => sign::sign(digest, key, nonce)?.ssh_blob(),
        }
    }

    /// Check an SSH signature blob over `digest`
    pub fn verify(&self, digest: &[u8], blob: &[u8]) -> Result<bool> {
        match self {
            HostKey::Dss(key) => {
                let signature = Signature::from_ssh_blob(blob)?;
                Ok(sign::verify(digest, key.params(), key.public(), &signature))
            }
        }
    }
}

//! Error types for keyx operations

use thiserror::Error;

/// Result type alias for keyx operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating keys, signing, or answering a key exchange
#[derive(Debug, Error)]
pub enum Error {
    /// Public and private values do not satisfy `y = g^x mod p`
    #[error("Invalid key pair: public value does not match private exponent")]
    InvalidKeyPair,

    /// Domain parameters or private exponent violate the DSA invariants
    #[error("Invalid domain parameters: {0}")]
    InvalidParameters(String),

    /// Negotiated key-exchange algorithm is not supported
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Wire field is truncated or not in canonical form
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    /// Client ephemeral value is outside [1, p-1]
    #[error("Client ephemeral value out of range")]
    InvalidEphemeral,

    /// Nonce or signature component reduced to zero modulo q
    #[error("Degenerate signature: nonce or signature component is zero mod q")]
    DegenerateSignature,

    /// Packet MAC did not match
    #[error("MAC mismatch at sequence number {sequence}")]
    MacMismatch { sequence: u32 },

    /// Invalid generator configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Hash or MAC provider failure
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Arithmetic pipeline produced a result that fails its own checks
    #[error("Internal invariant violated: {0}")]
    InternalInvariantError(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

//! Core types: domain parameters, key pairs and signatures

use crate::wire::{self, Reader};
use crate::{Error, Result};
use num_bigint::{prime::probably_prime, BigUint};
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Bit length of the subgroup order `q`
pub const Q_BITS: usize = 160;

/// Width in bytes of `r` and `s` inside an `ssh-dss` signature blob
pub const SIGNATURE_COMPONENT_LEN: usize = Q_BITS / 8;

/// SSH name of the DSA host key format
pub const SSH_DSS: &str = "ssh-dss";

/// Which half of a key pair a raw field buffer carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    /// The private exponent `x`
    Private,
    /// The public fields `p, q, g, y`
    Public,
}

/// DSA domain parameters `(p, q, g)`
#[derive(Clone, PartialEq, Eq)]
pub struct DomainParameters {
    p: BigUint,
    q: BigUint,
    g: BigUint,
}

impl DomainParameters {
    /// Build parameters from field values and check every invariant.
    ///
    /// `rounds` is the number of probable-prime rounds applied to `p` and `q`.
    pub fn new(p: BigUint, q: BigUint, g: BigUint, rounds: usize) -> Result<Self> {
        let params = Self { p, q, g };
        params.check(rounds)?;
        Ok(params)
    }

    /// Construct without checks; callers must run [`Self::check`]
    pub(crate) fn from_parts(p: BigUint, q: BigUint, g: BigUint) -> Self {
        Self { p, q, g }
    }

    /// Prime modulus
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// Prime subgroup order
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Subgroup generator
    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// Bit length `L` of the modulus
    pub fn modulus_bits(&self) -> usize {
        self.p.bits()
    }

    /// Check the FIPS 186 invariants on `(p, q, g)`
    pub fn check(&self, rounds: usize) -> Result<()> {
        let one = BigUint::one();

        if self.q.bits() != Q_BITS || self.q == (&one << (Q_BITS - 1)) {
            return Err(Error::InvalidParameters(format!(
                "q must lie strictly between 2^159 and 2^160, got {} bits",
                self.q.bits()
            )));
        }

        let l = self.p.bits();
        if !(512..=1024).contains(&l) || l % 64 != 0 {
            return Err(Error::InvalidParameters(format!(
                "p must be 512 to 1024 bits in steps of 64, got {} bits",
                l
            )));
        }
        if self.p == (&one << (l - 1)) {
            return Err(Error::InvalidParameters("p equals 2^(L-1)".into()));
        }

        if !((&self.p - &one) % &self.q).is_zero() {
            return Err(Error::InvalidParameters("q does not divide p - 1".into()));
        }

        if self.g <= one || self.g >= self.p {
            return Err(Error::InvalidParameters("g must lie in [2, p-1]".into()));
        }
        if !self.g.modpow(&self.q, &self.p).is_one() {
            return Err(Error::InvalidParameters("g does not have order q".into()));
        }

        if !probably_prime(&self.q, rounds) {
            return Err(Error::InvalidParameters("q is not prime".into()));
        }
        if !probably_prime(&self.p, rounds) {
            return Err(Error::InvalidParameters("p is not prime".into()));
        }

        Ok(())
    }
}

impl fmt::Debug for DomainParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainParameters")
            .field("bits", &self.modulus_bits())
            .field("q", &hex::encode(self.q.to_bytes_be()))
            .finish()
    }
}

/// Returns whether `y = g^x mod p`
pub fn validate(params: &DomainParameters, x: &BigUint, y: &BigUint) -> bool {
    params.g.modpow(x, &params.p) == *y
}

/// DSA key pair: domain parameters, private exponent `x`, public value `y`
#[derive(Clone)]
pub struct KeyPair {
    params: DomainParameters,
    x: BigUint,
    y: BigUint,
}

impl KeyPair {
    /// Assemble a key pair from externally supplied values.
    ///
    /// Runs the same checks as generation: domain parameter invariants,
    /// `0 < x < q`, and `y = g^x mod p`.
    pub fn new(params: DomainParameters, x: BigUint, y: BigUint, rounds: usize) -> Result<Self> {
        params.check(rounds)?;
        Self::from_checked_params(params, x, y)
    }

    /// Assemble a key pair whose parameters are already known to be valid
    pub(crate) fn from_checked_params(
        params: DomainParameters,
        x: BigUint,
        y: BigUint,
    ) -> Result<Self> {
        if x.is_zero() || x >= params.q {
            return Err(Error::InvalidParameters("x must lie in [1, q-1]".into()));
        }
        if !validate(&params, &x, &y) {
            return Err(Error::InvalidKeyPair);
        }
        Ok(Self { params, x, y })
    }

    /// Domain parameters
    pub fn params(&self) -> &DomainParameters {
        &self.params
    }

    /// Public value `y`
    pub fn public(&self) -> &BigUint {
        &self.y
    }

    pub(crate) fn private(&self) -> &BigUint {
        &self.x
    }

    /// Re-check `y = g^x mod p`
    pub fn validate(&self) -> bool {
        validate(&self.params, &self.x, &self.y)
    }

    /// Raw field buffer for the key codec.
    ///
    /// `Public` is `mpint(p) || mpint(q) || mpint(g) || mpint(y)`, `Private`
    /// is `mpint(x)`.
    pub fn raw_fields(&self, role: KeyRole) -> Vec<u8> {
        let mut buf = Vec::new();
        match role {
            KeyRole::Public => {
                wire::put_mpint(&mut buf, &self.params.p);
                wire::put_mpint(&mut buf, &self.params.q);
                wire::put_mpint(&mut buf, &self.params.g);
                wire::put_mpint(&mut buf, &self.y);
            }
            KeyRole::Private => wire::put_mpint(&mut buf, &self.x),
        }
        buf
    }

    /// Rebuild a key pair from the two raw field buffers and validate it
    pub fn from_raw_fields(public: &[u8], private: &[u8], rounds: usize) -> Result<Self> {
        let mut reader = Reader::new(public);
        let p = reader.read_mpint()?;
        let q = reader.read_mpint()?;
        let g = reader.read_mpint()?;
        let y = reader.read_mpint()?;
        reader.finish()?;

        let x = wire::decode_mpint(private)?;

        let params = DomainParameters::new(p, q, g, rounds)?;
        Self::from_checked_params(params, x, y)
    }

    /// `ssh-dss` host key blob: `string("ssh-dss") || mpint(p) || mpint(q) || mpint(g) || mpint(y)`
    pub fn host_key_blob(&self) -> Vec<u8> {
        let mut blob = Vec::new();
        wire::put_string(&mut blob, SSH_DSS.as_bytes());
        blob.extend_from_slice(&self.raw_fields(KeyRole::Public));
        blob
    }

    /// Hex-encoded serializable form
    pub fn to_key_file(&self) -> KeyFile {
        KeyFile {
            algorithm: SSH_DSS.to_string(),
            p: self.params.p.clone(),
            q: self.params.q.clone(),
            g: self.params.g.clone(),
            y: self.y.clone(),
            x: self.x.clone(),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("params", &self.params)
            .field("y", &hex::encode(self.y.to_bytes_be()))
            .field("x", &"<redacted>")
            .finish()
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.x.zeroize();
    }
}

/// Serializable key pair, every field stored as a hex string
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyFile {
    /// Host key algorithm name
    pub algorithm: String,
    #[serde(with = "biguint_hex")]
    pub p: BigUint,
    #[serde(with = "biguint_hex")]
    pub q: BigUint,
    #[serde(with = "biguint_hex")]
    pub g: BigUint,
    #[serde(with = "biguint_hex")]
    pub y: BigUint,
    #[serde(with = "biguint_hex")]
    pub x: BigUint,
}

impl KeyFile {
    /// Validate and convert into a [`KeyPair`]
    pub fn into_key_pair(self, rounds: usize) -> Result<KeyPair> {
        if self.algorithm != SSH_DSS {
            return Err(Error::UnsupportedAlgorithm(self.algorithm.clone()));
        }
        let params =
            DomainParameters::new(self.p.clone(), self.q.clone(), self.g.clone(), rounds)?;
        KeyPair::from_checked_params(params, self.x.clone(), self.y.clone())
    }
}

impl Drop for KeyFile {
    fn drop(&mut self) {
        self.x.zeroize();
    }
}

mod biguint_hex {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value.to_bytes_be()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
        Ok(BigUint::from_bytes_be(&bytes))
    }
}

/// DSA signature `(r, s)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// R component
    pub r: BigUint,
    /// S component
    pub s: BigUint,
}

impl Signature {
    /// Create a new signature
    pub fn new(r: BigUint, s: BigUint) -> Self {
        Self { r, s }
    }

    /// Convert to bytes (r || s), each left-padded to 20 bytes
    pub fn to_bytes(&self) -> Result<[u8; 2 * SIGNATURE_COMPONENT_LEN]> {
        let mut bytes = [0u8; 2 * SIGNATURE_COMPONENT_LEN];
        bytes[..SIGNATURE_COMPONENT_LEN]
            .copy_from_slice(&wire::fixed_width(&self.r, SIGNATURE_COMPONENT_LEN)?);
        bytes[SIGNATURE_COMPONENT_LEN..]
            .copy_from_slice(&wire::fixed_width(&self.s, SIGNATURE_COMPONENT_LEN)?);
        Ok(bytes)
    }

    /// Parse the 40-byte `r || s` form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 2 * SIGNATURE_COMPONENT_LEN {
            return Err(Error::MalformedEncoding(format!(
                "ssh-dss signature must be {} bytes, got {}",
                2 * SIGNATURE_COMPONENT_LEN,
                bytes.len()
            )));
        }
        let (r, s) = bytes.split_at(SIGNATURE_COMPONENT_LEN);
        Ok(Self::new(BigUint::from_bytes_be(r), BigUint::from_bytes_be(s)))
    }

    /// `ssh-dss` signature blob: `string("ssh-dss") || string(r || s)`
    pub fn ssh_blob(&self) -> Result<Vec<u8>> {
        let mut blob = Vec::new();
        wire::put_string(&mut blob, SSH_DSS.as_bytes());
        wire::put_string(&mut blob, &self.to_bytes()?);
        Ok(blob)
    }

    /// Parse an `ssh-dss` signature blob
    pub fn from_ssh_blob(blob: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(blob);
        let name = reader.read_string()?;
        if name != SSH_DSS.as_bytes() {
            return Err(Error::UnsupportedAlgorithm(
                String::from_utf8_lossy(name).into_owned(),
            ));
        }
        let body = reader.read_string()?;
        reader.finish()?;
        Self::from_bytes(body)
    }
}

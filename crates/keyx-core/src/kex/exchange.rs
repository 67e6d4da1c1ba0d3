//! Server side of `diffie-hellman-group1-sha1` (RFC 4253 Section 8)

use super::mac::MacState;
use super::transcript::{Handshake, HandshakeTranscript, EXCHANGE_HASH_LEN};
use super::{KEX_DH_GROUP1_SHA1, SSH_MSG_KEXDH_INIT, SSH_MSG_KEXDH_REPLY};
use crate::algorithm::HostKey;
use crate::wire::{self, Reader};
use crate::{Error, Result};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::{debug, info, instrument, warn};

/// Result of one key exchange
#[derive(Debug)]
pub struct ExchangeOutcome {
    /// SSH_MSG_KEXDH_REPLY payload
    pub reply: Vec<u8>,
    /// Exchange hash `H`
    pub exchange_hash: [u8; EXCHANGE_HASH_LEN],
    /// Values that were hashed into `H`
    pub transcript: HandshakeTranscript,
    /// MAC state keyed with the shared secret, starting at sequence 0
    pub mac: MacState,
}

/// Answers SSH_MSG_KEXDH_INIT with a signed SSH_MSG_KEXDH_REPLY
///
/// The engine holds only the host key; nothing carries over between calls,
/// so one engine can serve many handshakes, including concurrently.
///
/// The group is the host key's own DSA domain `(p, g)` and the server
/// exponent is the host key's public value `y`: `f = g^y mod p` and
/// `K = e^y mod p`. `K` is then used as the DSA nonce for the reply
/// signature. Both choices depart from RFC 4253, which calls for a fresh
/// per-session exponent in the Oakley group 2 modulus and an independent
/// random nonce. They are kept because peers of this engine rely on the
/// resulting reply bytes.
#[derive(Debug, Clone)]
pub struct KeyExchangeEngine {
    host_key: HostKey,
}

impl KeyExchangeEngine {
    /// Create an engine for `host_key`
    pub fn new(host_key: HostKey) -> Result<Self> {
        if !host_key.validate() {
            return Err(Error::InvalidKeyPair);
        }
        Ok(Self { host_key })
    }

    /// Host key used to sign replies
    pub fn host_key(&self) -> &HostKey {
        &self.host_key
    }

    /// Handle a full SSH_MSG_KEXDH_INIT payload
    pub fn handle_kexdh_init(&self, payload: &[u8], handshake: &Handshake) -> Result<ExchangeOutcome> {
        let e = parse_kexdh_init(payload)?;
        self.perform_exchange(e, handshake)
    }

    /// Compute the shared secret and build the signed reply
    ///
    /// # Arguments
    /// * `client_ephemeral` - `e` as a single canonical mpint
    /// * `handshake` - Identification strings, KEXINIT payloads and negotiated algorithm
    ///
    /// # Returns
    /// The reply payload, the exchange hash and transcript, and the MAC state
    #[instrument(skip_all, fields(kex = handshake.kex_algorithm()))]
    pub fn perform_exchange(
        &self,
        client_ephemeral: &[u8],
        handshake: &Handshake,
    ) -> Result<ExchangeOutcome> {
        if handshake.kex_algorithm() != KEX_DH_GROUP1_SHA1 {
            warn!(algorithm = handshake.kex_algorithm(), "Rejecting key exchange algorithm");
            return Err(Error::UnsupportedAlgorithm(
                handshake.kex_algorithm().to_string(),
            ));
        }

        let e = wire::decode_mpint(client_ephemeral).map_err(|err| {
            warn!(error = %err, "Rejecting client ephemeral value");
            err
        })?;

        let HostKey::Dss(key) = &self.host_key;
        let p = key.params().p();
        let g = key.params().g();
        let y = key.public();

        if e.is_zero() || e >= *p {
            warn!("Client ephemeral value out of range");
            return Err(Error::InvalidEphemeral);
        }

        let f = g.modpow(y, p);
        let k = e.modpow(y, p);
        debug!(f = hex::encode(f.to_bytes_be()), "Computed server ephemeral value");

        let host_key_blob = self.host_key.public_blob();
        let transcript = HandshakeTranscript::new(handshake.clone(), host_key_blob, e, f, k);
        let exchange_hash = transcript.exchange_hash();
        debug!(h = hex::encode(exchange_hash), "Computed exchange hash");

        let signature_blob = self
            .host_key
            .sign(&exchange_hash, transcript.shared_secret())?;

        let mut reply = vec![SSH_MSG_KEXDH_REPLY];
        wire::put_string(&mut reply, transcript.host_key_blob());
        wire::put_mpint(&mut reply, transcript.f());
        wire::put_string(&mut reply, &signature_blob);

        let mac = MacState::new(transcript.shared_secret().to_bytes_be());

        info!(
            reply_len = reply.len(),
            h = hex::encode(exchange_hash),
            "Key exchange reply built"
        );

        Ok(ExchangeOutcome {
            reply,
            exchange_hash,
            transcript,
            mac,
        })
    }
}

/// Strip the message type from SSH_MSG_KEXDH_INIT, returning the mpint `e`
pub fn parse_kexdh_init(payload: &[u8]) -> Result<&[u8]> {
    match payload.split_first() {
        Some((&SSH_MSG_KEXDH_INIT, rest)) => Ok(rest),
        Some((other, _)) => Err(Error::MalformedEncoding(format!(
            "expected SSH_MSG_KEXDH_INIT ({}), got {}",
            SSH_MSG_KEXDH_INIT, other
        ))),
        None => Err(Error::MalformedEncoding("empty KEXDH_INIT payload".into())),
    }
}

/// Build an SSH_MSG_KEXDH_INIT payload carrying `e`
pub fn kexdh_init(e: &BigUint) -> Vec<u8> {
    let mut payload = vec![SSH_MSG_KEXDH_INIT];
    wire::put_mpint(&mut payload, e);
    payload
}

/// Parsed SSH_MSG_KEXDH_REPLY, as a client sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KexdhReply {
    /// Host key blob `K_S`
    pub host_key_blob: Vec<u8>,
    /// Server ephemeral value
    pub f: BigUint,
    /// Signature blob over `H`
    pub signature_blob: Vec<u8>,
}

impl KexdhReply {
    /// Parse a reply payload, message type byte included
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let msg_type = reader.read_u8()?;
        if msg_type != SSH_MSG_KEXDH_REPLY {
            return Err(Error::MalformedEncoding(format!(
                "expected SSH_MSG_KEXDH_REPLY ({}), got {}",
                SSH_MSG_KEXDH_REPLY, msg_type
            )));
        }

        let host_key_blob = reader.read_string()?.to_vec();
        let f = reader.read_mpint()?;
        let signature_blob = reader.read_string()?.to_vec();
        reader.finish()?;

        if f <= BigUint::one() {
            return Err(Error::MalformedEncoding("server ephemeral value out of range".into()));
        }

        Ok(Self {
            host_key_blob,
            f,
            signature_blob,
        })
    }
}

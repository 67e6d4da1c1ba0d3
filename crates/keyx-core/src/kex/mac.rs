//! Per-packet MAC keyed with the exchange's shared secret

use crate::wire::{self, Reader};
use crate::{Error, Result};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha1 = Hmac<Sha1>;

/// MAC key and packet sequence number for one direction of one session
///
/// Every call that produces or checks a MAC advances the sequence number by
/// one, wrapping at 2^32. Mutation goes through `&mut self`; a session that
/// sends from several tasks must serialize access, e.g. behind a `Mutex`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MacState {
    key: Vec<u8>,
    sequence: u32,
}

impl MacState {
    /// Start a new direction at sequence number 0
    pub fn new(key: Vec<u8>) -> Self {
        Self::with_sequence(key, 0)
    }

    /// Resume a direction at a known sequence number
    pub fn with_sequence(key: Vec<u8>, sequence: u32) -> Self {
        Self { key, sequence }
    }

    /// Sequence number the next packet will use
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    fn hmac(&self, packet: &[u8]) -> Result<HmacSha1> {
        let mut mac = HmacSha1::new_from_slice(&self.key)
            .map_err(|e| Error::Crypto(e.to_string()))?;
        mac.update(&self.sequence.to_be_bytes());
        mac.update(packet);
        Ok(mac)
    }

    /// `string(HMAC-SHA1(K, be32(seq) || packet))`, then advance the sequence number
    pub fn sign_packet(&mut self, packet: &[u8]) -> Result<Vec<u8>> {
        let digest = self.hmac(packet)?.finalize().into_bytes();
        self.sequence = self.sequence.wrapping_add(1);

        let mut frame = Vec::with_capacity(4 + digest.len());
        wire::put_string(&mut frame, &digest);
        Ok(frame)
    }

    /// Check a MAC frame produced by the peer's [`MacState::sign_packet`]
    ///
    /// The sequence number advances whether or not the MAC matches.
    pub fn verify_packet(&mut self, packet: &[u8], frame: &[u8]) -> Result<()> {
        let sequence = self.sequence;
        let mac = self.hmac(packet)?;
        self.sequence = self.sequence.wrapping_add(1);

        let mut reader = Reader::new(frame);
        let digest = reader.read_string()?;
        reader.finish()?;

        mac.verify_slice(digest)
            .map_err(|_| Error::MacMismatch { sequence })
    }
}

impl fmt::Debug for MacState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacState")
            .field("key", &"<redacted>")
            .field("sequence", &self.sequence)
            .finish()
    }
}

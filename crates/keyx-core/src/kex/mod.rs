//! Key exchange: KEXINIT negotiation, the KEXDH reply and the packet MAC

mod exchange;
mod kexinit;
mod mac;
mod transcript;

pub use exchange::{kexdh_init, parse_kexdh_init, ExchangeOutcome, KexdhReply, KeyExchangeEngine};
pub use kexinit::{negotiate_algorithm, KexInit};
pub use mac::MacState;
pub use transcript::{Handshake, HandshakeTranscript, EXCHANGE_HASH_LEN};

/// The one supported key exchange method
pub const KEX_DH_GROUP1_SHA1: &str = "diffie-hellman-group1-sha1";

/// SSH_MSG_KEXINIT
pub const SSH_MSG_KEXINIT: u8 = 20;

/// SSH_MSG_KEXDH_INIT
pub const SSH_MSG_KEXDH_INIT: u8 = 30;

/// SSH_MSG_KEXDH_REPLY
pub const SSH_MSG_KEXDH_REPLY: u8 = 31;

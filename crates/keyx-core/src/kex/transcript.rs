//! Handshake inputs and the captured exchange transcript

use super::kexinit::{negotiate_algorithm, KexInit};
use crate::wire;
use num_bigint::BigUint;
use sha1::{Digest, Sha1};
use std::fmt;
use zeroize::Zeroize;

/// Length of the SHA-1 exchange hash
pub const EXCHANGE_HASH_LEN: usize = 20;

/// Values agreed before the client's SSH_MSG_KEXDH_INIT arrives
#[derive(Debug, Clone)]
pub struct Handshake {
    client_version: String,
    server_version: String,
    client_kexinit: Vec<u8>,
    server_kexinit: Vec<u8>,
    kex_algorithm: String,
}

impl Handshake {
    /// Create handshake inputs with an already negotiated algorithm name
    ///
    /// Identification strings may carry their trailing CR LF; it is stripped.
    pub fn new(
        client_version: &str,
        server_version: &str,
        client_kexinit: Vec<u8>,
        server_kexinit: Vec<u8>,
        kex_algorithm: &str,
    ) -> Self {
        Self {
            client_version: strip_line_ending(client_version).to_string(),
            server_version: strip_line_ending(server_version).to_string(),
            client_kexinit,
            server_kexinit,
            kex_algorithm: kex_algorithm.to_string(),
        }
    }

    /// Create handshake inputs, negotiating the algorithm from both KEXINIT payloads
    pub fn from_kexinit(
        client_version: &str,
        server_version: &str,
        client_kexinit: Vec<u8>,
        server_kexinit: Vec<u8>,
    ) -> crate::Result<Self> {
        let client = KexInit::from_bytes(&client_kexinit)?;
        let server = KexInit::from_bytes(&server_kexinit)?;
        let kex_algorithm = negotiate_algorithm(&client.kex_algorithms, &server.kex_algorithms)?;

        Ok(Self::new(
            client_version,
            server_version,
            client_kexinit,
            server_kexinit,
            &kex_algorithm,
        ))
    }

    /// Client identification string `V_C`
    pub fn client_version(&self) -> &str {
        &self.client_version
    }

    /// Server identification string `V_S`
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// Negotiated key exchange algorithm name
    pub fn kex_algorithm(&self) -> &str {
        &self.kex_algorithm
    }
}

fn strip_line_ending(version: &str) -> &str {
    version.trim_end_matches(['\r', '\n'])
}

/// Every value hashed into `H` for one exchange
///
/// Built once by the exchange engine and never modified.
#[derive(Clone)]
pub struct HandshakeTranscript {
    handshake: Handshake,
    host_key_blob: Vec<u8>,
    e: BigUint,
    f: BigUint,
    k: BigUint,
}

impl HandshakeTranscript {
    pub(crate) fn new(
        handshake: Handshake,
        host_key_blob: Vec<u8>,
        e: BigUint,
        f: BigUint,
        k: BigUint,
    ) -> Self {
        Self {
            handshake,
            host_key_blob,
            e,
            f,
            k,
        }
    }

    /// Inputs fixed before the exchange
    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Host key blob `K_S`, without the outer length prefix
    pub fn host_key_blob(&self) -> &[u8] {
        &self.host_key_blob
    }

    /// Client ephemeral value
    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Server ephemeral value
    pub fn f(&self) -> &BigUint {
        &self.f
    }

    /// Shared secret
    pub fn shared_secret(&self) -> &BigUint {
        &self.k
    }

    /// `string(V_C) || string(V_S) || string(I_C) || string(I_S) || string(K_S) || mpint(e) || mpint(f) || mpint(K)`
    pub fn encode(&self) -> Vec<u8> {
        let hs = &self.handshake;
        let mut buf = Vec::new();
        wire::put_string(&mut buf, hs.client_version.as_bytes());
        wire::put_string(&mut buf, hs.server_version.as_bytes());
        wire::put_string(&mut buf, &hs.client_kexinit);
        wire::put_string(&mut buf, &hs.server_kexinit);
        wire::put_string(&mut buf, &self.host_key_blob);
        wire::put_mpint(&mut buf, &self.e);
        wire::put_mpint(&mut buf, &self.f);
        wire::put_mpint(&mut buf, &self.k);
        buf
    }

    /// Exchange hash `H = SHA1(encode())`
    pub fn exchange_hash(&self) -> [u8; EXCHANGE_HASH_LEN] {
        let mut encoded = self.encode();
        let hash = Sha1::digest(&encoded);
        encoded.zeroize();
        hash.into()
    }
}

impl fmt::Debug for HandshakeTranscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeTranscript")
            .field("handshake", &self.handshake)
            .field("e", &hex::encode(self.e.to_bytes_be()))
            .field("f", &hex::encode(self.f.to_bytes_be()))
            .field("k", &"<redacted>")
            .finish()
    }
}

impl Drop for HandshakeTranscript {
    fn drop(&mut self) {
        self.k.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kex::KEX_DH_GROUP1_SHA1;
    use crate::wire::Reader;

    fn handshake() -> Handshake {
        Handshake::new(
            "SSH-2.0-client\r\n",
            "SSH-2.0-keyx",
            vec![20, 1, 2],
            vec![20, 3, 4],
            KEX_DH_GROUP1_SHA1,
        )
    }

    #[test]
    fn test_versions_are_stripped() {
        let hs = handshake();
        assert_eq!(hs.client_version(), "SSH-2.0-client");
        assert_eq!(hs.server_version(), "SSH-2.0-keyx");
    }

    #[test]
    fn test_encode_layout() {
        let transcript = HandshakeTranscript::new(
            handshake(),
            b"blob".to_vec(),
            BigUint::from(5u32),
            BigUint::from(0x80u32),
            BigUint::from(7u32),
        );
        let encoded = transcript.encode();

        let mut reader = Reader::new(&encoded);
        assert_eq!(reader.read_string().unwrap(), b"SSH-2.0-client");
        assert_eq!(reader.read_string().unwrap(), b"SSH-2.0-keyx");
        assert_eq!(reader.read_string().unwrap(), &[20, 1, 2]);
        assert_eq!(reader.read_string().unwrap(), &[20, 3, 4]);
        assert_eq!(reader.read_string().unwrap(), b"blob");
        assert_eq!(reader.read_mpint().unwrap(), BigUint::from(5u32));
        // 0x80 needs the sign pad
        assert_eq!(reader.read_string().unwrap(), &[0x00, 0x80]);
        assert_eq!(reader.read_mpint().unwrap(), BigUint::from(7u32));
        reader.finish().unwrap();

        let expected: [u8; 20] = Sha1::digest(&encoded).into();
        assert_eq!(transcript.exchange_hash(), expected);
    }

    #[test]
    fn test_from_kexinit_negotiates() {
        let server = KexInit::server_default([1u8; 16]);
        let mut client = KexInit::server_default([2u8; 16]);
        client.kex_algorithms = vec![
            "ecdh-sha2-nistp256".to_string(),
            KEX_DH_GROUP1_SHA1.to_string(),
        ];

        let hs = Handshake::from_kexinit(
            "SSH-2.0-client",
            "SSH-2.0-keyx",
            client.to_bytes(),
            server.to_bytes(),
        )
        .unwrap();
        assert_eq!(hs.kex_algorithm(), KEX_DH_GROUP1_SHA1);
    }
}

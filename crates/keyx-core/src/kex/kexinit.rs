//! SSH_MSG_KEXINIT parsing and algorithm negotiation (RFC 4253 Section 7.1)

use super::{KEX_DH_GROUP1_SHA1, SSH_MSG_KEXINIT};
use crate::types::SSH_DSS;
use crate::wire::{self, Reader};
use crate::{Error, Result};

/// Parsed SSH_MSG_KEXINIT payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KexInit {
    /// Random cookie
    pub cookie: [u8; 16],
    /// Key exchange algorithms, in preference order
    pub kex_algorithms: Vec<String>,
    /// Host key algorithms
    pub server_host_key_algorithms: Vec<String>,
    /// Ciphers client to server
    pub encryption_algorithms_client_to_server: Vec<String>,
    /// Ciphers server to client
    pub encryption_algorithms_server_to_client: Vec<String>,
    /// MACs client to server
    pub mac_algorithms_client_to_server: Vec<String>,
    /// MACs server to client
    pub mac_algorithms_server_to_client: Vec<String>,
    /// Compression client to server
    pub compression_algorithms_client_to_server: Vec<String>,
    /// Compression server to client
    pub compression_algorithms_server_to_client: Vec<String>,
    /// Languages client to server
    pub languages_client_to_server: Vec<String>,
    /// Languages server to client
    pub languages_server_to_client: Vec<String>,
    /// Whether a guessed key exchange packet follows
    pub first_kex_packet_follows: bool,
}

impl KexInit {
    /// KEXINIT advertising what this crate can answer
    pub fn server_default(cookie: [u8; 16]) -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            cookie,
            kex_algorithms: names(&[KEX_DH_GROUP1_SHA1]),
            server_host_key_algorithms: names(&[SSH_DSS]),
            encryption_algorithms_client_to_server: names(&["none"]),
            encryption_algorithms_server_to_client: names(&["none"]),
            mac_algorithms_client_to_server: names(&["hmac-sha1"]),
            mac_algorithms_server_to_client: names(&["hmac-sha1"]),
            compression_algorithms_client_to_server: names(&["none"]),
            compression_algorithms_server_to_client: names(&["none"]),
            languages_client_to_server: Vec::new(),
            languages_server_to_client: Vec::new(),
            first_kex_packet_follows: false,
        }
    }

    /// Serialize as a KEXINIT payload, message type byte included
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![SSH_MSG_KEXINIT];
        buf.extend_from_slice(&self.cookie);
        for list in self.name_lists() {
            wire::put_name_list(&mut buf, list);
        }
        buf.push(self.first_kex_packet_follows as u8);
        wire::put_u32(&mut buf, 0);
        buf
    }

    /// Parse a KEXINIT payload, message type byte included
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);

        let msg_type = reader.read_u8()?;
        if msg_type != SSH_MSG_KEXINIT {
            return Err(Error::MalformedEncoding(format!(
                "expected SSH_MSG_KEXINIT ({}), got {}",
                SSH_MSG_KEXINIT, msg_type
            )));
        }

        let mut cookie = [0u8; 16];
        cookie.copy_from_slice(reader.read_bytes(16)?);

        let kex_algorithms = reader.read_name_list()?;
        let server_host_key_algorithms = reader.read_name_list()?;
        let encryption_algorithms_client_to_server = reader.read_name_list()?;
        let encryption_algorithms_server_to_client = reader.read_name_list()?;
        let mac_algorithms_client_to_server = reader.read_name_list()?;
        let mac_algorithms_server_to_client = reader.read_name_list()?;
        let compression_algorithms_client_to_server = reader.read_name_list()?;
        let compression_algorithms_server_to_client = reader.read_name_list()?;
        let languages_client_to_server = reader.read_name_list()?;
        let languages_server_to_client = reader.read_name_list()?;

        let first_kex_packet_follows = reader.read_u8()? != 0;
        // reserved
        reader.read_u32()?;
        reader.finish()?;

        Ok(Self {
            cookie,
            kex_algorithms,
            server_host_key_algorithms,
            encryption_algorithms_client_to_server,
            encryption_algorithms_server_to_client,
            mac_algorithms_client_to_server,
            mac_algorithms_server_to_client,
            compression_algorithms_client_to_server,
            compression_algorithms_server_to_client,
            languages_client_to_server,
            languages_server_to_client,
            first_kex_packet_follows,
        })
    }

    fn name_lists(&self) -> [&Vec<String>; 10] {
        [
            &self.kex_algorithms,
            &self.server_host_key_algorithms,
            &self.encryption_algorithms_client_to_server,
            &self.encryption_algorithms_server_to_client,
            &self.mac_algorithms_client_to_server,
            &self.mac_algorithms_server_to_client,
            &self.compression_algorithms_client_to_server,
            &self.compression_algorithms_server_to_client,
            &self.languages_client_to_server,
            &self.languages_server_to_client,
        ]
    }
}

/// First client algorithm that the server also lists
pub fn negotiate_algorithm(client_list: &[String], server_list: &[String]) -> Result<String> {
    client_list
        .iter()
        .find(|name| server_list.contains(name))
        .cloned()
        .ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!(
                "no common algorithm: client={:?}, server={:?}",
                client_list, server_list
            ))
        })
}

//! End-to-end key exchange through the public API

use keyx_core::kex::{
    kexdh_init, Handshake, KexInit, KexdhReply, KeyExchangeEngine, MacState, KEX_DH_GROUP1_SHA1,
};
use keyx_core::wire::Reader;
use keyx_core::{keygen, Algorithm, DomainParameters, Error, HostKey, KeyFile, KeyPair, KeyRole};
use num_bigint::BigUint;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha1::{Digest, Sha1};
use std::sync::Arc;

const P_HEX: &str = "8606e9a06e31b53a841ca64b01fa4bd105d6f6023e0b733d5d523f1089e4593c\
                     0842c729752e5306e84fd2e08ce27d0dae7696c9fa5dba6c2167bd4f215d29f1";
const Q_HEX: &str = "f90bf02a1bc74715fef52cb172fa7c4bc5fba1f9";
const G_HEX: &str = "675c43e6640cba28a38fc056a21401df9a1743ed52e014d01a4570697a87e30b\
                     2e5d306a1f1e8fb87fe0861086d273a0b8d252fac7bf9bb458b93c04492e4da1";
const X_HEX: &str = "df3b224fc3818698ffb2788159cb1cd9f435a4e7";
const Y_HEX: &str = "121d221ab7c07e6b669ed631686e9150e1650ff8163d6602ace72ec41833218f\
                     1e3bca95644eaea75009b14f6f3409560a781880a355bae1758d9e240055a456";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("keyx_core=debug"))
        .with_test_writer()
        .try_init();
}

fn hex_int(text: &str) -> BigUint {
    BigUint::parse_bytes(text.as_bytes(), 16).unwrap()
}

fn fixture() -> KeyPair {
    let params = DomainParameters::new(hex_int(P_HEX), hex_int(Q_HEX), hex_int(G_HEX), 20).unwrap();
    KeyPair::new(params, hex_int(X_HEX), hex_int(Y_HEX), 20).unwrap()
}

fn handshake() -> Handshake {
    let mut client = KexInit::server_default([0x11; 16]);
    client.kex_algorithms = vec![
        "curve25519-sha256".to_string(),
        KEX_DH_GROUP1_SHA1.to_string(),
    ];
    let server = KexInit::server_default([0x22; 16]);

    Handshake::from_kexinit(
        "SSH-2.0-OpenSSH_4.3\r\n",
        "SSH-2.0-keyx_0.1\r\n",
        client.to_bytes(),
        server.to_bytes(),
    )
    .unwrap()
}

#[test]
fn client_verifies_reply() {
    init_tracing();
    let host_key = HostKey::Dss(fixture());
    let engine = KeyExchangeEngine::new(host_key.clone()).unwrap();
    let hs = handshake();

    let key = fixture();
    let client_secret = BigUint::from(0xdead_beef_u64);
    let e = key.params().g().modpow(&client_secret, key.params().p());

    let outcome = engine.handle_kexdh_init(&kexdh_init(&e), &hs).unwrap();
    let reply = KexdhReply::from_bytes(&outcome.reply).unwrap();

    // client recomputes K and H on its own
    let k = reply.f.modpow(&client_secret, key.params().p());
    assert_eq!(&k, outcome.transcript.shared_secret());

    let mut transcript = Vec::new();
    keyx_core::wire::put_string(&mut transcript, b"SSH-2.0-OpenSSH_4.3");
    keyx_core::wire::put_string(&mut transcript, b"SSH-2.0-keyx_0.1");
    let client_kexinit = {
        let mut c = KexInit::server_default([0x11; 16]);
        c.kex_algorithms = vec![
            "curve25519-sha256".to_string(),
            KEX_DH_GROUP1_SHA1.to_string(),
        ];
        c.to_bytes()
    };
    keyx_core::wire::put_string(&mut transcript, &client_kexinit);
    keyx_core::wire::put_string(&mut transcript, &KexInit::server_default([0x22; 16]).to_bytes());
    keyx_core::wire::put_string(&mut transcript, &reply.host_key_blob);
    keyx_core::wire::put_mpint(&mut transcript, &e);
    keyx_core::wire::put_mpint(&mut transcript, &reply.f);
    keyx_core::wire::put_mpint(&mut transcript, &k);
    let h: [u8; 20] = Sha1::digest(&transcript).into();

    assert_eq!(h, outcome.exchange_hash);
    assert!(host_key.verify(&h, &reply.signature_blob).unwrap());
}

#[test]
fn reply_starts_with_type_and_host_key() {
    let engine = KeyExchangeEngine::new(HostKey::Dss(fixture())).unwrap();
    let key = fixture();
    let e = key.params().g().modpow(&BigUint::from(3u32), key.params().p());

    let outcome = engine.handle_kexdh_init(&kexdh_init(&e), &handshake()).unwrap();

    let mut reader = Reader::new(&outcome.reply);
    assert_eq!(reader.read_u8().unwrap(), 31);
    let blob = reader.read_string().unwrap();
    assert_eq!(blob, key.host_key_blob().as_slice());
    reader.read_mpint().unwrap();
    let signature_blob = reader.read_string().unwrap();
    reader.finish().unwrap();

    let mut sig = Reader::new(signature_blob);
    assert_eq!(sig.read_string().unwrap(), b"ssh-dss");
    assert_eq!(sig.read_string().unwrap().len(), 40);
    sig.finish().unwrap();
}

#[test]
fn shared_engine_is_deterministic_across_threads() {
    let engine = Arc::new(KeyExchangeEngine::new(HostKey::Dss(fixture())).unwrap());
    let key = fixture();
    let e = key.params().g().modpow(&BigUint::from(77u32), key.params().p());
    let payload = kexdh_init(&e);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let payload = payload.clone();
            std::thread::spawn(move || engine.handle_kexdh_init(&payload, &handshake()).unwrap().reply)
        })
        .collect();

    let replies: Vec<Vec<u8>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(replies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn mac_states_stay_in_step() {
    let engine = KeyExchangeEngine::new(HostKey::Dss(fixture())).unwrap();
    let key = fixture();
    let client_secret = BigUint::from(12345u32);
    let e = key.params().g().modpow(&client_secret, key.params().p());

    let mut outcome = engine.handle_kexdh_init(&kexdh_init(&e), &handshake()).unwrap();
    let reply = KexdhReply::from_bytes(&outcome.reply).unwrap();
    let k = reply.f.modpow(&client_secret, key.params().p());
    let mut client_mac = MacState::new(k.to_bytes_be());

    for packet in [&b"first"[..], &b"second"[..], &b"third"[..]] {
        let frame = outcome.mac.sign_packet(packet).unwrap();
        client_mac.verify_packet(packet, &frame).unwrap();
    }
    assert_eq!(outcome.mac.sequence(), 3);
    assert_eq!(client_mac.sequence(), 3);
}

#[test]
fn rejected_inputs_are_typed() {
    init_tracing();
    let engine = KeyExchangeEngine::new(HostKey::Dss(fixture())).unwrap();

    let other = Handshake::new("SSH-2.0-a", "SSH-2.0-b", vec![20], vec![20], "diffie-hellman-group14-sha1");
    let result = engine.perform_exchange(&[0, 0, 0, 1, 5], &other);
    assert!(matches!(result, Err(Error::UnsupportedAlgorithm(_))));

    let padded = [0, 0, 0, 2, 0x00, 0x05];
    let result = engine.perform_exchange(&padded, &handshake());
    assert!(matches!(result, Err(Error::MalformedEncoding(_))));
}

#[test]
fn key_material_round_trips_through_raw_fields_and_json() {
    let key = fixture();

    let host_key = HostKey::from_raw_fields(
        Algorithm::Dss,
        &key.raw_fields(KeyRole::Public),
        &key.raw_fields(KeyRole::Private),
        20,
    )
    .unwrap();
    assert_eq!(host_key.public_blob(), key.host_key_blob());

    let json = serde_json::to_string(&key.to_key_file()).unwrap();
    let file: KeyFile = serde_json::from_str(&json).unwrap();
    let loaded = file.into_key_pair(20).unwrap();
    assert_eq!(loaded.public(), key.public());

    let mut tampered: serde_json::Value = serde_json::from_str(&json).unwrap();
    tampered["y"] = serde_json::Value::String("02".into());
    let file: KeyFile = serde_json::from_value(tampered).unwrap();
    assert!(matches!(file.into_key_pair(20), Err(Error::InvalidKeyPair)));
}

#[test]
fn generated_key_drives_an_exchange() {
    init_tracing();
    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let config = keygen::GeneratorConfig::new(vec![512], 20, 100_000).unwrap();
    let host_key = HostKey::generate(Algorithm::Dss, &config, &mut rng).unwrap();
    let HostKey::Dss(key) = &host_key;
    let e = key.params().g().modpow(&BigUint::from(99u32), key.params().p());

    let engine = KeyExchangeEngine::new(host_key.clone()).unwrap();
    let outcome = engine.handle_kexdh_init(&kexdh_init(&e), &handshake()).unwrap();
    let reply = KexdhReply::from_bytes(&outcome.reply).unwrap();
    assert!(host_key.verify(&outcome.exchange_hash, &reply.signature_blob).unwrap());
}

//! keyx CLI
//!
//! Command-line front end for the keyx core:
//! - DSA host key generation
//! - Key inspection
//! - Answering a KEXDH_INIT with a signed KEXDH_REPLY
//! - Signing a SHA-1 digest

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use keyx_core::kex::{Handshake, KeyExchangeEngine};
use keyx_core::keygen::{self, GeneratorConfig, DEFAULT_MAX_ITERATIONS};
use keyx_core::{sign, HostKey, KeyFile, KeyPair, KeyRole, DEFAULT_PRIMALITY_ROUNDS};
use rand::rngs::OsRng;
use std::io::Read;
use tracing::{info, Level};

/// keyx - DSA host keys and the diffie-hellman-group1-sha1 server reply
#[derive(Parser)]
#[command(name = "keyx")]
#[command(about = "DSA host keys and SSH group1 key exchange")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key pair and print it as JSON
    Generate {
        /// Modulus size in bits (512..=1024, multiple of 64)
        #[arg(short, long, env = "KEYX_MODULUS_BITS", default_value_t = 1024)]
        bits: usize,

        /// Probable-prime rounds
        #[arg(short, long, env = "KEYX_PRIMALITY_ROUNDS", default_value_t = DEFAULT_PRIMALITY_ROUNDS)]
        rounds: usize,
    },

    /// Load, validate and describe a key file
    Info {
        /// Key file path, or - for stdin
        #[arg(short, long)]
        key: String,
    },

    /// Answer a KEXDH_INIT and print the reply
    Exchange {
        /// Key file path, or - for stdin
        #[arg(short, long)]
        key: String,

        /// Client identification string
        #[arg(long)]
        client_version: String,

        /// Server identification string
        #[arg(long)]
        server_version: String,

        /// Client KEXINIT payload (hex)
        #[arg(long)]
        client_kexinit: String,

        /// Server KEXINIT payload (hex)
        #[arg(long)]
        server_kexinit: String,

        /// Client ephemeral value as an encoded mpint (hex)
        #[arg(short, long)]
        e: String,
    },

    /// Sign a 20-byte digest with a random nonce
    Sign {
        /// Key file path, or - for stdin
        #[arg(short, long)]
        key: String,

        /// SHA-1 digest (hex)
        #[arg(short, long)]
        digest: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Generate { bits, rounds } => {
            run_generate(bits, rounds).await?;
        }
        Commands::Info { ref key } => {
            show_info(key)?;
        }
        Commands::Exchange {
            ref key,
            ref client_version,
            ref server_version,
            ref client_kexinit,
            ref server_kexinit,
            ref e,
        } => {
            let handshake = Handshake::from_kexinit(
                client_version,
                server_version,
                hex::decode(client_kexinit).context("client KEXINIT is not hex")?,
                hex::decode(server_kexinit).context("server KEXINIT is not hex")?,
            )?;
            run_exchange(key, &handshake, e)?;
        }
        Commands::Sign { ref key, ref digest } => {
            run_sign(key, digest)?;
        }
    }

    Ok(())
}

async fn run_generate(bits: usize, rounds: usize) -> Result<()> {
    let config = GeneratorConfig::new(vec![bits], rounds, DEFAULT_MAX_ITERATIONS)?;

    info!(bits, rounds, "Generating DSA key pair");

    let key = keygen::generate_in_background(config).await?;
    let json = serde_json::to_string_pretty(&key.to_key_file())?;

    info!(
        modulus_bits = key.params().modulus_bits(),
        y = hex::encode(key.public().to_bytes_be()),
        "Key pair generated"
    );

    println!("{}", json);

    Ok(())
}

fn show_info(path: &str) -> Result<()> {
    let key = load_key(path)?;

    println!("Key Info:");
    println!("  Algorithm: {}", HostKey::Dss(key.clone()).algorithm());
    println!("  Modulus bits: {}", key.params().modulus_bits());
    println!("  Public fields: {}", hex::encode(key.raw_fields(KeyRole::Public)));
    println!("  Host key blob: {}", hex::encode(key.host_key_blob()));

    Ok(())
}

fn run_exchange(path: &str, handshake: &Handshake, e: &str) -> Result<()> {
    let engine = KeyExchangeEngine::new(HostKey::Dss(load_key(path)?))?;
    let e = hex::decode(e).context("client ephemeral value is not hex")?;

    info!(
        client = handshake.client_version(),
        kex = handshake.kex_algorithm(),
        "Answering KEXDH_INIT"
    );

    let outcome = engine.perform_exchange(&e, handshake)?;

    println!("Reply: {}", hex::encode(&outcome.reply));
    println!("Exchange hash: {}", hex::encode(outcome.exchange_hash));

    Ok(())
}

fn run_sign(path: &str, digest: &str) -> Result<()> {
    let key = load_key(path)?;
    let digest = hex::decode(digest).context("digest is not hex")?;
    if digest.len() != 20 {
        bail!("Digest must be 20 bytes, got {}", digest.len());
    }

    let signature = sign::sign_with_rng(&digest, &key, &mut OsRng)?;

    info!(
        r = %signature.r.to_str_radix(16),
        s = %signature.s.to_str_radix(16),
        "Signature generated"
    );

    println!("Signature:");
    println!("  r: {}", signature.r.to_str_radix(16));
    println!("  s: {}", signature.s.to_str_radix(16));
    println!("  blob: {}", hex::encode(signature.ssh_blob()?));

    Ok(())
}

fn load_key(path: &str) -> Result<KeyPair> {
    let json = if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?
    };
    let file: KeyFile = serde_json::from_str(&json)?;
    Ok(file.into_key_pair(DEFAULT_PRIMALITY_ROUNDS)?)
}

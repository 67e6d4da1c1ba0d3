//! DSA signature generation and verification

use crate::types::{DomainParameters, KeyPair, Signature};
use crate::{Error, Result};
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use tracing::{debug, instrument};

/// Sign a digest with an explicit nonce
///
/// # Arguments
/// * `digest` - Message digest, read as an unsigned big-endian integer
/// * `key` - Signing key pair
/// * `nonce` - Per-signature secret `k`; reduced modulo `q`
///
/// # Returns
/// `(r, s)` that has passed verification against `key.public()`
#[instrument(skip_all, fields(digest = %hex::encode(digest)))]
pub fn sign(digest: &[u8], key: &KeyPair, nonce: &BigUint) -> Result<Signature> {
    sign_components(digest, key.params(), key.private(), key.public(), nonce)
}

/// Sign a digest with a fresh random nonce in [1, q-1]
pub fn sign_with_rng<R: CryptoRng + RngCore>(
    digest: &[u8],
    key: &KeyPair,
    rng: &mut R,
) -> Result<Signature> {
    let nonce = rng.gen_biguint_range(&BigUint::one(), key.params().q());
    sign(digest, key, &nonce)
}

fn sign_components(
    digest: &[u8],
    params: &DomainParameters,
    x: &BigUint,
    y: &BigUint,
    nonce: &BigUint,
) -> Result<Signature> {
    let p = params.p();
    let q = params.q();

    // g has order q, so reducing k leaves g^k unchanged
    let k = nonce % q;
    if k.is_zero() {
        return Err(Error::DegenerateSignature);
    }

    let r = params.g().modpow(&k, p) % q;
    if r.is_zero() {
        return Err(Error::DegenerateSignature);
    }

    let h = BigUint::from_bytes_be(digest);
    let s = (mod_inverse(&k, q) * ((&h + x * &r) % q)) % q;
    if s.is_zero() {
        return Err(Error::DegenerateSignature);
    }

    let signature = Signature::new(r, s);

    if !verify(digest, params, y, &signature) {
        return Err(Error::InternalInvariantError(
            "signature failed self-verification".into(),
        ));
    }

    debug!(
        r = hex::encode(signature.r.to_bytes_be()),
        s = hex::encode(signature.s.to_bytes_be()),
        "Signature verified"
    );

    Ok(signature)
}

/// Verify `(r, s)` over `digest` with the public value `y`
///
/// Checks `0 < r < q`, `0 < s < q`, and
/// `((g^(H w) * y^(r w)) mod p) mod q = r` with `w = s^-1 mod q`.
pub fn verify(digest: &[u8], params: &DomainParameters, y: &BigUint, signature: &Signature) -> bool {
    let p = params.p();
    let q = params.q();
    let (r, s) = (&signature.r, &signature.s);

    if r.is_zero() || r >= q || s.is_zero() || s >= q {
        return false;
    }

    let h = BigUint::from_bytes_be(digest);
    let w = mod_inverse(s, q);
    let u1 = (&h * &w) % q;
    let u2 = (r * &w) % q;
    let v = ((params.g().modpow(&u1, p) * y.modpow(&u2, p)) % p) % q;

    v == *r
}

/// Inverse modulo the prime `q`, by Fermat's little theorem
fn mod_inverse(a: &BigUint, q: &BigUint) -> BigUint {
    let exponent = q - 2u32;
    a.modpow(&exponent, q)
}

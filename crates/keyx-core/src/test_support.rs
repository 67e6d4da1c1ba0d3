//! Fixed 512-bit key pair shared by unit tests

use crate::types::{DomainParameters, KeyPair};
use num_bigint::BigUint;

pub(crate) const P_HEX: &str = "8606e9a06e31b53a841ca64b01fa4bd105d6f6023e0b733d5d523f1089e4593c\
                                 0842c729752e5306e84fd2e08ce27d0dae7696c9fa5dba6c2167bd4f215d29f1";
pub(crate) const Q_HEX: &str = "f90bf02a1bc74715fef52cb172fa7c4bc5fba1f9";
pub(crate) const G_HEX: &str = "675c43e6640cba28a38fc056a21401df9a1743ed52e014d01a4570697a87e30b\
                                 2e5d306a1f1e8fb87fe0861086d273a0b8d252fac7bf9bb458b93c04492e4da1";
pub(crate) const X_HEX: &str = "df3b224fc3818698ffb2788159cb1cd9f435a4e7";
pub(crate) const Y_HEX: &str = "121d221ab7c07e6b669ed631686e9150e1650ff8163d6602ace72ec41833218f\
                                 1e3bca95644eaea75009b14f6f3409560a781880a355bae1758d9e240055a456";

pub(crate) fn from_hex(text: &str) -> BigUint {
    BigUint::parse_bytes(text.as_bytes(), 16).expect("valid hex")
}

pub(crate) fn fixture_key_pair() -> KeyPair {
    let params =
        DomainParameters::new(from_hex(P_HEX), from_hex(Q_HEX), from_hex(G_HEX), 20).unwrap();
    KeyPair::new(params, from_hex(X_HEX), from_hex(Y_HEX), 20).unwrap()
}

//! ML-KEM-768 wrapper.
//!
//! Keys are handled as the 64-byte FIPS 203 seed `d || z`; the expanded
//! decapsulation key only exists for the duration of one call.
//!
//! # RNG Bridging
//!
//! The `ml-kem` crate uses a newer `rand_core` than this crate. Entropy is
//! drawn from the caller's `CryptoRngCore` and fed into ml-kem's
//! deterministic APIs instead, so there is a single entropy source and the
//! output is reproducible for a given RNG state.

use ml_kem::kem::{Decapsulate, KeyExport};
use ml_kem::{B32, MlKem768, Seed};
use rand_core::CryptoRngCore;
use sha3::Shake256;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use zeroize::Zeroizing;

use crate::error::Error;

/// ML-KEM-768 encapsulation key (public) size in bytes.
pub const KEM_EK_LEN: usize = 1184;

/// ML-KEM-768 decapsulation key seed size in bytes.
pub const KEM_SEED_LEN: usize = 64;

/// ML-KEM-768 ciphertext size in bytes.
pub const KEM_CT_LEN: usize = 1088;

/// ML-KEM-768 shared secret size in bytes.
pub const KEM_SS_LEN: usize = 32;

/// SHAKE256 over the concatenation of `input`, filling `out`.
pub fn shake256(input: &[&[u8]], out: &mut [u8]) {
    let mut hasher = Shake256::default();
    for part in input {
        hasher.update(part);
    }
    hasher.finalize_xof().read(out);
}

fn decapsulation_key(seed_bytes: &[u8]) -> Result<ml_kem::DecapsulationKey<MlKem768>, Error> {
    let seed_bytes: &[u8; KEM_SEED_LEN] = seed_bytes
        .try_into()
        .map_err(|_| Error::Deserialize("invalid ML-KEM seed length"))?;
    let seed: Seed = (*seed_bytes).into();
    // NOTE: DecapsulationKey zeroization depends on the ml-kem crate's
    // implementation. Pinned to ml-kem 0.3.0-rc.0; verify on upgrades.
    Ok(ml_kem::DecapsulationKey::<MlKem768>::from_seed(seed))
}

/// Derive the encapsulation key from a decapsulation key seed.
pub fn ek_from_seed(seed: &[u8]) -> Result<[u8; KEM_EK_LEN], Error> {
    let dk = decapsulation_key(seed)?;
    let ek_exported = dk.encapsulation_key().to_bytes();
    let mut ek_bytes = [0u8; KEM_EK_LEN];
    ek_bytes.copy_from_slice(ek_exported.as_slice());
    Ok(ek_bytes)
}

/// Check that `ek` is a well-formed encapsulation key.
pub fn validate_ek(ek: &[u8]) -> Result<(), Error> {
    let ek: &[u8; KEM_EK_LEN] = ek
        .try_into()
        .map_err(|_| Error::Deserialize("invalid ML-KEM public key length"))?;
    ml_kem::EncapsulationKey::<MlKem768>::new(ek.into())
        .map(drop)
        .map_err(|_| Error::Deserialize("invalid ML-KEM public key"))
}

/// Encapsulate a shared secret against `ek`.
///
/// Draws the 32-byte encapsulation message `m` from `rng`.
/// Returns `(ciphertext, shared_secret)`.
pub fn encapsulate(
    ek: &[u8],
    rng: &mut dyn CryptoRngCore,
) -> Result<([u8; KEM_CT_LEN], Zeroizing<[u8; KEM_SS_LEN]>), Error> {
    let ek: &[u8; KEM_EK_LEN] = ek
        .try_into()
        .map_err(|_| Error::Deserialize("invalid ML-KEM public key length"))?;
    let ek = ml_kem::EncapsulationKey::<MlKem768>::new(ek.into())
        .map_err(|_| Error::Deserialize("invalid ML-KEM public key"))?;

    let mut m_bytes = Zeroizing::new([0u8; 32]);
    rng.fill_bytes(&mut *m_bytes);
    let m: &B32 = (&*m_bytes).into();

    let (ct, ss) = ek.encapsulate_deterministic(m);

    let mut ct_bytes = [0u8; KEM_CT_LEN];
    ct_bytes.copy_from_slice(ct.as_slice());
    let mut ss_bytes = Zeroizing::new([0u8; KEM_SS_LEN]);
    ss_bytes.copy_from_slice(ss.as_slice());
    Ok((ct_bytes, ss_bytes))
}

/// Decapsulate `ct` with the key expanded from `seed`.
///
/// ML-KEM uses implicit rejection: a tampered ciphertext yields a
/// pseudorandom shared secret rather than an error.
pub fn decapsulate(seed: &[u8], ct: &[u8]) -> Result<Zeroizing<[u8; KEM_SS_LEN]>, Error> {
    let dk = decapsulation_key(seed)?;
    let ct = ml_kem::kem::Ciphertext::<MlKem768>::try_from(ct)
        .map_err(|_| Error::Deserialize("invalid ML-KEM ciphertext length"))?;
    let ss = dk.decapsulate(&ct);

    let mut ss_bytes = Zeroizing::new([0u8; KEM_SS_LEN]);
    ss_bytes.copy_from_slice(ss.as_slice());
    Ok(ss_bytes)
}

//! X-Wing: a hybrid of ML-KEM-768 and X25519 with a SHA3-256 combiner
//! (draft-connolly-cfrg-xwing-kem).
//!
//! ```text
//! expand(sk)    = SHAKE256(sk, 96) -> (mlkem_seed[64], sk_x[32])
//! pk            = pk_m || pk_x
//! ct            = ct_m || ct_x
//! shared_secret = SHA3-256(ss_m || ss_x || ct_x || pk_x || "\.//^\")
//! ```
//!
//! Encapsulation draws the 32-byte ML-KEM message before the ephemeral
//! X25519 scalar, so a 64-byte `eseed` fed through the RNG reproduces the
//! published known-answer tests.
//!
//! The X25519 half is never checked for a low-order share. A zero `ss_x`
//! is hashed like any other value and decapsulation does not fail on it.

use rand_core::CryptoRngCore;
use sha3::{Digest, Sha3_256};
use zeroize::Zeroizing;

use super::{Encapsulated, Kem, SharedSecret, check_ikm};
use crate::crypto::pq::{self, KEM_CT_LEN, KEM_EK_LEN, KEM_SEED_LEN};
use crate::crypto::x25519::{self, DH_LEN};
use crate::error::Error;
use crate::identifiers::KemId;
use crate::keys::{KeyPair, PrivateKey, PublicKey};

const XWING_LABEL: &[u8] = b"\\.//^\\";

/// X-Wing private key (seed) length.
pub const XWING_SK_LEN: usize = 32;
/// X-Wing public key length.
pub const XWING_PK_LEN: usize = KEM_EK_LEN + DH_LEN;
/// X-Wing ciphertext length.
pub const XWING_CT_LEN: usize = KEM_CT_LEN + DH_LEN;
/// X-Wing shared secret length.
pub const XWING_SS_LEN: usize = 32;

/// X-Wing KEM. There is no authenticated mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct XWing;

struct Expanded {
    mlkem_seed: Zeroizing<[u8; KEM_SEED_LEN]>,
    sk_x: Zeroizing<[u8; DH_LEN]>,
}

fn expand(sk: &[u8]) -> Result<Expanded, Error> {
    if sk.len() != XWING_SK_LEN {
        return Err(Error::Deserialize("invalid X-Wing private key length"));
    }
    let mut expanded = Zeroizing::new([0u8; KEM_SEED_LEN + DH_LEN]);
    pq::shake256(&[sk], &mut *expanded);

    let mut mlkem_seed = Zeroizing::new([0u8; KEM_SEED_LEN]);
    mlkem_seed.copy_from_slice(&expanded[..KEM_SEED_LEN]);
    let mut sk_x = Zeroizing::new([0u8; DH_LEN]);
    sk_x.copy_from_slice(&expanded[KEM_SEED_LEN..]);
    Ok(Expanded { mlkem_seed, sk_x })
}

fn public_key_bytes(sk: &[u8]) -> Result<Vec<u8>, Error> {
    let expanded = expand(sk)?;
    let mut pk = Vec::with_capacity(XWING_PK_LEN);
    pk.extend_from_slice(&pq::ek_from_seed(&*expanded.mlkem_seed)?);
    pk.extend_from_slice(&x25519::public_key(&expanded.sk_x));
    Ok(pk)
}

fn combiner(ss_m: &[u8], ss_x: &[u8], ct_x: &[u8], pk_x: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut hasher = Sha3_256::new();
    Digest::update(&mut hasher, ss_m);
    Digest::update(&mut hasher, ss_x);
    Digest::update(&mut hasher, ct_x);
    Digest::update(&mut hasher, pk_x);
    Digest::update(&mut hasher, XWING_LABEL);
    Zeroizing::new(hasher.finalize().to_vec())
}

fn split_public_key(pk: &[u8]) -> Result<(&[u8], &[u8; DH_LEN]), Error> {
    if pk.len() != XWING_PK_LEN {
        return Err(Error::Deserialize("invalid X-Wing public key length"));
    }
    let (pk_m, pk_x) = pk.split_at(KEM_EK_LEN);
    let pk_x = pk_x
        .try_into()
        .map_err(|_| Error::Deserialize("invalid X-Wing public key length"))?;
    Ok((pk_m, pk_x))
}

impl XWing {
    fn key_pair_from_seed(sk: &[u8]) -> Result<KeyPair, Error> {
        let pk = public_key_bytes(sk)?;
        Ok(KeyPair {
            private_key: PrivateKey::new(KemId::XWing, sk.to_vec()),
            public_key: PublicKey::new(KemId::XWing, pk),
        })
    }
}

impl Kem for XWing {
    fn id(&self) -> KemId {
        KemId::XWing
    }

    fn shared_secret_len(&self) -> usize {
        XWING_SS_LEN
    }

    fn enc_len(&self) -> usize {
        XWING_CT_LEN
    }

    fn public_key_len(&self) -> usize {
        XWING_PK_LEN
    }

    fn private_key_len(&self) -> usize {
        XWING_SK_LEN
    }

    fn generate_key_pair(&self, rng: &mut dyn CryptoRngCore) -> Result<KeyPair, Error> {
        let mut sk = Zeroizing::new([0u8; XWING_SK_LEN]);
        rng.fill_bytes(&mut *sk);
        Self::key_pair_from_seed(&*sk)
    }

    fn derive_key_pair(&self, ikm: &[u8]) -> Result<KeyPair, Error> {
        check_ikm(ikm)?;
        let mut sk = Zeroizing::new([0u8; XWING_SK_LEN]);
        pq::shake256(&[ikm], &mut *sk);
        Self::key_pair_from_seed(&*sk)
    }

    fn public_key(&self, sk: &PrivateKey) -> Result<PublicKey, Error> {
        let pk = public_key_bytes(sk.check_kem(KemId::XWing)?)?;
        Ok(PublicKey::new(KemId::XWing, pk))
    }

    fn deserialize_public_key(&self, bytes: &[u8]) -> Result<PublicKey, Error> {
        let (pk_m, _) = split_public_key(bytes)?;
        pq::validate_ek(pk_m)?;
        Ok(PublicKey::new(KemId::XWing, bytes.to_vec()))
    }

    fn deserialize_private_key(&self, bytes: &[u8]) -> Result<PrivateKey, Error> {
        if bytes.len() != XWING_SK_LEN {
            return Err(Error::Deserialize("invalid X-Wing private key length"));
        }
        Ok(PrivateKey::new(KemId::XWing, bytes.to_vec()))
    }

    fn encap(&self, rng: &mut dyn CryptoRngCore, pk_r: &PublicKey) -> Result<Encapsulated, Error> {
        let (pk_m, pk_x) = split_public_key(pk_r.check_kem(KemId::XWing)?)?;

        let (ct_m, ss_m) = pq::encapsulate(pk_m, rng)?;

        let mut ek_x = Zeroizing::new([0u8; DH_LEN]);
        rng.fill_bytes(&mut *ek_x);
        let ct_x = x25519::public_key(&ek_x);
        let ss_x = x25519::dh_unchecked(&ek_x, pk_x);

        let shared_secret = combiner(&*ss_m, &*ss_x, &ct_x, pk_x);
        let mut enc = Vec::with_capacity(XWING_CT_LEN);
        enc.extend_from_slice(&ct_m);
        enc.extend_from_slice(&ct_x);
        Ok(Encapsulated {
            shared_secret: SharedSecret::new(shared_secret),
            enc,
        })
    }

    fn decap(&self, enc: &[u8], sk_r: &PrivateKey) -> Result<SharedSecret, Error> {
        if enc.len() != XWING_CT_LEN {
            return Err(Error::Deserialize("invalid X-Wing ciphertext length"));
        }
        let expanded = expand(sk_r.check_kem(KemId::XWing)?)?;
        let (ct_m, ct_x) = enc.split_at(KEM_CT_LEN);
        let ct_x: &[u8; DH_LEN] = ct_x
            .try_into()
            .map_err(|_| Error::Deserialize("invalid X-Wing ciphertext length"))?;

        let ss_m = pq::decapsulate(&*expanded.mlkem_seed, ct_m)?;
        let ss_x = x25519::dh_unchecked(&expanded.sk_x, ct_x);
        let pk_x = x25519::public_key(&expanded.sk_x);

        Ok(SharedSecret::new(combiner(&*ss_m, &*ss_x, ct_x, &pk_x)))
    }
}

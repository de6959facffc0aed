//! Concatenation combiner over two independent KEMs.
//!
//! Every value is the first component's followed by the second's:
//! `enc = enc_a || enc_b`, `pk = pk_a || pk_b`, `sk = sk_a || sk_b` and
//! `shared_secret = ss_a || ss_b`. Component lengths are fixed, so splitting
//! is by offset.

use std::sync::Arc;

use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use super::{DhkemX25519HkdfSha256, Encapsulated, Kem, MlKem768, SharedSecret, check_ikm};
use crate::crypto::hkdf::HkdfSha256;
use crate::error::Error;
use crate::identifiers::{KemId, kem_suite_id};
use crate::kdf::LabeledKdf;
use crate::keys::{KeyPair, PrivateKey, PublicKey};

const COMPONENT_SEED_LEN: usize = 32;

/// A hybrid KEM made of `A` and `B`, identified by a caller-chosen id.
///
/// A failure in either component fails the whole operation. There is no
/// authenticated mode.
pub struct HybridKem<A, B> {
    id: KemId,
    a: A,
    b: B,
    kdf: LabeledKdf,
}

/// DHKEM(X25519, HKDF-SHA256) followed by ML-KEM-768, KEM id `0x0030`.
///
/// The post-quantum half is FIPS 203 ML-KEM-768, not the round-3 Kyber768
/// that earlier drafts paired with this id. Peers that still run Kyber768
/// derive different secrets and will not interoperate.
pub type X25519MlKem768 = HybridKem<DhkemX25519HkdfSha256, MlKem768>;

impl Default for X25519MlKem768 {
    fn default() -> Self {
        Self::new(KemId::X25519MlKem768, DhkemX25519HkdfSha256::new(), MlKem768)
    }
}

impl<A: Kem, B: Kem> HybridKem<A, B> {
    /// Combine `a` and `b` under the KEM identifier `id`.
    pub fn new(id: KemId, a: A, b: B) -> Self {
        Self {
            id,
            a,
            b,
            kdf: LabeledKdf::new(Arc::new(HkdfSha256), &kem_suite_id(id)),
        }
    }

    fn split<'a>(
        &self,
        bytes: &'a [u8],
        first: usize,
        total: usize,
    ) -> Option<(&'a [u8], &'a [u8])> {
        (bytes.len() == total).then(|| bytes.split_at(first))
    }

    fn combine_key_pairs(&self, a: KeyPair, b: KeyPair) -> KeyPair {
        let mut sk = a.private_key.to_bytes();
        sk.extend_from_slice(&b.private_key.to_bytes());
        let mut pk = a.public_key.as_bytes().to_vec();
        pk.extend_from_slice(b.public_key.as_bytes());
        KeyPair {
            private_key: PrivateKey::new(self.id, sk.to_vec()),
            public_key: PublicKey::new(self.id, pk),
        }
    }

    fn component_public_keys(&self, pk: &PublicKey) -> Result<(PublicKey, PublicKey), Error> {
        let (pk_a, pk_b) = self
            .split(
                pk.check_kem(self.id)?,
                self.a.public_key_len(),
                self.public_key_len(),
            )
            .ok_or(Error::Deserialize("invalid hybrid public key length"))?;
        Ok((
            self.a.deserialize_public_key(pk_a)?,
            self.b.deserialize_public_key(pk_b)?,
        ))
    }

    fn component_private_keys(&self, sk: &PrivateKey) -> Result<(PrivateKey, PrivateKey), Error> {
        let (sk_a, sk_b) = self
            .split(
                sk.check_kem(self.id)?,
                self.a.private_key_len(),
                self.private_key_len(),
            )
            .ok_or(Error::Deserialize("invalid hybrid private key length"))?;
        Ok((
            self.a.deserialize_private_key(sk_a)?,
            self.b.deserialize_private_key(sk_b)?,
        ))
    }
}

impl<A: Kem, B: Kem> Kem for HybridKem<A, B> {
    fn id(&self) -> KemId {
        self.id
    }

    fn shared_secret_len(&self) -> usize {
        self.a.shared_secret_len() + self.b.shared_secret_len()
    }

    fn enc_len(&self) -> usize {
        self.a.enc_len() + self.b.enc_len()
    }

    fn public_key_len(&self) -> usize {
        self.a.public_key_len() + self.b.public_key_len()
    }

    fn private_key_len(&self) -> usize {
        self.a.private_key_len() + self.b.private_key_len()
    }

    fn generate_key_pair(&self, rng: &mut dyn CryptoRngCore) -> Result<KeyPair, Error> {
        let a = self.a.generate_key_pair(rng)?;
        let b = self.b.generate_key_pair(rng)?;
        Ok(self.combine_key_pairs(a, b))
    }

    fn derive_key_pair(&self, ikm: &[u8]) -> Result<KeyPair, Error> {
        check_ikm(ikm)?;
        let dkp_prk = self.kdf.labeled_extract(b"", b"dkp_prk", ikm);
        let seed = self
            .kdf
            .labeled_expand(&dkp_prk, b"sk", b"", COMPONENT_SEED_LEN)?;
        let a = self.a.derive_key_pair(&seed)?;
        let b = self.b.derive_key_pair(&seed)?;
        Ok(self.combine_key_pairs(a, b))
    }

    fn public_key(&self, sk: &PrivateKey) -> Result<PublicKey, Error> {
        let (sk_a, sk_b) = self.component_private_keys(sk)?;
        let mut pk = self.a.public_key(&sk_a)?.as_bytes().to_vec();
        pk.extend_from_slice(self.b.public_key(&sk_b)?.as_bytes());
        Ok(PublicKey::new(self.id, pk))
    }

    fn deserialize_public_key(&self, bytes: &[u8]) -> Result<PublicKey, Error> {
        let pk = PublicKey::new(self.id, bytes.to_vec());
        self.component_public_keys(&pk)?;
        Ok(pk)
    }

    fn deserialize_private_key(&self, bytes: &[u8]) -> Result<PrivateKey, Error> {
        let sk = PrivateKey::new(self.id, bytes.to_vec());
        self.component_private_keys(&sk)?;
        Ok(sk)
    }

    fn encap(&self, rng: &mut dyn CryptoRngCore, pk_r: &PublicKey) -> Result<Encapsulated, Error> {
        let (pk_a, pk_b) = self.component_public_keys(pk_r)?;
        let a = self.a.encap(rng, &pk_a)?;
        let b = self.b.encap(rng, &pk_b)?;

        let mut shared_secret = Zeroizing::new(a.shared_secret.as_bytes().to_vec());
        shared_secret.extend_from_slice(b.shared_secret.as_bytes());
        let mut enc = a.enc;
        enc.extend_from_slice(&b.enc);
        Ok(Encapsulated {
            shared_secret: SharedSecret::new(shared_secret),
            enc,
        })
    }

    fn decap(&self, enc: &[u8], sk_r: &PrivateKey) -> Result<SharedSecret, Error> {
        let (enc_a, enc_b) = self
            .split(enc, self.a.enc_len(), self.enc_len())
            .ok_or(Error::Deserialize("invalid hybrid enc length"))?;
        let (sk_a, sk_b) = self.component_private_keys(sk_r)?;

        let ss_a = self.a.decap(enc_a, &sk_a)?;
        let ss_b = self.b.decap(enc_b, &sk_b)?;

        let mut shared_secret = Zeroizing::new(ss_a.as_bytes().to_vec());
        shared_secret.extend_from_slice(ss_b.as_bytes());
        Ok(SharedSecret::new(shared_secret))
    }
}

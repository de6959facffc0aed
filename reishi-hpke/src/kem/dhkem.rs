//! DH-based KEM (RFC 9180 Section 4.1).
//!
//! [`DhKem`] turns any [`DhGroup`] plus a KDF into a full KEM:
//!
//! ```text
//! Encap(pkR):
//!   skE, pkE = GenerateKeyPair()
//!   dh = DH(skE, pkR)
//!   kem_context = pkE || pkR
//!   shared_secret = ExtractAndExpand(dh, kem_context)
//!
//! AuthEncap(pkR, skS):
//!   dh = DH(skE, pkR) || DH(skS, pkR)
//!   kem_context = pkE || pkR || pkS
//! ```

use core::marker::PhantomData;
use std::sync::Arc;

use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use super::{Encapsulated, Kem, SharedSecret, check_ikm};
use crate::crypto::ec::{P256, P384, P521, Secp256k1};
use crate::crypto::hkdf::{HkdfSha256, HkdfSha384, HkdfSha512};
use crate::crypto::x448::X448;
use crate::crypto::x25519::X25519;
use crate::error::Error;
use crate::identifiers::{KemId, kem_suite_id};
use crate::kdf::LabeledKdf;
use crate::keys::jwk::{self, JwkCurve};
use crate::keys::{Key, KeyFormat, KeyPair, PrivateKey, PublicKey};

/// A prime-order group (or Montgomery curve) with Diffie-Hellman.
///
/// Keys cross this trait as their serialized byte strings.
pub trait DhGroup: Send + Sync + 'static {
    /// The KEM identifier of the DH-KEM over this group.
    const KEM_ID: KemId;
    /// `Npk`, which is also `Nenc`.
    const PUBLIC_KEY_LEN: usize;
    /// `Nsk`
    const PRIVATE_KEY_LEN: usize;
    /// JWK encoding of this group, if one is registered.
    const JWK: Option<JwkCurve>;

    /// `DeriveKeyPair` minus the public half: map `ikm` to a valid
    /// serialized private key using the KEM's labeled KDF.
    fn derive_private_key(kdf: &LabeledKdf, ikm: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error>;

    /// Check a serialized private key.
    fn validate_private_key(sk: &[u8]) -> Result<(), Error>;

    /// Check a serialized public key.
    fn validate_public_key(pk: &[u8]) -> Result<(), Error>;

    /// Compute the serialized public key for `sk`.
    fn public_key_from_private(sk: &[u8]) -> Result<Vec<u8>, Error>;

    /// Diffie-Hellman between `sk` and `pk`.
    ///
    /// Must fail on an all-zero (low-order) result.
    fn dh(sk: &[u8], pk: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error>;
}

/// The RFC 9180 DH-KEM over group `G` with KDF `K`.
///
/// Only the six registered group and KDF pairs have constructors, so the
/// KEM id always names the KDF actually in use.
///
/// ```
/// use reishi_hpke::crypto::ec::P256;
/// use reishi_hpke::crypto::hkdf::HkdfSha256;
/// use reishi_hpke::kem::dhkem::DhKem;
///
/// let kem = DhKem::<P256, HkdfSha256>::new();
/// ```
///
/// ```compile_fail
/// use reishi_hpke::crypto::ec::P256;
/// use reishi_hpke::crypto::hkdf::HkdfSha512;
/// use reishi_hpke::kem::dhkem::DhKem;
///
/// let kem = DhKem::<P256, HkdfSha512>::new();
/// ```
pub struct DhKem<G, K> {
    kdf: LabeledKdf,
    _group: PhantomData<fn() -> (G, K)>,
}

/// DHKEM(P-256, HKDF-SHA256)
pub type DhkemP256HkdfSha256 = DhKem<P256, HkdfSha256>;
/// DHKEM(P-384, HKDF-SHA384)
pub type DhkemP384HkdfSha384 = DhKem<P384, HkdfSha384>;
/// DHKEM(P-521, HKDF-SHA512)
pub type DhkemP521HkdfSha512 = DhKem<P521, HkdfSha512>;
/// DHKEM(secp256k1, HKDF-SHA256)
pub type DhkemSecp256k1HkdfSha256 = DhKem<Secp256k1, HkdfSha256>;
/// DHKEM(X25519, HKDF-SHA256)
pub type DhkemX25519HkdfSha256 = DhKem<X25519, HkdfSha256>;
/// DHKEM(X448, HKDF-SHA512)
pub type DhkemX448HkdfSha512 = DhKem<X448, HkdfSha512>;

macro_rules! registered_dhkem {
    ($($group:ty => $kdf:ident),+ $(,)?) => {$(
        impl DhKem<$group, $kdf> {
            pub fn new() -> Self {
                Self {
                    kdf: LabeledKdf::new(Arc::new($kdf), &kem_suite_id(<$group>::KEM_ID)),
                    _group: PhantomData,
                }
            }
        }

        impl Default for DhKem<$group, $kdf> {
            fn default() -> Self {
                Self::new()
            }
        }
    )+};
}

registered_dhkem! {
    P256 => HkdfSha256,
    P384 => HkdfSha384,
    P521 => HkdfSha512,
    Secp256k1 => HkdfSha256,
    X25519 => HkdfSha256,
    X448 => HkdfSha512,
}

impl<G: DhGroup, K> DhKem<G, K> {
    fn encap_inner(
        &self,
        pk_r: &PublicKey,
        sk_s: Option<&PrivateKey>,
        ephemeral: &KeyPair,
    ) -> Result<Encapsulated, Error> {
        let pk_rm = pk_r.check_kem(G::KEM_ID)?;
        let sk_e = ephemeral.private_key.check_kem(G::KEM_ID)?;
        let enc = ephemeral.public_key.check_kem(G::KEM_ID)?.to_vec();

        let mut dh = G::dh(sk_e, pk_rm).map_err(|_| Error::Encap("DH with recipient key failed"))?;
        let mut kem_context = Vec::with_capacity(3 * G::PUBLIC_KEY_LEN);
        kem_context.extend_from_slice(&enc);
        kem_context.extend_from_slice(pk_rm);

        if let Some(sk_s) = sk_s {
            let sk_sm = sk_s.check_kem(G::KEM_ID)?;
            let dh_static =
                G::dh(sk_sm, pk_rm).map_err(|_| Error::Encap("DH with recipient key failed"))?;
            dh.extend_from_slice(&dh_static);
            kem_context.extend_from_slice(&G::public_key_from_private(sk_sm)?);
        }

        let shared_secret = self
            .kdf
            .extract_and_expand(&dh, &kem_context, self.kdf.hash_len())?;
        Ok(Encapsulated {
            shared_secret: SharedSecret::new(shared_secret),
            enc,
        })
    }

    fn decap_inner(
        &self,
        enc: &[u8],
        sk_r: &PrivateKey,
        pk_s: Option<&PublicKey>,
    ) -> Result<SharedSecret, Error> {
        G::validate_public_key(enc)?;
        let sk_rm = sk_r.check_kem(G::KEM_ID)?;
        let pk_rm = G::public_key_from_private(sk_rm)?;

        let mut dh = G::dh(sk_rm, enc).map_err(|_| Error::Decap("DH with ephemeral key failed"))?;
        let mut kem_context = Vec::with_capacity(3 * G::PUBLIC_KEY_LEN);
        kem_context.extend_from_slice(enc);
        kem_context.extend_from_slice(&pk_rm);

        if let Some(pk_s) = pk_s {
            let pk_sm = pk_s.check_kem(G::KEM_ID)?;
            let dh_static =
                G::dh(sk_rm, pk_sm).map_err(|_| Error::Decap("DH with sender key failed"))?;
            dh.extend_from_slice(&dh_static);
            kem_context.extend_from_slice(pk_sm);
        }

        let shared_secret = self
            .kdf
            .extract_and_expand(&dh, &kem_context, self.kdf.hash_len())?;
        Ok(SharedSecret::new(shared_secret))
    }

    fn generate_key_pair_inner(&self, rng: &mut dyn CryptoRngCore) -> Result<KeyPair, Error> {
        let mut ikm = Zeroizing::new(vec![0u8; G::PRIVATE_KEY_LEN]);
        rng.fill_bytes(&mut ikm);
        self.derive_key_pair_inner(&ikm)
    }

    fn derive_key_pair_inner(&self, ikm: &[u8]) -> Result<KeyPair, Error> {
        check_ikm(ikm)?;
        let sk = G::derive_private_key(&self.kdf, ikm)?;
        let pk = G::public_key_from_private(&sk).map_err(|_| Error::DeriveKeyPair)?;
        Ok(KeyPair {
            private_key: PrivateKey::new(G::KEM_ID, sk.to_vec()),
            public_key: PublicKey::new(G::KEM_ID, pk),
        })
    }
}

impl<G: DhGroup, K> Kem for DhKem<G, K> {
    fn id(&self) -> KemId {
        G::KEM_ID
    }

    fn shared_secret_len(&self) -> usize {
        self.kdf.hash_len()
    }

    fn enc_len(&self) -> usize {
        G::PUBLIC_KEY_LEN
    }

    fn public_key_len(&self) -> usize {
        G::PUBLIC_KEY_LEN
    }

    fn private_key_len(&self) -> usize {
        G::PRIVATE_KEY_LEN
    }

    fn generate_key_pair(&self, rng: &mut dyn CryptoRngCore) -> Result<KeyPair, Error> {
        self.generate_key_pair_inner(rng)
    }

    fn derive_key_pair(&self, ikm: &[u8]) -> Result<KeyPair, Error> {
        self.derive_key_pair_inner(ikm)
    }

    fn public_key(&self, sk: &PrivateKey) -> Result<PublicKey, Error> {
        let pk = G::public_key_from_private(sk.check_kem(G::KEM_ID)?)?;
        Ok(PublicKey::new(G::KEM_ID, pk))
    }

    fn deserialize_public_key(&self, bytes: &[u8]) -> Result<PublicKey, Error> {
        G::validate_public_key(bytes)?;
        Ok(PublicKey::new(G::KEM_ID, bytes.to_vec()))
    }

    fn deserialize_private_key(&self, bytes: &[u8]) -> Result<PrivateKey, Error> {
        G::validate_private_key(bytes)?;
        Ok(PrivateKey::new(G::KEM_ID, bytes.to_vec()))
    }

    fn import_key(&self, format: KeyFormat, data: &[u8], is_public: bool) -> Result<Key, Error> {
        let raw = match format {
            KeyFormat::Raw => Zeroizing::new(data.to_vec()),
            KeyFormat::Jwk => {
                let curve = G::JWK.ok_or(Error::NotSupported("JWK import for this KEM"))?;
                let coord_len = match curve {
                    JwkCurve::Ec(_) => G::PRIVATE_KEY_LEN,
                    JwkCurve::Okp(_) => G::PUBLIC_KEY_LEN,
                };
                jwk::to_raw(data, curve, is_public, coord_len, G::PRIVATE_KEY_LEN)?
            }
        };
        if is_public {
            self.deserialize_public_key(&raw).map(Key::Public)
        } else {
            self.deserialize_private_key(&raw).map(Key::Private)
        }
    }

    fn encap(&self, rng: &mut dyn CryptoRngCore, pk_r: &PublicKey) -> Result<Encapsulated, Error> {
        let ephemeral = self.generate_key_pair_inner(rng)?;
        self.encap_inner(pk_r, None, &ephemeral)
    }

    fn decap(&self, enc: &[u8], sk_r: &PrivateKey) -> Result<SharedSecret, Error> {
        self.decap_inner(enc, sk_r, None)
    }

    fn auth_encap(
        &self,
        rng: &mut dyn CryptoRngCore,
        pk_r: &PublicKey,
        sk_s: &PrivateKey,
    ) -> Result<Encapsulated, Error> {
        let ephemeral = self.generate_key_pair_inner(rng)?;
        self.encap_inner(pk_r, Some(sk_s), &ephemeral)
    }

    fn auth_decap(
        &self,
        enc: &[u8],
        sk_r: &PrivateKey,
        pk_s: &PublicKey,
    ) -> Result<SharedSecret, Error> {
        self.decap_inner(enc, sk_r, Some(pk_s))
    }

    fn encap_with_ephemeral(
        &self,
        pk_r: &PublicKey,
        sk_s: Option<&PrivateKey>,
        ephemeral: &KeyPair,
    ) -> Result<Encapsulated, Error> {
        self.encap_inner(pk_r, sk_s, ephemeral)
    }
}

/// `DeriveKeyPair` for X25519, X448 and secp256k1:
/// `LabeledExpand(LabeledExtract("", "dkp_prk", ikm), "sk", "", Nsk)`.
pub(crate) fn derive_sk_expand(
    kdf: &LabeledKdf,
    ikm: &[u8],
    len: usize,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    let dkp_prk = kdf.labeled_extract(b"", b"dkp_prk", ikm);
    kdf.labeled_expand(&dkp_prk, b"sk", b"", len)
}

/// `DeriveKeyPair` for the NIST curves: the `"candidate"` rejection loop.
///
/// The first byte of each candidate is masked with `bitmask` before
/// `is_valid` is asked whether it is a scalar in `[1, n)`.
pub(crate) fn derive_sk_candidate(
    kdf: &LabeledKdf,
    ikm: &[u8],
    len: usize,
    bitmask: u8,
    is_valid: impl Fn(&[u8]) -> bool,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    let dkp_prk = kdf.labeled_extract(b"", b"dkp_prk", ikm);
    for counter in 0..=u8::MAX {
        let mut candidate = kdf.labeled_expand(&dkp_prk, b"candidate", &[counter], len)?;
        candidate[0] &= bitmask;
        if is_valid(&candidate) {
            return Ok(candidate);
        }
    }
    Err(Error::DeriveKeyPair)
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::*;

    fn round_trip(kem: impl Kem) {
        let kp = kem.generate_key_pair(&mut OsRng).unwrap();
        let out = kem.encap(&mut OsRng, &kp.public_key).unwrap();
        assert_eq!(out.enc.len(), kem.enc_len());
        let ss = kem.decap(&out.enc, &kp.private_key).unwrap();
        assert_eq!(ss.as_bytes(), out.shared_secret.as_bytes());
        assert_eq!(ss.as_bytes().len(), kem.shared_secret_len());
    }

    fn auth_round_trip(kem: impl Kem) {
        let recipient = kem.generate_key_pair(&mut OsRng).unwrap();
        let sender = kem.generate_key_pair(&mut OsRng).unwrap();
        let out = kem
            .auth_encap(&mut OsRng, &recipient.public_key, &sender.private_key)
            .unwrap();
        let ss = kem
            .auth_decap(&out.enc, &recipient.private_key, &sender.public_key)
            .unwrap();
        assert_eq!(ss.as_bytes(), out.shared_secret.as_bytes());

        let impostor = kem.generate_key_pair(&mut OsRng).unwrap();
        let wrong = kem
            .auth_decap(&out.enc, &recipient.private_key, &impostor.public_key)
            .unwrap();
        assert_ne!(wrong.as_bytes(), out.shared_secret.as_bytes());
    }

    #[test]
    fn encap_decap_all_groups() {
        round_trip(DhkemP256HkdfSha256::new());
        round_trip(DhkemP384HkdfSha384::new());
        round_trip(DhkemP521HkdfSha512::new());
        round_trip(DhkemSecp256k1HkdfSha256::new());
        round_trip(DhkemX25519HkdfSha256::new());
        round_trip(DhkemX448HkdfSha512::new());
    }

    #[test]
    fn auth_encap_decap_all_groups() {
        auth_round_trip(DhkemP256HkdfSha256::new());
        auth_round_trip(DhkemP384HkdfSha384::new());
        auth_round_trip(DhkemP521HkdfSha512::new());
        auth_round_trip(DhkemSecp256k1HkdfSha256::new());
        auth_round_trip(DhkemX25519HkdfSha256::new());
        auth_round_trip(DhkemX448HkdfSha512::new());
    }

    #[test]
    fn derive_key_pair_is_deterministic() {
        let kem = DhkemP256HkdfSha256::new();
        let a = kem.derive_key_pair(&[7u8; 32]).unwrap();
        let b = kem.derive_key_pair(&[7u8; 32]).unwrap();
        assert_eq!(a.public_key, b.public_key);
        assert_eq!(*a.private_key.to_bytes(), *b.private_key.to_bytes());
    }

    #[test]
    fn derive_key_pair_rejects_long_ikm() {
        let kem = DhkemX25519HkdfSha256::new();
        assert_eq!(
            kem.derive_key_pair(&[0u8; 129]).unwrap_err(),
            Error::InvalidParam("Too long ikm")
        );
        assert!(kem.derive_key_pair(&[0u8; 128]).is_ok());
    }

    #[test]
    fn public_key_matches_key_pair() {
        let kem = DhkemX448HkdfSha512::new();
        let kp = kem.generate_key_pair(&mut OsRng).unwrap();
        assert_eq!(kem.public_key(&kp.private_key).unwrap(), kp.public_key);
    }

    #[test]
    fn foreign_key_rejected() {
        let x25519 = DhkemX25519HkdfSha256::new();
        let p256 = DhkemP256HkdfSha256::new();
        let kp = p256.generate_key_pair(&mut OsRng).unwrap();
        assert_eq!(
            x25519.encap(&mut OsRng, &kp.public_key).unwrap_err(),
            Error::InvalidParam("public key belongs to a different KEM")
        );
    }

    #[test]
    fn wrong_length_enc_rejected() {
        let kem = DhkemX25519HkdfSha256::new();
        let kp = kem.generate_key_pair(&mut OsRng).unwrap();
        assert!(matches!(
            kem.decap(&[1u8; 31], &kp.private_key),
            Err(Error::Deserialize(_))
        ));
    }

    #[test]
    fn low_order_enc_rejected() {
        let kem = DhkemX25519HkdfSha256::new();
        let kp = kem.generate_key_pair(&mut OsRng).unwrap();
        assert!(matches!(
            kem.decap(&[0u8; 32], &kp.private_key),
            Err(Error::Deserialize(_))
        ));
    }

    #[test]
    fn low_order_public_keys_not_importable() {
        let mut order_one = [0u8; 32];
        order_one[0] = 1;
        let x25519 = DhkemX25519HkdfSha256::new();
        for point in [[0u8; 32], order_one] {
            assert!(matches!(
                x25519.deserialize_public_key(&point),
                Err(Error::Deserialize(_))
            ));
            assert!(matches!(
                x25519.import_key(KeyFormat::Raw, &point, true),
                Err(Error::Deserialize(_))
            ));
        }
        assert!(matches!(
            DhkemX448HkdfSha512::new().deserialize_public_key(&[0u8; 56]),
            Err(Error::Deserialize(_))
        ));
    }

    #[test]
    fn registered_pairs_use_their_kdf() {
        let kems: [(Box<dyn Kem>, usize); 6] = [
            (Box::new(DhkemP256HkdfSha256::new()), 32),
            (Box::new(DhkemP384HkdfSha384::new()), 48),
            (Box::new(DhkemP521HkdfSha512::new()), 64),
            (Box::new(DhkemSecp256k1HkdfSha256::new()), 32),
            (Box::new(DhkemX25519HkdfSha256::default()), 32),
            (Box::new(DhkemX448HkdfSha512::default()), 64),
        ];
        for (kem, nsecret) in kems {
            assert_eq!(kem.shared_secret_len(), nsecret, "{}", kem.id());
        }
    }

    #[test]
    fn fixed_ephemeral_is_reproducible() {
        let kem = DhkemP384HkdfSha384::new();
        let recipient = kem.generate_key_pair(&mut OsRng).unwrap();
        let ephemeral = kem.derive_key_pair(b"fixed ephemeral").unwrap();
        let a = kem
            .encap_with_ephemeral(&recipient.public_key, None, &ephemeral)
            .unwrap();
        let b = kem
            .encap_with_ephemeral(&recipient.public_key, None, &ephemeral)
            .unwrap();
        assert_eq!(a.enc, b.enc);
        assert_eq!(a.enc, ephemeral.public_key.as_bytes());
        assert_eq!(a.shared_secret.as_bytes(), b.shared_secret.as_bytes());
    }

    #[test]
    fn serialize_round_trip() {
        let kem = DhkemP521HkdfSha512::new();
        let kp = kem.generate_key_pair(&mut OsRng).unwrap();
        let pk_bytes = kem.serialize_public_key(&kp.public_key).unwrap();
        let sk_bytes = kem.serialize_private_key(&kp.private_key).unwrap();
        assert_eq!(pk_bytes.len(), 133);
        assert_eq!(sk_bytes.len(), 66);
        assert_eq!(kem.deserialize_public_key(&pk_bytes).unwrap(), kp.public_key);
        let sk = kem.deserialize_private_key(&sk_bytes).unwrap();
        assert_eq!(kem.public_key(&sk).unwrap(), kp.public_key);
    }

    #[test]
    fn jwk_unsupported_for_secp256k1() {
        let kem = DhkemSecp256k1HkdfSha256::new();
        assert_eq!(
            kem.import_key(KeyFormat::Jwk, b"{}", true).unwrap_err(),
            Error::NotSupported("JWK import for this KEM")
        );
    }
}

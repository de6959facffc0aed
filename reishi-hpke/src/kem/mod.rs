//! Key Encapsulation Mechanisms.
//!
//! - [`dhkem`]: the generic DH-KEM built from a [`DhGroup`] and a KDF
//! - [`hybrid`]: concatenation combiner over two KEMs
//! - [`mlkem`]: ML-KEM-768
//! - [`xwing`]: X-Wing (ML-KEM-768 + X25519)

pub mod dhkem;
#[cfg(feature = "pq")]
pub mod hybrid;
#[cfg(feature = "pq")]
pub mod mlkem;
#[cfg(feature = "pq")]
pub mod xwing;

use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use crate::error::Error;
use crate::identifiers::KemId;
use crate::keys::{Key, KeyFormat, KeyPair, PrivateKey, PublicKey};

pub use dhkem::{
    DhGroup, DhKem, DhkemP256HkdfSha256, DhkemP384HkdfSha384, DhkemP521HkdfSha512,
    DhkemSecp256k1HkdfSha256, DhkemX25519HkdfSha256, DhkemX448HkdfSha512,
};
#[cfg(feature = "pq")]
pub use hybrid::{HybridKem, X25519MlKem768};
#[cfg(feature = "pq")]
pub use mlkem::MlKem768;
#[cfg(feature = "pq")]
pub use xwing::XWing;

/// Longest accepted input keying material for `derive_key_pair`.
pub const INPUT_LENGTH_LIMIT: usize = 128;

/// A KEM shared secret.
///
/// Zeroized on drop.
#[derive(Clone)]
pub struct SharedSecret(Zeroizing<Vec<u8>>);

impl SharedSecret {
    pub(crate) fn new(bytes: Zeroizing<Vec<u8>>) -> Self {
        Self(bytes)
    }

    /// Access the raw shared secret.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

/// The output of an encapsulation: the shared secret and the `enc` value
/// that lets the recipient recover it.
#[derive(Debug)]
pub struct Encapsulated {
    pub shared_secret: SharedSecret,
    pub enc: Vec<u8>,
}

/// A Key Encapsulation Mechanism.
///
/// Object safe; the [`CipherSuite`](crate::CipherSuite) holds one as
/// `Arc<dyn Kem>`. Randomness is always supplied by the caller.
pub trait Kem: Send + Sync {
    /// The registry identifier of this KEM.
    fn id(&self) -> KemId;

    /// `Nsecret`
    fn shared_secret_len(&self) -> usize;

    /// `Nenc`
    fn enc_len(&self) -> usize;

    /// `Npk`
    fn public_key_len(&self) -> usize;

    /// `Nsk`
    fn private_key_len(&self) -> usize;

    /// Generate a fresh random key pair.
    fn generate_key_pair(&self, rng: &mut dyn CryptoRngCore) -> Result<KeyPair, Error>;

    /// Deterministically derive a key pair from `ikm`.
    ///
    /// Fails with [`Error::InvalidParam`] if `ikm` is longer than
    /// [`INPUT_LENGTH_LIMIT`].
    fn derive_key_pair(&self, ikm: &[u8]) -> Result<KeyPair, Error>;

    /// Compute the public key belonging to `sk`.
    fn public_key(&self, sk: &PrivateKey) -> Result<PublicKey, Error>;

    /// Parse a serialized public key.
    fn deserialize_public_key(&self, bytes: &[u8]) -> Result<PublicKey, Error>;

    /// Parse a serialized private key.
    fn deserialize_private_key(&self, bytes: &[u8]) -> Result<PrivateKey, Error>;

    /// Serialize a public key of this KEM.
    fn serialize_public_key(&self, pk: &PublicKey) -> Result<Vec<u8>, Error> {
        Ok(pk.check_kem(self.id())?.to_vec())
    }

    /// Serialize a private key of this KEM.
    fn serialize_private_key(&self, sk: &PrivateKey) -> Result<Zeroizing<Vec<u8>>, Error> {
        Ok(Zeroizing::new(sk.check_kem(self.id())?.to_vec()))
    }

    /// Import a key in the given format.
    ///
    /// The default accepts only [`KeyFormat::Raw`].
    fn import_key(&self, format: KeyFormat, data: &[u8], is_public: bool) -> Result<Key, Error> {
        match format {
            KeyFormat::Raw if is_public => self.deserialize_public_key(data).map(Key::Public),
            KeyFormat::Raw => self.deserialize_private_key(data).map(Key::Private),
            KeyFormat::Jwk => Err(Error::NotSupported("JWK import for this KEM")),
        }
    }

    /// Encapsulate a fresh shared secret to `pk_r`.
    fn encap(&self, rng: &mut dyn CryptoRngCore, pk_r: &PublicKey) -> Result<Encapsulated, Error>;

    /// Recover the shared secret from `enc`.
    fn decap(&self, enc: &[u8], sk_r: &PrivateKey) -> Result<SharedSecret, Error>;

    /// Encapsulate to `pk_r` while authenticating the sender's key `sk_s`.
    fn auth_encap(
        &self,
        _rng: &mut dyn CryptoRngCore,
        _pk_r: &PublicKey,
        _sk_s: &PrivateKey,
    ) -> Result<Encapsulated, Error> {
        Err(Error::NotSupported("Auth mode for this KEM"))
    }

    /// Recover the shared secret from `enc`, checking it came from `pk_s`.
    fn auth_decap(
        &self,
        _enc: &[u8],
        _sk_r: &PrivateKey,
        _pk_s: &PublicKey,
    ) -> Result<SharedSecret, Error> {
        Err(Error::NotSupported("Auth mode for this KEM"))
    }

    /// Encapsulate with a caller-fixed ephemeral key pair.
    ///
    /// Only meant for reproducing published test vectors; a fixed ephemeral
    /// key destroys the sender's forward secrecy.
    fn encap_with_ephemeral(
        &self,
        _pk_r: &PublicKey,
        _sk_s: Option<&PrivateKey>,
        _ephemeral: &KeyPair,
    ) -> Result<Encapsulated, Error> {
        Err(Error::NotSupported("fixed ephemeral key for this KEM"))
    }
}

pub(crate) fn check_ikm(ikm: &[u8]) -> Result<(), Error> {
    if ikm.len() > INPUT_LENGTH_LIMIT {
        return Err(Error::InvalidParam("Too long ikm"));
    }
    Ok(())
}

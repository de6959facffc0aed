//! Opaque key handles.
//!
//! Keys are tagged with the KEM that produced them; a KEM refuses keys that
//! carry another KEM's tag. Private keys are zeroized on drop.

pub mod jwk;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::Error;
use crate::identifiers::KemId;

/// Encoding of key material passed to [`Kem::import_key`](crate::Kem::import_key).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    /// The KEM's `SerializePublicKey` / `SerializePrivateKey` encoding.
    Raw,
    /// A JSON Web Key (RFC 7517), for the NIST curves, X25519 and X448.
    Jwk,
}

/// A KEM public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    kem: KemId,
    bytes: Vec<u8>,
}

impl PublicKey {
    pub(crate) fn new(kem: KemId, bytes: Vec<u8>) -> Self {
        Self { kem, bytes }
    }

    /// The KEM this key belongs to.
    pub fn kem(&self) -> KemId {
        self.kem
    }

    /// The serialized public key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn check_kem(&self, kem: KemId) -> Result<&[u8], Error> {
        if self.kem == kem {
            Ok(&self.bytes)
        } else {
            Err(Error::InvalidParam("public key belongs to a different KEM"))
        }
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl core::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let prefix = &self.bytes[..self.bytes.len().min(4)];
        write!(f, "PublicKey({}, {:02x?})", self.kem, prefix)
    }
}

/// A KEM private key.
///
/// Zeroized from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    #[zeroize(skip)]
    kem: KemId,
    bytes: Vec<u8>,
}

impl PrivateKey {
    pub(crate) fn new(kem: KemId, bytes: Vec<u8>) -> Self {
        Self { kem, bytes }
    }

    /// The KEM this key belongs to.
    pub fn kem(&self) -> KemId {
        self.kem
    }

    /// Export the serialized private key.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.bytes.clone())
    }

    pub(crate) fn check_kem(&self, kem: KemId) -> Result<&[u8], Error> {
        if self.kem == kem {
            Ok(&self.bytes)
        } else {
            Err(Error::InvalidParam("private key belongs to a different KEM"))
        }
    }
}

impl core::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PrivateKey({}, [REDACTED])", self.kem)
    }
}

/// A private key and its public counterpart.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

/// A key produced by [`Kem::import_key`](crate::Kem::import_key).
#[derive(Clone, Debug)]
pub enum Key {
    Public(PublicKey),
    Private(PrivateKey),
}

impl Key {
    /// The public key, if this is one.
    pub fn into_public(self) -> Option<PublicKey> {
        match self {
            Self::Public(pk) => Some(pk),
            Self::Private(_) => None,
        }
    }

    /// The private key, if this is one.
    pub fn into_private(self) -> Option<PrivateKey> {
        match self {
            Self::Private(sk) => Some(sk),
            Self::Public(_) => None,
        }
    }
}

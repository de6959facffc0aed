use aes_gcm::aead::{self as rc_aead, KeyInit, Payload};

use crate::error::Error;
use crate::identifiers::AeadId;

/// Nonce length shared by every AEAD in the registry (`Nn`).
pub const AEAD_NONCE_LEN: usize = 12;
/// Tag length shared by every AEAD in the registry (`Nt`).
pub const AEAD_TAG_LEN: usize = 16;

/// An AEAD scheme with fixed key, nonce and tag sizes.
///
/// Implementations are stateless; the encryption context owns the key and
/// computes the per-message nonce.
pub trait Aead: Send + Sync {
    /// The registry identifier of this AEAD.
    fn id(&self) -> AeadId;

    /// `Nk`
    fn key_len(&self) -> usize;

    /// `Nn`
    fn nonce_len(&self) -> usize;

    /// `Nt`
    fn tag_len(&self) -> usize;

    /// Encrypt `plaintext`, returning ciphertext with the tag appended.
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8])
    -> Result<Vec<u8>, Error>;

    /// Decrypt and authenticate `ciphertext`.
    ///
    /// Any failure (bad tag, truncated input) surfaces as [`Error::Open`].
    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8])
    -> Result<Vec<u8>, Error>;
}

fn seal_with<C>(key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error>
where
    C: KeyInit + rc_aead::Aead,
{
    if nonce.len() != AEAD_NONCE_LEN {
        return Err(Error::Seal("invalid nonce length"));
    }
    let cipher = C::new_from_slice(key).map_err(|_| Error::Seal("invalid key length"))?;
    cipher
        .encrypt(
            rc_aead::Nonce::<C>::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| Error::Seal("encryption failed"))
}

fn open_with<C>(key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error>
where
    C: KeyInit + rc_aead::Aead,
{
    if nonce.len() != AEAD_NONCE_LEN || ciphertext.len() < AEAD_TAG_LEN {
        return Err(Error::Open);
    }
    let cipher = C::new_from_slice(key).map_err(|_| Error::Open)?;
    cipher
        .decrypt(
            rc_aead::Nonce::<C>::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| Error::Open)
}

macro_rules! aead_impl {
    ($name:ident, $cipher:ty, $id:expr, $nk:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Aead for $name {
            fn id(&self) -> AeadId {
                $id
            }

            fn key_len(&self) -> usize {
                $nk
            }

            fn nonce_len(&self) -> usize {
                AEAD_NONCE_LEN
            }

            fn tag_len(&self) -> usize {
                AEAD_TAG_LEN
            }

            fn seal(
                &self,
                key: &[u8],
                nonce: &[u8],
                aad: &[u8],
                plaintext: &[u8],
            ) -> Result<Vec<u8>, Error> {
                seal_with::<$cipher>(key, nonce, aad, plaintext)
            }

            fn open(
                &self,
                key: &[u8],
                nonce: &[u8],
                aad: &[u8],
                ciphertext: &[u8],
            ) -> Result<Vec<u8>, Error> {
                open_with::<$cipher>(key, nonce, aad, ciphertext)
            }
        }
    };
}

aead_impl!(Aes128Gcm, aes_gcm::Aes128Gcm, AeadId::Aes128Gcm, 16, "AES-128-GCM.");
aead_impl!(Aes256Gcm, aes_gcm::Aes256Gcm, AeadId::Aes256Gcm, 32, "AES-256-GCM.");
aead_impl!(
    ChaCha20Poly1305,
    chacha20poly1305::ChaCha20Poly1305,
    AeadId::ChaCha20Poly1305,
    32,
    "ChaCha20-Poly1305."
);

/// The export-only AEAD: no key, no nonce, no encryption.
///
/// Contexts built on it can only [`export`](crate::SenderContext::export).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOnly;

impl Aead for ExportOnly {
    fn id(&self) -> AeadId {
        AeadId::ExportOnly
    }

    fn key_len(&self) -> usize {
        0
    }

    fn nonce_len(&self) -> usize {
        0
    }

    fn tag_len(&self) -> usize {
        0
    }

    fn seal(&self, _: &[u8], _: &[u8], _: &[u8], _: &[u8]) -> Result<Vec<u8>, Error> {
        Err(Error::NotSupported("Export only"))
    }

    fn open(&self, _: &[u8], _: &[u8], _: &[u8], _: &[u8]) -> Result<Vec<u8>, Error> {
        Err(Error::NotSupported("Export only"))
    }
}

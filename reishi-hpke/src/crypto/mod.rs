//! Primitive wrappers behind the HPKE capability traits.
//!
//! - [`aead`]: AES-GCM, ChaCha20-Poly1305 and the export-only marker
//! - [`ec`]: P-256, P-384, P-521 and secp256k1 Diffie-Hellman
//! - [`hkdf`]: HKDF over SHA-2
//! - [`pq`]: ML-KEM-768 and SHAKE256
//! - [`x25519`] / [`x448`]: Montgomery-curve Diffie-Hellman with low-order point rejection

pub mod aead;
pub mod ec;
pub mod hkdf;
#[cfg(feature = "pq")]
pub mod pq;
pub mod x25519;
pub mod x448;

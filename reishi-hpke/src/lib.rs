#![deny(unsafe_code)]

//! # reishi-hpke
//!
//! A pure, sans-IO implementation of Hybrid Public Key Encryption
//! (RFC 9180) with pluggable KEMs, KDFs and AEADs.
//!
//! ## Suites
//!
//! - KEMs: DHKEM over P-256, P-384, P-521, secp256k1, X25519 and X448;
//!   ML-KEM-768, X-Wing, the X25519 + ML-KEM-768 hybrid and a generic
//!   hybrid combiner behind the `pq` feature (enabled by default)
//! - KDFs: HKDF-SHA256, HKDF-SHA384, HKDF-SHA512
//! - AEADs: AES-128-GCM, AES-256-GCM, ChaCha20-Poly1305 and export-only
//!
//! ## Security Properties
//!
//! - Low-order and off-curve public keys rejected at deserialization,
//!   including the small-subgroup points of X25519 and X448
//! - All key material zeroized on drop
//! - Nonce reuse impossible: sequence numbers only advance on success and
//!   exhaustion is an error
//! - Randomness is always injected by the caller
//!
//! ```
//! use rand_core::OsRng;
//! use reishi_hpke::{AeadId, CipherSuite, KdfId, KemId, RecipientParams, SenderParams};
//!
//! let suite = CipherSuite::from_ids(KemId::X25519, KdfId::HkdfSha256, AeadId::Aes128Gcm)?;
//! let recipient = suite.generate_key_pair(&mut OsRng)?;
//!
//! let mut sender = suite.create_sender_context(
//!     &mut OsRng,
//!     &SenderParams::new(&recipient.public_key).info(b"app"),
//! )?;
//! let ct = sender.seal(b"hello", b"")?;
//!
//! let mut receiver = suite.create_recipient_context(
//!     &RecipientParams::new(&recipient.private_key, sender.enc()).info(b"app"),
//! )?;
//! assert_eq!(receiver.open(&ct, b"")?, b"hello");
//! # Ok::<(), reishi_hpke::Error>(())
//! ```

pub mod crypto;
pub mod error;
pub mod identifiers;
pub mod kdf;
pub mod kem;
pub mod keys;

mod context;
mod key_schedule;
mod mode;
mod suite;

// Re-export the primary public API
pub use context::{RecipientContext, SenderContext};
pub use crypto::aead::{Aead, Aes128Gcm, Aes256Gcm, ChaCha20Poly1305, ExportOnly};
pub use crypto::hkdf::{HkdfSha256, HkdfSha384, HkdfSha512, Kdf};
pub use error::Error;
pub use identifiers::{AeadId, KdfId, KemId};
pub use kem::{
    DhkemP256HkdfSha256, DhkemP384HkdfSha384, DhkemP521HkdfSha512, DhkemSecp256k1HkdfSha256,
    DhkemX25519HkdfSha256, DhkemX448HkdfSha512, Encapsulated, INPUT_LENGTH_LIMIT, Kem,
    SharedSecret,
};
pub use keys::{Key, KeyFormat, KeyPair, PrivateKey, PublicKey};
pub use mode::{MINIMUM_PSK_LENGTH, Mode, Psk};
pub use suite::{CipherSuite, RecipientParams, Sealed, SenderParams};

#[cfg(feature = "pq")]
pub use kem::{HybridKem, MlKem768, X25519MlKem768, XWing};

//! Algorithm identifiers from the HPKE IANA registry.
//!
//! The identifiers are plain 16-bit codes. They feed the suite ids that bind
//! every labeled KDF call to one particular combination of algorithms.

use core::fmt;
use core::hash::{Hash, Hasher};

use crate::error::Error;

/// Protocol version label prepended to every labeled KDF input.
pub(crate) const HPKE_VERSION: &[u8] = b"HPKE-v1";

/// Length of the HPKE suite id: `"HPKE" || kem || kdf || aead`.
pub const SUITE_ID_LEN: usize = 10;

/// Length of the KEM suite id: `"KEM" || kem`.
pub const KEM_SUITE_ID_LEN: usize = 5;

/// Key Encapsulation Mechanism identifier.
///
/// Equality and hashing go by registry code, so `Other(0x0010)` is the same
/// identifier as `P256`.
#[derive(Debug, Clone, Copy)]
pub enum KemId {
    /// DHKEM(P-256, HKDF-SHA256)
    P256,
    /// DHKEM(P-384, HKDF-SHA384)
    P384,
    /// DHKEM(P-521, HKDF-SHA512)
    P521,
    /// DHKEM(secp256k1, HKDF-SHA256)
    Secp256k1,
    /// DHKEM(X25519, HKDF-SHA256)
    X25519,
    /// DHKEM(X448, HKDF-SHA512)
    X448,
    /// ML-KEM-768
    MlKem768,
    /// X-Wing (ML-KEM-768 + X25519)
    XWing,
    /// X25519 and ML-KEM-768 joined by the concatenation combiner
    X25519MlKem768,
    /// Any other code, e.g. one assigned to a caller-built hybrid KEM.
    Other(u16),
}

impl KemId {
    /// The registry code of this KEM.
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::P256 => 0x0010,
            Self::P384 => 0x0011,
            Self::P521 => 0x0012,
            Self::Secp256k1 => 0x0016,
            Self::X25519 => 0x0020,
            Self::X448 => 0x0021,
            Self::MlKem768 => 0x0041,
            Self::XWing => 0x647a,
            Self::X25519MlKem768 => 0x0030,
            Self::Other(id) => id,
        }
    }

    /// Map a registry code back to an identifier.
    ///
    /// Codes without a named variant become [`KemId::Other`].
    pub const fn from_u16(id: u16) -> Self {
        match id {
            0x0010 => Self::P256,
            0x0011 => Self::P384,
            0x0012 => Self::P521,
            0x0016 => Self::Secp256k1,
            0x0020 => Self::X25519,
            0x0021 => Self::X448,
            0x0041 => Self::MlKem768,
            0x647a => Self::XWing,
            0x0030 => Self::X25519MlKem768,
            other => Self::Other(other),
        }
    }

    /// The named variant for this code, if there is one.
    pub const fn canonical(self) -> Self {
        Self::from_u16(self.to_u16())
    }
}

impl PartialEq for KemId {
    fn eq(&self, other: &Self) -> bool {
        self.to_u16() == other.to_u16()
    }
}

impl Eq for KemId {}

impl Hash for KemId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_u16().hash(state);
    }
}

impl fmt::Display for KemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical() {
            Self::P256 => write!(f, "DHKEM(P-256, HKDF-SHA256)"),
            Self::P384 => write!(f, "DHKEM(P-384, HKDF-SHA384)"),
            Self::P521 => write!(f, "DHKEM(P-521, HKDF-SHA512)"),
            Self::Secp256k1 => write!(f, "DHKEM(secp256k1, HKDF-SHA256)"),
            Self::X25519 => write!(f, "DHKEM(X25519, HKDF-SHA256)"),
            Self::X448 => write!(f, "DHKEM(X448, HKDF-SHA512)"),
            Self::MlKem768 => write!(f, "ML-KEM-768"),
            Self::XWing => write!(f, "X-Wing"),
            Self::X25519MlKem768 => write!(f, "X25519-ML-KEM-768"),
            Self::Other(id) => write!(f, "KEM(0x{id:04x})"),
        }
    }
}

/// Key Derivation Function identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KdfId {
    /// HKDF-SHA256
    HkdfSha256,
    /// HKDF-SHA384
    HkdfSha384,
    /// HKDF-SHA512
    HkdfSha512,
}

impl KdfId {
    /// The registry code of this KDF.
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::HkdfSha256 => 0x0001,
            Self::HkdfSha384 => 0x0002,
            Self::HkdfSha512 => 0x0003,
        }
    }
}

impl TryFrom<u16> for KdfId {
    type Error = Error;

    fn try_from(id: u16) -> Result<Self, Error> {
        match id {
            0x0001 => Ok(Self::HkdfSha256),
            0x0002 => Ok(Self::HkdfSha384),
            0x0003 => Ok(Self::HkdfSha512),
            _ => Err(Error::NotSupported("unknown KDF id")),
        }
    }
}

impl fmt::Display for KdfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HkdfSha256 => write!(f, "HKDF-SHA256"),
            Self::HkdfSha384 => write!(f, "HKDF-SHA384"),
            Self::HkdfSha512 => write!(f, "HKDF-SHA512"),
        }
    }
}

/// AEAD identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AeadId {
    /// AES-128-GCM
    Aes128Gcm,
    /// AES-256-GCM
    Aes256Gcm,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305,
    /// No AEAD; the context only supports secret export.
    ExportOnly,
}

impl AeadId {
    /// The registry code of this AEAD.
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::Aes128Gcm => 0x0001,
            Self::Aes256Gcm => 0x0002,
            Self::ChaCha20Poly1305 => 0x0003,
            Self::ExportOnly => 0xffff,
        }
    }
}

impl TryFrom<u16> for AeadId {
    type Error = Error;

    fn try_from(id: u16) -> Result<Self, Error> {
        match id {
            0x0001 => Ok(Self::Aes128Gcm),
            0x0002 => Ok(Self::Aes256Gcm),
            0x0003 => Ok(Self::ChaCha20Poly1305),
            0xffff => Ok(Self::ExportOnly),
            _ => Err(Error::NotSupported("unknown AEAD id")),
        }
    }
}

impl fmt::Display for AeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes128Gcm => write!(f, "AES-128-GCM"),
            Self::Aes256Gcm => write!(f, "AES-256-GCM"),
            Self::ChaCha20Poly1305 => write!(f, "ChaCha20Poly1305"),
            Self::ExportOnly => write!(f, "Export-only"),
        }
    }
}

/// `"HPKE" || I2OSP(kem_id, 2) || I2OSP(kdf_id, 2) || I2OSP(aead_id, 2)`
pub fn suite_id(kem: KemId, kdf: KdfId, aead: AeadId) -> [u8; SUITE_ID_LEN] {
    let mut id = [0u8; SUITE_ID_LEN];
    id[..4].copy_from_slice(b"HPKE");
    id[4..6].copy_from_slice(&kem.to_u16().to_be_bytes());
    id[6..8].copy_from_slice(&kdf.to_u16().to_be_bytes());
    id[8..].copy_from_slice(&aead.to_u16().to_be_bytes());
    id
}

/// `"KEM" || I2OSP(kem_id, 2)`
pub fn kem_suite_id(kem: KemId) -> [u8; KEM_SUITE_ID_LEN] {
    let mut id = [0u8; KEM_SUITE_ID_LEN];
    id[..3].copy_from_slice(b"KEM");
    id[3..].copy_from_slice(&kem.to_u16().to_be_bytes());
    id
}

//! Labeled extract/expand bound to a suite id.
//!
//! A [`LabeledKdf`] can only be built together with its suite id, so a
//! labeled call on an unbound KDF cannot be expressed. The KEM-level suite
//! id (`"KEM" || kem_id`) and the HPKE-level suite id
//! (`"HPKE" || kem_id || kdf_id || aead_id`) live in separate instances.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::crypto::hkdf::Kdf;
use crate::error::Error;
use crate::identifiers::HPKE_VERSION;

/// A KDF together with the suite id that every labeled call is bound to.
#[derive(Clone)]
pub struct LabeledKdf {
    kdf: Arc<dyn Kdf>,
    suite_id: Vec<u8>,
}

impl core::fmt::Debug for LabeledKdf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LabeledKdf")
            .field("kdf", &self.kdf.id())
            .field("suite_id", &self.suite_id)
            .finish()
    }
}

impl LabeledKdf {
    /// Bind `kdf` to `suite_id`.
    pub fn new(kdf: Arc<dyn Kdf>, suite_id: &[u8]) -> Self {
        Self {
            kdf,
            suite_id: suite_id.to_vec(),
        }
    }

    /// The underlying KDF.
    pub fn kdf(&self) -> &dyn Kdf {
        self.kdf.as_ref()
    }

    /// `Nh`
    pub fn hash_len(&self) -> usize {
        self.kdf.hash_len()
    }

    /// The suite id mixed into every labeled call.
    pub fn suite_id(&self) -> &[u8] {
        &self.suite_id
    }

    /// `Extract(salt, "HPKE-v1" || suite_id || label || ikm)`
    pub fn labeled_extract(&self, salt: &[u8], label: &[u8], ikm: &[u8]) -> Zeroizing<Vec<u8>> {
        self.kdf
            .extract(salt, &[HPKE_VERSION, &self.suite_id, label, ikm])
    }

    /// `Expand(prk, I2OSP(len, 2) || "HPKE-v1" || suite_id || label || info, len)`
    pub fn labeled_expand(
        &self,
        prk: &[u8],
        label: &[u8],
        info: &[u8],
        len: usize,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        let encoded_len = u16::try_from(len)
            .map_err(|_| Error::InvalidParam("Expand length exceeds 65535"))?
            .to_be_bytes();
        let mut okm = Zeroizing::new(vec![0u8; len]);
        self.kdf.expand(
            prk,
            &[&encoded_len, HPKE_VERSION, &self.suite_id, label, info],
            &mut okm,
        )?;
        Ok(okm)
    }

    /// The DH-KEM shared secret derivation:
    /// `LabeledExpand(LabeledExtract("", "eae_prk", dh), "shared_secret", kem_context, len)`.
    pub fn extract_and_expand(
        &self,
        dh: &[u8],
        kem_context: &[u8],
        len: usize,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        let eae_prk = self.labeled_extract(b"", b"eae_prk", dh);
        self.labeled_expand(&eae_prk, b"shared_secret", kem_context, len)
    }
}

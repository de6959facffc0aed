use zeroize::Zeroizing;

use crate::crypto::aead::Aead;
use crate::error::Error;
use crate::kdf::LabeledKdf;
use crate::kem::{INPUT_LENGTH_LIMIT, SharedSecret};
use crate::mode::Mode;

/// Secrets produced by the key schedule.
///
/// `key` and `base_nonce` are empty for the export-only AEAD.
pub(crate) struct ContextSecrets {
    pub key: Zeroizing<Vec<u8>>,
    pub base_nonce: Zeroizing<Vec<u8>>,
    pub exporter_secret: Zeroizing<Vec<u8>>,
}

/// RFC 9180 Section 5.1 `KeySchedule`.
///
/// `kdf` must be bound to the HPKE suite id.
pub(crate) fn key_schedule<T>(
    kdf: &LabeledKdf,
    aead: &dyn Aead,
    shared_secret: &SharedSecret,
    info: &[u8],
    mode: &Mode<'_, T>,
) -> Result<ContextSecrets, Error> {
    if info.len() > INPUT_LENGTH_LIMIT {
        return Err(Error::InvalidParam("Too long info"));
    }
    let (psk_id, psk) = match mode.psk() {
        Some(psk) => (psk.id(), psk.key()),
        None => (&[][..], &[][..]),
    };

    let psk_id_hash = kdf.labeled_extract(b"", b"psk_id_hash", psk_id);
    let info_hash = kdf.labeled_extract(b"", b"info_hash", info);
    let mut context = Zeroizing::new(Vec::with_capacity(1 + psk_id_hash.len() + info_hash.len()));
    context.push(mode.id());
    context.extend_from_slice(&psk_id_hash);
    context.extend_from_slice(&info_hash);

    let secret = kdf.labeled_extract(shared_secret.as_bytes(), b"secret", psk);
    let exporter_secret = kdf.labeled_expand(&secret, b"exp", &context, kdf.hash_len())?;

    let (key, base_nonce) = if aead.key_len() == 0 {
        (Zeroizing::new(Vec::new()), Zeroizing::new(Vec::new()))
    } else {
        (
            kdf.labeled_expand(&secret, b"key", &context, aead.key_len())?,
            kdf.labeled_expand(&secret, b"base_nonce", &context, aead.nonce_len())?,
        )
    };

    Ok(ContextSecrets {
        key,
        base_nonce,
        exporter_secret,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::crypto::aead::{Aes128Gcm, ExportOnly};
    use crate::crypto::hkdf::HkdfSha256;
    use crate::identifiers::{AeadId, KdfId, KemId, suite_id};
    use crate::mode::Psk;

    fn kdf() -> LabeledKdf {
        LabeledKdf::new(
            Arc::new(HkdfSha256),
            &suite_id(KemId::X25519, KdfId::HkdfSha256, AeadId::Aes128Gcm),
        )
    }

    fn unhex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    // RFC 9180 A.1.1: DHKEM(X25519, HKDF-SHA256), HKDF-SHA256, AES-128-GCM, Base
    #[test]
    fn rfc9180_base_mode_secrets() {
        let shared_secret = SharedSecret::new(Zeroizing::new(unhex(
            "fe0e18c9f024ce43799ae393c7e8fe8fce9d218875e8227b0187c04e7d2ea1fc",
        )));
        let info = unhex("4f6465206f6e2061204772656369616e2055726e");

        let secrets =
            key_schedule::<()>(&kdf(), &Aes128Gcm, &shared_secret, &info, &Mode::Base).unwrap();

        assert_eq!(hex::encode(&*secrets.key), "4531685d41d65f03dc48f6b8302c05b0");
        assert_eq!(hex::encode(&*secrets.base_nonce), "56d890e5accaaf011cff4b7d");
        assert_eq!(
            hex::encode(&*secrets.exporter_secret),
            "45ff1c2e220db587171952c0592d5f5ebe103f1561a2614e38f2ffd47e99e3f8"
        );
    }

    #[test]
    fn info_length_limit() {
        let ss = SharedSecret::new(Zeroizing::new(vec![1u8; 32]));
        assert_eq!(
            key_schedule::<()>(&kdf(), &Aes128Gcm, &ss, &[0u8; 129], &Mode::Base)
                .err()
                .unwrap(),
            Error::InvalidParam("Too long info")
        );
        assert!(key_schedule::<()>(&kdf(), &Aes128Gcm, &ss, &[0u8; 128], &Mode::Base).is_ok());
    }

    #[test]
    fn psk_changes_every_secret() {
        let ss = SharedSecret::new(Zeroizing::new(vec![1u8; 32]));
        let psk = Psk::new(b"id", &[7u8; 32]).unwrap();
        let base = key_schedule::<()>(&kdf(), &Aes128Gcm, &ss, b"", &Mode::Base).unwrap();
        let with_psk = key_schedule::<()>(&kdf(), &Aes128Gcm, &ss, b"", &Mode::Psk(psk)).unwrap();
        assert_ne!(*base.key, *with_psk.key);
        assert_ne!(*base.base_nonce, *with_psk.base_nonce);
        assert_ne!(*base.exporter_secret, *with_psk.exporter_secret);
    }

    #[test]
    fn export_only_has_no_key() {
        let ss = SharedSecret::new(Zeroizing::new(vec![1u8; 32]));
        let secrets = key_schedule::<()>(&kdf(), &ExportOnly, &ss, b"", &Mode::Base).unwrap();
        assert!(secrets.key.is_empty());
        assert!(secrets.base_nonce.is_empty());
        assert_eq!(secrets.exporter_secret.len(), 32);
    }
}

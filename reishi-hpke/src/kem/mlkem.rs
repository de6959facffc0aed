use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use super::{Encapsulated, Kem, SharedSecret, check_ikm};
use crate::crypto::pq::{self, KEM_CT_LEN, KEM_EK_LEN, KEM_SEED_LEN, KEM_SS_LEN};
use crate::error::Error;
use crate::identifiers::KemId;
use crate::keys::{KeyPair, PrivateKey, PublicKey};

/// ML-KEM-768 as a standalone HPKE KEM.
///
/// The private key is the 64-byte seed; `DeriveKeyPair(ikm)` sets it to
/// `SHAKE256(ikm, 64)`. There is no authenticated mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct MlKem768;

impl MlKem768 {
    fn key_pair_from_seed(seed: &[u8]) -> Result<KeyPair, Error> {
        let ek = pq::ek_from_seed(seed)?;
        Ok(KeyPair {
            private_key: PrivateKey::new(KemId::MlKem768, seed.to_vec()),
            public_key: PublicKey::new(KemId::MlKem768, ek.to_vec()),
        })
    }
}

impl Kem for MlKem768 {
    fn id(&self) -> KemId {
        KemId::MlKem768
    }

    fn shared_secret_len(&self) -> usize {
        KEM_SS_LEN
    }

    fn enc_len(&self) -> usize {
        KEM_CT_LEN
    }

    fn public_key_len(&self) -> usize {
        KEM_EK_LEN
    }

    fn private_key_len(&self) -> usize {
        KEM_SEED_LEN
    }

    fn generate_key_pair(&self, rng: &mut dyn CryptoRngCore) -> Result<KeyPair, Error> {
        let mut seed = Zeroizing::new([0u8; KEM_SEED_LEN]);
        rng.fill_bytes(&mut *seed);
        Self::key_pair_from_seed(&*seed)
    }

    fn derive_key_pair(&self, ikm: &[u8]) -> Result<KeyPair, Error> {
        check_ikm(ikm)?;
        let mut seed = Zeroizing::new([0u8; KEM_SEED_LEN]);
        pq::shake256(&[ikm], &mut *seed);
        Self::key_pair_from_seed(&*seed)
    }

    fn public_key(&self, sk: &PrivateKey) -> Result<PublicKey, Error> {
        let ek = pq::ek_from_seed(sk.check_kem(KemId::MlKem768)?)?;
        Ok(PublicKey::new(KemId::MlKem768, ek.to_vec()))
    }

    fn deserialize_public_key(&self, bytes: &[u8]) -> Result<PublicKey, Error> {
        pq::validate_ek(bytes)?;
        Ok(PublicKey::new(KemId::MlKem768, bytes.to_vec()))
    }

    fn deserialize_private_key(&self, bytes: &[u8]) -> Result<PrivateKey, Error> {
        if bytes.len() != KEM_SEED_LEN {
            return Err(Error::Deserialize("invalid ML-KEM seed length"));
        }
        Ok(PrivateKey::new(KemId::MlKem768, bytes.to_vec()))
    }

    fn encap(&self, rng: &mut dyn CryptoRngCore, pk_r: &PublicKey) -> Result<Encapsulated, Error> {
        let (ct, ss) = pq::encapsulate(pk_r.check_kem(KemId::MlKem768)?, rng)?;
        Ok(Encapsulated {
            shared_secret: SharedSecret::new(Zeroizing::new(ss.to_vec())),
            enc: ct.to_vec(),
        })
    }

    fn decap(&self, enc: &[u8], sk_r: &PrivateKey) -> Result<SharedSecret, Error> {
        let ss = pq::decapsulate(sk_r.check_kem(KemId::MlKem768)?, enc)?;
        Ok(SharedSecret::new(Zeroizing::new(ss.to_vec())))
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::*;

    #[test]
    fn encap_decap_round_trip() {
        let kp = MlKem768.generate_key_pair(&mut OsRng).unwrap();
        let out = MlKem768.encap(&mut OsRng, &kp.public_key).unwrap();
        assert_eq!(out.enc.len(), KEM_CT_LEN);
        let ss = MlKem768.decap(&out.enc, &kp.private_key).unwrap();
        assert_eq!(ss.as_bytes(), out.shared_secret.as_bytes());
    }

    #[test]
    fn derive_key_pair_is_deterministic() {
        let a = MlKem768.derive_key_pair(b"ml-kem ikm").unwrap();
        let b = MlKem768.derive_key_pair(b"ml-kem ikm").unwrap();
        assert_eq!(a.public_key, b.public_key);
        assert_eq!(a.public_key.as_bytes().len(), KEM_EK_LEN);
    }

    #[test]
    fn auth_mode_not_supported() {
        let kp = MlKem768.generate_key_pair(&mut OsRng).unwrap();
        assert_eq!(
            MlKem768
                .auth_encap(&mut OsRng, &kp.public_key, &kp.private_key)
                .unwrap_err(),
            Error::NotSupported("Auth mode for this KEM")
        );
    }

    #[test]
    fn short_enc_rejected() {
        let kp = MlKem768.generate_key_pair(&mut OsRng).unwrap();
        assert!(matches!(
            MlKem768.decap(&[0u8; 32], &kp.private_key),
            Err(Error::Deserialize(_))
        ));
    }
}

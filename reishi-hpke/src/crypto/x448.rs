use subtle::ConstantTimeEq;
use x448::{PublicKey as X448PublicKey, Secret as X448Secret};
use zeroize::Zeroizing;

use crate::error::Error;
use crate::identifiers::KemId;
use crate::kdf::LabeledKdf;
use crate::kem::dhkem::{DhGroup, derive_sk_expand};
use crate::keys::jwk::JwkCurve;

/// X448 key and DH output length in bytes.
pub const X448_LEN: usize = 56;

/// Curve448 in Montgomery form.
///
/// The serialized private key is the raw 56-byte string; clamping happens
/// inside the DH computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct X448;

fn secret(sk: &[u8]) -> Result<X448Secret, Error> {
    if sk.len() != X448_LEN {
        return Err(Error::Deserialize("invalid X448 private key length"));
    }
    X448Secret::from_bytes(sk).ok_or(Error::Deserialize("invalid X448 private key"))
}

/// Parses a public key, refusing the low-order points.
fn public_key(pk: &[u8]) -> Result<X448PublicKey, Error> {
    if pk.len() != X448_LEN {
        return Err(Error::Deserialize("invalid X448 public key length"));
    }
    X448PublicKey::from_bytes(pk).ok_or(Error::Deserialize("low-order X448 public key"))
}

impl DhGroup for X448 {
    const KEM_ID: KemId = KemId::X448;
    const PUBLIC_KEY_LEN: usize = X448_LEN;
    const PRIVATE_KEY_LEN: usize = X448_LEN;
    const JWK: Option<JwkCurve> = Some(JwkCurve::Okp("X448"));

    fn derive_private_key(kdf: &LabeledKdf, ikm: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        derive_sk_expand(kdf, ikm, X448_LEN)
    }

    fn validate_private_key(sk: &[u8]) -> Result<(), Error> {
        secret(sk).map(drop)
    }

    fn validate_public_key(pk: &[u8]) -> Result<(), Error> {
        public_key(pk).map(drop)
    }

    fn public_key_from_private(sk: &[u8]) -> Result<Vec<u8>, Error> {
        let secret = secret(sk)?;
        Ok(X448PublicKey::from(&secret).as_bytes().to_vec())
    }

    fn dh(sk: &[u8], pk: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        let secret = secret(sk)?;
        let public = public_key(pk)?;
        let shared = secret
            .as_diffie_hellman(&public)
            .ok_or(Error::Decap("low-order X448 public key"))?;
        if bool::from(shared.as_bytes().ct_eq(&[0u8; X448_LEN])) {
            return Err(Error::Decap("low-order X448 public key"));
        }
        Ok(Zeroizing::new(shared.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7748 Section 6.2
    #[test]
    fn rfc7748_diffie_hellman() {
        let alice_sk = hex::decode(
            "9a8f4925d1519f5775cf46b04b5800d4ee9ee8bae8bc5565d498c28d\
             d9c9baf574a9419744897391006382a6f127ab1d9ac2d8c0a598726b",
        )
        .unwrap();
        let bob_pk = hex::decode(
            "3eb7a829b0cd20f5bcfc0b599b6feccf6da4627107bdb0d4f345b430\
             27d8b972fc3e34fb4232a13ca706dcb57aec3dae07bdc1c67bf33609",
        )
        .unwrap();

        assert_eq!(
            hex::encode(X448::public_key_from_private(&alice_sk).unwrap()),
            "9b08f7cc31b7e3e67d22d5aea121074a273bd2b83de09c63faa73d2c\
             22c5d9bbc836647241d953d40c5b12da88120d53177f80e532c41fa0"
        );
        assert_eq!(
            hex::encode(&*X448::dh(&alice_sk, &bob_pk).unwrap()),
            "07fff4181ac6cc95ec1c16a94a0f74d12da232ce40a77552281d282b\
             b60c0b56fd2464c335543936521c24403085d59a449a5037514a879d"
        );
    }

    #[test]
    fn zero_public_key_rejected() {
        let sk = [0x42u8; X448_LEN];
        assert!(matches!(
            X448::dh(&sk, &[0u8; X448_LEN]),
            Err(Error::Deserialize(_))
        ));
    }

    #[test]
    fn low_order_public_keys_rejected_at_import() {
        let mut one = [0u8; X448_LEN];
        one[0] = 1;
        for point in [[0u8; X448_LEN], one] {
            assert_eq!(
                X448::validate_public_key(&point),
                Err(Error::Deserialize("low-order X448 public key"))
            );
        }
        assert!(X448::validate_public_key(&[9u8; X448_LEN]).is_ok());
    }

    #[test]
    fn wrong_lengths_rejected() {
        assert!(X448::validate_private_key(&[0u8; 6]).is_err());
        assert!(X448::validate_public_key(&[0u8; 6]).is_err());
    }
}

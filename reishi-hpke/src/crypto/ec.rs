//! Short Weierstrass curves: P-256, P-384, P-521 and secp256k1.
//!
//! The NIST curves use uncompressed SEC1 public keys and the x-coordinate as
//! DH output, per RFC 9180. secp256k1 uses compressed SEC1 public keys and
//! the compressed shared point as DH output.

use k256::elliptic_curve::group::Curve;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroizing;

use crate::error::Error;
use crate::identifiers::KemId;
use crate::kdf::LabeledKdf;
use crate::kem::dhkem::{DhGroup, derive_sk_candidate, derive_sk_expand};
use crate::keys::jwk::JwkCurve;

macro_rules! nist_group {
    ($name:ident, $c:ident, $kem:expr, $nsk:expr, $bitmask:expr, $crv:literal) => {
        #[doc = concat!("The NIST ", $crv, " curve.")]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $name {
            fn secret_key(sk: &[u8]) -> Result<$c::SecretKey, Error> {
                if sk.len() != $nsk {
                    return Err(Error::Deserialize("invalid private key length"));
                }
                $c::SecretKey::from_slice(sk).map_err(|_| Error::Deserialize("invalid private key"))
            }

            fn public_key(pk: &[u8]) -> Result<$c::PublicKey, Error> {
                if pk.len() != 1 + 2 * $nsk || pk[0] != 0x04 {
                    return Err(Error::Deserialize("invalid public key encoding"));
                }
                $c::PublicKey::from_sec1_bytes(pk)
                    .map_err(|_| Error::Deserialize("invalid public key"))
            }
        }

        impl DhGroup for $name {
            const KEM_ID: KemId = $kem;
            const PUBLIC_KEY_LEN: usize = 1 + 2 * $nsk;
            const PRIVATE_KEY_LEN: usize = $nsk;
            const JWK: Option<JwkCurve> = Some(JwkCurve::Ec($crv));

            fn derive_private_key(
                kdf: &LabeledKdf,
                ikm: &[u8],
            ) -> Result<Zeroizing<Vec<u8>>, Error> {
                derive_sk_candidate(kdf, ikm, $nsk, $bitmask, |candidate| {
                    $c::SecretKey::from_slice(candidate).is_ok()
                })
            }

            fn validate_private_key(sk: &[u8]) -> Result<(), Error> {
                Self::secret_key(sk).map(drop)
            }

            fn validate_public_key(pk: &[u8]) -> Result<(), Error> {
                Self::public_key(pk).map(drop)
            }

            fn public_key_from_private(sk: &[u8]) -> Result<Vec<u8>, Error> {
                let public = Self::secret_key(sk)?.public_key();
                Ok(public.to_encoded_point(false).as_bytes().to_vec())
            }

            fn dh(sk: &[u8], pk: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
                let secret = Self::secret_key(sk)?;
                let public = Self::public_key(pk)?;
                let shared = $c::elliptic_curve::ecdh::diffie_hellman(
                    secret.to_nonzero_scalar(),
                    public.as_affine(),
                );
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
        }
    };
}

nist_group!(P256, p256, KemId::P256, 32, 0xff, "P-256");
nist_group!(P384, p384, KemId::P384, 48, 0xff, "P-384");
nist_group!(P521, p521, KemId::P521, 66, 0x01, "P-521");

/// Compressed SEC1 point length on secp256k1.
const K256_POINT_LEN: usize = 33;
const K256_SCALAR_LEN: usize = 32;

/// The secp256k1 curve.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1;

impl Secp256k1 {
    fn secret_key(sk: &[u8]) -> Result<k256::SecretKey, Error> {
        if sk.len() != K256_SCALAR_LEN {
            return Err(Error::Deserialize("invalid private key length"));
        }
        k256::SecretKey::from_slice(sk).map_err(|_| Error::Deserialize("invalid private key"))
    }

    fn public_key(pk: &[u8]) -> Result<k256::PublicKey, Error> {
        if pk.len() != K256_POINT_LEN {
            return Err(Error::Deserialize("invalid public key encoding"));
        }
        k256::PublicKey::from_sec1_bytes(pk).map_err(|_| Error::Deserialize("invalid public key"))
    }
}

impl DhGroup for Secp256k1 {
    const KEM_ID: KemId = KemId::Secp256k1;
    const PUBLIC_KEY_LEN: usize = K256_POINT_LEN;
    const PRIVATE_KEY_LEN: usize = K256_SCALAR_LEN;
    const JWK: Option<JwkCurve> = None;

    fn derive_private_key(kdf: &LabeledKdf, ikm: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        let sk = derive_sk_expand(kdf, ikm, K256_SCALAR_LEN)?;
        Self::secret_key(&sk).map_err(|_| Error::DeriveKeyPair)?;
        Ok(sk)
    }

    fn validate_private_key(sk: &[u8]) -> Result<(), Error> {
        Self::secret_key(sk).map(drop)
    }

    fn validate_public_key(pk: &[u8]) -> Result<(), Error> {
        Self::public_key(pk).map(drop)
    }

    fn public_key_from_private(sk: &[u8]) -> Result<Vec<u8>, Error> {
        let public = Self::secret_key(sk)?.public_key();
        Ok(public.to_encoded_point(true).as_bytes().to_vec())
    }

    fn dh(sk: &[u8], pk: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        let secret = Self::secret_key(sk)?;
        let public = Self::public_key(pk)?;
        let point = public.to_projective() * *secret.to_nonzero_scalar();
        let shared = k256::PublicKey::from_affine(Curve::to_affine(&point))
            .map_err(|_| Error::Decap("DH produced the identity"))?;
        Ok(Zeroizing::new(shared.to_encoded_point(true).as_bytes().to_vec()))
    }
}

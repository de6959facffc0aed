use subtle::{Choice, ConstantTimeEq};
use x25519_dalek::{PublicKey as DalekPublicKey, StaticSecret as DalekStaticSecret};
use zeroize::Zeroizing;

use crate::error::Error;
use crate::identifiers::KemId;
use crate::kdf::LabeledKdf;
use crate::kem::dhkem::{DhGroup, derive_sk_expand};
use crate::keys::jwk::JwkCurve;

/// X25519 key and DH output length in bytes.
pub const DH_LEN: usize = 32;

/// Curve25519 in Montgomery form.
#[derive(Debug, Clone, Copy, Default)]
pub struct X25519;

/// u-coordinates of points of order 1, 2, 4 and 8, including the
/// non-canonical encodings of 0 and 1. Compared with the top bit masked.
const LOW_ORDER_POINTS: [[u8; DH_LEN]; 7] = [
    [0; DH_LEN],
    [
        0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00,
    ],
    [
        0xe0, 0xeb, 0x7a, 0x7c, 0x3b, 0x41, 0xb8, 0xae, 0x16, 0x56, 0xe3, 0xfa, 0xf1, 0x9f, 0xc4,
        0x6a, 0xda, 0x09, 0x8d, 0xeb, 0x9c, 0x32, 0xb1, 0xfd, 0x86, 0x62, 0x05, 0x16, 0x5f, 0x49,
        0xb8, 0x00,
    ],
    [
        0x5f, 0x9c, 0x95, 0xbc, 0xa3, 0x50, 0x8c, 0x24, 0xb1, 0xd0, 0xb1, 0x55, 0x9c, 0x83, 0xef,
        0x5b, 0x04, 0x44, 0x5c, 0xc4, 0x58, 0x1c, 0x8e, 0x86, 0xd8, 0x22, 0x4e, 0xdd, 0xd0, 0x9f,
        0x11, 0x57,
    ],
    // p - 1, p, p + 1
    [
        0xec, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0x7f,
    ],
    [
        0xed, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0x7f,
    ],
    [
        0xee, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0x7f,
    ],
];

/// Whether `pk` encodes a point in the small subgroup.
pub(crate) fn is_low_order(pk: &[u8; DH_LEN]) -> bool {
    let mut masked = *pk;
    masked[DH_LEN - 1] &= 0x7f;
    let mut found = Choice::from(0);
    for point in &LOW_ORDER_POINTS {
        found |= masked.ct_eq(point);
    }
    bool::from(found)
}

fn secret_from_slice(sk: &[u8]) -> Result<DalekStaticSecret, Error> {
    let bytes: [u8; DH_LEN] = sk
        .try_into()
        .map_err(|_| Error::Deserialize("invalid X25519 private key length"))?;
    Ok(DalekStaticSecret::from(bytes))
}

/// X25519 between a raw scalar and a raw u-coordinate, with no check on
/// the output.
pub(crate) fn dh_unchecked(sk: &[u8; DH_LEN], pk: &[u8; DH_LEN]) -> Zeroizing<[u8; DH_LEN]> {
    let secret = DalekStaticSecret::from(*sk);
    let shared = secret.diffie_hellman(&DalekPublicKey::from(*pk));
    Zeroizing::new(*shared.as_bytes())
}

/// X25519 between a raw scalar and a raw u-coordinate.
///
/// Rejects the all-zeros output, which indicates a low-order public key
/// (RFC 7748 Section 6.1).
pub(crate) fn dh(sk: &[u8; DH_LEN], pk: &[u8; DH_LEN]) -> Result<Zeroizing<[u8; DH_LEN]>, Error> {
    let shared = dh_unchecked(sk, pk);
    if bool::from(shared.ct_eq(&[0u8; DH_LEN])) {
        Err(Error::Decap("low-order X25519 public key"))
    } else {
        Ok(shared)
    }
}

/// The X25519 public key for a raw scalar.
pub(crate) fn public_key(sk: &[u8; DH_LEN]) -> [u8; DH_LEN] {
    DalekPublicKey::from(&DalekStaticSecret::from(*sk)).to_bytes()
}

impl DhGroup for X25519 {
    const KEM_ID: KemId = KemId::X25519;
    const PUBLIC_KEY_LEN: usize = DH_LEN;
    const PRIVATE_KEY_LEN: usize = DH_LEN;
    const JWK: Option<JwkCurve> = Some(JwkCurve::Okp("X25519"));

    fn derive_private_key(kdf: &LabeledKdf, ikm: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        derive_sk_expand(kdf, ikm, DH_LEN)
    }

    fn validate_private_key(sk: &[u8]) -> Result<(), Error> {
        secret_from_slice(sk).map(drop)
    }

    fn validate_public_key(pk: &[u8]) -> Result<(), Error> {
        let pk: &[u8; DH_LEN] = pk
            .try_into()
            .map_err(|_| Error::Deserialize("invalid X25519 public key length"))?;
        if is_low_order(pk) {
            return Err(Error::Deserialize("low-order X25519 public key"));
        }
        Ok(())
    }

    fn public_key_from_private(sk: &[u8]) -> Result<Vec<u8>, Error> {
        let secret = secret_from_slice(sk)?;
        Ok(DalekPublicKey::from(&secret).to_bytes().to_vec())
    }

    fn dh(sk: &[u8], pk: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
        let sk: &[u8; DH_LEN] = sk
            .try_into()
            .map_err(|_| Error::Deserialize("invalid X25519 private key length"))?;
        let pk: &[u8; DH_LEN] = pk
            .try_into()
            .map_err(|_| Error::Deserialize("invalid X25519 public key length"))?;
        let shared = dh(sk, pk)?;
        Ok(Zeroizing::new(shared.to_vec()))
    }
}

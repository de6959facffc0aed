//! JSON Web Key import for the DH groups that have a registered JWK form.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::error::Error;

/// The JWK shape a DH group uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwkCurve {
    /// `kty: "EC"`, public key encoded as `0x04 || x || y`.
    Ec(&'static str),
    /// `kty: "OKP"`, public key encoded as `x`.
    Okp(&'static str),
}

#[derive(Deserialize)]
struct Jwk {
    kty: String,
    crv: String,
    x: Option<String>,
    y: Option<String>,
    d: Option<String>,
}

impl Drop for Jwk {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        if let Some(d) = self.d.as_mut() {
            d.zeroize();
        }
    }
}

fn decode_member(value: Option<&str>, len: usize) -> Result<Zeroizing<Vec<u8>>, Error> {
    let value = value.ok_or(Error::Deserialize("missing JWK member"))?;
    let bytes = Zeroizing::new(
        URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|_| Error::Deserialize("invalid base64url in JWK"))?,
    );
    if bytes.len() != len {
        return Err(Error::Deserialize("invalid JWK member length"));
    }
    Ok(bytes)
}

/// Convert a JWK into the raw serialized key for `curve`.
///
/// `coord_len` is the size of one coordinate (EC) or of the whole key
/// (OKP); `secret_len` is `Nsk`.
pub(crate) fn to_raw(
    data: &[u8],
    curve: JwkCurve,
    is_public: bool,
    coord_len: usize,
    secret_len: usize,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    let jwk: Jwk =
        serde_json::from_slice(data).map_err(|_| Error::Deserialize("malformed JWK"))?;

    let (kty, crv) = match curve {
        JwkCurve::Ec(crv) => ("EC", crv),
        JwkCurve::Okp(crv) => ("OKP", crv),
    };
    if jwk.kty != kty {
        return Err(Error::Deserialize("JWK kty mismatch"));
    }
    if jwk.crv != crv {
        return Err(Error::Deserialize("JWK crv mismatch"));
    }

    if !is_public {
        return decode_member(jwk.d.as_deref(), secret_len);
    }
    if jwk.d.is_some() {
        return Err(Error::Deserialize("private JWK given as public key"));
    }

    match curve {
        JwkCurve::Ec(_) => {
            let x = decode_member(jwk.x.as_deref(), coord_len)?;
            let y = decode_member(jwk.y.as_deref(), coord_len)?;
            let mut raw = Zeroizing::new(Vec::with_capacity(1 + 2 * coord_len));
            raw.push(0x04);
            raw.extend_from_slice(&x);
            raw.extend_from_slice(&y);
            Ok(raw)
        }
        JwkCurve::Okp(_) => decode_member(jwk.x.as_deref(), coord_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P256: JwkCurve = JwkCurve::Ec("P-256");

    fn b64(bytes: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(bytes)
    }

    #[test]
    fn ec_public_assembles_uncompressed_point() {
        let jwk = format!(
            r#"{{"kty":"EC","crv":"P-256","x":"{}","y":"{}"}}"#,
            b64(&[1u8; 32]),
            b64(&[2u8; 32])
        );
        let raw = to_raw(jwk.as_bytes(), P256, true, 32, 32).unwrap();
        assert_eq!(raw.len(), 65);
        assert_eq!(raw[0], 0x04);
        assert_eq!(&raw[1..33], &[1u8; 32]);
        assert_eq!(&raw[33..], &[2u8; 32]);
    }

    #[test]
    fn private_uses_d() {
        let jwk = format!(
            r#"{{"kty":"OKP","crv":"X25519","x":"{}","d":"{}"}}"#,
            b64(&[1u8; 32]),
            b64(&[3u8; 32])
        );
        let raw = to_raw(jwk.as_bytes(), JwkCurve::Okp("X25519"), false, 32, 32).unwrap();
        assert_eq!(&*raw, &[3u8; 32]);
    }

    #[test]
    fn curve_mismatch_rejected() {
        let jwk = format!(
            r#"{{"kty":"EC","crv":"P-384","x":"{}","y":"{}"}}"#,
            b64(&[1u8; 32]),
            b64(&[2u8; 32])
        );
        assert_eq!(
            to_raw(jwk.as_bytes(), P256, true, 32, 32).unwrap_err(),
            Error::Deserialize("JWK crv mismatch")
        );
    }

    #[test]
    fn kty_mismatch_rejected() {
        let jwk = format!(r#"{{"kty":"OKP","crv":"P-256","x":"{}"}}"#, b64(&[1u8; 32]));
        assert_eq!(
            to_raw(jwk.as_bytes(), P256, true, 32, 32).unwrap_err(),
            Error::Deserialize("JWK kty mismatch")
        );
    }

    #[test]
    fn missing_member_rejected() {
        let jwk = format!(r#"{{"kty":"EC","crv":"P-256","x":"{}"}}"#, b64(&[1u8; 32]));
        assert_eq!(
            to_raw(jwk.as_bytes(), P256, true, 32, 32).unwrap_err(),
            Error::Deserialize("missing JWK member")
        );
    }

    #[test]
    fn short_coordinate_rejected() {
        let jwk = format!(
            r#"{{"kty":"EC","crv":"P-256","x":"{}","y":"{}"}}"#,
            b64(&[1u8; 31]),
            b64(&[2u8; 32])
        );
        assert_eq!(
            to_raw(jwk.as_bytes(), P256, true, 32, 32).unwrap_err(),
            Error::Deserialize("invalid JWK member length")
        );
    }

    #[test]
    fn garbage_rejected() {
        assert_eq!(
            to_raw(b"not json", P256, true, 32, 32).unwrap_err(),
            Error::Deserialize("malformed JWK")
        );
    }
}

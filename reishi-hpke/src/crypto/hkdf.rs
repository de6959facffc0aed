use hkdf::{Hkdf, HkdfExtract};
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::error::Error;
use crate::identifiers::KdfId;

/// Raw HKDF extract/expand.
///
/// Inputs are passed as slices of parts so labeled callers can prepend their
/// prefixes without building a temporary buffer.
pub trait Kdf: Send + Sync {
    /// The registry identifier of this KDF.
    fn id(&self) -> KdfId;

    /// `Nh`: the output size of `extract`.
    fn hash_len(&self) -> usize;

    /// HKDF-Extract over `salt` and the concatenation of `ikm`.
    fn extract(&self, salt: &[u8], ikm: &[&[u8]]) -> Zeroizing<Vec<u8>>;

    /// HKDF-Expand, filling all of `okm`.
    ///
    /// Fails with [`Error::InvalidParam`] if `okm` is longer than `255 * Nh`
    /// or if `prk` is shorter than `Nh`.
    fn expand(&self, prk: &[u8], info: &[&[u8]], okm: &mut [u8]) -> Result<(), Error>;
}

macro_rules! hkdf_impl {
    ($name:ident, $hash:ty, $id:expr, $nh:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Kdf for $name {
            fn id(&self) -> KdfId {
                $id
            }

            fn hash_len(&self) -> usize {
                $nh
            }

            fn extract(&self, salt: &[u8], ikm: &[&[u8]]) -> Zeroizing<Vec<u8>> {
                let mut extract = HkdfExtract::<$hash>::new(Some(salt));
                for part in ikm {
                    extract.input_ikm(part);
                }
                let (prk, _) = extract.finalize();
                Zeroizing::new(prk.to_vec())
            }

            fn expand(&self, prk: &[u8], info: &[&[u8]], okm: &mut [u8]) -> Result<(), Error> {
                let hk = Hkdf::<$hash>::from_prk(prk)
                    .map_err(|_| Error::InvalidParam("PRK shorter than hash length"))?;
                hk.expand_multi_info(info, okm)
                    .map_err(|_| Error::InvalidParam("Entropy limit reached"))
            }
        }
    };
}

hkdf_impl!(HkdfSha256, Sha256, KdfId::HkdfSha256, 32, "HKDF-SHA256.");
hkdf_impl!(HkdfSha384, Sha384, KdfId::HkdfSha384, 48, "HKDF-SHA384.");
hkdf_impl!(HkdfSha512, Sha512, KdfId::HkdfSha512, 64, "HKDF-SHA512.");

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 5869 A.1
    #[test]
    fn rfc5869_case_1() {
        let ikm = [0x0bu8; 22];
        let salt = hex::decode("000102030405060708090a0b0c").unwrap();
        let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();

        let prk = HkdfSha256.extract(&salt, &[&ikm]);
        assert_eq!(
            hex::encode(&*prk),
            "077709362c2e32df0ddc3f0dc47bba6390b6c73bb50f9c3122ec844ad7c2b3e5"
        );

        let mut okm = [0u8; 42];
        HkdfSha256.expand(&prk, &[&info], &mut okm).unwrap();
        assert_eq!(
            hex::encode(okm),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf\
             34007208d5b887185865"
        );
    }

    #[test]
    fn extract_parts_equal_concatenation() {
        let whole = HkdfSha384.extract(b"salt", &[b"helloworld"]);
        let parts = HkdfSha384.extract(b"salt", &[b"hello", b"", b"world"]);
        assert_eq!(*whole, *parts);
        assert_eq!(whole.len(), HkdfSha384.hash_len());
    }

    #[test]
    fn expand_rejects_oversized_output() {
        let prk = HkdfSha256.extract(b"", &[b"ikm"]);
        let mut okm = vec![0u8; 255 * 32 + 1];
        assert_eq!(
            HkdfSha256.expand(&prk, &[], &mut okm),
            Err(Error::InvalidParam("Entropy limit reached"))
        );
    }

    #[test]
    fn expand_accepts_maximum_output() {
        let prk = HkdfSha512.extract(b"", &[b"ikm"]);
        let mut okm = vec![0u8; 255 * 64];
        assert!(HkdfSha512.expand(&prk, &[], &mut okm).is_ok());
    }

    #[test]
    fn expand_rejects_short_prk() {
        let mut okm = [0u8; 16];
        assert!(HkdfSha256.expand(&[0u8; 8], &[], &mut okm).is_err());
    }
}

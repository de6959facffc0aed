//! The cipher suite: one KEM, one KDF and one AEAD, and the entry points
//! that turn them into encryption contexts.

use std::sync::Arc;

use rand_core::CryptoRngCore;
use tracing::debug;

use crate::context::{RecipientContext, SenderContext};
use crate::crypto::aead::{Aead, Aes128Gcm, Aes256Gcm, ChaCha20Poly1305, ExportOnly};
use crate::crypto::hkdf::{HkdfSha256, HkdfSha384, HkdfSha512, Kdf};
use crate::error::Error;
use crate::identifiers::{AeadId, KdfId, KemId, SUITE_ID_LEN, suite_id};
use crate::kdf::LabeledKdf;
use crate::kem::{
    DhkemP256HkdfSha256, DhkemP384HkdfSha384, DhkemP521HkdfSha512, DhkemSecp256k1HkdfSha256,
    DhkemX25519HkdfSha256, DhkemX448HkdfSha512, Kem,
};
#[cfg(feature = "pq")]
use crate::kem::{MlKem768, X25519MlKem768, XWing};
use crate::key_schedule::key_schedule;
use crate::keys::{Key, KeyFormat, KeyPair, PrivateKey, PublicKey};
use crate::mode::{Mode, Psk};

/// Inputs for [`CipherSuite::create_sender_context`].
///
/// Starts in Base mode; [`psk`](Self::psk) and
/// [`sender_key`](Self::sender_key) move it to the PSK and Auth modes.
#[derive(Debug, Clone, Copy)]
pub struct SenderParams<'a> {
    recipient_public_key: &'a PublicKey,
    info: &'a [u8],
    mode: Mode<'a, &'a PrivateKey>,
    ephemeral: Option<&'a KeyPair>,
}

impl<'a> SenderParams<'a> {
    pub fn new(recipient_public_key: &'a PublicKey) -> Self {
        Self {
            recipient_public_key,
            info: &[],
            mode: Mode::Base,
            ephemeral: None,
        }
    }

    /// Application info bound into the key schedule. At most 128 bytes.
    pub fn info(mut self, info: &'a [u8]) -> Self {
        self.info = info;
        self
    }

    pub fn psk(mut self, psk: Psk<'a>) -> Self {
        self.mode = self.mode.with_psk(psk);
        self
    }

    /// Authenticate the sender with its static private key.
    pub fn sender_key(mut self, sender_key: &'a PrivateKey) -> Self {
        self.mode = self.mode.with_auth(sender_key);
        self
    }

    /// Use a fixed ephemeral key pair instead of a fresh one.
    ///
    /// For reproducing test vectors only.
    pub fn ephemeral_key_pair(mut self, ephemeral: &'a KeyPair) -> Self {
        self.ephemeral = Some(ephemeral);
        self
    }

    pub fn mode(&self) -> &Mode<'a, &'a PrivateKey> {
        &self.mode
    }
}

/// Inputs for [`CipherSuite::create_recipient_context`].
#[derive(Debug, Clone, Copy)]
pub struct RecipientParams<'a> {
    recipient_key: &'a PrivateKey,
    enc: &'a [u8],
    info: &'a [u8],
    mode: Mode<'a, &'a PublicKey>,
}

impl<'a> RecipientParams<'a> {
    pub fn new(recipient_key: &'a PrivateKey, enc: &'a [u8]) -> Self {
        Self {
            recipient_key,
            enc,
            info: &[],
            mode: Mode::Base,
        }
    }

    pub fn info(mut self, info: &'a [u8]) -> Self {
        self.info = info;
        self
    }

    pub fn psk(mut self, psk: Psk<'a>) -> Self {
        self.mode = self.mode.with_psk(psk);
        self
    }

    /// Require the message to come from the holder of `sender_public_key`.
    pub fn sender_public_key(mut self, sender_public_key: &'a PublicKey) -> Self {
        self.mode = self.mode.with_auth(sender_public_key);
        self
    }

    pub fn mode(&self) -> &Mode<'a, &'a PublicKey> {
        &self.mode
    }
}

/// Output of the single-shot [`CipherSuite::seal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// The encapsulated key.
    pub enc: Vec<u8>,
    /// The ciphertext, `Nt` bytes longer than the plaintext.
    pub ct: Vec<u8>,
}

/// An HPKE cipher suite.
///
/// Immutable once built and cheap to share: the KDF and AEAD handles are
/// reference counted and handed to every context the suite creates.
#[derive(Clone)]
pub struct CipherSuite {
    kem: Arc<dyn Kem>,
    kdf: LabeledKdf,
    aead: Arc<dyn Aead>,
}

impl core::fmt::Debug for CipherSuite {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CipherSuite")
            .field("kem", &self.kem.id())
            .field("kdf", &self.kdf.kdf().id())
            .field("aead", &self.aead.id())
            .finish()
    }
}

impl CipherSuite {
    /// Build a suite from concrete primitives.
    ///
    /// ```
    /// use reishi_hpke::{CipherSuite, DhkemX25519HkdfSha256, HkdfSha256, Aes128Gcm};
    ///
    /// let suite = CipherSuite::new(DhkemX25519HkdfSha256::new(), HkdfSha256, Aes128Gcm);
    /// assert_eq!(suite.suite_id().len(), 10);
    /// ```
    pub fn new(
        kem: impl Kem + 'static,
        kdf: impl Kdf + 'static,
        aead: impl Aead + 'static,
    ) -> Self {
        Self::from_shared(Arc::new(kem), Arc::new(kdf), Arc::new(aead))
    }

    /// Build a suite from shared primitive handles.
    pub fn from_shared(kem: Arc<dyn Kem>, kdf: Arc<dyn Kdf>, aead: Arc<dyn Aead>) -> Self {
        let id = suite_id(kem.id(), kdf.id(), aead.id());
        Self {
            kem,
            kdf: LabeledKdf::new(kdf, &id),
            aead,
        }
    }

    /// Build a suite from registry identifiers.
    ///
    /// Fails with [`Error::NotSupported`] for an identifier without a
    /// built-in implementation, such as an unassigned [`KemId::Other`].
    pub fn from_ids(kem: KemId, kdf: KdfId, aead: AeadId) -> Result<Self, Error> {
        let kem: Arc<dyn Kem> = match kem.canonical() {
            KemId::P256 => Arc::new(DhkemP256HkdfSha256::new()),
            KemId::P384 => Arc::new(DhkemP384HkdfSha384::new()),
            KemId::P521 => Arc::new(DhkemP521HkdfSha512::new()),
            KemId::Secp256k1 => Arc::new(DhkemSecp256k1HkdfSha256::new()),
            KemId::X25519 => Arc::new(DhkemX25519HkdfSha256::new()),
            KemId::X448 => Arc::new(DhkemX448HkdfSha512::new()),
            #[cfg(feature = "pq")]
            KemId::MlKem768 => Arc::new(MlKem768),
            #[cfg(feature = "pq")]
            KemId::XWing => Arc::new(XWing),
            #[cfg(feature = "pq")]
            KemId::X25519MlKem768 => Arc::new(X25519MlKem768::default()),
            _ => return Err(Error::NotSupported("no built-in KEM for this id")),
        };
        let kdf: Arc<dyn Kdf> = match kdf {
            KdfId::HkdfSha256 => Arc::new(HkdfSha256),
            KdfId::HkdfSha384 => Arc::new(HkdfSha384),
            KdfId::HkdfSha512 => Arc::new(HkdfSha512),
        };
        let aead: Arc<dyn Aead> = match aead {
            AeadId::Aes128Gcm => Arc::new(Aes128Gcm),
            AeadId::Aes256Gcm => Arc::new(Aes256Gcm),
            AeadId::ChaCha20Poly1305 => Arc::new(ChaCha20Poly1305),
            AeadId::ExportOnly => Arc::new(ExportOnly),
        };
        Ok(Self::from_shared(kem, kdf, aead))
    }

    pub fn kem(&self) -> &dyn Kem {
        self.kem.as_ref()
    }

    pub fn kdf(&self) -> &dyn Kdf {
        self.kdf.kdf()
    }

    pub fn aead(&self) -> &dyn Aead {
        self.aead.as_ref()
    }

    /// `"HPKE" || I2OSP(kem_id, 2) || I2OSP(kdf_id, 2) || I2OSP(aead_id, 2)`
    pub fn suite_id(&self) -> [u8; SUITE_ID_LEN] {
        suite_id(self.kem.id(), self.kdf.kdf().id(), self.aead.id())
    }

    pub fn generate_key_pair(&self, rng: &mut dyn CryptoRngCore) -> Result<KeyPair, Error> {
        self.kem.generate_key_pair(rng)
    }

    pub fn derive_key_pair(&self, ikm: &[u8]) -> Result<KeyPair, Error> {
        self.kem.derive_key_pair(ikm)
    }

    pub fn import_key(
        &self,
        format: KeyFormat,
        data: &[u8],
        is_public: bool,
    ) -> Result<Key, Error> {
        self.kem.import_key(format, data, is_public)
    }

    /// Encapsulate to the recipient and derive the sender's context.
    ///
    /// The encapsulated key is available from [`SenderContext::enc`].
    pub fn create_sender_context(
        &self,
        rng: &mut dyn CryptoRngCore,
        params: &SenderParams<'_>,
    ) -> Result<SenderContext, Error> {
        let pk_r = params.recipient_public_key;
        let sk_s = params.mode.auth().copied();
        let encapsulated = match (params.ephemeral, sk_s) {
            (Some(ephemeral), sk_s) => self.kem.encap_with_ephemeral(pk_r, sk_s, ephemeral)?,
            (None, Some(sk_s)) => self.kem.auth_encap(rng, pk_r, sk_s)?,
            (None, None) => self.kem.encap(rng, pk_r)?,
        };

        let secrets = key_schedule(
            &self.kdf,
            self.aead.as_ref(),
            &encapsulated.shared_secret,
            params.info,
            &params.mode,
        )?;
        debug!(
            kem = %self.kem.id(),
            kdf = %self.kdf.kdf().id(),
            aead = %self.aead.id(),
            mode = params.mode.name(),
            "created sender context"
        );
        Ok(SenderContext::new(
            self.aead.clone(),
            self.kdf.clone(),
            secrets,
            encapsulated.enc,
        ))
    }

    /// Decapsulate `enc` and derive the recipient's context.
    pub fn create_recipient_context(
        &self,
        params: &RecipientParams<'_>,
    ) -> Result<RecipientContext, Error> {
        let shared_secret = match params.mode.auth() {
            Some(pk_s) => self.kem.auth_decap(params.enc, params.recipient_key, pk_s)?,
            None => self.kem.decap(params.enc, params.recipient_key)?,
        };

        let secrets = key_schedule(
            &self.kdf,
            self.aead.as_ref(),
            &shared_secret,
            params.info,
            &params.mode,
        )?;
        debug!(
            kem = %self.kem.id(),
            kdf = %self.kdf.kdf().id(),
            aead = %self.aead.id(),
            mode = params.mode.name(),
            "created recipient context"
        );
        Ok(RecipientContext::new(self.aead.clone(), self.kdf.clone(), secrets))
    }

    /// Encrypt a single message.
    pub fn seal(
        &self,
        rng: &mut dyn CryptoRngCore,
        params: &SenderParams<'_>,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Sealed, Error> {
        let mut ctx = self.create_sender_context(rng, params)?;
        let ct = ctx.seal(plaintext, aad)?;
        Ok(Sealed {
            enc: ctx.enc().to_vec(),
            ct,
        })
    }

    /// Decrypt a single message produced by [`seal`](Self::seal).
    pub fn open(
        &self,
        params: &RecipientParams<'_>,
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, Error> {
        self.create_recipient_context(params)?.open(ciphertext, aad)
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::*;

    fn x25519_suite() -> CipherSuite {
        CipherSuite::from_ids(KemId::X25519, KdfId::HkdfSha256, AeadId::Aes128Gcm).unwrap()
    }

    #[test]
    fn suite_id_layout() {
        let suite =
            CipherSuite::from_ids(KemId::P256, KdfId::HkdfSha384, AeadId::ExportOnly).unwrap();
        assert_eq!(suite.suite_id(), *b"HPKE\x00\x10\x00\x02\xff\xff");
    }

    #[test]
    fn unknown_kem_id_not_supported() {
        assert!(matches!(
            CipherSuite::from_ids(KemId::Other(0x1234), KdfId::HkdfSha256, AeadId::Aes128Gcm),
            Err(Error::NotSupported(_))
        ));
    }

    #[test]
    fn other_id_with_registered_code_resolves() {
        let suite =
            CipherSuite::from_ids(KemId::Other(0x0020), KdfId::HkdfSha256, AeadId::Aes128Gcm)
                .unwrap();
        assert_eq!(suite.kem().id(), KemId::X25519);
        assert_eq!(suite.suite_id(), x25519_suite().suite_id());
    }

    #[cfg(feature = "pq")]
    #[test]
    fn named_hybrid_resolves_from_id() {
        for kem in [KemId::X25519MlKem768, KemId::Other(0x0030)] {
            let suite =
                CipherSuite::from_ids(kem, KdfId::HkdfSha256, AeadId::ChaCha20Poly1305).unwrap();
            assert_eq!(suite.kem().id().to_u16(), 0x0030);
            assert_eq!(suite.kem().enc_len(), 32 + 1088);
        }
    }

    #[test]
    fn single_shot_round_trip() {
        let suite = x25519_suite();
        let kp = suite.generate_key_pair(&mut OsRng).unwrap();
        let sealed = suite
            .seal(
                &mut OsRng,
                &SenderParams::new(&kp.public_key).info(b"info"),
                b"hello",
                b"aad",
            )
            .unwrap();
        assert_eq!(sealed.ct.len(), 5 + 16);

        let params = RecipientParams::new(&kp.private_key, &sealed.enc).info(b"info");
        assert_eq!(suite.open(&params, &sealed.ct, b"aad").unwrap(), b"hello");

        let wrong_info = RecipientParams::new(&kp.private_key, &sealed.enc).info(b"other");
        assert_eq!(suite.open(&wrong_info, &sealed.ct, b"aad"), Err(Error::Open));
    }

    #[test]
    fn params_builders_select_mode() {
        let suite = x25519_suite();
        let kp = suite.generate_key_pair(&mut OsRng).unwrap();
        let psk = Psk::new(b"id", &[1u8; 32]).unwrap();

        assert_eq!(SenderParams::new(&kp.public_key).mode().id(), 0);
        assert_eq!(SenderParams::new(&kp.public_key).psk(psk).mode().id(), 1);
        assert_eq!(
            SenderParams::new(&kp.public_key).sender_key(&kp.private_key).mode().id(),
            2
        );
        assert_eq!(
            RecipientParams::new(&kp.private_key, &[])
                .sender_public_key(&kp.public_key)
                .psk(psk)
                .mode()
                .id(),
            3
        );
    }

    #[test]
    fn mode_mismatch_fails_open() {
        let suite = x25519_suite();
        let kp = suite.generate_key_pair(&mut OsRng).unwrap();
        let psk = Psk::new(b"id", &[1u8; 32]).unwrap();
        let sealed = suite
            .seal(&mut OsRng, &SenderParams::new(&kp.public_key).psk(psk), b"m", b"")
            .unwrap();
        let base = RecipientParams::new(&kp.private_key, &sealed.enc);
        assert_eq!(suite.open(&base, &sealed.ct, b""), Err(Error::Open));
    }

    #[test]
    fn foreign_key_rejected() {
        let suite = x25519_suite();
        let p256 =
            CipherSuite::from_ids(KemId::P256, KdfId::HkdfSha256, AeadId::Aes128Gcm).unwrap();
        let kp = p256.generate_key_pair(&mut OsRng).unwrap();
        assert!(matches!(
            suite.create_sender_context(&mut OsRng, &SenderParams::new(&kp.public_key)),
            Err(Error::InvalidParam(_))
        ));
    }
}

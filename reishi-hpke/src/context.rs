use std::sync::Arc;

use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::crypto::aead::Aead;
use crate::error::Error;
use crate::identifiers::AeadId;
use crate::kdf::LabeledKdf;
use crate::kem::INPUT_LENGTH_LIMIT;
use crate::key_schedule::ContextSecrets;

/// One direction of traffic: an AEAD key, a base nonce and a sequence number.
struct Direction {
    key: Zeroizing<Vec<u8>>,
    base_nonce: Zeroizing<Vec<u8>>,
    /// Incremented after each successful seal/open.
    seq: u64,
}

impl Direction {
    fn new(key: Zeroizing<Vec<u8>>, base_nonce: Zeroizing<Vec<u8>>) -> Self {
        Self {
            key,
            base_nonce,
            seq: 0,
        }
    }

    /// `min(2^64, 2^(8 * Nn)) - 1`
    fn seq_limit(&self) -> u64 {
        let bits = 8 * self.base_nonce.len();
        if bits >= 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        }
    }

    /// `base_nonce XOR I2OSP(seq, Nn)`
    fn nonce(&self) -> Zeroizing<Vec<u8>> {
        let mut nonce = self.base_nonce.clone();
        let seq = self.seq.to_be_bytes();
        let n = nonce.len().min(seq.len());
        let nonce_len = nonce.len();
        for (byte, s) in nonce[nonce_len - n..].iter_mut().zip(&seq[seq.len() - n..]) {
            *byte ^= s;
        }
        nonce
    }

    fn check_limit(&self) -> Result<(), Error> {
        if self.seq >= self.seq_limit() {
            return Err(Error::MessageLimitReached);
        }
        Ok(())
    }

    fn seal(&mut self, aead: &dyn Aead, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        self.check_limit()?;
        let ct = aead.seal(&self.key, &self.nonce(), aad, plaintext)?;
        trace!(seq = self.seq, len = plaintext.len(), "sealed message");
        self.seq += 1;
        Ok(ct)
    }

    fn open(&mut self, aead: &dyn Aead, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        self.check_limit()?;
        let pt = aead
            .open(&self.key, &self.nonce(), aad, ciphertext)
            .inspect_err(|_| debug!(seq = self.seq, "open failed"))?;
        trace!(seq = self.seq, len = pt.len(), "opened message");
        self.seq += 1;
        Ok(pt)
    }
}

/// The state shared by sender and recipient contexts.
///
/// The request direction carries sender-to-recipient traffic and exists
/// from the start; the response direction only after
/// `setup_bidirectional`.
struct ContextState {
    aead: Arc<dyn Aead>,
    kdf: LabeledKdf,
    exporter_secret: Zeroizing<Vec<u8>>,
    request: Direction,
    response: Option<Direction>,
}

impl ContextState {
    fn new(aead: Arc<dyn Aead>, kdf: LabeledKdf, secrets: ContextSecrets) -> Self {
        let ContextSecrets {
            key,
            base_nonce,
            exporter_secret,
        } = secrets;
        Self {
            aead,
            kdf,
            exporter_secret,
            request: Direction::new(key, base_nonce),
            response: None,
        }
    }

    fn check_aead(&self) -> Result<(), Error> {
        if self.aead.id() == AeadId::ExportOnly {
            debug!("encryption requested on an export-only context");
            return Err(Error::NotSupported("Export only"));
        }
        Ok(())
    }

    fn export(&self, exporter_context: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>, Error> {
        if exporter_context.len() > INPUT_LENGTH_LIMIT {
            return Err(Error::InvalidParam("Too long exporter context"));
        }
        self.kdf
            .labeled_expand(&self.exporter_secret, b"sec", exporter_context, len)
    }

    fn setup_bidirectional(&mut self, key_seed: &[u8], nonce_seed: &[u8]) -> Result<(), Error> {
        self.check_aead()?;
        if self.response.is_some() {
            return Err(Error::InvalidParam("bidirectional context already set up"));
        }
        let key = self.export(key_seed, self.aead.key_len())?;
        let base_nonce = self.export(nonce_seed, self.aead.nonce_len())?;
        self.response = Some(Direction::new(key, base_nonce));
        debug!("response direction established");
        Ok(())
    }

    fn seal_request(&mut self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        self.check_aead()?;
        self.request.seal(self.aead.as_ref(), aad, plaintext)
    }

    fn open_request(&mut self, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        self.check_aead()?;
        self.request.open(self.aead.as_ref(), aad, ciphertext)
    }

    fn seal_response(&mut self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        self.check_aead()?;
        let response = self
            .response
            .as_mut()
            .ok_or(Error::Seal("no response direction; call setup_bidirectional"))?;
        response.seal(self.aead.as_ref(), aad, plaintext)
    }

    fn open_response(&mut self, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        self.check_aead()?;
        let response = self.response.as_mut().ok_or(Error::Open)?;
        response.open(self.aead.as_ref(), aad, ciphertext)
    }
}

/// The sender's encryption context.
///
/// Seals on the request direction. After
/// [`setup_bidirectional`](Self::setup_bidirectional) it can also open the
/// recipient's responses.
pub struct SenderContext {
    state: ContextState,
    enc: Vec<u8>,
}

impl SenderContext {
    pub(crate) fn new(
        aead: Arc<dyn Aead>,
        kdf: LabeledKdf,
        secrets: ContextSecrets,
        enc: Vec<u8>,
    ) -> Self {
        Self {
            state: ContextState::new(aead, kdf, secrets),
            enc,
        }
    }

    /// The encapsulated key the recipient needs to build its context.
    pub fn enc(&self) -> &[u8] {
        &self.enc
    }

    /// Encrypt a message to the recipient.
    pub fn seal(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, Error> {
        self.state.seal_request(aad, plaintext)
    }

    /// Decrypt a response from the recipient.
    ///
    /// Fails with [`Error::Open`] until the response direction is set up.
    pub fn open(&mut self, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>, Error> {
        self.state.open_response(aad, ciphertext)
    }

    /// Derive `len` bytes of secret bound to `exporter_context`.
    pub fn export(&self, exporter_context: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>, Error> {
        self.state.export(exporter_context, len)
    }

    /// Derive the response direction from two exported seeds.
    ///
    /// Can only be called once per context.
    pub fn setup_bidirectional(&mut self, key_seed: &[u8], nonce_seed: &[u8]) -> Result<(), Error> {
        self.state.setup_bidirectional(key_seed, nonce_seed)
    }

    /// The AEAD tag overhead per message.
    pub fn overhead(&self) -> usize {
        self.state.aead.tag_len()
    }
}

/// The recipient's encryption context.
///
/// Opens on the request direction. After
/// [`setup_bidirectional`](Self::setup_bidirectional) it can also seal
/// responses.
pub struct RecipientContext {
    state: ContextState,
}

impl RecipientContext {
    pub(crate) fn new(aead: Arc<dyn Aead>, kdf: LabeledKdf, secrets: ContextSecrets) -> Self {
        Self {
            state: ContextState::new(aead, kdf, secrets),
        }
    }

    /// Decrypt a message from the sender.
    ///
    /// A failed open leaves the sequence number unchanged.
    pub fn open(&mut self, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>, Error> {
        self.state.open_request(aad, ciphertext)
    }

    /// Encrypt a response to the sender.
    ///
    /// Fails with [`Error::Seal`] until the response direction is set up.
    pub fn seal(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, Error> {
        self.state.seal_response(aad, plaintext)
    }

    /// Derive `len` bytes of secret bound to `exporter_context`.
    pub fn export(&self, exporter_context: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>, Error> {
        self.state.export(exporter_context, len)
    }

    /// Derive the response direction from two exported seeds.
    ///
    /// Can only be called once per context.
    pub fn setup_bidirectional(&mut self, key_seed: &[u8], nonce_seed: &[u8]) -> Result<(), Error> {
        self.state.setup_bidirectional(key_seed, nonce_seed)
    }

    /// The AEAD tag overhead per message.
    pub fn overhead(&self) -> usize {
        self.state.aead.tag_len()
    }
}

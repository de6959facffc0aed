/// Errors that can occur while setting up or using an HPKE context.
///
/// Every variant carries only static context, so the type stays `Copy` and
/// never leaks key material through its `Display` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An input violated a length or pairing constraint.
    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),
    /// Key material is malformed (wrong length, off-curve point, bad scalar).
    #[error("failed to deserialize key: {0}")]
    Deserialize(&'static str),
    /// The KEM failed to encapsulate against a well-formed public key.
    #[error("encapsulation failed: {0}")]
    Encap(&'static str),
    /// The KEM failed to decapsulate a well-formed `enc`.
    #[error("decapsulation failed: {0}")]
    Decap(&'static str),
    /// No valid private key could be derived from the input keying material.
    #[error("failed to derive key pair")]
    DeriveKeyPair,
    /// AEAD encryption failed, or the context has no sealing direction.
    #[error("seal failed: {0}")]
    Seal(&'static str),
    /// AEAD decryption failed.
    ///
    /// Intentionally carries no detail.
    #[error("open failed")]
    Open,
    /// The sequence number for this direction is exhausted.
    #[error("message limit reached")]
    MessageLimitReached,
    /// The requested capability is not provided by this suite.
    #[error("not supported: {0}")]
    NotSupported(&'static str),
}

use crate::error::Error;
use crate::kem::INPUT_LENGTH_LIMIT;

/// Shortest accepted pre-shared key.
pub const MINIMUM_PSK_LENGTH: usize = 32;

/// A pre-shared key and its identifier.
///
/// Only constructible through [`Psk::new`], which enforces the length
/// rules, so a `Psk` in hand is always usable.
#[derive(Clone, Copy)]
pub struct Psk<'a> {
    id: &'a [u8],
    key: &'a [u8],
}

impl<'a> Psk<'a> {
    /// Validate and wrap a PSK.
    ///
    /// Both `id` and `key` must be non-empty and at most
    /// [`INPUT_LENGTH_LIMIT`] bytes; `key` must have at least
    /// [`MINIMUM_PSK_LENGTH`] bytes.
    pub fn new(id: &'a [u8], key: &'a [u8]) -> Result<Self, Error> {
        if key.len() > INPUT_LENGTH_LIMIT {
            return Err(Error::InvalidParam("Too long psk.key"));
        }
        if id.len() > INPUT_LENGTH_LIMIT {
            return Err(Error::InvalidParam("Too long psk.id"));
        }
        if id.is_empty() || key.is_empty() {
            return Err(Error::InvalidParam("Inconsistent PSK inputs"));
        }
        if key.len() < MINIMUM_PSK_LENGTH {
            return Err(Error::InvalidParam("PSK must have at least 32 bytes"));
        }
        Ok(Self { id, key })
    }

    pub fn id(&self) -> &'a [u8] {
        self.id
    }

    pub(crate) fn key(&self) -> &'a [u8] {
        self.key
    }
}

impl core::fmt::Debug for Psk<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Psk")
            .field("id", &self.id)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// The HPKE mode, carrying exactly the inputs that mode needs.
///
/// `T` is the sender's authentication key: the private key on the sending
/// side and the public key on the receiving side. A PSK in Base or Auth
/// mode cannot be expressed.
#[derive(Debug, Clone, Copy)]
pub enum Mode<'a, T> {
    Base,
    Psk(Psk<'a>),
    Auth(T),
    AuthPsk(T, Psk<'a>),
}

impl<'a, T> Mode<'a, T> {
    /// The one-byte mode identifier mixed into the key schedule.
    pub fn id(&self) -> u8 {
        match self {
            Self::Base => 0x00,
            Self::Psk(_) => 0x01,
            Self::Auth(_) => 0x02,
            Self::AuthPsk(..) => 0x03,
        }
    }

    pub fn psk(&self) -> Option<&Psk<'a>> {
        match self {
            Self::Psk(psk) | Self::AuthPsk(_, psk) => Some(psk),
            Self::Base | Self::Auth(_) => None,
        }
    }

    pub fn auth(&self) -> Option<&T> {
        match self {
            Self::Auth(key) | Self::AuthPsk(key, _) => Some(key),
            Self::Base | Self::Psk(_) => None,
        }
    }

    /// Add (or replace) the PSK, moving Base to Psk and Auth to AuthPsk.
    pub fn with_psk(self, psk: Psk<'a>) -> Self {
        match self {
            Self::Base | Self::Psk(_) => Self::Psk(psk),
            Self::Auth(key) | Self::AuthPsk(key, _) => Self::AuthPsk(key, psk),
        }
    }

    /// Add (or replace) the sender key, moving Base to Auth and Psk to AuthPsk.
    pub fn with_auth(self, key: T) -> Self {
        match self {
            Self::Base | Self::Auth(_) => Self::Auth(key),
            Self::Psk(psk) | Self::AuthPsk(_, psk) => Self::AuthPsk(key, psk),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Psk(_) => "psk",
            Self::Auth(_) => "auth",
            Self::AuthPsk(..) => "auth_psk",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = &[0x42; 32];

    #[test]
    fn psk_length_rules() {
        assert!(Psk::new(b"id", KEY).is_ok());
        assert_eq!(
            Psk::new(b"id", &[0u8; 31]).unwrap_err(),
            Error::InvalidParam("PSK must have at least 32 bytes")
        );
        assert_eq!(
            Psk::new(b"id", &[0u8; 129]).unwrap_err(),
            Error::InvalidParam("Too long psk.key")
        );
        assert_eq!(
            Psk::new(&[0u8; 129], KEY).unwrap_err(),
            Error::InvalidParam("Too long psk.id")
        );
        assert!(Psk::new(&[0u8; 128], &[0u8; 128]).is_ok());
    }

    #[test]
    fn psk_requires_both_halves() {
        assert_eq!(
            Psk::new(b"", KEY).unwrap_err(),
            Error::InvalidParam("Inconsistent PSK inputs")
        );
        assert_eq!(
            Psk::new(b"id", b"").unwrap_err(),
            Error::InvalidParam("Inconsistent PSK inputs")
        );
    }

    #[test]
    fn mode_ids() {
        let psk = Psk::new(b"id", KEY).unwrap();
        assert_eq!(Mode::<()>::Base.id(), 0);
        assert_eq!(Mode::<()>::Psk(psk).id(), 1);
        assert_eq!(Mode::Auth(()).id(), 2);
        assert_eq!(Mode::AuthPsk((), psk).id(), 3);
    }

    #[test]
    fn builders_compose() {
        let psk = Psk::new(b"id", KEY).unwrap();
        let mode = Mode::Base.with_psk(psk).with_auth(7u8);
        assert_eq!(mode.id(), 3);
        assert_eq!(mode.auth(), Some(&7));
        assert_eq!(mode.psk().unwrap().id(), b"id");

        let mode = Mode::Base.with_auth(1u8);
        assert_eq!(mode.id(), 2);
        assert!(mode.psk().is_none());
    }

    #[test]
    fn debug_redacts_key() {
        let psk = Psk::new(b"id", KEY).unwrap();
        assert!(format!("{psk:?}").contains("REDACTED"));
    }
}

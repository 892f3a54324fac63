//! Error types for the session core.

use std::fmt;

// ─── SecurityError ────────────────────────────────────────────────────────────

/// An incoming frame failed a protocol security check.
///
/// Fatal to the message, not necessarily to the connection; tearing the
/// session down is the caller's decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecurityError {
    /// The frame's `auth_key_id` is not ours.
    InvalidAuthKey,
    /// No authorization key is available to decrypt with.
    UnsetAuthKey,
    /// The recomputed `msg_key` differs from the transmitted one.
    MsgKeyMismatch,
    /// The remote `msg_id` was already accepted recently.
    DuplicateMsgId,
    /// Server message IDs must be odd.
    EvenMsgId,
    /// The remote `msg_id` is too far in the past.
    MsgTooOld,
    /// The remote `msg_id` is too far in the future.
    MsgTooNew,
}

impl fmt::Display for SecurityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAuthKey => write!(f, "invalid auth key"),
            Self::UnsetAuthKey   => write!(f, "unset auth key"),
            Self::MsgKeyMismatch => write!(f, "msg_key mismatch"),
            Self::DuplicateMsgId => write!(f, "duplicate msgId"),
            Self::EvenMsgId      => write!(f, "server sent an even msgId"),
            Self::MsgTooOld      => write!(f, "server sent a very old message"),
            Self::MsgTooNew      => write!(f, "server sent a very new message"),
        }
    }
}

impl std::error::Error for SecurityError {}

// ─── Error ────────────────────────────────────────────────────────────────────

/// Every failure the session core can report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Encryption attempted without a usable key or salt. Retry after the
    /// key exchange completes.
    AuthKeyUnset,
    /// Malformed or truncated incoming frame.
    InvalidBuffer,
    /// An incoming frame failed a security check.
    Security(SecurityError),
    /// The decrypted body is not a valid TL object.
    Deserialize(mtcore_tl::deserialize::Error),
    /// The OS random source failed.
    Rng(getrandom::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthKeyUnset   => write!(f, "auth key unset"),
            Self::InvalidBuffer  => write!(f, "invalid buffer"),
            Self::Security(e)    => write!(f, "security error: {e}"),
            Self::Deserialize(e) => write!(f, "deserialize error: {e}"),
            Self::Rng(e)         => write!(f, "random source failed: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Security(e)    => Some(e),
            Self::Deserialize(e) => Some(e),
            _                    => None,
        }
    }
}

impl From<SecurityError> for Error {
    fn from(e: SecurityError) -> Self { Self::Security(e) }
}

impl From<mtcore_tl::deserialize::Error> for Error {
    fn from(e: mtcore_tl::deserialize::Error) -> Self { Self::Deserialize(e) }
}

impl From<getrandom::Error> for Error {
    fn from(e: getrandom::Error) -> Self { Self::Rng(e) }
}

impl From<mtcore_crypto::DecryptError> for Error {
    fn from(e: mtcore_crypto::DecryptError) -> Self {
        use mtcore_crypto::DecryptError;
        match e {
            DecryptError::InvalidBuffer      => Self::InvalidBuffer,
            DecryptError::AuthKeyMismatch    => Self::Security(SecurityError::InvalidAuthKey),
            DecryptError::MessageKeyMismatch => Self::Security(SecurityError::MsgKeyMismatch),
        }
    }
}

/// Specialized `Result` for the session core.
pub type Result<T> = std::result::Result<T, Error>;

//! Failure taxonomy shared by the password and token components.

use std::fmt;

/// Coarse classification of every failure this crate can report.
///
/// Component errors keep their detailed variants for logging; callers that
/// only need to decide what to do next should match on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A credential record or token could not be structurally parsed.
    Parse,
    /// A hash/MAC primitive or required key material is missing. This is a
    /// startup misconfiguration and retrying will not help.
    CryptoUnavailable,
    /// A token signature did not verify against any configured key.
    SignatureMismatch,
    /// A token is past its expiry.
    Expired,
}

impl ErrorKind {
    /// Whether the failure means "the presented credential is not good",
    /// as opposed to "this process is misconfigured".
    #[must_use]
    pub const fn is_rejection(self) -> bool {
        !matches!(self, Self::CryptoUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parse => "parse error",
            Self::CryptoUnavailable => "crypto unavailable",
            Self::SignatureMismatch => "signature mismatch",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

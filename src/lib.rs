//! # Credence (credential security)
//!
//! `credence` owns the two pieces of an account service that have to be
//! right: how passwords are stored and how sessions are proven.
//!
//! ## Passwords
//!
//! [`CredentialHasher`] derives salted PBKDF2-HMAC-SHA256 digests and stores
//! them in a self-describing text record:
//!
//! ```text
//! pbkdf2-hmac-sha256:<iterations>$<salt>$<digest-hex>
//! ```
//!
//! Because the iteration count travels with the record, the configured default
//! can be raised at any time. Old records keep verifying with their original
//! count and [`CredentialHasher::needs_rehash`] reports when one should be
//! re-encoded.
//!
//! ## Sessions
//!
//! [`TokenService`] issues compact HS512 JWTs carrying a `userId` claim and an
//! absolute expiry. There is no server-side session state: expiry is the only
//! termination mechanism, so callers needing forced logout must keep their own
//! denylist or shorten the lifetime. Signing keys are injected configuration;
//! previous keys may be kept around to validate tokens minted before a rotation.
//!
//! ## Flows
//!
//! [`Authenticator`] composes both for registration, login, password change and
//! request authentication, reporting failures through the opaque [`AuthError`].

pub mod auth;
pub mod cli;
pub mod error;
pub mod password;
pub mod token;

pub use auth::{AuthError, Authenticator, Login};
pub use error::ErrorKind;
pub use password::{CredentialHasher, CredentialRecord, HasherConfig, Salt};
pub use token::{Claims, Compression, TokenConfig, TokenService};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

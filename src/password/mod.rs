//! Salted, iterated password digests.
//!
//! Digests are PBKDF2 with an HMAC-SHA-256 core and a 256-bit output. The
//! stored form is a [`CredentialRecord`]; see its docs for the text layout.

mod record;
mod salt;

pub use record::{Algorithm, CredentialRecord};
pub use salt::{Salt, SALT_LEN};

use crate::error::ErrorKind;
use hmac::Hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, error, instrument};

/// Iteration count for newly encoded records.
pub const DEFAULT_ITERATIONS: u32 = 150_000;

/// Highest iteration count accepted when encoding or reading a record.
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// Derived key length in bytes (256 bits).
pub const DIGEST_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("expected 3 '$'-delimited segments, found {0}")]
    SegmentCount(usize),
    #[error("missing ':'-delimited iteration count")]
    MissingIterations,
    #[error("invalid iteration count: {0:?}")]
    InvalidIterations(String),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("empty salt")]
    EmptySalt,
    #[error("salt contains the '$' delimiter")]
    InvalidSalt,
    #[error("invalid digest")]
    InvalidDigest,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("key derivation rejected its parameters")]
    InvalidKeyMaterial,
    #[error("iteration count {0} outside 1..={MAX_ITERATIONS}")]
    InvalidIterations(u32),
    #[error("invalid credential record: {0}")]
    Parse(#[from] ParseError),
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKeyMaterial | Self::InvalidIterations(_) => ErrorKind::CryptoUnavailable,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    iterations: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl HasherConfig {
    #[must_use]
    pub const fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }
}

/// Encodes and verifies password credentials.
///
/// Stateless apart from its configuration; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct CredentialHasher {
    config: HasherConfig,
}

impl CredentialHasher {
    /// Build a hasher, validating the configured iteration count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIterations`] if the count is zero or above
    /// [`MAX_ITERATIONS`].
    pub fn new(config: HasherConfig) -> Result<Self, Error> {
        check_iterations(config.iterations)?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &HasherConfig {
        &self.config
    }

    /// Encode `password` with a fresh salt and the configured iteration count.
    ///
    /// # Errors
    ///
    /// Returns an error only if key derivation fails.
    pub fn encode(&self, password: &str) -> Result<CredentialRecord, Error> {
        self.encode_with_salt(password, Salt::generate())
    }

    /// Encode `password` with a caller-chosen salt and the configured iteration count.
    ///
    /// # Errors
    ///
    /// Returns an error only if key derivation fails.
    pub fn encode_with_salt(&self, password: &str, salt: Salt) -> Result<CredentialRecord, Error> {
        encode(password, salt, self.config.iterations)
    }

    /// Check `password` against a stored record string.
    ///
    /// Never fails: unparseable records, derivation errors and mismatches all
    /// read as `false`. Use [`Self::try_verify`] to tell a broken setup apart
    /// from a wrong password.
    #[must_use]
    pub fn verify(&self, password: &str, record: &str) -> bool {
        match self.try_verify(password, record) {
            Ok(matched) => matched,
            Err(err) => {
                error!("credential verification unavailable: {err}");
                false
            }
        }
    }

    /// Like [`Self::verify`] but surfaces derivation failures.
    ///
    /// A record that does not parse is a mismatch (`Ok(false)`), not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if key derivation itself fails.
    pub fn try_verify(&self, password: &str, record: &str) -> Result<bool, Error> {
        match record.parse::<CredentialRecord>() {
            Ok(record) => verify_record(password, &record),
            Err(err) => {
                debug!("rejecting credential record: {err}");
                Ok(false)
            }
        }
    }

    /// Whether `record` should be re-encoded with the current configuration.
    ///
    /// True for records below the configured iteration count and for records
    /// carrying the legacy algorithm label.
    #[must_use]
    pub fn needs_rehash(&self, record: &CredentialRecord) -> bool {
        record.algorithm() != Algorithm::Pbkdf2HmacSha256
            || record.iterations() < self.config.iterations
    }
}

/// Encode `password` into a record with an explicit salt and iteration count.
///
/// Pure function of its inputs.
///
/// # Errors
///
/// Returns an error if the iteration count is out of range or derivation fails.
pub fn encode(password: &str, salt: Salt, iterations: u32) -> Result<CredentialRecord, Error> {
    let digest = derive_key(password, &salt, iterations)?;
    Ok(CredentialRecord::new(
        Algorithm::Pbkdf2HmacSha256,
        iterations,
        salt,
        digest,
    ))
}

/// PBKDF2-HMAC-SHA256 of `password`, hex-encoded to exactly `DIGEST_LEN * 2`
/// lowercase characters (leading zero bytes included).
///
/// # Errors
///
/// Returns an error if the iteration count is out of range or derivation fails.
pub fn derive_digest(password: &str, salt: &Salt, iterations: u32) -> Result<String, Error> {
    derive_key(password, salt, iterations).map(hex::encode)
}

/// Recompute the digest for `password` and compare it to `record` in constant time.
///
/// # Errors
///
/// Returns an error if derivation fails.
pub fn verify_record(password: &str, record: &CredentialRecord) -> Result<bool, Error> {
    let derived = derive_key(password, record.salt(), record.iterations())?;
    Ok(derived.as_slice().ct_eq(record.digest().as_slice()).into())
}

#[instrument(level = "trace", skip(password, salt))]
fn derive_key(password: &str, salt: &Salt, iterations: u32) -> Result<[u8; DIGEST_LEN], Error> {
    check_iterations(iterations)?;
    let mut key = [0u8; DIGEST_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt.as_bytes(), iterations, &mut key)
        .map_err(|_| Error::InvalidKeyMaterial)?;
    Ok(key)
}

fn check_iterations(iterations: u32) -> Result<(), Error> {
    if iterations == 0 || iterations > MAX_ITERATIONS {
        return Err(Error::InvalidIterations(iterations));
    }
    Ok(())
}

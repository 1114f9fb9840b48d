use super::{ParseError, Salt, DIGEST_LEN, MAX_ITERATIONS};
use std::{fmt, str::FromStr};

/// Key derivation scheme named in a record prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// `pbkdf2-hmac-sha256`, written by this crate.
    Pbkdf2HmacSha256,
    /// `pbkdf2:sha256`, the older label for the same derivation. Read-only.
    LegacyPbkdf2Sha256,
}

impl Algorithm {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pbkdf2HmacSha256 => "pbkdf2-hmac-sha256",
            Self::LegacyPbkdf2Sha256 => "pbkdf2:sha256",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "pbkdf2-hmac-sha256" => Some(Self::Pbkdf2HmacSha256),
            "pbkdf2:sha256" => Some(Self::LegacyPbkdf2Sha256),
            _ => None,
        }
    }
}

/// A stored password credential: `<algorithm>:<iterations>$<salt>$<digest-hex>`.
///
/// Immutable once built. Parsing is strict: anything that does not split into
/// exactly three `$` segments with a `:`-delimited iteration count is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    algorithm: Algorithm,
    iterations: u32,
    salt: Salt,
    digest: [u8; DIGEST_LEN],
}

impl CredentialRecord {
    pub(crate) const fn new(
        algorithm: Algorithm,
        iterations: u32,
        salt: Salt,
        digest: [u8; DIGEST_LEN],
    ) -> Self {
        Self {
            algorithm,
            iterations,
            salt,
            digest,
        }
    }

    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    #[must_use]
    pub const fn salt(&self) -> &Salt {
        &self.salt
    }

    #[must_use]
    pub const fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Lowercase hex of the digest, always `DIGEST_LEN * 2` characters.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

impl fmt::Display for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}${}${}",
            self.algorithm.label(),
            self.iterations,
            self.salt,
            self.digest_hex()
        )
    }
}

impl FromStr for CredentialRecord {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('$').collect();
        let [prefix, salt, digest_hex] = segments.as_slice() else {
            return Err(ParseError::SegmentCount(segments.len()));
        };

        // The legacy label contains a ':' itself, so split on the last one.
        let (label, iterations) = prefix
            .rsplit_once(':')
            .ok_or(ParseError::MissingIterations)?;
        let algorithm = Algorithm::from_label(label)
            .ok_or_else(|| ParseError::UnsupportedAlgorithm(label.to_string()))?;
        let iterations = parse_iterations(iterations)?;

        let salt = Salt::new(*salt)?;

        if digest_hex.len() != DIGEST_LEN * 2 {
            return Err(ParseError::InvalidDigest);
        }
        let mut digest = [0u8; DIGEST_LEN];
        hex::decode_to_slice(digest_hex, &mut digest).map_err(|_| ParseError::InvalidDigest)?;

        Ok(Self::new(algorithm, iterations, salt, digest))
    }
}

fn parse_iterations(value: &str) -> Result<u32, ParseError> {
    let iterations = value
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidIterations(value.to_string()))?;
    if iterations == 0 || iterations > MAX_ITERATIONS {
        return Err(ParseError::InvalidIterations(value.to_string()));
    }
    Ok(iterations)
}

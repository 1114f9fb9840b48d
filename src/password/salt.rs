use super::ParseError;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use std::fmt;

/// Length of freshly generated salts.
pub const SALT_LEN: usize = 8;

/// Per-credential salt. Not secret; stored next to the digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Salt(String);

impl Salt {
    /// Draw [`SALT_LEN`] characters uniformly from `[A-Za-z0-9]` using the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let value: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(SALT_LEN)
            .map(char::from)
            .collect();
        Self(value)
    }

    /// Wrap an existing salt, e.g. one read back from a stored record.
    ///
    /// Any length is accepted so records produced elsewhere keep verifying,
    /// but the salt must be non-empty and must not contain the `$` delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptySalt`] or [`ParseError::InvalidSalt`].
    pub fn new(value: impl Into<String>) -> Result<Self, ParseError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ParseError::EmptySalt);
        }
        if value.contains('$') {
            return Err(ParseError::InvalidSalt);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_salt_is_alphanumeric() {
        for _ in 0..100 {
            let salt = Salt::generate();
            assert_eq!(salt.as_str().len(), SALT_LEN);
            assert!(salt.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn generated_salts_differ() {
        assert_ne!(Salt::generate(), Salt::generate());
    }

    #[test]
    fn new_rejects_empty_and_delimiter() {
        assert!(matches!(Salt::new(""), Err(ParseError::EmptySalt)));
        assert!(matches!(Salt::new("ab$cd"), Err(ParseError::InvalidSalt)));
        assert_eq!(Salt::new("aB3xQ9fZ").map(|s| s.to_string()).ok(), Some("aB3xQ9fZ".to_string()));
    }
}

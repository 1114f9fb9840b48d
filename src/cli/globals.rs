use crate::password::{CredentialHasher, HasherConfig};
use crate::token::{Compression, TokenConfig, TokenService};
use anyhow::{Context, Result};
use secrecy::SecretString;
use time::Duration;

/// Settings shared by every subcommand.
#[derive(Clone)]
pub struct GlobalArgs {
    pub iterations: u32,
    pub signing_key: Option<SecretString>,
    pub previous_signing_keys: Vec<SecretString>,
    pub token_ttl_seconds: i64,
    pub token_compression: Compression,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            signing_key: None,
            previous_signing_keys: Vec::new(),
            token_ttl_seconds: crate::token::DEFAULT_LIFETIME.whole_seconds(),
            token_compression: Compression::default(),
        }
    }

    pub fn set_signing_key(&mut self, key: SecretString) {
        self.signing_key = Some(key);
    }

    /// # Errors
    /// Returns an error if the iteration count is out of range.
    pub fn hasher(&self) -> Result<CredentialHasher> {
        CredentialHasher::new(HasherConfig::default().with_iterations(self.iterations))
            .context("invalid --iterations")
    }

    /// # Errors
    /// Returns an error if no signing key was configured or it is unusable.
    pub fn token_service(&self) -> Result<TokenService> {
        let key = self
            .signing_key
            .clone()
            .context("missing required argument: --signing-key (or CREDENCE_SIGNING_KEY)")?;
        let config = TokenConfig::new(key)
            .with_previous_keys(self.previous_signing_keys.iter().cloned())
            .with_lifetime(Duration::seconds(self.token_ttl_seconds))
            .with_compression(self.token_compression);
        TokenService::new(config).context("could not configure the token service")
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("iterations", &self.iterations)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "***"))
            .field(
                "previous_signing_keys",
                &format!("{} key(s)", self.previous_signing_keys.len()),
            )
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("token_compression", &self.token_compression)
            .finish()
    }
}

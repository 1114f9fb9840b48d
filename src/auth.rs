//! Account flows built on the hasher and the token service.
//!
//! Account storage stays with the caller: every flow takes the stored record
//! string as input and hands back whatever needs to be persisted.

use crate::password::{self, CredentialHasher, CredentialRecord};
use crate::token::{self, Claims, TokenService};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info};

/// Caller-facing failure. Deliberately coarse: the detailed reason is logged,
/// never returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not authenticated")]
    Unauthenticated,
    #[error("authentication unavailable")]
    Unavailable,
}

impl From<password::Error> for AuthError {
    fn from(err: password::Error) -> Self {
        error!("credential hashing failed: {err}");
        Self::Unavailable
    }
}

impl From<token::Error> for AuthError {
    fn from(err: token::Error) -> Self {
        if err.kind().is_rejection() {
            debug!(kind = %err.kind(), "token rejected: {err}");
            Self::Unauthenticated
        } else {
            error!("token service failed: {err}");
            Self::Unavailable
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Login {
    pub token: String,
    /// Re-encoded credential to persist when the stored one used weaker
    /// parameters than the current configuration.
    pub upgraded_record: Option<CredentialRecord>,
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    hasher: CredentialHasher,
    tokens: TokenService,
}

impl Authenticator {
    #[must_use]
    pub const fn new(hasher: CredentialHasher, tokens: TokenService) -> Self {
        Self { hasher, tokens }
    }

    #[must_use]
    pub const fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Encode the password of a new account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unavailable`] if hashing fails.
    pub fn register(&self, password: &str) -> Result<CredentialRecord, AuthError> {
        Ok(self.hasher.encode(password)?)
    }

    /// Check `password` against the stored record and issue a session token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] for a wrong password or unreadable record,
    /// - [`AuthError::Unavailable`] if hashing or signing fails.
    pub fn login(
        &self,
        user_id: impl Into<Value>,
        password: &str,
        stored: &str,
        extra_claims: Map<String, Value>,
    ) -> Result<Login, AuthError> {
        let record = self.check(password, stored)?;

        let upgraded_record = if self.hasher.needs_rehash(&record) {
            info!(
                from_iterations = record.iterations(),
                to_iterations = self.hasher.config().iterations(),
                "upgrading credential record"
            );
            Some(self.hasher.encode(password)?)
        } else {
            None
        };

        let token = self
            .tokens
            .issue_with(user_id, extra_claims, self.tokens.lifetime())?;

        Ok(Login {
            token,
            upgraded_record,
        })
    }

    /// Replace a password after checking the current one. The new record always
    /// gets a fresh salt.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] if `old_password` does not match,
    /// - [`AuthError::Unavailable`] if hashing fails.
    pub fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        stored: &str,
    ) -> Result<CredentialRecord, AuthError> {
        self.check(old_password, stored)?;
        Ok(self.hasher.encode(new_password)?)
    }

    /// Validate a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] for any bad, expired or malformed token.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(self.tokens.validate(token)?)
    }

    fn check(&self, password: &str, stored: &str) -> Result<CredentialRecord, AuthError> {
        let record: CredentialRecord = stored.parse().map_err(|err| {
            debug!("rejecting credential record: {err}");
            AuthError::InvalidCredentials
        })?;
        if password::verify_record(password, &record)? {
            Ok(record)
        } else {
            debug!("password mismatch");
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::HasherConfig;
    use crate::token::{TokenConfig, SUBJECT};
    use secrecy::SecretString;
    use serde_json::json;

    fn authenticator(iterations: u32) -> Authenticator {
        let hasher =
            CredentialHasher::new(HasherConfig::default().with_iterations(iterations)).unwrap();
        let tokens =
            TokenService::new(TokenConfig::new(SecretString::from("auth-test-key".to_string())))
                .unwrap();
        Authenticator::new(hasher, tokens)
    }

    #[test]
    fn register_then_login() {
        let auth = authenticator(10);
        let record = auth.register("hunter2").unwrap().to_string();

        let login = auth.login(42, "hunter2", &record, Map::new()).unwrap();
        assert!(login.upgraded_record.is_none());

        let claims = auth.authenticate(&login.token).unwrap();
        assert_eq!(claims.sub, SUBJECT);
        assert_eq!(claims.user_id, 42);
    }

    #[test]
    fn login_rejects_wrong_password_and_broken_record() {
        let auth = authenticator(10);
        let record = auth.register("hunter2").unwrap().to_string();

        assert_eq!(
            auth.login(42, "hunter3", &record, Map::new()).unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            auth.login(42, "hunter2", "garbage", Map::new()).unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn login_upgrades_weaker_records() {
        let old = authenticator(5);
        let record = old.register("hunter2").unwrap();

        let auth = authenticator(10);
        let login = auth
            .login(7, "hunter2", &record.to_string(), Map::new())
            .unwrap();
        let upgraded = login.upgraded_record.unwrap();
        assert_eq!(upgraded.iterations(), 10);
        assert_ne!(upgraded.salt(), record.salt());
        assert!(auth.hasher().verify("hunter2", &upgraded.to_string()));
    }

    #[test]
    fn login_carries_extra_claims() {
        let auth = authenticator(10);
        let record = auth.register("hunter2").unwrap().to_string();
        let extra = json!({"role": "admin"}).as_object().cloned().unwrap();
        let login = auth.login(1, "hunter2", &record, extra).unwrap();
        let claims = auth.authenticate(&login.token).unwrap();
        assert_eq!(claims.get("role"), Some(json!("admin")));
    }

    #[test]
    fn change_password_requires_old_one() {
        let auth = authenticator(10);
        let record = auth.register("old-pass").unwrap().to_string();

        assert_eq!(
            auth.change_password("wrong", "new-pass", &record).unwrap_err(),
            AuthError::InvalidCredentials
        );

        let changed = auth
            .change_password("old-pass", "new-pass", &record)
            .unwrap()
            .to_string();
        assert!(auth.hasher().verify("new-pass", &changed));
        assert!(!auth.hasher().verify("old-pass", &changed));
    }

    #[test]
    fn bad_tokens_are_uniformly_unauthenticated() {
        let auth = authenticator(10);
        let expired = auth
            .tokens()
            .issue_with(1, Map::new(), time::Duration::seconds(-1))
            .unwrap();

        let other = TokenService::new(TokenConfig::new(SecretString::from(
            "someone-else".to_string(),
        )))
        .unwrap();
        let foreign = other.issue(1).unwrap();

        for token in [expired.as_str(), foreign.as_str(), "not.a.token", ""] {
            assert_eq!(
                auth.authenticate(token).unwrap_err(),
                AuthError::Unauthenticated
            );
        }
    }
}

//! Signed, expiring session tokens.
//!
//! Tokens are compact JWTs (`header.payload.signature`) signed with HMAC-SHA-512.
//! The payload is compressed before signing when a compression is configured,
//! and both compressed and plain payloads are accepted on read.
//!
//! Nothing is stored server-side. A token stays valid until its `exp` passes;
//! revocation, if needed, is the caller's job.

mod claims;
mod codec;
mod keys;

pub use claims::{Claims, RESERVED_CLAIMS, SUBJECT};
pub use codec::Compression;

use crate::error::ErrorKind;
use codec::Header;
use keys::KeyRing;
use secrecy::SecretString;
use serde_json::{Map, Value};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

/// JWS algorithm of every token this service issues or accepts.
pub const ALGORITHM: &str = "HS512";

/// Token lifetime when the caller does not ask for one.
pub const DEFAULT_LIFETIME: Duration = Duration::days(7);

/// Upper bound on a decompressed payload.
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    Malformed,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("unsupported compression: {0}")]
    UnsupportedCompression(String),
    #[error("uncompressed tokens are not accepted")]
    UncompressedRejected,
    #[error("compression error")]
    Compression(#[source] std::io::Error),
    #[error("decompressed payload exceeds {MAX_PAYLOAD_LEN} bytes")]
    PayloadTooLarge,
    #[error("unexpected subject: {0}")]
    UnexpectedSubject(String),
    #[error("userId claim is null")]
    MissingUserId,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("signing failure: {0}")]
    SigningFailure(&'static str),
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSignature | Self::UnsupportedAlgorithm(_) => ErrorKind::SignatureMismatch,
            Self::Expired => ErrorKind::Expired,
            Self::SigningFailure(_) => ErrorKind::CryptoUnavailable,
            Self::Malformed
            | Self::Base64
            | Self::Json(_)
            | Self::UnsupportedCompression(_)
            | Self::UncompressedRejected
            | Self::Compression(_)
            | Self::PayloadTooLarge
            | Self::UnexpectedSubject(_)
            | Self::MissingUserId => ErrorKind::Parse,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    signing_key: SecretString,
    previous_keys: Vec<SecretString>,
    lifetime: Duration,
    compression: Compression,
    accept_uncompressed: bool,
}

impl TokenConfig {
    #[must_use]
    pub fn new(signing_key: SecretString) -> Self {
        Self {
            signing_key,
            previous_keys: Vec::new(),
            lifetime: DEFAULT_LIFETIME,
            compression: Compression::default(),
            accept_uncompressed: true,
        }
    }

    /// Keys retired by rotation, newest first. They verify but never sign.
    #[must_use]
    pub fn with_previous_keys(mut self, keys: impl IntoIterator<Item = SecretString>) -> Self {
        self.previous_keys = keys.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Whether tokens without a `zip` header validate. Defaults to `true`.
    #[must_use]
    pub fn with_accept_uncompressed(mut self, accept: bool) -> Self {
        self.accept_uncompressed = accept;
        self
    }
}

/// Issues and validates session tokens.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: KeyRing,
    lifetime: Duration,
    compression: Compression,
    accept_uncompressed: bool,
}

impl TokenService {
    /// # Errors
    ///
    /// Returns [`Error::SigningFailure`] if the signing key is empty.
    pub fn new(config: TokenConfig) -> Result<Self, Error> {
        let keys = KeyRing::new(config.signing_key, config.previous_keys)?;
        debug!(
            keys = keys.len(),
            lifetime_seconds = config.lifetime.whole_seconds(),
            compression = %config.compression,
            "token service configured"
        );
        Ok(Self {
            keys,
            lifetime: config.lifetime,
            compression: config.compression,
            accept_uncompressed: config.accept_uncompressed,
        })
    }

    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a token for `user_id` with the configured lifetime and no extra claims.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or signing fails.
    pub fn issue(&self, user_id: impl Into<Value>) -> Result<String, Error> {
        self.issue_with(user_id, Map::new(), self.lifetime)
    }

    /// Issue a token with extra claims and an explicit lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or signing fails.
    pub fn issue_with(
        &self,
        user_id: impl Into<Value>,
        claims: Map<String, Value>,
        lifetime: Duration,
    ) -> Result<String, Error> {
        let now = OffsetDateTime::now_utc();
        let remaining = lifetime.saturating_add(Duration::nanoseconds(i64::from(now.nanosecond())));
        self.mint(user_id, claims, now.unix_timestamp(), remaining)
    }

    /// Issue a token as if the current time were `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingUserId`] for a null `user_id`, otherwise an
    /// error only if encoding or signing fails.
    pub fn issue_at(
        &self,
        user_id: impl Into<Value>,
        extra: Map<String, Value>,
        lifetime: Duration,
        now: i64,
    ) -> Result<String, Error> {
        self.mint(user_id, extra, now, lifetime)
    }

    /// `lifetime` counts from the start of second `now`; `exp` is rounded up
    /// so a sub-second remainder never shortens it.
    fn mint(
        &self,
        user_id: impl Into<Value>,
        mut extra: Map<String, Value>,
        now: i64,
        lifetime: Duration,
    ) -> Result<String, Error> {
        let user_id = user_id.into();
        if user_id.is_null() {
            return Err(Error::MissingUserId);
        }
        for name in RESERVED_CLAIMS {
            if extra.remove(name).is_some() {
                warn!("dropping caller-supplied reserved claim {name:?}");
            }
        }

        let claims = Claims {
            sub: SUBJECT.to_string(),
            exp: now.saturating_add(ceil_seconds(lifetime)),
            iat: Some(now),
            user_id,
            extra,
        };

        let header_b64 = codec::b64e_json(&Header::hs512(self.compression))?;
        let payload = self.compression.compress(&serde_json::to_vec(&claims)?)?;
        let signing_input = format!("{header_b64}.{}", codec::b64e(&payload));
        let signature = self.keys.sign(signing_input.as_bytes())?;

        debug!(exp = claims.exp, "issued session token");
        Ok(format!("{signing_input}.{}", codec::b64e(&signature)))
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSignature`] if no configured key produced the signature,
    ///   which covers any tampering with header or payload,
    /// - [`Error::Expired`] if `exp` is not strictly in the future,
    /// - a parse-kind error if the token is structurally broken.
    pub fn validate(&self, token: &str) -> Result<Claims, Error> {
        self.validate_at(token, now_unix_seconds())
    }

    /// Validate as if the current time were `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// See [`Self::validate`].
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, Error> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::Malformed);
        };
        if header_b64.is_empty() || payload_b64.is_empty() {
            return Err(Error::Malformed);
        }

        // Signature first: nothing from the header or payload is trusted before it checks out.
        let signature = codec::b64d(signature_b64).map_err(|_| Error::InvalidSignature)?;
        let signing_input = format!("{header_b64}.{payload_b64}");
        self.keys.verify(signing_input.as_bytes(), &signature)?;

        let header: Header = codec::b64d_json(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(Error::UnsupportedAlgorithm(header.alg));
        }
        let compression = Compression::from_header(header.zip.as_deref())?;
        if compression == Compression::None && !self.accept_uncompressed {
            return Err(Error::UncompressedRejected);
        }

        let payload = compression.decompress(&codec::b64d(payload_b64)?)?;
        let claims: Claims = serde_json::from_slice(&payload)?;

        if claims.sub != SUBJECT {
            return Err(Error::UnexpectedSubject(claims.sub));
        }
        if claims.user_id.is_null() {
            return Err(Error::MissingUserId);
        }
        if claims.exp <= now {
            return Err(Error::Expired);
        }

        Ok(claims)
    }

    /// Read a single claim from a verified token. An absent claim is `None`,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Fails exactly like [`Self::validate`].
    pub fn extract_claim(&self, token: &str, key: &str) -> Result<Option<Value>, Error> {
        self.extract_claim_at(token, key, now_unix_seconds())
    }

    /// # Errors
    ///
    /// Fails exactly like [`Self::validate_at`].
    pub fn extract_claim_at(&self, token: &str, key: &str, now: i64) -> Result<Option<Value>, Error> {
        Ok(self.validate_at(token, now)?.get(key))
    }
}

fn ceil_seconds(duration: Duration) -> i64 {
    let seconds = duration.whole_seconds();
    if duration.subsec_nanoseconds() > 0 {
        seconds.saturating_add(1)
    } else {
        seconds
    }
}

fn now_unix_seconds() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn service(key: &str) -> TokenService {
        TokenService::new(TokenConfig::new(SecretString::from(key.to_string()))).unwrap()
    }

    fn issue(tokens: &TokenService, user_id: i64) -> String {
        tokens
            .issue_at(user_id, Map::new(), DEFAULT_LIFETIME, NOW)
            .unwrap()
    }

    fn split(token: &str) -> (String, String, String) {
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        (parts[0].to_string(), parts[1].to_string(), parts[2].to_string())
    }

    #[test]
    fn round_trip() {
        let tokens = service("test-signing-key");
        let token = issue(&tokens, 42);
        let claims = tokens.validate_at(&token, NOW).unwrap();
        assert_eq!(claims.sub, "user");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.iat, Some(NOW));
        assert_eq!(claims.exp, NOW + 7 * 24 * 60 * 60);
        assert_eq!(
            tokens.extract_claim_at(&token, "userId", NOW).unwrap(),
            Some(json!(42))
        );
        assert_eq!(tokens.extract_claim_at(&token, "nope", NOW).unwrap(), None);
    }

    #[test]
    fn header_declares_hs512_and_gzip() {
        let tokens = service("test-signing-key");
        let (header, _, _) = split(&issue(&tokens, 1));
        let header: Header = codec::b64d_json(&header).unwrap();
        assert_eq!(header.alg, "HS512");
        assert_eq!(header.zip.as_deref(), Some("GZIP"));
    }

    #[test]
    fn expiry_is_strict() {
        let tokens = service("test-signing-key");
        let token = tokens
            .issue_at(7, Map::new(), Duration::seconds(60), NOW)
            .unwrap();
        assert!(tokens.validate_at(&token, NOW + 59).is_ok());
        assert!(matches!(
            tokens.validate_at(&token, NOW + 60),
            Err(Error::Expired)
        ));

        let negative = tokens
            .issue_at(7, Map::new(), Duration::seconds(-1), NOW)
            .unwrap();
        let err = tokens.validate_at(&negative, NOW).unwrap_err();
        assert!(matches!(err, Error::Expired));
        assert_eq!(err.kind(), ErrorKind::Expired);
    }

    #[test]
    fn fractional_lifetime_rounds_up() {
        let tokens = service("test-signing-key");
        let token = tokens
            .issue_at(7, Map::new(), Duration::milliseconds(900), NOW)
            .unwrap();
        let claims = tokens.validate_at(&token, NOW).unwrap();
        assert_eq!(claims.exp, NOW + 1);
        assert!(matches!(
            tokens.validate_at(&token, NOW + 1),
            Err(Error::Expired)
        ));

        let token = tokens
            .issue_at(7, Map::new(), Duration::milliseconds(1500), NOW)
            .unwrap();
        assert!(tokens.validate_at(&token, NOW + 1).is_ok());
        assert!(tokens.validate_at(&token, NOW + 2).is_err());
    }

    #[test]
    fn sub_second_token_is_valid_when_issued() {
        let tokens = service("test-signing-key");
        let token = tokens
            .issue_with(7, Map::new(), Duration::milliseconds(900))
            .unwrap();
        let claims = tokens.validate(&token).unwrap();
        assert!(claims.exp > claims.iat.unwrap());
        assert!(matches!(
            tokens.validate_at(&token, claims.exp),
            Err(Error::Expired)
        ));
    }

    #[test]
    fn null_user_id_is_refused() {
        let tokens = service("test-signing-key");
        assert!(matches!(
            tokens.issue_at(Value::Null, Map::new(), DEFAULT_LIFETIME, NOW),
            Err(Error::MissingUserId)
        ));

        let header_b64 = codec::b64e_json(&Header::hs512(Compression::None)).unwrap();
        let payload = json!({"sub": "user", "userId": null, "exp": NOW + 60});
        let signing_input = format!("{header_b64}.{}", codec::b64e_json(&payload).unwrap());
        let signature = tokens.keys.sign(signing_input.as_bytes()).unwrap();
        let token = format!("{signing_input}.{}", codec::b64e(&signature));
        assert!(matches!(
            tokens.validate_at(&token, NOW),
            Err(Error::MissingUserId)
        ));
    }

    #[test]
    fn any_signature_character_flip_is_detected() {
        let tokens = service("test-signing-key");
        let token = issue(&tokens, 42);
        let (header, payload, signature) = split(&token);

        for index in 0..signature.len() {
            let mut chars: Vec<char> = signature.chars().collect();
            chars[index] = if chars[index] == 'A' { 'g' } else { 'A' };
            let tampered: String = chars.into_iter().collect();
            let err = tokens
                .validate_at(&format!("{header}.{payload}.{tampered}"), NOW)
                .unwrap_err();
            assert!(
                matches!(err, Error::InvalidSignature),
                "flip at {index} gave {err:?}"
            );
            assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
        }
    }

    #[test]
    fn payload_and_header_tampering_is_a_signature_failure() {
        let tokens = service("test-signing-key");
        let (header, payload, signature) = split(&issue(&tokens, 42));

        let forged_payload = codec::b64e(
            &Compression::Gzip
                .compress(br#"{"sub":"user","exp":99999999999,"userId":1}"#)
                .unwrap(),
        );
        assert!(matches!(
            tokens.validate_at(&format!("{header}.{forged_payload}.{signature}"), NOW),
            Err(Error::InvalidSignature)
        ));

        let forged_header = codec::b64e_json(&Header::hs512(Compression::None)).unwrap();
        assert!(matches!(
            tokens.validate_at(&format!("{forged_header}.{payload}.{signature}"), NOW),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn wrong_key_is_a_signature_failure() {
        let token = issue(&service("key-one"), 42);
        assert!(matches!(
            service("key-two").validate_at(&token, NOW),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn rotated_keys_still_validate() {
        let old = service("old-key");
        let token = issue(&old, 42);

        let rotated = TokenService::new(
            TokenConfig::new(SecretString::from("new-key".to_string()))
                .with_previous_keys([SecretString::from("old-key".to_string())]),
        )
        .unwrap();
        assert_eq!(rotated.validate_at(&token, NOW).unwrap().user_id, 42);

        let fresh = issue(&rotated, 43);
        assert!(matches!(
            old.validate_at(&fresh, NOW),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn both_compression_conventions_are_read() {
        let key = || SecretString::from("shared-key".to_string());
        let reader = service("shared-key");
        for compression in [Compression::None, Compression::Gzip, Compression::Deflate] {
            let writer =
                TokenService::new(TokenConfig::new(key()).with_compression(compression)).unwrap();
            let token = issue(&writer, 42);
            assert_eq!(reader.validate_at(&token, NOW).unwrap().user_id, 42);
        }
    }

    #[test]
    fn uncompressed_tokens_can_be_refused() {
        let key = || SecretString::from("shared-key".to_string());
        let writer =
            TokenService::new(TokenConfig::new(key()).with_compression(Compression::None)).unwrap();
        let strict =
            TokenService::new(TokenConfig::new(key()).with_accept_uncompressed(false)).unwrap();
        let token = issue(&writer, 42);
        assert!(matches!(
            strict.validate_at(&token, NOW),
            Err(Error::UncompressedRejected)
        ));
    }

    #[test]
    fn extra_claims_are_carried_and_reserved_ones_protected() {
        let tokens = service("test-signing-key");
        let extra = json!({"role": "admin", "sub": "root", "exp": 99_999_999_999_i64})
            .as_object()
            .cloned()
            .unwrap();
        let token = tokens.issue_at("u-1", extra, DEFAULT_LIFETIME, NOW).unwrap();
        let claims = tokens.validate_at(&token, NOW).unwrap();
        assert_eq!(claims.sub, "user");
        assert_eq!(claims.exp, NOW + DEFAULT_LIFETIME.whole_seconds());
        assert_eq!(claims.user_id, "u-1");
        assert_eq!(claims.get("role"), Some(json!("admin")));
    }

    #[test]
    fn structural_garbage_is_malformed() {
        let tokens = service("test-signing-key");
        for token in ["", "abc", "a.b", "a.b.c.d", ".b.c", "a..c"] {
            let err = tokens.validate_at(token, NOW).unwrap_err();
            assert!(matches!(err, Error::Malformed), "{token:?} gave {err:?}");
            assert_eq!(err.kind(), ErrorKind::Parse);
        }
    }

    #[test]
    fn foreign_algorithm_is_refused_even_when_mac_matches() {
        let tokens = service("test-signing-key");
        let header = codec::b64e_json(&Header {
            alg: "HS256".to_string(),
            zip: None,
        })
        .unwrap();
        let payload = codec::b64e(br#"{"sub":"user","exp":99999999999,"userId":1}"#);
        let input = format!("{header}.{payload}");
        let signature = codec::b64e(&tokens.keys.sign(input.as_bytes()).unwrap());
        assert!(matches!(
            tokens.validate_at(&format!("{input}.{signature}"), NOW),
            Err(Error::UnsupportedAlgorithm(alg)) if alg == "HS256"
        ));
    }

    #[test]
    fn wrong_subject_is_refused() {
        let tokens = service("test-signing-key");
        let header = codec::b64e_json(&Header::hs512(Compression::None)).unwrap();
        let payload = codec::b64e(br#"{"sub":"admin","exp":99999999999,"userId":1}"#);
        let input = format!("{header}.{payload}");
        let signature = codec::b64e(&tokens.keys.sign(input.as_bytes()).unwrap());
        assert!(matches!(
            tokens.validate_at(&format!("{input}.{signature}"), NOW),
            Err(Error::UnexpectedSubject(sub)) if sub == "admin"
        ));
    }

    #[test]
    fn empty_signing_key_fails_construction() {
        let err = TokenService::new(TokenConfig::new(SecretString::from(String::new()))).unwrap_err();
        assert!(matches!(err, Error::SigningFailure(_)));
        assert_eq!(err.kind(), ErrorKind::CryptoUnavailable);
    }
}

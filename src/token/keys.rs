use super::Error;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha512;
use tracing::{debug, warn};

type HmacSha512 = Hmac<Sha512>;

/// HS512 keys should be at least as long as the hash output.
const RECOMMENDED_KEY_LEN: usize = 64;

/// Ordered signing keys: index 0 signs, every key verifies.
#[derive(Debug, Clone)]
pub(crate) struct KeyRing {
    keys: Vec<SecretString>,
}

impl KeyRing {
    /// # Errors
    ///
    /// Returns [`Error::SigningFailure`] if the current key is empty.
    pub(crate) fn new(current: SecretString, previous: Vec<SecretString>) -> Result<Self, Error> {
        if current.expose_secret().is_empty() {
            return Err(Error::SigningFailure("signing key is empty"));
        }
        if current.expose_secret().len() < RECOMMENDED_KEY_LEN {
            warn!("signing key is shorter than {RECOMMENDED_KEY_LEN} bytes");
        }

        let mut keys = Vec::with_capacity(previous.len() + 1);
        keys.push(current);
        keys.extend(
            previous
                .into_iter()
                .filter(|key| !key.expose_secret().is_empty()),
        );
        Ok(Self { keys })
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn sign(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        let key = self
            .keys
            .first()
            .ok_or(Error::SigningFailure("signing key is absent"))?;
        let mut mac = mac_for(key)?;
        mac.update(input);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Verify `signature` against each key in order; the tag comparison is constant time.
    pub(crate) fn verify(&self, input: &[u8], signature: &[u8]) -> Result<(), Error> {
        for (index, key) in self.keys.iter().enumerate() {
            let mut mac = mac_for(key)?;
            mac.update(input);
            if mac.verify_slice(signature).is_ok() {
                if index > 0 {
                    debug!("token verified with previous signing key #{index}");
                }
                return Ok(());
            }
        }
        Err(Error::InvalidSignature)
    }
}

fn mac_for(key: &SecretString) -> Result<HmacSha512, Error> {
    HmacSha512::new_from_slice(key.expose_secret().as_bytes())
        .map_err(|_| Error::SigningFailure("HMAC-SHA512 rejected the signing key"))
}

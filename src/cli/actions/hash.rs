use crate::cli::globals::GlobalArgs;
use crate::password::Salt;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::io::Write;
use tracing::{info, instrument};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub password: Option<SecretString>,
    pub salt: Option<String>,
}

/// Print a new credential record for the password.
///
/// # Errors
/// Returns an error if the salt is invalid or derivation fails.
#[instrument(skip_all, fields(iterations = args.globals.iterations))]
pub fn execute(args: Args, out: &mut impl Write) -> Result<()> {
    let hasher = args.globals.hasher()?;
    let password = super::password_or_stdin(args.password)?;

    let record = match args.salt {
        Some(salt) => {
            let salt = Salt::new(salt).context("invalid --salt")?;
            hasher.encode_with_salt(password.expose_secret(), salt)?
        }
        None => hasher.encode(password.expose_secret())?,
    };

    info!("encoded credential record");
    writeln!(out, "{record}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_with_given_salt() {
        let args = Args {
            globals: GlobalArgs::new(1),
            password: Some(SecretString::from("password".to_string())),
            salt: Some("salt".to_string()),
        };
        let mut out = Vec::new();
        execute(args, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "pbkdf2-hmac-sha256:1$salt$120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b\n"
        );
    }

    #[test]
    fn rejects_salt_with_separator() {
        let args = Args {
            globals: GlobalArgs::new(1),
            password: Some(SecretString::from("password".to_string())),
            salt: Some("sa$lt".to_string()),
        };
        assert!(execute(args, &mut Vec::new()).is_err());
    }
}

use crate::cli::globals::GlobalArgs;
use anyhow::{bail, Result};
use secrecy::{ExposeSecret, SecretString};
use std::io::Write;
use tracing::instrument;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub password: Option<SecretString>,
    pub record: String,
}

/// Check the password against the record; a mismatch is an error so the exit
/// status reflects it.
///
/// # Errors
/// Returns an error if the password does not match or derivation fails.
#[instrument(skip_all)]
pub fn execute(args: Args, out: &mut impl Write) -> Result<()> {
    let hasher = args.globals.hasher()?;
    let password = super::password_or_stdin(args.password)?;

    if !hasher.try_verify(password.expose_secret(), &args.record)? {
        bail!("password does not match");
    }

    writeln!(out, "ok")?;
    Ok(())
}

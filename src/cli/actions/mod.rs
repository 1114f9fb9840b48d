pub mod hash;
pub mod issue;
pub mod validate;
pub mod verify;

// The match over `Action` lives in `run` so this module only declares variants.
mod run;

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::io::BufRead;

#[derive(Debug)]
pub enum Action {
    Hash(hash::Args),
    Verify(verify::Args),
    Issue(issue::Args),
    Validate(validate::Args),
}

impl Action {
    /// Execute the action, writing its result to stdout.
    /// # Errors
    /// Returns an error if the action fails.
    pub fn execute(self) -> Result<()> {
        let stdout = std::io::stdout();
        run::execute(self, &mut stdout.lock())
    }
}

/// Use the given password or read the first line of stdin.
fn password_or_stdin(password: Option<SecretString>) -> Result<SecretString> {
    if let Some(password) = password {
        return Ok(password);
    }
    read_password(std::io::stdin().lock())
}

fn read_password(mut input: impl BufRead) -> Result<SecretString> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    Ok(SecretString::from(password.to_string()))
}

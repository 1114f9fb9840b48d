use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use std::io::Write;
use tracing::instrument;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub token: String,
}

/// Validate a token and print its claims as JSON.
///
/// # Errors
/// Returns an error if the token is malformed, forged or expired.
#[instrument(skip_all)]
pub fn execute(args: Args, out: &mut impl Write) -> Result<()> {
    let tokens = args.globals.token_service()?;
    let claims = tokens.validate(args.token.trim())?;
    serde_json::to_writer_pretty(&mut *out, &claims)?;
    writeln!(out)?;
    Ok(())
}

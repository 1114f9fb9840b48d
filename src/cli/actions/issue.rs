use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use serde_json::{Map, Value};
use std::io::Write;
use tracing::instrument;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub user_id: Value,
    pub claims: Map<String, Value>,
}

/// Print a signed session token.
///
/// # Errors
/// Returns an error if no signing key is configured or signing fails.
#[instrument(skip_all, fields(user_id = %args.user_id))]
pub fn execute(args: Args, out: &mut impl Write) -> Result<()> {
    let tokens = args.globals.token_service()?;
    let token = tokens.issue_with(args.user_id, args.claims, tokens.lifetime())?;
    writeln!(out, "{token}")?;
    Ok(())
}

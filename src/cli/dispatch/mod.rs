//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the [`Action`] the binary executes, pulling the
//! shared settings into [`GlobalArgs`] first.

use crate::cli::actions::{hash, issue, validate, verify, Action};
use crate::cli::commands::{password, token};
use crate::cli::globals::GlobalArgs;
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use serde_json::{Map, Value};

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or malformed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = globals(matches)?;

    match matches.subcommand() {
        Some(("hash", sub)) => Ok(Action::Hash(hash::Args {
            globals,
            password: secret(sub, password::ARG_PASSWORD),
            salt: sub.get_one::<String>(password::ARG_SALT).cloned(),
        })),
        Some(("verify", sub)) => Ok(Action::Verify(verify::Args {
            globals,
            password: secret(sub, password::ARG_PASSWORD),
            record: sub
                .get_one::<String>(password::ARG_RECORD)
                .cloned()
                .context("missing required argument: --record")?,
        })),
        Some(("issue", sub)) => {
            let user_id = sub
                .get_one::<String>(token::ARG_USER_ID)
                .context("missing required argument: --user-id")?;
            let claims = sub
                .get_many::<String>(token::ARG_CLAIM)
                .map(|claims| claims.map(|c| parse_claim(c)).collect::<Result<Map<_, _>>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Action::Issue(issue::Args {
                globals,
                user_id: parse_user_id(user_id),
                claims,
            }))
        }
        Some(("validate", sub)) => Ok(Action::Validate(validate::Args {
            globals,
            token: sub
                .get_one::<String>(token::ARG_TOKEN)
                .cloned()
                .context("missing required argument: <token>")?,
        })),
        Some((name, _)) => Err(anyhow!("unknown subcommand: {name}")),
        None => Err(anyhow!("missing subcommand")),
    }
}

fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let password_opts = password::Options::parse(matches)?;
    let token_opts = token::Options::parse(matches)?;

    let mut globals = GlobalArgs::new(password_opts.iterations);
    if let Some(key) = token_opts.signing_key {
        globals.set_signing_key(key);
    }
    globals.previous_signing_keys = token_opts.previous_signing_keys;
    globals.token_ttl_seconds = token_opts.ttl_seconds;
    globals.token_compression = token_opts.compression;
    Ok(globals)
}

fn secret(matches: &clap::ArgMatches, id: &str) -> Option<SecretString> {
    matches
        .get_one::<String>(id)
        .map(|value| SecretString::from(value.clone()))
}

/// Numeric ids stay numbers on the wire; anything else is a string.
fn parse_user_id(value: &str) -> Value {
    value
        .parse::<i64>()
        .map_or_else(|_| Value::from(value), Value::from)
}

/// `key=value`, where a value that parses as JSON keeps its type.
fn parse_claim(claim: &str) -> Result<(String, Value)> {
    let (key, value) = claim
        .split_once('=')
        .ok_or_else(|| anyhow!("claim must be key=value, got {claim:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("claim name is empty in {claim:?}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((key.to_string(), value))
}

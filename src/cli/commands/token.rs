use crate::token::Compression;
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use secrecy::SecretString;

pub const ARG_SIGNING_KEY: &str = "signing-key";
pub const ARG_PREVIOUS_SIGNING_KEYS: &str = "previous-signing-keys";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_TOKEN_COMPRESSION: &str = "token-compression";
pub const ARG_USER_ID: &str = "user-id";
pub const ARG_CLAIM: &str = "claim";
pub const ARG_TOKEN: &str = "token";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SIGNING_KEY)
                .long("signing-key")
                .help("HS512 signing key for session tokens")
                .env("CREDENCE_SIGNING_KEY")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_PREVIOUS_SIGNING_KEYS)
                .long("previous-signing-keys")
                .help("Retired signing keys still accepted for validation, comma separated, newest first")
                .env("CREDENCE_PREVIOUS_SIGNING_KEYS")
                .hide_env_values(true)
                .value_delimiter(',')
                .action(ArgAction::Append)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long("token-ttl-seconds")
                .help("Session token lifetime in seconds")
                .env("CREDENCE_TOKEN_TTL_SECONDS")
                .default_value("604800")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64))
                .global(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_COMPRESSION)
                .long("token-compression")
                .help("Payload compression for issued tokens: gzip, deflate or none")
                .env("CREDENCE_TOKEN_COMPRESSION")
                .default_value("gzip")
                .value_parser(|s: &str| s.parse::<Compression>())
                .global(true),
        )
}

#[must_use]
pub fn issue() -> Command {
    Command::new("issue")
        .about("Issue a session token")
        .arg(
            Arg::new(ARG_USER_ID)
                .long("user-id")
                .help("Value of the userId claim (numbers stay numeric)")
                .required(true),
        )
        .arg(
            Arg::new(ARG_CLAIM)
                .long("claim")
                .help("Extra claim as key=value; JSON values are kept typed")
                .action(ArgAction::Append),
        )
}

#[must_use]
pub fn validate() -> Command {
    Command::new("validate")
        .about("Validate a session token and print its claims")
        .arg(
            Arg::new(ARG_TOKEN)
                .help("Compact token string")
                .env("CREDENCE_TOKEN")
                .hide_env_values(true)
                .required(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub signing_key: Option<SecretString>,
    pub previous_signing_keys: Vec<SecretString>,
    pub ttl_seconds: i64,
    pub compression: Compression,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let signing_key = matches
            .get_one::<String>(ARG_SIGNING_KEY)
            .map(|key| SecretString::from(key.clone()));
        let previous_signing_keys = matches
            .get_many::<String>(ARG_PREVIOUS_SIGNING_KEYS)
            .map(|keys| {
                keys.map(|key| SecretString::from(key.trim().to_string()))
                    .collect()
            })
            .unwrap_or_default();
        let ttl_seconds = matches
            .get_one::<i64>(ARG_TOKEN_TTL_SECONDS)
            .copied()
            .context("missing required argument: --token-ttl-seconds")?;
        let compression = matches
            .get_one::<Compression>(ARG_TOKEN_COMPRESSION)
            .copied()
            .context("missing required argument: --token-compression")?;

        Ok(Self {
            signing_key,
            previous_signing_keys,
            ttl_seconds,
            compression,
        })
    }
}

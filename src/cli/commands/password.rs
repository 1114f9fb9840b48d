use crate::password::MAX_ITERATIONS;
use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_ITERATIONS: &str = "iterations";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_SALT: &str = "salt";
pub const ARG_RECORD: &str = "record";

pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_ITERATIONS)
            .long("iterations")
            .help("PBKDF2 iteration count for new credential records")
            .env("CREDENCE_ITERATIONS")
            .global(true)
            .default_value("150000")
            .value_parser(clap::value_parser!(u32).range(1..=i64::from(MAX_ITERATIONS))),
    )
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long("password")
        .help("Plaintext password (read from stdin when omitted)")
        .env("CREDENCE_PASSWORD")
        .hide_env_values(true)
}

#[must_use]
pub fn hash() -> Command {
    Command::new("hash")
        .about("Encode a password into a credential record")
        .arg(password_arg())
        .arg(
            Arg::new(ARG_SALT)
                .long("salt")
                .help("Use this salt instead of a freshly generated one"),
        )
}

#[must_use]
pub fn verify() -> Command {
    Command::new("verify")
        .about("Check a password against a credential record")
        .arg(password_arg())
        .arg(
            Arg::new(ARG_RECORD)
                .long("record")
                .help("Stored credential record: <algorithm>:<iterations>$<salt>$<digest>")
                .env("CREDENCE_RECORD")
                .required(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub iterations: u32,
}

impl Options {
    /// # Errors
    /// Returns an error if the iteration count is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let iterations = matches
            .get_one::<u32>(ARG_ITERATIONS)
            .copied()
            .context("missing required argument: --iterations")?;
        Ok(Self { iterations })
    }
}

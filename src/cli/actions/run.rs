use crate::cli::actions::{hash, issue, validate, verify, Action};
use anyhow::Result;
use std::io::Write;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub fn execute(action: Action, out: &mut impl Write) -> Result<()> {
    match action {
        Action::Hash(args) => hash::execute(args, out),
        Action::Verify(args) => verify::execute(args, out),
        Action::Issue(args) => issue::execute(args, out),
        Action::Validate(args) => validate::execute(args, out),
    }
}

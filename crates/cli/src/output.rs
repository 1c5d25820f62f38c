//! Terminal output. Results go to stdout as pretty JSON or plain lines; logs
//! go to stderr.

use serde::Serialize;

use crate::commands::CommandError;

/// Print `value` as pretty JSON.
#[allow(clippy::print_stdout)]
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print one line.
#[allow(clippy::print_stdout)]
pub fn line(text: impl std::fmt::Display) {
    println!("{text}");
}

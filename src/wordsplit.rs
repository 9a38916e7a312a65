//! Shell-style word splitting for the command portion of a tab line.

use crate::error::{CroreError, Result};

/// Split a command string into argv using POSIX-like shell quoting rules.
///
/// An empty or all-whitespace command, or one that `shlex` cannot tokenize
/// (e.g. unbalanced quotes), is a `BadCommand` error.
pub fn split_command(s: &str) -> Result<Vec<String>> {
    let argv = shlex::split(s)
        .ok_or_else(|| CroreError::bad_command(format!("unbalanced quoting in {s:?}")))?;

    if argv.is_empty() {
        return Err(CroreError::bad_command("command is empty"));
    }

    Ok(argv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_words() {
        assert_eq!(split_command("echo hello world").unwrap(), vec!["echo", "hello", "world"]);
    }

    #[test]
    fn respects_quoting() {
        assert_eq!(
            split_command("echo \"hello world\"").unwrap(),
            vec!["echo", "hello world"]
        );
    }

    #[test]
    fn rejects_unbalanced_quotes() {
        assert!(split_command("echo \"unterminated").is_err());
    }

    #[test]
    fn rejects_empty_command() {
        assert!(split_command("   ").is_err());
    }
}

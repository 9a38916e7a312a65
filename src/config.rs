//! Configuration model, config file reader, and tabfile reader
//!
//! These three pieces let the crate run standalone rather than depend on
//! something else to supply a parsed configuration and job lines. All
//! three run once at startup — there is no reload.

use crate::error::{CroreError, Result};
use crate::log::Verbosity;
use crate::wordsplit::split_command;
use std::fs;
use std::path::Path;

/// Immutable, fully-resolved configuration passed to the scheduling loop.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub verbosity: Verbosity,
    pub legacy: bool,
    pub envs: Vec<(String, String)>,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            legacy: false,
            envs: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
        }
    }
}

/// The subset of `Configuration` a config file can set, plus the two
/// tabfile-selection keys that don't belong on `Configuration` itself.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub tabfile: Option<String>,
    pub notabfile: bool,
    pub before: Option<Vec<String>>,
    pub after: Option<Vec<String>>,
    pub legacy: bool,
    pub private: bool,
    pub silent: bool,
    pub envs: Vec<(String, String)>,
}

/// Parse `key = val` lines from a config file. Blank lines and lines whose
/// first non-whitespace character is `#` are skipped. Every other line must
/// contain the literal substring `" = "`. Unrecognized keys become child
/// environment variable assignments.
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let text = fs::read_to_string(path)?;
    let mut config = ConfigFile::default();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(sep) = trimmed.find(" = ") else {
            return Err(CroreError::BadConfigLine { line: line_no, text: line.to_string() });
        };
        let key = trimmed[..sep].trim();
        let value = trimmed[sep + 3..].trim();

        match key {
            "tabfile" => config.tabfile = Some(value.to_string()),
            "notabfile" => config.notabfile = true,
            "before" => config.before = Some(split_command(value)?),
            "after" => config.after = Some(split_command(value)?),
            "legacy" => config.legacy = true,
            "private" => config.private = true,
            "silent" => config.silent = true,
            _ => config.envs.push((key.to_string(), value.to_string())),
        }
    }

    Ok(config)
}

/// Read a crontab file into non-empty, non-comment lines, each paired with
/// its 1-based line number in the original file so construction errors can
/// be reported with location.
pub fn read_tabfile(path: &Path) -> Result<Vec<(usize, String)>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.to_string()))
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .collect())
}

//! Command-line flags and the merge of flags, config file, and tabfile into
//! one immutable `Configuration` plus job set.
//!
//! CLI flags take precedence over same-named config-file keys; booleans OR
//! together (either source asking for silent/legacy/etc. is enough), `-t`
//! and `before`/`after` replace the config-file value outright when given,
//! and env assignments from both sources accumulate in the order read,
//! config file first.

use crate::config::{read_config_file, read_tabfile, Configuration, ConfigFile};
use crate::error::{CroreError, Result};
use crate::log::Verbosity;
use crate::wordsplit::split_command;
use clap::Parser;
use std::path::PathBuf;

/// A lightweight cron daemon.
#[derive(Parser, Debug)]
#[command(name = "crore", about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Print version and exit, bypassing every other flag.
    #[arg(short = 'v')]
    pub version: bool,

    /// After-hook command, run once following each job.
    #[arg(short = 'a', value_name = "CMD")]
    pub after: Option<String>,

    /// Before-hook command, run once preceding each job.
    #[arg(short = 'b', value_name = "CMD")]
    pub before: Option<String>,

    /// Environment variable for children, `KEY=VALUE`. May be repeated.
    #[arg(short = 'e', value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Legacy mode: capture and log child stdout/stderr, ignore exit status.
    #[arg(short = 'l')]
    pub legacy: bool,

    /// Do not read any tab file.
    #[arg(short = 'n')]
    pub no_tabfile: bool,

    /// Verbosity = PRIVATE (log activity but redact commands and env values).
    #[arg(short = 'p')]
    pub private: bool,

    /// Verbosity = SILENT (no log output at all).
    #[arg(short = 's')]
    pub silent: bool,

    /// Tab file path (default: $HOME/.config/crore/tab).
    #[arg(short = 't', value_name = "PATH")]
    pub tabfile: Option<PathBuf>,

    /// Extra cron line, appended to the loaded tab. May be repeated.
    #[arg(short = 'x', value_name = "EXPR")]
    pub extra: Vec<String>,
}

/// The default config-file location, chosen by analogy to the tabfile's
/// own default (see DESIGN.md).
fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".config").join("crore").join("rc"))
}

fn default_tabfile_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|h| h.join(".config").join("crore").join("tab"))
        .ok_or_else(|| CroreError::BadArgs("could not determine home directory".to_string()))
}

/// One raw job line plus its 1-based origin line number for error
/// reporting, whether it came from the tab file or a `-x` flag.
pub struct RawLine {
    pub line_no: usize,
    pub text: String,
}

/// Assemble a `Configuration` and the raw job lines it should schedule,
/// from parsed CLI flags plus whatever config file and tab file they (or
/// their defaults) point to. Everything here runs once, at startup.
pub fn assemble(cli: Cli) -> Result<(Configuration, Vec<RawLine>)> {
    let config_file = match default_config_path() {
        Some(path) if path.is_file() => read_config_file(&path)?,
        _ => ConfigFile::default(),
    };

    let verbosity = if cli.silent || config_file.silent {
        Verbosity::Silent
    } else if cli.private || config_file.private {
        Verbosity::Private
    } else {
        Verbosity::Normal
    };

    let legacy = cli.legacy || config_file.legacy;

    let before = match cli.before {
        Some(cmd) => split_command(&cmd)?,
        None => config_file.before.unwrap_or_default(),
    };
    let after = match cli.after {
        Some(cmd) => split_command(&cmd)?,
        None => config_file.after.unwrap_or_default(),
    };

    let mut envs = config_file.envs;
    for assignment in &cli.env {
        envs.push(parse_env_assignment(assignment)?);
    }

    let configuration = Configuration { verbosity, legacy, envs, before, after };

    let no_tabfile = cli.no_tabfile || config_file.notabfile;
    let mut lines: Vec<RawLine> = Vec::new();
    if !no_tabfile {
        let tabfile = match cli.tabfile.or(config_file.tabfile.map(PathBuf::from)) {
            Some(path) => path,
            None => default_tabfile_path()?,
        };
        for (line_no, text) in read_tabfile(&tabfile)? {
            lines.push(RawLine { line_no, text });
        }
    }

    let next_line_no = lines.last().map_or(1, |l| l.line_no + 1);
    for (offset, expr) in cli.extra.into_iter().enumerate() {
        lines.push(RawLine { line_no: next_line_no + offset, text: expr });
    }

    Ok((configuration, lines))
}

fn parse_env_assignment(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        CroreError::BadArgs(format!("-e expects KEY=VALUE, got {raw:?}"))
    })?;
    Ok((key.to_string(), value.to_string()))
}

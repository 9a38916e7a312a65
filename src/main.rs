//! crore: a lightweight cron daemon
//!
//! Parses flags, merges them with a config file and a tab file into a job
//! set and a `Configuration`, then hands both to the scheduling loop, which
//! runs forever. Everything here is fatal: a flag error, a bad config
//! line, an invalid cron expression, an empty tab, or an unreadable tab
//! file all exit non-zero before the loop starts.

use chrono::Utc;
use clap::Parser;
use crore::cli::{self, Cli};
use crore::error::CroreError;
use crore::job::new_job;
use crore::log::{HookKind, Logger};
use crore::scheduler;

fn main() {
    if let Err(e) = run() {
        eprintln!("crore: {e}");
        std::process::exit(1);
    }
}

fn run() -> crore::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if cli.version {
        println!("crore {}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }
    let (config, lines) = cli::assemble(cli)?;

    let logger = Logger::new(config.verbosity);
    for (key, value) in &config.envs {
        logger.env_registered(key, value);
    }
    if !config.before.is_empty() {
        logger.hook_registered(HookKind::Before, &config.before);
    }
    if !config.after.is_empty() {
        logger.hook_registered(HookKind::After, &config.after);
    }

    let now = Utc::now();
    let mut jobs = Vec::with_capacity(lines.len());
    for raw in &lines {
        let job = new_job(&raw.text, now).map_err(|e| e.with_line(raw.line_no))?;
        jobs.push(job);
    }

    if jobs.is_empty() {
        return Err(CroreError::EmptyTab);
    }

    tracing::debug!(job_count = jobs.len(), "crore starting scheduling loop");
    scheduler::run(jobs, &config);
}

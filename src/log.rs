//! Log sink
//!
//! A single verbosity gate with three levels, all writing to stdout with a
//! `crore:` prefix. Lines are hand-formatted with `println!` rather than
//! routed through a structured-logging crate: the literal strings below are
//! part of the daemon's observable behavior, and matching them exactly is
//! simpler this way than through a generic subscriber's formatting layer.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Silent,
    Private,
    Normal,
}

/// What the loop is sleeping until / waking for: either a single job's
/// command line, or a count of jobs sharing the same earliest `next_run`.
pub enum SleepTarget<'a> {
    Job(&'a str),
    Coincident(usize),
}

impl fmt::Display for SleepTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SleepTarget::Job(cmd) => write!(f, "{cmd}"),
            SleepTarget::Coincident(n) => write!(f, "{n} coincident jobs"),
        }
    }
}

pub struct Logger {
    verbosity: Verbosity,
}

impl Logger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn env_registered(&self, key: &str, value: &str) {
        match self.verbosity {
            Verbosity::Silent => {}
            Verbosity::Private => println!("crore: env: {key}={{redacted}}"),
            Verbosity::Normal => println!("crore: env: {key}={value}"),
        }
    }

    pub fn hook_registered(&self, kind: HookKind, argv: &[String]) {
        let label = kind.register_label();
        match self.verbosity {
            Verbosity::Silent => {}
            Verbosity::Private => println!("crore: {label}"),
            Verbosity::Normal => println!("crore: {label}: {}", argv.join(" ")),
        }
    }

    pub fn sleeping(&self, seconds: i64, target: SleepTarget) {
        match self.verbosity {
            Verbosity::Silent => {}
            Verbosity::Private => println!("crore: sleeping {seconds}s"),
            Verbosity::Normal => println!("crore: sleeping {seconds}s until: {target}"),
        }
    }

    pub fn awake(&self, target: SleepTarget) {
        match self.verbosity {
            Verbosity::Silent => {}
            Verbosity::Private => println!("crore: awake"),
            Verbosity::Normal => println!("crore: awake for: {target}"),
        }
    }

    pub fn hook_fired(&self, kind: HookKind) {
        let label = kind.fired_label();
        match self.verbosity {
            Verbosity::Silent => {}
            Verbosity::Private | Verbosity::Normal => println!("crore: {label}"),
        }
    }

    pub fn child_nonzero(&self, code: i32, cmd: &str) {
        match self.verbosity {
            Verbosity::Silent => {}
            Verbosity::Private | Verbosity::Normal => {
                println!("crore: cronjob exited status {code} ({cmd})")
            }
        }
    }

    pub fn child_signaled(&self, signo: i32, cmd: &str) {
        match self.verbosity {
            Verbosity::Silent => {}
            Verbosity::Private | Verbosity::Normal => {
                println!("crore: cronjob exited from signal {signo} ({cmd})")
            }
        }
    }

    /// A child could not be spawned at all: logged at PRIVATE and NORMAL,
    /// same shape as the nonzero-exit line.
    pub fn spawn_error(&self, cmd: &str, detail: &str) {
        match self.verbosity {
            Verbosity::Silent => {}
            Verbosity::Private | Verbosity::Normal => {
                println!("crore: failed to spawn ({cmd}): {detail}")
            }
        }
    }

    pub fn legacy_output(&self, cmd: &str, stdout: &str, stderr: &str) {
        match self.verbosity {
            Verbosity::Silent => {}
            Verbosity::Private => println!("crore: got non-empty output (check logs)"),
            Verbosity::Normal => {
                println!("crore: got non-empty output from `{cmd}`:");
                if !stdout.is_empty() {
                    print!("{stdout}");
                }
                if !stderr.is_empty() {
                    eprint!("{stderr}");
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Before,
    After,
}

impl HookKind {
    fn register_label(self) -> &'static str {
        match self {
            HookKind::Before => "registered before-hook",
            HookKind::After => "registered after-hook",
        }
    }

    fn fired_label(self) -> &'static str {
        match self {
            HookKind::Before => "before-hook",
            HookKind::After => "after-hook",
        }
    }
}

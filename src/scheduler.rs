//! Scheduling loop
//!
//! Ties together job selection, sleeping, dispatch, hooks, and rescheduling
//! into the steady-state loop: pick the earliest due job, sleep until it
//! fires, run every job that's due, then reschedule each. The loop itself
//! (`run`) is a thin `DateTime::now`/`thread::sleep` shell around the four
//! pure-ish steps below, so those steps can be exercised directly in tests
//! without a real wall-clock wait.

use crate::config::Configuration;
use crate::executor::{self, ExecStatus};
use crate::job::{reschedule, CronJob};
use crate::log::{HookKind, Logger, SleepTarget};
use chrono::{DateTime, Utc};
use std::thread;
use std::time::Duration as StdDuration;

/// What the loop is about to sleep until: the earliest `next_run` across
/// the job set, how many jobs share it, and one of their command lines for
/// display (arbitrary among ties, since the log line only names one).
pub struct Selection {
    pub at: DateTime<Utc>,
    pub coincident: usize,
    pub sample_command: String,
}

impl Selection {
    pub fn target(&self) -> SleepTarget<'_> {
        if self.coincident > 1 {
            SleepTarget::Coincident(self.coincident)
        } else {
            SleepTarget::Job(&self.sample_command)
        }
    }
}

/// Scan the job set once, finding the minimum `next_run` and counting ties.
/// Panics if `jobs` is empty — the caller (main, via `EmptyTab`) never lets
/// an empty job set reach the loop.
pub fn select(jobs: &[CronJob]) -> Selection {
    let earliest = jobs.iter().map(|j| j.next_run).min().expect("job set must be non-empty");
    let mut coincident = 0;
    let mut sample_command = String::new();
    for job in jobs {
        if job.next_run == earliest {
            coincident += 1;
            if sample_command.is_empty() {
                sample_command = job.command_line();
            }
        }
    }
    Selection { at: earliest, coincident, sample_command }
}

/// Indices, in job-set (insertion) order, of every job whose `next_run` has
/// arrived by `now`.
pub fn due(jobs: &[CronJob], now: DateTime<Utc>) -> Vec<usize> {
    jobs.iter()
        .enumerate()
        .filter(|(_, j)| j.next_run <= now)
        .map(|(i, _)| i)
        .collect()
}

/// Run every due job in order, with before/after hooks around each. No two
/// executions overlap: this function does not return until all of them
/// have completed.
pub fn dispatch_due(jobs: &[CronJob], due_idx: &[usize], config: &Configuration, logger: &Logger) {
    for &idx in due_idx {
        dispatch_one(&jobs[idx], config, logger);
    }
}

fn dispatch_one(job: &CronJob, config: &Configuration, logger: &Logger) {
    run_before_hook(config, logger);

    let cmd_line = job.command_line();
    let envs = [config.envs.clone()];
    let (result, duration) = if config.legacy {
        let (output, duration) = executor::exec_legacy(&job.command, &envs);
        let stderr = match output {
            Ok((stdout, stderr)) => {
                if !stdout.is_empty() || !stderr.is_empty() {
                    logger.legacy_output(&cmd_line, &stdout, &stderr);
                }
                stderr
            }
            Err(detail) => {
                logger.spawn_error(&cmd_line, &detail);
                String::new()
            }
        };
        (stderr, duration)
    } else {
        let (status, duration) = executor::exec(&job.command, &envs);
        match &status {
            ExecStatus::Exited(code) => {
                if !status.is_success() {
                    logger.child_nonzero(*code, &cmd_line);
                }
            }
            ExecStatus::Signaled(signo) => logger.child_signaled(*signo, &cmd_line),
            ExecStatus::SpawnError(detail) => logger.spawn_error(&cmd_line, detail),
        }
        (status.result_string(), duration)
    };

    run_after_hook(config, logger, &result, duration);
}

fn run_before_hook(config: &Configuration, logger: &Logger) {
    if config.before.is_empty() {
        return;
    }
    logger.hook_fired(HookKind::Before);
    let overlay = vec![("CRORE_COMMAND".to_string(), config.before.join(" "))];
    let envs = [config.envs.clone(), overlay];
    let _ = executor::exec(&config.before, &envs);
}

fn run_after_hook(config: &Configuration, logger: &Logger, result: &str, duration: StdDuration) {
    if config.after.is_empty() {
        return;
    }
    logger.hook_fired(HookKind::After);
    let micros = (duration.as_nanos() / 1000).to_string();
    let overlay = vec![
        ("CRORE_COMMAND".to_string(), config.after.join(" ")),
        ("CRORE_RESULT".to_string(), result.to_string()),
        ("CRORE_DURATION".to_string(), micros),
    ];
    let envs = [config.envs.clone(), overlay];
    let _ = executor::exec(&config.after, &envs);
}

/// Reschedule every job named in `due_idx`, from `now`. Dispatch for the
/// whole tick must already be complete — no job re-fires within the same
/// tick even if its newly-computed `next_run` is already in the past.
pub fn reschedule_due(jobs: &mut [CronJob], due_idx: &[usize], now: DateTime<Utc>) -> crate::Result<()> {
    for &idx in due_idx {
        reschedule(&mut jobs[idx], now)?;
    }
    Ok(())
}

/// One pass: select, sleep, dispatch, reschedule. Never returns an error
/// except from a reschedule, which can't happen for an expression that
/// parsed successfully at construction.
fn tick(jobs: &mut Vec<CronJob>, config: &Configuration, logger: &Logger) -> crate::Result<()> {
    let selection = select(jobs);
    let now = Utc::now();
    let delta = selection.at - now;
    if delta > chrono::Duration::zero() {
        // `next_run` always lands on a whole second while `now` almost
        // never does; round the gap up rather than truncating it down, or
        // the loop wakes early and busy-spins through the leftover
        // fractional second until the job is actually due.
        let whole_secs = delta.num_seconds();
        let remainder = delta - chrono::Duration::seconds(whole_secs);
        let secs = if remainder > chrono::Duration::zero() { whole_secs + 1 } else { whole_secs };
        logger.sleeping(secs, selection.target());
        thread::sleep(StdDuration::from_secs(secs.max(0) as u64));
    }
    logger.awake(selection.target());

    let now = Utc::now();
    let due_idx = due(jobs, now);
    dispatch_due(jobs, &due_idx, config, logger);

    let now = Utc::now();
    reschedule_due(jobs, &due_idx, now)
}

/// The steady-state loop. Never returns: process termination (signal,
/// `kill`) is the only way out.
pub fn run(mut jobs: Vec<CronJob>, config: &Configuration) -> ! {
    let logger = Logger::new(config.verbosity);
    loop {
        if let Err(e) = tick(&mut jobs, config, &logger) {
            // Reschedule cannot fail for an expression that parsed at
            // construction. If it somehow does, this is a bug, not a
            // recoverable runtime condition worth masking.
            panic!("reschedule failed for an already-validated expression: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::new_job;
    use chrono::TimeZone;
    use std::fs;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn select_picks_the_minimum_and_counts_ties() {
        let now = at(2025, 6, 1, 12, 0, 0);
        let jobs = vec![
            new_job("0 0 1 1 * /bin/true", now).unwrap(),
            new_job("* * * * * /bin/true", now).unwrap(),
            new_job("* * * * * /bin/false", now).unwrap(),
        ];
        let sel = select(&jobs);
        assert_eq!(sel.at, at(2025, 6, 1, 12, 1, 0));
        assert_eq!(sel.coincident, 2);
    }

    #[test]
    fn due_returns_indices_in_insertion_order() {
        let now = at(2025, 6, 1, 12, 0, 30);
        let mut jobs = vec![
            new_job("* * * * * /bin/true", now).unwrap(),
            new_job("* * * * * /bin/false", now).unwrap(),
        ];
        for j in jobs.iter_mut() {
            j.next_run = at(2025, 6, 1, 12, 1, 0);
        }
        let idx = due(&jobs, at(2025, 6, 1, 12, 1, 0));
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn dispatch_runs_jobs_in_insertion_order_without_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("order.log");
        let now = at(2025, 6, 1, 12, 0, 0);

        let cmd_for = |tag: &str| {
            format!(
                "* * * * * /bin/sh -c \"echo {tag} >> {}\"",
                log_path.to_str().unwrap()
            )
        };
        let jobs = vec![
            new_job(&cmd_for("first"), now).unwrap(),
            new_job(&cmd_for("second"), now).unwrap(),
            new_job(&cmd_for("third"), now).unwrap(),
        ];

        let config = Configuration::default();
        let logger = Logger::new(config.verbosity);
        let idx = due(&jobs, jobs[0].next_run);
        dispatch_due(&jobs, &idx, &config, &logger);

        let recorded = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = recorded.lines().collect();
        assert_eq!(lines, vec!["first", "second", "third"]);
    }

    #[test]
    fn reschedule_due_advances_only_the_named_jobs() {
        let now = at(2025, 6, 1, 12, 0, 30);
        let mut jobs = vec![
            new_job("* * * * * /bin/true", now).unwrap(),
            new_job("0 0 1 1 * /bin/true", now).unwrap(),
        ];
        let untouched = jobs[1].next_run;
        reschedule_due(&mut jobs, &[0], now).unwrap();
        assert!(jobs[0].next_run > now);
        assert_eq!(jobs[1].next_run, untouched);
    }

    #[test]
    fn after_hook_receives_command_result_and_duration_env_vars() {
        let dir = tempfile::tempdir().unwrap();
        let capture_path = dir.path().join("after_env.txt");
        let now = at(2025, 6, 1, 12, 0, 0);

        let job = new_job("* * * * * /bin/sh -c \"exit 3\"", now).unwrap();
        let mut config = Configuration::default();
        config.after = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            format!(
                "printf '%s|%s|%s' \"$CRORE_COMMAND\" \"$CRORE_RESULT\" \"$CRORE_DURATION\" > {}",
                capture_path.to_str().unwrap()
            ),
        ];

        let logger = Logger::new(config.verbosity);
        dispatch_one(&job, &config, &logger);

        let captured = fs::read_to_string(&capture_path).unwrap();
        let parts: Vec<&str> = captured.splitn(3, '|').collect();
        assert_eq!(parts[0], config.after.join(" "));
        assert_eq!(parts[1], "3");
        // No leading zeros, other than a lone "0".
        assert!(!parts[2].is_empty());
        assert!(parts[2] == "0" || !parts[2].starts_with('0'));
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn legacy_mode_logs_captured_output_and_passes_stderr_as_after_hook_result() {
        let dir = tempfile::tempdir().unwrap();
        let capture_path = dir.path().join("after_env.txt");
        let now = at(2025, 6, 1, 12, 0, 0);

        let job = new_job(
            "* * * * * /bin/sh -c \"echo hi; echo oops 1>&2\"",
            now,
        )
        .unwrap();
        let mut config = Configuration::default();
        config.legacy = true;
        config.after = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            format!(
                "printf '%s' \"$CRORE_RESULT\" > {}",
                capture_path.to_str().unwrap()
            ),
        ];

        let logger = Logger::new(config.verbosity);
        dispatch_one(&job, &config, &logger);

        let captured = fs::read_to_string(&capture_path).unwrap();
        assert_eq!(captured, "oops\n");
    }

    #[test]
    fn legacy_mode_spawn_failure_is_logged_instead_of_silently_succeeding() {
        let now = at(2025, 6, 1, 12, 0, 0);
        let job = new_job("* * * * * /no/such/executable-crore-test", now).unwrap();
        let mut config = Configuration::default();
        config.legacy = true;

        let logger = Logger::new(config.verbosity);
        // Exercised for the side effect (no panic) and to confirm the
        // legacy spawn-error path runs the same recovery as the non-legacy
        // one rather than returning silently as if the job had succeeded.
        dispatch_one(&job, &config, &logger);
    }
}

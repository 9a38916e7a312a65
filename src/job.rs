//! Job record
//!
//! A `CronJob` is constructed once from a raw tab line at startup and lives
//! for the life of the process. Its expression and command are immutable;
//! only `next_run` is ever rewritten, and only by the scheduling loop.

use crate::error::{CroreError, Result};
use crate::resolver::next_fire;
use crate::term::{parse_field, TermList};
use crate::wordsplit::split_command;
use chrono::{DateTime, Utc};

pub const MINUTE_RANGE: (i32, i32) = (0, 59);
pub const HOUR_RANGE: (i32, i32) = (0, 23);
pub const DOM_RANGE: (i32, i32) = (1, 31);
pub const MONTH_RANGE: (i32, i32) = (1, 12);
pub const DOW_RANGE: (i32, i32) = (0, 6);

/// The parsed five-field cron expression, plus the raw strings it was
/// parsed from (kept only for display and error messages).
#[derive(Debug, Clone)]
pub struct Expression {
    pub minute: TermList,
    pub hour: TermList,
    pub dom: TermList,
    pub month: TermList,
    pub dow: TermList,
    pub raw: [String; 5],
}

impl Expression {
    fn parse(fields: &[&str; 5]) -> Result<Self> {
        Ok(Self {
            minute: parse_field(fields[0], MINUTE_RANGE.0, MINUTE_RANGE.1)?,
            hour: parse_field(fields[1], HOUR_RANGE.0, HOUR_RANGE.1)?,
            dom: parse_field(fields[2], DOM_RANGE.0, DOM_RANGE.1)?,
            month: parse_field(fields[3], MONTH_RANGE.0, MONTH_RANGE.1)?,
            dow: parse_field(fields[4], DOW_RANGE.0, DOW_RANGE.1)?,
            raw: fields.map(String::from),
        })
    }

    fn next_fire(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        next_fire(&self.minute, &self.hour, &self.dom, &self.month, &self.dow, now)
    }
}

/// One line of the tab: a schedule plus the command it runs.
#[derive(Debug, Clone)]
pub struct CronJob {
    pub expression: Expression,
    pub command: Vec<String>,
    pub next_run: DateTime<Utc>,
}

impl CronJob {
    /// Display form of the command, e.g. for log lines.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Split a tab line into its five schedule fields and command portion.
///
/// Fields are whitespace-separated; the command is everything after the
/// fifth field, whitespace-trimmed but otherwise untouched (so quoting is
/// preserved for the word splitter).
fn split_line(line: &str) -> Result<([String; 5], String)> {
    let mut rest = line;
    let mut fields: Vec<String> = Vec::with_capacity(5);

    for _ in 0..5 {
        let trimmed = rest.trim_start();
        let idx = trimmed
            .find(char::is_whitespace)
            .ok_or_else(|| CroreError::invalid_expression("expected 5 fields followed by a command"))?;
        fields.push(trimmed[..idx].to_string());
        rest = &trimmed[idx..];
    }

    let command = rest.trim_start().to_string();
    if command.is_empty() {
        return Err(CroreError::invalid_expression(
            "expected 5 fields followed by a command",
        ));
    }

    Ok(([fields[0].clone(), fields[1].clone(), fields[2].clone(), fields[3].clone(), fields[4].clone()], command))
}

/// Build a `CronJob` from one raw tab line, resolving its first `next_run`
/// against `now`.
pub fn new_job(line: &str, now: DateTime<Utc>) -> Result<CronJob> {
    let (fields, command_str) = split_line(line)?;
    let field_refs: [&str; 5] = [&fields[0], &fields[1], &fields[2], &fields[3], &fields[4]];

    let command = split_command(&command_str)?;
    let expression = Expression::parse(&field_refs)?;
    let next_run = expression.next_fire(now)?;

    Ok(CronJob { expression, command, next_run })
}

/// Recompute `next_run` from the current instant. Never fails for an
/// expression that parsed successfully at construction.
pub fn reschedule(job: &mut CronJob, now: DateTime<Utc>) -> Result<()> {
    job.next_run = job.expression.next_fire(now)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn parses_a_well_formed_line() {
        let now = at(2025, 6, 1, 12, 0, 30);
        let job = new_job("* * * * * /bin/true", now).unwrap();
        assert_eq!(job.command, vec!["/bin/true"]);
        assert_eq!(job.next_run, at(2025, 6, 1, 12, 1, 0));
    }

    #[test]
    fn preserves_quoted_command_arguments() {
        let now = at(2025, 6, 1, 12, 0, 0);
        let job = new_job(r#"* * * * * echo "hello world""#, now).unwrap();
        assert_eq!(job.command, vec!["echo", "hello world"]);
    }

    #[test]
    fn rejects_fewer_than_six_tokens() {
        let now = at(2025, 6, 1, 12, 0, 0);
        assert!(new_job("* * * * *", now).is_err());
    }

    #[test]
    fn rejects_bad_cron_fields() {
        let now = at(2025, 6, 1, 12, 0, 0);
        assert!(new_job("60 * * * * /bin/true", now).is_err());
    }

    #[test]
    fn rejects_unbalanced_quotes_in_command() {
        let now = at(2025, 6, 1, 12, 0, 0);
        assert!(new_job("* * * * * echo \"oops", now).is_err());
    }

    #[test]
    fn reschedule_advances_next_run() {
        let now = at(2025, 6, 1, 12, 0, 30);
        let mut job = new_job("* * * * * /bin/true", now).unwrap();
        let first = job.next_run;
        reschedule(&mut job, first).unwrap();
        assert!(job.next_run > first);
    }
}

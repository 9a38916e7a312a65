//! Integration tests for the config-file and tabfile readers, exercised
//! against real files on disk rather than in-memory strings.

use crore::config::{read_config_file, read_tabfile};
use crore::job::new_job;
use chrono::{TimeZone, Utc};
use std::io::Write;

#[test]
fn config_file_and_tabfile_round_trip_from_real_files() {
    let dir = tempfile::tempdir().unwrap();

    let config_path = dir.path().join("rc");
    let mut config_file = std::fs::File::create(&config_path).unwrap();
    writeln!(config_file, "# crore config").unwrap();
    writeln!(config_file, "legacy = yes").unwrap();
    writeln!(config_file, "before = echo starting").unwrap();
    writeln!(config_file, "MAILTO = ops@example.com").unwrap();
    drop(config_file);

    let config = read_config_file(&config_path).unwrap();
    assert!(config.legacy);
    assert_eq!(config.before, Some(vec!["echo".to_string(), "starting".to_string()]));
    assert_eq!(config.envs, vec![("MAILTO".to_string(), "ops@example.com".to_string())]);

    let tab_path = dir.path().join("tab");
    let mut tab_file = std::fs::File::create(&tab_path).unwrap();
    writeln!(tab_file, "# nightly backup").unwrap();
    writeln!(tab_file, "0 2 * * * /usr/local/bin/backup.sh").unwrap();
    writeln!(tab_file).unwrap();
    writeln!(tab_file, "*/15 * * * * /usr/local/bin/healthcheck.sh").unwrap();
    drop(tab_file);

    let lines = read_tabfile(&tab_path).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].0, 2);
    assert_eq!(lines[1].0, 4);

    let now = Utc.with_ymd_and_hms(2025, 6, 1, 1, 0, 0).unwrap();
    for (_, text) in &lines {
        new_job(text, now).unwrap();
    }
}

#[test]
fn config_file_rejects_a_malformed_line_with_its_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("rc");
    let mut config_file = std::fs::File::create(&config_path).unwrap();
    writeln!(config_file, "legacy = yes").unwrap();
    writeln!(config_file, "this is garbage").unwrap();
    drop(config_file);

    let err = read_config_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn tabfile_line_numbers_survive_into_job_construction_errors() {
    let dir = tempfile::tempdir().unwrap();
    let tab_path = dir.path().join("tab");
    let mut tab_file = std::fs::File::create(&tab_path).unwrap();
    writeln!(tab_file, "* * * * * /bin/true").unwrap();
    writeln!(tab_file, "99 * * * * /bin/true").unwrap();
    drop(tab_file);

    let lines = read_tabfile(&tab_path).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 1, 0, 0).unwrap();

    let (bad_line_no, bad_text) = &lines[1];
    let err = new_job(bad_text, now).unwrap_err().with_line(*bad_line_no);
    assert!(err.to_string().contains("line 2"));
}

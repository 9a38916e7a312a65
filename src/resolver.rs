//! Next-fire resolver
//!
//! Computes the next UTC instant at which a job's five fields all match,
//! starting from a reference instant, without scanning minute-by-minute
//! through the future. The one bounded linear scan in this module walks
//! whole days, not minutes, and only when the day-of-week field is
//! restricted (see `resolve_date`).

use crate::error::{CroreError, Result};
use crate::term::TermList;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

/// Smallest `w` in `[term.min, term.max]` matching `term` with `w >= v` (if
/// `include_current`) or `w > v`. Returns `term.min` if no such `w` exists,
/// signaling to the caller that this term wrapped.
fn next_applicable(term: &crate::term::Term, v: i32, include_current: bool) -> i32 {
    let v_eff = if include_current { v } else { v + 1 };
    if v_eff <= term.min {
        return term.min;
    }
    if v_eff > term.max {
        return term.min;
    }
    let w = ((v_eff + term.step - 1) / term.step) * term.step;
    if w > term.max {
        term.min
    } else {
        w
    }
}

/// Advance one field's term list past (or at) `v`, reporting whether the
/// field wrapped back to its minimum.
fn condense(term_list: &TermList, global_max: i32, v: i32, include_current: bool) -> (i32, bool) {
    let v_adj = if include_current { v } else { v + 1 };
    if v_adj > global_max {
        let min_of_mins = term_list.terms().iter().map(|t| t.min).min().unwrap();
        return (min_of_mins, true);
    }

    let mut best: Option<i32> = None;
    for t in term_list.terms() {
        let cand = next_applicable(t, v_adj, true);
        if cand >= v_adj {
            best = Some(best.map_or(cand, |b: i32| b.min(cand)));
        }
    }

    match best {
        Some(b) => (b, false),
        None => {
            let min_of_mins = term_list.terms().iter().map(|t| t.min).min().unwrap();
            (min_of_mins, true)
        }
    }
}

/// Build a calendar date, rescuing the one recurring case where a
/// valid-looking day/month combination doesn't exist in every year:
/// `month == 2, day == 29` exists only in leap years, so advance year by
/// year (capped) until one is found. Any other construction failure (e.g.
/// day 30 of February, day 31 of April) can never become valid and is a
/// bug in the submitted expression.
fn construct_date(year: i32, month: i32, day: i32) -> Result<NaiveDate> {
    if let Some(d) = NaiveDate::from_ymd_opt(year, month as u32, day as u32) {
        return Ok(d);
    }

    if month == 2 && day == 29 {
        for candidate_year in (year + 1)..=(year + 8) {
            if let Some(d) = NaiveDate::from_ymd_opt(candidate_year, 2, 29) {
                return Ok(d);
            }
        }
        return Err(CroreError::invalid_expression(
            "day 29 of February requested but no leap year found within 8 years",
        ));
    }

    Err(CroreError::invalid_expression(format!(
        "no such date: {year}-{month:02}-{day:02}"
    )))
}

fn cron_weekday(d: NaiveDate) -> i32 {
    d.weekday().num_days_from_sunday() as i32
}

/// Resolve the earliest date on or after `from_day` at which the
/// day-of-month, month, and day-of-week fields all match.
fn resolve_date(
    dom: &TermList,
    month: &TermList,
    dow: &TermList,
    from_day: NaiveDate,
) -> Result<NaiveDate> {
    let (cand_day, day_wrapped) = condense(dom, 31, from_day.day() as i32, true);
    let (cand_month, _month_wrapped) = condense(month, 12, from_day.month() as i32, !day_wrapped);

    let mut candidate = construct_date(from_day.year(), cand_month, cand_day)?;

    if candidate.year() == from_day.year() && candidate.ordinal() < from_day.ordinal() {
        let (first_month, _) = condense(month, 12, 1, true);
        let (first_day, _) = condense(dom, 31, 1, true);
        candidate = construct_date(from_day.year() + 1, first_month, first_day)?;
    }

    if dow.is_unrestricted(0, 6) {
        return Ok(candidate);
    }

    // The one bounded-iteration fallback: restrictive day-of-week
    // combinations are rare enough that walking forward a day at a time is
    // acceptable. Capped at 8 years so a pathological expression that can
    // never match (e.g. day 30 of February on a Monday) terminates with an
    // error instead of looping forever.
    const MAX_DAYS: i64 = 8 * 366;
    let mut probe = candidate;
    for _ in 0..MAX_DAYS {
        if dow.matches(cron_weekday(probe))
            && month.matches(probe.month() as i32)
            && dom.matches(probe.day() as i32)
        {
            return Ok(probe);
        }
        probe = probe
            .succ_opt()
            .ok_or_else(|| CroreError::invalid_expression("date overflow while searching for a matching weekday"))?;
    }

    Err(CroreError::invalid_expression(
        "no matching day-of-week/day-of-month/month combination found within 8 years",
    ))
}

/// Compute the next UTC instant strictly after (or equal to, if still
/// pending this minute) `now` at which all five fields match.
pub fn next_fire(
    minute: &TermList,
    hour: &TermList,
    dom: &TermList,
    month: &TermList,
    dow: &TermList,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let today = now.date_naive();
    let date_candidate = resolve_date(dom, month, dow, today)?;

    if date_candidate != today {
        let (cand_min, _) = condense(minute, 59, 0, true);
        let (cand_hour, _) = condense(hour, 23, 0, true);
        return build_instant(date_candidate, cand_hour, cand_min);
    }

    let (cand_min, min_wrapped) = condense(minute, 59, now.minute() as i32, false);
    let (cand_hour, hour_wrapped) = condense(hour, 23, now.hour() as i32, !min_wrapped);

    if !hour_wrapped {
        return build_instant(date_candidate, cand_hour, cand_min);
    }

    let tomorrow = today
        .succ_opt()
        .ok_or_else(|| CroreError::invalid_expression("date overflow advancing past midnight"))?;
    let date_candidate = resolve_date(dom, month, dow, tomorrow)?;
    let (cand_min, _) = condense(minute, 59, 0, true);
    let (cand_hour, _) = condense(hour, 23, 0, true);
    build_instant(date_candidate, cand_hour, cand_min)
}

fn build_instant(date: NaiveDate, hour: i32, minute: i32) -> Result<DateTime<Utc>> {
    let naive = date
        .and_hms_opt(hour as u32, minute as u32, 0)
        .ok_or_else(|| CroreError::invalid_expression(format!("invalid time {hour:02}:{minute:02}:00")))?;
    Ok(naive.and_utc())
}

//! Cron field term parser
//!
//! A cron field (minute, hour, day-of-month, month, or day-of-week) is a
//! comma-separated list of subterms. Each subterm collapses to a `Term`:
//! a `(min, max, step)` triple. Matching is quirky by design — see
//! `Term::matches` — and must be preserved exactly for compatibility with
//! the original daemon this crate replaces.

use crate::error::{CroreError, Result};

/// A single arithmetic schedule fragment within one cron field.
///
/// Invariants (enforced by `parse_field`, never by this type alone):
/// `field_min <= min <= max <= field_max` and `step != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub min: i32,
    pub max: i32,
    pub step: i32,
}

impl Term {
    /// Whether `v` matches this term.
    ///
    /// `v == min`, or `v` is within range and `v % step == 0`. Note this is
    /// modulo on the absolute value, not an offset from `min` — `1/5`
    /// matches 1, 5, 10, 15, ..., not 1, 6, 11, 16.
    pub fn matches(&self, v: i32) -> bool {
        v >= self.min && v <= self.max && (v == self.min || v % self.step == 0)
    }
}

/// An ordered, non-empty sequence of `Term`s for one cron field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermList(Vec<Term>);

impl TermList {
    pub fn terms(&self) -> &[Term] {
        &self.0
    }

    /// Whether any term in the list matches `v`.
    pub fn matches(&self, v: i32) -> bool {
        self.0.iter().any(|t| t.matches(v))
    }

    /// True when this is exactly one term spanning `[field_min, field_max]`
    /// with step 1 — i.e. the field is unrestricted (`*`).
    pub fn is_unrestricted(&self, field_min: i32, field_max: i32) -> bool {
        self.0.len() == 1 && self.0[0].min == field_min && self.0[0].max == field_max && self.0[0].step == 1
    }
}

/// Parse one cron field (already split out of the five space-separated
/// fields) into a `TermList`.
///
/// Grammar per subterm (comma-separated): `*`, `N`, `N-M`, `*-M`, `N/S`,
/// `*/S`, `N-M/S`.
pub fn parse_field(raw: &str, field_min: i32, field_max: i32) -> Result<TermList> {
    let mut terms = Vec::new();
    for subterm in raw.split(',') {
        terms.push(parse_subterm(subterm, field_min, field_max)?);
    }
    if terms.is_empty() {
        return Err(CroreError::invalid_expression(format!(
            "empty field: {raw:?}"
        )));
    }
    Ok(TermList(terms))
}

fn parse_subterm(subterm: &str, field_min: i32, field_max: i32) -> Result<Term> {
    let subterm = subterm.trim();

    if subterm == "*" {
        return Ok(Term { min: field_min, max: field_max, step: 1 });
    }

    // Substitute a leading `*` with `0` so the range/step split below is
    // uniform; `*` is distinguished from a literal `0` via `is_wildcard_lo`.
    let is_wildcard_lo = subterm.starts_with('*');
    let substituted: String = if is_wildcard_lo {
        format!("0{}", &subterm[1..])
    } else {
        subterm.to_string()
    };

    let mut split = substituted.splitn(2, '/');
    let range_part = split.next().unwrap_or_default();
    let step_part = split.next();

    let mut range_split = range_part.splitn(2, '-');
    let lo_part = range_split.next().unwrap_or_default();
    let hi_part = range_split.next();

    let lo: i32 = lo_part
        .parse()
        .map_err(|_| CroreError::invalid_expression(format!("not a number: {lo_part:?}")))?;

    let (mut min, mut max) = if is_wildcard_lo {
        (field_min, field_max)
    } else {
        (lo, lo)
    };

    if let Some(hi_part) = hi_part {
        let hi: i32 = hi_part
            .parse()
            .map_err(|_| CroreError::invalid_expression(format!("not a number: {hi_part:?}")))?;
        max = hi;
    }

    let mut step = 1;
    if let Some(step_part) = step_part {
        if step_part.is_empty() {
            return Err(CroreError::invalid_expression("empty step value"));
        }
        step = step_part
            .parse()
            .map_err(|_| CroreError::invalid_expression(format!("not a number: {step_part:?}")))?;

        // `5/5` means "from 5, every 5, up to the field max": a lone point
        // widens to the field max once a step is present.
        if max == min {
            max = field_max;
        }
    }

    if step == 0 {
        return Err(CroreError::invalid_expression("step cannot be 0"));
    }
    if min < field_min {
        return Err(CroreError::invalid_expression(format!(
            "{min} is below the field minimum {field_min}"
        )));
    }
    if max > field_max {
        return Err(CroreError::invalid_expression(format!(
            "{max} is above the field maximum {field_max}"
        )));
    }
    if min > max {
        return Err(CroreError::invalid_expression(format!(
            "range {min}-{max} is backwards"
        )));
    }

    Ok(Term { min, max, step })
}

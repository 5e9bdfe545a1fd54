//! The structured named-field hash form (`spec.md` §4.5).
//!
//! Unlike the two text grammars, this codec trades on a loosely-typed
//! associative container — a `HashMap<String, String>`, the shape a
//! caller gets back from decoding a generic structured format (JSON,
//! a key/value store row, ...) — rather than a line of bytes. The field
//! vocabulary is the one in `spec.md` §4.5's table (`cycle`, `type`,
//! `daynumber`, `month`, `day`, `range-type`, `range`, `exceptions`,
//! `completions`); `daynumber` is overloaded per-kind the way the table
//! describes it (day-of-month for the `*-by-date` kinds, an ordinal 1-5
//! for the `*-by-weekday` kinds, day-of-year for `yearly`+`yearday`).
//!
//! `interval` and `range-type` are the only mandatory keys (`spec.md`
//! §4.5, §7): missing either one yields `Kind::None` and `false`.
//! Everything else — an unrecognized `cycle`/`type` pair, an unknown
//! month or weekday name, an out-of-range `daynumber` — is a silent
//! no-op, per §7's "no failure is fatal" / "unknown hash values preserve
//! the previous state".

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};

use crate::date::CalendarDate;
use crate::daykey::{DayKey, DaySet};
use crate::rule::{Kind, Rule};
use crate::weekday::WeekdaySet;

const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "sunday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
];

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month - 1) as usize]
}

fn month_from_name(name: &str) -> Option<u32> {
    MONTH_NAMES.iter().position(|m| m.eq_ignore_ascii_case(name)).map(|idx| idx as u32 + 1)
}

fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[WeekdaySet::index_of(weekday) as usize]
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    WEEKDAY_NAMES
        .iter()
        .position(|w| w.eq_ignore_ascii_case(name))
        .map(|idx| WeekdaySet::weekday_from_index(idx as u32))
}

fn day_set_from_csv(value: &str) -> DaySet {
    value.split(',').filter_map(|s| DayKey::parse(s.trim())).collect()
}

fn day_set_to_csv(set: &DaySet) -> String {
    let mut keys: Vec<_> = set.iter().map(DayKey::to_string).collect();
    keys.sort();
    keys.join(",")
}

fn date_from_ordinal(year: i32, ordinal: u32) -> NaiveDate {
    NaiveDate::from_yo_opt(year, ordinal).unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 12, 31).unwrap())
}

/// Build a [`Rule`] anchored to `start` from named fields. Returns
/// `(rule, false)` with `rule.kind() == Kind::None` when `interval` or
/// `range-type` is absent (`spec.md` §4.5, §7); `(rule, true)` otherwise.
pub fn parse(fields: &HashMap<String, String>, start: NaiveDateTime) -> (Rule, bool) {
    let mut rule = Rule::new(start);

    let interval = fields.get("interval").and_then(|v| v.parse::<i32>().ok());
    let range_type = fields.get("range-type").map(String::as_str);
    if interval.is_none() || range_type.is_none() {
        return (rule, false);
    }
    rule.set_interval(interval.unwrap());

    let cycle = fields.get("cycle").map(String::as_str);
    let kind_type = fields.get("type").map(String::as_str);
    let kind = match (cycle, kind_type) {
        (Some("daily"), _) => Kind::Daily,
        (Some("weekly"), _) => Kind::Weekly,
        (Some("monthly"), Some("daynumber")) => Kind::MonthlyByDate,
        (Some("monthly"), Some("weekday")) => Kind::MonthlyByWeekday,
        (Some("yearly"), Some("monthday")) => Kind::YearlyByDate,
        (Some("yearly"), Some("yearday")) => Kind::YearlyByDayOfYear,
        (Some("yearly"), Some("weekday")) => Kind::YearlyByWeekday,
        _ => Kind::None,
    };
    rule.set_kind(kind);

    let mut last_weekday = None;
    if let Some(days) = fields.get("day") {
        let mut mask = WeekdaySet::empty();
        for token in days.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if let Some(wd) = weekday_from_name(token) {
                mask.insert(wd);
                last_weekday = Some(wd);
            }
        }
        if kind == Kind::Weekly {
            rule.set_weekday_mask(mask);
        }
    }

    match range_type {
        Some("number") => {
            if let Some(n) = fields.get("range").and_then(|v| v.parse::<i32>().ok()) {
                rule.set_count(n);
            }
        }
        Some("date") => {
            if let Some(range) = fields.get("range") {
                if let Some(key) = DayKey::parse(range.trim()) {
                    if let Some(date) = key.to_naive_date() {
                        rule.set_until(date.and_hms_opt(23, 59, 59));
                    }
                }
            }
        }
        _ => {}
    }

    let daynumber = fields.get("daynumber").and_then(|v| v.parse::<u32>().ok());
    let month = fields.get("month").and_then(|v| month_from_name(v));

    let mut start_date = start.date();
    match kind {
        Kind::MonthlyByDate => {
            if let Some(day) = daynumber {
                if let Some(d) = NaiveDate::from_ymd_opt(start_date.year(), start_date.month(), day) {
                    start_date = d;
                }
            }
        }
        Kind::MonthlyByWeekday => {
            if let (Some(nth), Some(wd)) = (daynumber, last_weekday) {
                start_date = start_date.and_hms_opt(0, 0, 0).unwrap().with_nth_weekday(wd, nth).date();
            }
        }
        Kind::YearlyByDate => {
            if let (Some(m), Some(d)) = (month, daynumber) {
                if let Some(date) = NaiveDate::from_ymd_opt(start_date.year(), m, d) {
                    start_date = date;
                }
            }
        }
        Kind::YearlyByDayOfYear => {
            if let Some(doy) = daynumber {
                start_date = date_from_ordinal(start_date.year(), doy);
            }
        }
        Kind::YearlyByWeekday => {
            if let (Some(m), Some(nth), Some(wd)) = (month, daynumber, last_weekday) {
                let anchor = NaiveDate::from_ymd_opt(start_date.year(), m, 1).unwrap();
                start_date = anchor.and_hms_opt(0, 0, 0).unwrap().with_nth_weekday(wd, nth).date();
            }
        }
        Kind::Daily | Kind::Weekly | Kind::None => {}
    }
    rule.set_start(start_date.and_time(start.time()));

    if let Some(exceptions) = fields.get("exceptions") {
        rule.set_exceptions(day_set_from_csv(exceptions));
    }
    if let Some(completions) = fields.get("completions") {
        rule.set_completions(day_set_from_csv(completions));
    }

    (rule, true)
}

/// Reverse of [`parse`]. Returns an empty map when `rule.kind()` is
/// `Kind::None` (`spec.md` §4.5).
pub fn emit(rule: &Rule) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    if rule.kind() == Kind::None {
        return fields;
    }

    fields.insert("interval".to_string(), rule.interval().to_string());
    let start = rule.start();

    let (cycle, type_field) = match rule.kind() {
        Kind::None => unreachable!("checked above"),
        Kind::Daily => ("daily", None),
        Kind::Weekly => ("weekly", None),
        Kind::MonthlyByDate => ("monthly", Some("daynumber")),
        Kind::MonthlyByWeekday => ("monthly", Some("weekday")),
        Kind::YearlyByDate => ("yearly", Some("monthday")),
        Kind::YearlyByDayOfYear => ("yearly", Some("yearday")),
        Kind::YearlyByWeekday => ("yearly", Some("weekday")),
    };
    fields.insert("cycle".to_string(), cycle.to_string());
    if let Some(t) = type_field {
        fields.insert("type".to_string(), t.to_string());
    }

    match rule.kind() {
        Kind::Weekly => {
            let days: Vec<&str> = rule.weekday_mask().iter().map(weekday_name).collect();
            fields.insert("day".to_string(), days.join(","));
        }
        Kind::MonthlyByWeekday | Kind::YearlyByWeekday => {
            fields.insert("day".to_string(), weekday_name(start.weekday()).to_string());
            fields.insert("daynumber".to_string(), ((start.day() + 6) / 7).to_string());
        }
        Kind::MonthlyByDate => {
            fields.insert("daynumber".to_string(), start.day().to_string());
        }
        Kind::YearlyByDayOfYear => {
            fields.insert("daynumber".to_string(), start.ordinal().to_string());
        }
        Kind::YearlyByDate => {
            fields.insert("daynumber".to_string(), start.day().to_string());
        }
        Kind::None => unreachable!("checked above"),
        Kind::Daily => {}
    }

    if matches!(rule.kind(), Kind::YearlyByDate | Kind::YearlyByWeekday) {
        fields.insert("month".to_string(), month_name(start.month()).to_string());
    }

    if let Some(count) = rule.count() {
        fields.insert("range-type".to_string(), "number".to_string());
        fields.insert("range".to_string(), count.to_string());
    } else if let Some(until) = rule.until() {
        fields.insert("range-type".to_string(), "date".to_string());
        fields.insert("range".to_string(), DayKey::from_date(until.date()).to_string());
    } else {
        fields.insert("range-type".to_string(), "none".to_string());
    }

    if !rule.exceptions().is_empty() {
        fields.insert("exceptions".to_string(), day_set_to_csv(rule.exceptions()));
    }
    if !rule.completions().is_empty() {
        fields.insert("completions".to_string(), day_set_to_csv(rule.completions()));
    }

    fields
}

//! The iCalendar 2.0 key/value `RRULE` format (`spec.md` §4.4).
//!
//! `FREQ=...;INTERVAL=...;BYDAY=...;BYYEARDAY=...;UNTIL=...;COUNT=...`,
//! semicolon-separated pairs in no fixed order. Unlike the legacy line
//! grammar in [`crate::codec::legacy`], ordinal-weekday and day-of-year
//! modifiers are read back from `start` rather than from the wire value
//! itself, the same choice made there and for the same reason: the engine
//! always recomputes them from `start`, so storing a second copy would
//! only create a place for parse and reality to disagree.

use chrono::{Datelike, NaiveDateTime};

use crate::codec::format_ical_datetime;
use crate::date::CalendarDate;
use crate::parser::take_ical_datetime;
use crate::rule::{Kind, Rule};
use crate::weekday::WeekdaySet;

fn pairs(input: &str) -> Vec<(&str, &str)> {
    input
        .split(';')
        .filter_map(|part| part.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect()
}

fn weekday_token_from_byday_item(item: &str) -> Option<chrono::Weekday> {
    // Items may carry a leading `[+-]?<ordinal>` prefix (`2MO`, `-1FR`);
    // only the trailing two-letter code matters here since the ordinal is
    // reconstructed from `start`.
    if item.len() < 2 {
        return None;
    }
    WeekdaySet::token_to_weekday(&item[item.len() - 2..])
}

/// Parse an `RRULE` key/value string, anchoring the result to `start`.
/// An input with no recognized `FREQ` yields `Kind::None`.
pub fn parse(input: &str, start: NaiveDateTime) -> Rule {
    let mut rule = Rule::new(start);
    let pairs = pairs(input);

    let freq = pairs.iter().find(|(k, _)| *k == "FREQ").map(|(_, v)| *v);
    let has_byday = pairs.iter().any(|(k, _)| *k == "BYDAY");
    let has_byyearday = pairs.iter().any(|(k, _)| *k == "BYYEARDAY");

    let kind = match freq {
        Some("DAILY") => Kind::Daily,
        Some("WEEKLY") => Kind::Weekly,
        Some("MONTHLY") if has_byday => Kind::MonthlyByWeekday,
        Some("MONTHLY") => Kind::MonthlyByDate,
        Some("YEARLY") if has_byyearday => Kind::YearlyByDayOfYear,
        Some("YEARLY") if has_byday => Kind::YearlyByWeekday,
        Some("YEARLY") => Kind::YearlyByDate,
        _ => return rule,
    };
    rule.set_kind(kind);

    for (key, value) in &pairs {
        match *key {
            "INTERVAL" => {
                if let Ok(n) = value.parse::<i32>() {
                    rule.set_interval(n);
                }
            }
            "COUNT" => {
                if let Ok(n) = value.parse::<i32>() {
                    rule.set_count(n);
                }
            }
            "UNTIL" => {
                if let Ok((_, until)) = take_ical_datetime(value.as_bytes()) {
                    rule.set_until(Some(until));
                }
            }
            "BYDAY" if kind == Kind::Weekly => {
                let mut mask = WeekdaySet::empty();
                for item in value.split(',') {
                    if let Some(wd) = weekday_token_from_byday_item(item) {
                        mask.insert(wd);
                    }
                }
                rule.set_weekday_mask(mask);
            }
            _ => {}
        }
    }

    rule
}

/// Reverse of [`parse`].
pub fn emit(rule: &Rule) -> String {
    if rule.kind() == Kind::None {
        return String::new();
    }

    let freq = match rule.kind() {
        Kind::None => unreachable!("checked above"),
        Kind::Daily => "DAILY",
        Kind::Weekly => "WEEKLY",
        Kind::MonthlyByDate | Kind::MonthlyByWeekday => "MONTHLY",
        Kind::YearlyByDate | Kind::YearlyByDayOfYear | Kind::YearlyByWeekday => "YEARLY",
    };

    let mut parts = vec![format!("FREQ={}", freq), format!("INTERVAL={}", rule.interval())];

    match rule.kind() {
        Kind::Weekly => {
            let days: Vec<&str> = rule.weekday_mask().iter().map(WeekdaySet::weekday_to_token).collect();
            if !days.is_empty() {
                parts.push(format!("BYDAY={}", days.join(",")));
            }
        }
        Kind::MonthlyByWeekday => {
            let start = rule.start();
            let nth = (start.day() + 6) / 7;
            parts.push(format!("BYDAY={}{}", nth, WeekdaySet::weekday_to_token(start.weekday())));
        }
        Kind::YearlyByWeekday => {
            // `spec.md` §4.4: `ordinal = start.week_of_year - week_of_year(first-of-month) + 1`,
            // i.e. `start`'s 1-based week number within its own month.
            let start = rule.start();
            let nth = start.week_of_month();
            parts.push(format!("BYDAY={}{}", nth, WeekdaySet::weekday_to_token(start.weekday())));
            parts.push(format!("BYMONTH={}", start.month()));
        }
        Kind::YearlyByDayOfYear => {
            parts.push(format!("BYYEARDAY={}", rule.start().ordinal()));
        }
        _ => {}
    }

    if let Some(until) = rule.until() {
        // Half-open output convention (`spec.md` §4.4/§6.3): emit `until + 1 day`.
        parts.push(format!("UNTIL={}", format_ical_datetime(until + chrono::Duration::days(1))));
    } else if let Some(count) = rule.count() {
        parts.push(format!("COUNT={}", count));
    }

    parts.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    #[test]
    fn key_value_round_trip_weekly() {
        let start = dt(2009, 1, 5); // Monday
        let mut rule = Rule::new(start);
        rule.set_kind(Kind::Weekly);
        rule.set_interval(2);
        rule.add_weekday(Weekday::Mon);
        rule.add_weekday(Weekday::Thu);
        rule.set_until(Some(dt(2009, 6, 30)));

        let emitted = emit(&rule);
        assert_eq!(emitted, "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,TH;UNTIL=20090701T100000");

        // `UNTIL` is emitted one day later than `until` (half-open
        // convention, `spec.md` §4.4/§6.3) and parsed back literally
        // (parsers treat `UNTIL` as inclusive on input, `spec.md` §6.3),
        // so round-tripping through text does not recover the original
        // `until` value, only an equivalent active window.
        let parsed = parse(&emitted, start);
        assert_eq!(parsed.kind(), Kind::Weekly);
        assert_eq!(parsed.interval(), 2);
        assert!(parsed.weekday_mask().contains(Weekday::Mon));
        assert!(parsed.weekday_mask().contains(Weekday::Thu));
        assert_eq!(parsed.until(), Some(dt(2009, 7, 1)));
    }

    #[test]
    fn count_round_trip_daily() {
        let start = dt(2009, 1, 1);
        let mut rule = Rule::new(start);
        rule.set_kind(Kind::Daily);
        rule.set_interval(3);
        rule.set_count(5);

        let emitted = emit(&rule);
        assert_eq!(emitted, "FREQ=DAILY;INTERVAL=3;COUNT=5");

        let parsed = parse(&emitted, start);
        assert_eq!(parsed.kind(), Kind::Daily);
        assert_eq!(parsed.interval(), 3);
        assert_eq!(parsed.count(), Some(5));
    }

    #[test]
    fn monthly_by_weekday_emits_byday_without_ordinal_storage() {
        let start = dt(2009, 1, 12); // 2nd Monday
        let mut rule = Rule::new(start);
        rule.set_kind(Kind::MonthlyByWeekday);

        let emitted = emit(&rule);
        assert_eq!(emitted, "FREQ=MONTHLY;INTERVAL=1;BYDAY=2MO");

        let parsed = parse(&emitted, start);
        assert_eq!(parsed.kind(), Kind::MonthlyByWeekday);
    }

    #[test]
    fn yearly_by_weekday_round_trip() {
        let start = dt(2009, 11, 26); // 4th Thursday of November, but Nov 2009's
                                       // 5th calendar week (`spec.md` §4.4's
                                       // `week_of_year - week_of_year(first-of-month) +
                                       // 1`, not the simpler "nth occurrence" count)
        let mut rule = Rule::new(start);
        rule.set_kind(Kind::YearlyByWeekday);
        rule.set_count(10);

        let emitted = emit(&rule);
        assert_eq!(emitted, "FREQ=YEARLY;INTERVAL=1;BYDAY=5TH;BYMONTH=11;COUNT=10");

        let parsed = parse(&emitted, start);
        assert_eq!(parsed.kind(), Kind::YearlyByWeekday);
        assert_eq!(parsed.count(), Some(10));
    }

    #[test]
    fn unrecognized_freq_yields_none() {
        let start = dt(2009, 1, 1);
        let parsed = parse("FREQ=SECONDLY", start);
        assert_eq!(parsed.kind(), Kind::None);
    }

    #[test]
    fn missing_freq_yields_none() {
        let start = dt(2009, 1, 1);
        let parsed = parse("INTERVAL=2", start);
        assert_eq!(parsed.kind(), Kind::None);
    }
}

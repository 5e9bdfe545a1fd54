//! The vCalendar 1.0 line-oriented `RRULE` format (`spec.md` §4.3).
//!
//! Grammar: `<TAG><INTERVAL?><SP? MODIFIERS><SP><TERMINATOR>`. Parsing is a
//! small hand-rolled state machine built out of the `nom` primitives in
//! `crate::parser`, generalizing the teacher's `duration/parse.rs`
//! tag-then-digits combinators to this line grammar's tag/interval/
//! modifier/terminator shape.

use chrono::{Datelike, NaiveDateTime};

use crate::codec::format_ical_datetime;
use crate::date::days_in_month;
use crate::parser::{take_ical_datetime, take_signed_digits};
use crate::rule::{Kind, Rule};
use crate::weekday::WeekdaySet;

fn tag_and_kind(input: &[u8]) -> Option<(Kind, &[u8])> {
    // Two-letter tags first so "MP"/"MD"/"YM"/"YD" aren't shadowed by a
    // single-letter match.
    let two_letter = [
        (&b"MP"[..], Kind::MonthlyByWeekday),
        (&b"MD"[..], Kind::MonthlyByDate),
        (&b"YM"[..], Kind::YearlyByDate),
        (&b"YD"[..], Kind::YearlyByDayOfYear),
    ];
    for (tag, kind) in two_letter {
        if input.starts_with(tag) {
            return Some((kind, &input[2..]));
        }
    }
    match input.first() {
        Some(b'D') => Some((Kind::Daily, &input[1..])),
        Some(b'W') => Some((Kind::Weekly, &input[1..])),
        _ => None,
    }
}

/// Parse a legacy `RRULE` line, anchoring the resulting rule to `start`.
/// Empty or non-matching input yields `Kind::None` (`spec.md` §4.3,
/// §9(c): a non-matching line is unambiguously "kind = None", returned
/// immediately with no attempt to read undefined capture groups).
pub fn parse(input: &str, start: NaiveDateTime) -> Rule {
    let mut rule = Rule::new(start);
    let bytes = input.as_bytes();

    let Some((kind, rest)) = tag_and_kind(bytes) else {
        return rule;
    };

    let (rest, interval) = match take_signed_digits(rest) {
        Ok((rest, interval)) if interval > 0 => (rest, interval as u32),
        _ => (rest, 1),
    };

    rule.set_kind(kind);
    rule.set_interval(interval as i32);

    let mut rest = rest;
    if kind == Kind::Weekly {
        let mut mask = WeekdaySet::empty();
        loop {
            let trimmed = skip_ascii_whitespace(rest);
            if trimmed.len() < 2 {
                break;
            }
            let token = std::str::from_utf8(&trimmed[..2]).unwrap_or("");
            match WeekdaySet::token_to_weekday(token) {
                Some(wd) => {
                    mask.insert(wd);
                    rest = &trimmed[2..];
                }
                None => break,
            }
        }
        if mask.is_empty() {
            mask.insert(start.weekday());
        }
        rule.set_weekday_mask(mask);
    }

    // Advance past unrecognized modifier characters until a terminator
    // (`#<digits>` or `YYYYMMDD[THHMMSS]`) appears, per `spec.md` §4.3.
    loop {
        if rest.is_empty() {
            return rule;
        }
        if rest[0] == b'#' {
            if let Ok((_, count)) = take_signed_digits(&rest[1..]) {
                rule.set_count(count);
            }
            return rule;
        }
        if rest.len() >= 8 && rest[..8].iter().all(u8::is_ascii_digit) {
            if let Ok((_, until)) = take_ical_datetime(rest) {
                rule.set_until(Some(until));
            }
            return rule;
        }
        rest = &rest[1..];
    }
}

fn skip_ascii_whitespace(input: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < input.len() && input[i].is_ascii_whitespace() {
        i += 1;
    }
    &input[i..]
}

/// Reverse of [`parse`].
pub fn emit(rule: &Rule) -> String {
    if rule.kind() == Kind::None {
        return String::new();
    }

    let tag = match rule.kind() {
        Kind::None => unreachable!("checked above"),
        Kind::Daily => "D",
        Kind::Weekly => "W",
        Kind::MonthlyByWeekday => "MP",
        Kind::MonthlyByDate => "MD",
        Kind::YearlyByDate => "YM",
        Kind::YearlyByDayOfYear => "YD",
        Kind::YearlyByWeekday => "YM", // no distinct legacy tag; closest analogue
    };

    let mut out = format!("{}{}", tag, rule.interval());

    match rule.kind() {
        Kind::Weekly => {
            for wd in rule.weekday_mask().iter() {
                out.push(' ');
                out.push_str(WeekdaySet::weekday_to_token(wd));
            }
        }
        Kind::MonthlyByWeekday | Kind::YearlyByWeekday => {
            let start = rule.start();
            let p = ordinal_position(start);
            out.push_str(&format!(" {}+ {}", p, WeekdaySet::weekday_to_token(start.weekday())));
        }
        _ => {}
    }

    out.push(' ');
    match rule.until() {
        Some(until) => {
            let emitted = until + chrono::Duration::days(1);
            out.push_str(&format_ical_datetime(emitted));
        }
        None => out.push_str(&format!("#{}", rule.count().unwrap_or(0))),
    }

    out
}

/// Ordinal position of `start`'s weekday within its month (`spec.md`
/// §4.3 Emit): `5` if `start.day + 7` lands in the next month, else
/// `⌈start.day / 7⌉`. This can disagree with the engine's own `nth`
/// (`engine::monthly_by_weekday`, which never special-cases `5`) for a
/// last-occurrence date early enough in a short month — e.g. 2009-01-26
/// (the last Monday of January) is `⌈26/7⌉ = 4`, but `26 + 7 = 33` lands
/// in February, so this emits `5`. Preserved as specified.
fn ordinal_position(start: NaiveDateTime) -> u32 {
    if start.day() + 7 > days_in_month(start.year(), start.month()) {
        5
    } else {
        (start.day() + 6) / 7
    }
}

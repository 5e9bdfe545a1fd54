//! The next-occurrence engine (`spec.md` §4.1).
//!
//! Each recurrence kind is one match arm, generalizing the teacher's
//! tagged-variant `Iterator::next` dispatch in `recurrence/recur.rs`. Every
//! function here is total: it returns `Option<NaiveDateTime>` (or `bool`
//! for [`has_active_occurrence`]) and never panics on a well-formed `Rule`.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::date::{self, CalendarDate};
use crate::daykey::DayKey;
use crate::rule::{Kind, Rule};

fn ceil_div(a: i64, b: i64) -> i64 {
    if a <= 0 {
        0
    } else {
        (a + b - 1) / b
    }
}

fn nth_weekday_date(year: i32, month: u32, weekday: Weekday, nth: u32) -> NaiveDate {
    let anchor = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    anchor.with_nth_weekday(weekday, nth).date()
}

/// `spec.md` §4.1: the earliest occurrence `O` with `O >= pivot`, subject
/// to `count`/`until`, or `None`.
pub fn next_after(rule: &Rule, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
    let start = rule.start();

    // Callers may pass the anchor itself as pivot; this guarantees the
    // first occurrence is always reachable.
    if start >= pivot {
        return Some(start);
    }

    if rule.kind() == Kind::None || rule.interval() == 0 {
        return None;
    }

    match rule.kind() {
        Kind::None => None,
        Kind::Daily => daily(rule, pivot),
        Kind::Weekly => weekly(rule, pivot),
        Kind::MonthlyByDate => monthly_by_date(rule, pivot),
        Kind::MonthlyByWeekday => monthly_by_weekday(rule, pivot),
        Kind::YearlyByDate => yearly_by_date(rule, pivot),
        Kind::YearlyByDayOfYear => yearly_by_day_of_year(rule, pivot),
        Kind::YearlyByWeekday => yearly_by_weekday(rule, pivot),
    }
}

fn daily(rule: &Rule, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
    let start = rule.start();
    let interval = rule.interval() as i64;

    // Whole days between `start` and `pivot`, rounded up when `pivot`'s
    // time-of-day falls later in the day than `start`'s — otherwise a
    // same-date pivot with a later time could produce a candidate that is
    // earlier than the pivot.
    let diff = pivot.signed_duration_since(start);
    let whole_days = diff.num_days();
    let d = if diff - Duration::days(whole_days) > Duration::zero() {
        whole_days + 1
    } else {
        whole_days
    };

    let k = ceil_div(d, interval);
    if let Some(count) = rule.count() {
        if k >= count as i64 {
            return None;
        }
    }

    let candidate = start.add_days(k * interval);
    match rule.until() {
        Some(until) if candidate > until => None,
        _ => Some(candidate),
    }
}

fn weekly(rule: &Rule, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
    let mask = rule.weekday_mask();
    if mask.is_empty() {
        return None;
    }

    let start = rule.start();
    let interval = rule.interval() as i64;

    // Both week anchors carry `start`'s time-of-day, not the date they
    // are computed from (`spec.md` §4.1 Weekly, "anchor's time-of-day
    // copied from start").
    let sw = date::iso_week_start_date(start.date()).and_time(start.time());
    let pw = date::iso_week_start_date(pivot.date()).and_time(start.time());
    let week_end = pw.add_days(6);

    let delta = pw.whole_days_since(&sw);
    let step = interval * 7;
    let aligned = if delta % step == 0 {
        delta
    } else {
        delta + (step - delta.rem_euclid(step))
    };

    if let Some(count) = rule.count() {
        let occurrence_index = aligned / 7 / interval;
        if occurrence_index >= count as i64 {
            return None;
        }
    }

    let mut cand = sw.add_days(aligned);
    while cand < pivot && cand <= week_end {
        cand = cand.add_days(1);
    }

    if cand > week_end {
        return next_after(rule, week_end);
    }

    while !mask.contains(cand.weekday()) {
        cand = cand.add_days(1);
        if cand > week_end {
            return next_after(rule, week_end);
        }
    }

    match rule.until() {
        Some(until) if cand > until => None,
        _ => Some(cand),
    }
}

fn monthly_by_date(rule: &Rule, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
    let start = rule.start();
    let interval = rule.interval() as i32;

    let mut target_year = pivot.year();
    let mut target_month = pivot.month() as i32;
    if pivot.day() > start.day() {
        let total = target_year * 12 + (target_month - 1) + 1;
        target_year = total.div_euclid(12);
        target_month = total.rem_euclid(12) + 1;
    }

    let delta_months = (target_year - start.year()) * 12 + (target_month - start.month() as i32);
    let mut off = ceil_div(delta_months.max(0) as i64, interval as i64) as i32 * interval;

    loop {
        if let Some(count) = rule.count() {
            if off / interval >= count as i32 {
                return None;
            }
        }

        let total = start.year() * 12 + (start.month() as i32 - 1) + off;
        let year = total.div_euclid(12);
        let month = (total.rem_euclid(12) + 1) as u32;

        if let Some(date) = NaiveDate::from_ymd_opt(year, month, start.day()) {
            let candidate = date.and_time(start.time());
            if candidate >= pivot {
                return match rule.until() {
                    Some(until) if candidate > until => None,
                    _ => Some(candidate),
                };
            }
        } else if interval == 12 && (month != 2 || start.day() > 29) {
            // The anchor itself names a non-existent date (e.g. April
            // 31) and every yearly-interval candidate shares its
            // month/day, so nothing will ever be valid.
            return None;
        }

        off += interval;
    }
}

fn monthly_by_weekday(rule: &Rule, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
    let start = rule.start();
    let interval = rule.interval() as i32;
    let nth = (start.day() + 6) / 7;
    let wd = start.weekday();

    let delta_months = (pivot.year() - start.year()) * 12 + (pivot.month() as i32 - start.month() as i32);
    let off = ceil_div(delta_months.max(0) as i64, interval as i64) as i32 * interval;
    let mut cur_off = off - interval;

    loop {
        cur_off += interval;
        if let Some(count) = rule.count() {
            if cur_off / interval >= count as i32 {
                return None;
            }
        }

        let total = start.year() * 12 + (start.month() as i32 - 1) + cur_off;
        let year = total.div_euclid(12);
        let month = (total.rem_euclid(12) + 1) as u32;
        let candidate = nth_weekday_date(year, month, wd, nth).and_time(start.time());

        if candidate >= pivot {
            return match rule.until() {
                Some(until) if candidate > until => None,
                _ => Some(candidate),
            };
        }
    }
}

fn yearly_by_date(rule: &Rule, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
    let start = rule.start();
    let interval = rule.interval() as i32;

    let mut candidate_year = pivot.year();
    if (pivot.month(), pivot.day()) > (start.month(), start.day()) {
        candidate_year += 1;
    }
    if start.month() == 2 && start.day() == 29 {
        while !date::is_leap_year(candidate_year) {
            candidate_year += 1;
        }
    }

    let mut off = ceil_div((candidate_year - start.year()).max(0) as i64, interval as i64) as i32 * interval;

    loop {
        if let Some(count) = rule.count() {
            if off / interval >= count as i32 {
                return None;
            }
        }

        let year = start.year() + off;
        if let Some(date) = NaiveDate::from_ymd_opt(year, start.month(), start.day()) {
            let candidate = date.and_time(start.time());
            if candidate >= pivot {
                return match rule.until() {
                    Some(until) if candidate > until => None,
                    _ => Some(candidate),
                };
            }
        }

        off += interval;
    }
}

fn yearly_by_day_of_year(rule: &Rule, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
    let start = rule.start();
    let interval = rule.interval() as i32;
    let doy = start.ordinal();

    let count_index = (pivot.year() - start.year()) / interval + 1;
    if let Some(count) = rule.count() {
        if count_index > count as i32 || (count_index == count as i32 && pivot.ordinal() > doy) {
            return None;
        }
    }

    let mut year = start.year() + (count_index - 1) * interval;
    let mut candidate_date = date_from_ordinal(year, doy);

    if candidate_date < pivot.date() {
        year += interval;
        candidate_date = date_from_ordinal(year, doy);
    }

    let candidate = candidate_date.and_time(start.time());
    match rule.until() {
        Some(until) if candidate > until => None,
        _ => Some(candidate),
    }
}

fn date_from_ordinal(year: i32, ordinal: u32) -> NaiveDate {
    NaiveDate::from_yo_opt(year, ordinal).unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 12, 31).unwrap())
}

fn yearly_by_weekday(rule: &Rule, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
    let start = rule.start();
    let interval = rule.interval() as i32;
    let nth = (start.day() + 6) / 7;
    let wd = start.weekday();
    let month = start.month();

    let delta_years = pivot.year() - start.year();
    let off = ceil_div(delta_years.max(0) as i64, interval as i64) as i32 * interval;
    let mut cur_off = off - interval;

    loop {
        cur_off += interval;
        if let Some(count) = rule.count() {
            if cur_off / interval >= count as i32 {
                return None;
            }
        }

        let year = start.year() + cur_off;
        let candidate = nth_weekday_date(year, month, wd, nth).and_time(start.time());

        if candidate >= pivot {
            return match rule.until() {
                Some(until) if candidate > until => None,
                _ => Some(candidate),
            };
        }
    }
}

/// `spec.md` §4.1: like [`next_after`] but skips candidates whose day key
/// is in `exceptions` or `completions`.
pub fn next_active_after(rule: &Rule, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
    let mut p = pivot;
    loop {
        let candidate = next_after(rule, p)?;
        let key = DayKey::from_date(candidate.date());
        if rule.exceptions().has_key(key) || rule.completions().has_key(key) {
            p = candidate.add_days(1);
            continue;
        }
        return Some(candidate);
    }
}

/// `spec.md` §4.1: whether any occurrence not covered by
/// `exceptions`/`completions` remains.
pub fn has_active_occurrence(rule: &Rule) -> bool {
    if rule.until().is_none() {
        return true;
    }

    let mut p = rule.start();
    loop {
        match next_after(rule, p) {
            None => return false,
            Some(candidate) => {
                let key = DayKey::from_date(candidate.date());
                if !rule.exceptions().has_key(key) && !rule.completions().has_key(key) {
                    return true;
                }
                // Strict-greater advance: avoids double-counting a day
                // shared by two candidates (`spec.md` §9(d)).
                p = candidate.add_days(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use chrono::NaiveTime;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_time(NaiveTime::default())
    }

    fn dt_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn daily_interval_two_with_count() {
        let mut rule = Rule::new(dt_hms(2009, 1, 1, 9, 0, 0));
        rule.set_kind(Kind::Daily);
        rule.set_interval(2);
        rule.set_count(3);

        let o1 = rule.next_after(dt(2009, 1, 1)).unwrap();
        assert_eq!(o1, dt_hms(2009, 1, 1, 9, 0, 0));

        let o2 = rule.next_after(o1.add_days(1)).unwrap();
        assert_eq!(o2, dt_hms(2009, 1, 3, 9, 0, 0));

        let o3 = rule.next_after(o2.add_days(1)).unwrap();
        assert_eq!(o3, dt_hms(2009, 1, 5, 9, 0, 0));

        assert_eq!(rule.next_after(dt(2009, 1, 6)), None);
    }

    #[test]
    fn weekly_mon_wed_fri() {
        let mut rule = Rule::new(dt_hms(2009, 1, 5, 10, 0, 0));
        rule.set_kind(Kind::Weekly);
        rule.add_weekday(Weekday::Mon);
        rule.add_weekday(Weekday::Wed);
        rule.add_weekday(Weekday::Fri);
        rule.set_until(Some(dt(2009, 1, 23)));

        let expected = [
            (1, 5),
            (1, 7),
            (1, 9),
            (1, 12),
            (1, 14),
            (1, 16),
            (1, 19),
            (1, 21),
            (1, 23),
        ];

        let mut pivot = rule.start();
        for (m, d) in expected {
            let occ = rule.next_after(pivot).unwrap();
            assert_eq!(occ.date(), NaiveDate::from_ymd_opt(2009, m, d).unwrap());
            pivot = occ.add_days(1);
        }
        assert_eq!(rule.next_after(pivot), None);

        assert_eq!(
            rule.next_after(dt(2009, 1, 20)).unwrap().date(),
            NaiveDate::from_ymd_opt(2009, 1, 21).unwrap()
        );
    }

    #[test]
    fn weekly_requires_nonempty_mask() {
        let mut rule = Rule::new(dt(2009, 1, 5));
        rule.set_kind(Kind::Weekly);
        assert_eq!(rule.next_after(dt(2009, 1, 10)), None);
    }

    #[test]
    fn monthly_by_date_skips_invalid_months() {
        let mut rule = Rule::new(dt(2009, 1, 31));
        rule.set_kind(Kind::MonthlyByDate);

        let expected = [1, 3, 5, 7, 8, 10, 12];
        let mut pivot = rule.start();
        for month in expected {
            let occ = rule.next_after(pivot).unwrap();
            assert_eq!(occ.date(), NaiveDate::from_ymd_opt(2009, month, 31).unwrap());
            pivot = occ.add_days(1);
        }

        assert_eq!(
            rule.next_after(dt(2009, 2, 1)).unwrap().date(),
            NaiveDate::from_ymd_opt(2009, 3, 31).unwrap()
        );
    }

    #[test]
    fn monthly_by_weekday_second_monday() {
        let mut rule = Rule::new(dt(2009, 1, 12));
        rule.set_kind(Kind::MonthlyByWeekday);

        assert_eq!(
            rule.next_after(dt(2009, 2, 1)).unwrap().date(),
            NaiveDate::from_ymd_opt(2009, 2, 9).unwrap()
        );
        assert_eq!(
            rule.next_after(dt(2009, 3, 1)).unwrap().date(),
            NaiveDate::from_ymd_opt(2009, 3, 9).unwrap()
        );
    }

    #[test]
    fn yearly_by_date_feb29_skips_to_next_leap_year() {
        let mut rule = Rule::new(dt(2008, 2, 29));
        rule.set_kind(Kind::YearlyByDate);

        assert_eq!(
            rule.next_after(dt(2009, 1, 1)).unwrap().date(),
            NaiveDate::from_ymd_opt(2012, 2, 29).unwrap()
        );
    }

    #[test]
    fn exceptions_are_skipped_by_next_active_after() {
        let mut rule = Rule::new(dt(2009, 1, 1));
        rule.set_kind(Kind::Daily);
        rule.set_count(5);
        rule.add_exception(2009, 1, 3);

        let occ = rule.next_active_after(dt(2009, 1, 2)).unwrap();
        assert_eq!(occ.date(), NaiveDate::from_ymd_opt(2009, 1, 4).unwrap());
    }

    #[test]
    fn next_active_after_never_returns_an_excepted_day() {
        let mut rule = Rule::new(dt(2009, 1, 1));
        rule.set_kind(Kind::Daily);
        rule.set_count(5);
        rule.add_exception(2009, 1, 3);
        rule.add_completion(2009, 1, 4);

        let mut pivot = rule.start();
        while let Some(occ) = rule.next_active_after(pivot) {
            assert!(!rule.has_exception(occ.year(), occ.month(), occ.day()));
            assert!(!rule.has_completion(occ.year(), occ.month(), occ.day()));
            pivot = occ.add_days(1);
        }
    }

    #[test]
    fn has_active_occurrence_true_when_until_unset() {
        let mut rule = Rule::new(dt(2009, 1, 1));
        rule.set_kind(Kind::Daily);
        assert!(rule.has_active_occurrence());
    }

    #[test]
    fn has_active_occurrence_false_when_all_excepted() {
        let mut rule = Rule::new(dt(2009, 1, 1));
        rule.set_kind(Kind::Daily);
        rule.set_until(Some(dt(2009, 1, 2)));
        rule.add_exception(2009, 1, 1);
        rule.add_exception(2009, 1, 2);
        assert!(!rule.has_active_occurrence());
    }
}

//! The "Date value" collaborator `spec.md` §1 treats as out of scope.
//!
//! `spec.md` §6.1 specifies the operations a date value must support:
//! field access, weekday, day-of-year, week-of-year/month, leap-year test,
//! ordinal-weekday placement, comparison, and day arithmetic. Rather than
//! invent a bespoke date type the way a from-scratch port might, we lean on
//! `chrono::NaiveDateTime` — the teacher's date type throughout
//! `util/search.rs` and `shift.rs` — and generalize the teacher's free
//! functions into a small extension trait plus a handful of free helpers
//! for the operations that need a `(year, month)` pair rather than `&self`.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::weekday::WeekdaySet;

/// Extension operations on [`chrono::NaiveDateTime`] matching `spec.md` §6.1.
pub trait CalendarDate: Sized + Copy {
    /// 0=Sunday … 6=Saturday, matching the weekday mask convention.
    fn weekday_index(&self) -> u32;

    /// ISO week number within the year.
    fn week_of_year(&self) -> u32;

    /// 1-based week number within the month (the teacher's
    /// `week_of_month` equivalent, generalized from `util/search.rs`'s
    /// `beginning_of_week`).
    fn week_of_month(&self) -> u32;

    /// Whole days between `self` and `other` (`self - other`).
    fn whole_days_since(&self, other: &Self) -> i64;

    /// A new value `n` days later (or earlier, if negative), preserving
    /// time-of-day.
    fn add_days(&self, n: i64) -> Self;

    /// A new value `n` months later (or earlier), clamped to the end of
    /// the target month, preserving time-of-day
    /// (`shift.rs::shift_months` generalized onto `NaiveDateTime`).
    fn add_months(&self, n: i32) -> Self;

    /// Mutated to the N-th occurrence (1-5) of `weekday` within `self`'s
    /// month. `n = 5` falls back to the last such weekday in the month
    /// when fewer than five occur (`spec.md` §6.1).
    fn with_nth_weekday(&self, weekday: Weekday, n: u32) -> Self;

    /// The first day of the ISO week containing `self`.
    fn start_of_iso_week(&self) -> Self;
}

impl CalendarDate for NaiveDateTime {
    fn weekday_index(&self) -> u32 {
        WeekdaySet::index_of(self.weekday())
    }

    fn week_of_year(&self) -> u32 {
        self.iso_week().week()
    }

    fn week_of_month(&self) -> u32 {
        let first_of_month = NaiveDate::from_ymd_opt(self.year(), self.month(), 1).unwrap();
        1 + (self.day() + first_of_month.weekday().num_days_from_monday() - 1) / 7
    }

    fn whole_days_since(&self, other: &Self) -> i64 {
        self.date().signed_duration_since(other.date()).num_days()
    }

    fn add_days(&self, n: i64) -> Self {
        *self + Duration::days(n)
    }

    fn add_months(&self, n: i32) -> Self {
        let date = shift_months(self.date(), n);
        date.and_time(self.time())
    }

    fn with_nth_weekday(&self, weekday: Weekday, n: u32) -> Self {
        let date = if n >= 5 {
            find_weekday_descending(weekday, self.year(), self.month(), 1)
        } else {
            find_weekday_ascending(weekday, self.year(), self.month(), n)
        };
        date.and_time(self.time())
    }

    fn start_of_iso_week(&self) -> Self {
        let week = self.iso_week();
        let monday = NaiveDate::from_isoywd_opt(week.year(), week.week(), Weekday::Mon)
            .expect("iso_week() always yields a valid (year, week)");
        monday.and_time(self.time())
    }
}

/// Is `year` a leap year (`spec.md` §6.1's static `is_leap_year`).
pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// The Monday of ISO week `iso_week` in `year`
/// (`spec.md` §6.1's static `first_day_of_week`).
pub fn first_day_of_week(iso_week: u32, year: i32) -> NaiveDate {
    NaiveDate::from_isoywd_opt(year, iso_week, Weekday::Mon)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 1, 1).unwrap())
}

/// The Monday of the ISO week containing `date`. `chrono`'s `iso_week()`
/// already resolves the year-boundary aliasing `spec.md` §4.1's Weekly
/// algorithm calls out explicitly (a late-December date can fall in ISO
/// week 1 of the following year), so no separate adjustment is needed.
pub fn iso_week_start_date(date: NaiveDate) -> NaiveDate {
    let week = date.iso_week();
    first_day_of_week(week.week(), week.year())
}

/// Number of days in `month` of `year`, generalized from
/// `util/search.rs::days_in_month`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .signed_duration_since(NaiveDate::from_ymd_opt(year, month, 1).unwrap())
        .num_days() as u32
}

/// The last day of `month` of `year`, generalized from
/// `util/search.rs::month_end`.
pub fn month_end(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)).unwrap()
}

/// Add `months_to_add` months to `date`, clamping the day to the target
/// month's length (`shift.rs::shift_months`, unchanged).
pub fn shift_months(date: NaiveDate, months_to_add: i32) -> NaiveDate {
    let total = date.year() * 12 + (date.month() as i32 - 1) + months_to_add;
    let year = total.div_euclid(12);
    let month = (total.rem_euclid(12) + 1) as u32;

    let was_end_of_month = date.day() == month_end(date.year(), date.month()).day();
    let day = if was_end_of_month {
        month_end(year, month).day()
    } else {
        date.day().min(month_end(year, month).day())
    };
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// The ascending (1st, 2nd, ...) occurrence of `weekday` in `(yy, mm)`,
/// generalized unchanged from `util/search.rs::find_weekday_ascending`.
pub fn find_weekday_ascending(weekday: Weekday, yy: i32, mm: u32, occurrence: u32) -> NaiveDate {
    let anchor = NaiveDate::from_ymd_opt(yy, mm, 1).unwrap();
    let mut offset = (weekday.num_days_from_monday() + 7 - anchor.weekday().num_days_from_monday()) % 7;
    if occurrence > 1 {
        offset += 7 * (occurrence - 1);
    }
    anchor + Duration::days(offset as i64)
}

/// The descending (last, 2nd-to-last, ...) occurrence of `weekday` in
/// `(yy, mm)`, generalized unchanged from
/// `util/search.rs::find_weekday_descending`.
pub fn find_weekday_descending(weekday: Weekday, yy: i32, mm: u32, occurrence: u32) -> NaiveDate {
    let anchor = month_end(yy, mm);
    let mut offset = (anchor.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    if occurrence > 1 {
        offset += 7 * (occurrence - 1);
    }
    anchor - Duration::days(offset as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_time(NaiveTime::default())
    }

    #[test]
    fn weekday_index_matches_mask_convention() {
        assert_eq!(dt(2009, 1, 4).weekday_index(), 0); // Sunday
        assert_eq!(dt(2009, 1, 5).weekday_index(), 1); // Monday
    }

    #[test]
    fn iso_week_start_handles_year_boundary() {
        // Dec 29, 2008 falls in ISO week 1 of 2009.
        let boundary = NaiveDate::from_ymd_opt(2008, 12, 29).unwrap();
        assert_eq!(iso_week_start_date(boundary), boundary);
    }

    #[test]
    fn shift_months_clamps_end_of_month() {
        assert_eq!(shift_months(NaiveDate::from_ymd_opt(2009, 1, 31).unwrap(), 1), NaiveDate::from_ymd_opt(2009, 2, 28).unwrap());
        assert_eq!(shift_months(NaiveDate::from_ymd_opt(2009, 3, 31).unwrap(), 1), NaiveDate::from_ymd_opt(2009, 4, 30).unwrap());
    }

    #[test]
    fn shift_months_preserves_last_day_tracking() {
        assert_eq!(shift_months(NaiveDate::from_ymd_opt(2009, 2, 28).unwrap(), 1), NaiveDate::from_ymd_opt(2009, 3, 31).unwrap());
    }

    #[test]
    fn nth_weekday_falls_back_to_last_when_fewer_than_five() {
        // Feb 2009 has only four Mondays.
        let d = dt(2009, 2, 1).with_nth_weekday(Weekday::Mon, 5);
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2009, 2, 23).unwrap());
    }

    #[test]
    fn is_leap_year_basic() {
        assert!(is_leap_year(2008));
        assert!(!is_leap_year(2009));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2000));
    }
}

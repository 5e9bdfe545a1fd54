//! The recurrence rule model (`spec.md` §3).

use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::daykey::DaySet;
use crate::engine;
use crate::weekday::WeekdaySet;

/// Recurrence type (`spec.md` §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Kind {
    #[default]
    None,
    Daily,
    Weekly,
    MonthlyByDate,
    MonthlyByWeekday,
    YearlyByDate,
    YearlyByDayOfYear,
    YearlyByWeekday,
}

/// Mutually exclusive termination condition (`spec.md` §3.2 invariant 2,
/// §9 "model as a single optional tagged variant").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Termination {
    #[default]
    None,
    Count(u32),
    Until(NaiveDateTime),
}

/// A recurrence rule, anchored to a starting instant
/// (`spec.md` §3.1/§3.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    start: NaiveDateTime,
    kind: Kind,
    interval: u32,
    termination: Termination,
    weekday_mask: WeekdaySet,
    exceptions: DaySet,
    completions: DaySet,
}

impl Rule {
    /// A new rule anchored to `start`, defaulting to `Kind::None`
    /// (`spec.md` §3.3).
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            start,
            kind: Kind::None,
            interval: 1,
            termination: Termination::None,
            weekday_mask: WeekdaySet::empty(),
            exceptions: DaySet::new(),
            completions: DaySet::new(),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn set_start(&mut self, start: NaiveDateTime) {
        self.start = start;
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: Kind) {
        self.kind = kind;
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Set-attempts `<= 0` are silently ignored (`spec.md` §3.1).
    pub fn set_interval(&mut self, interval: i32) {
        if interval > 0 {
            self.interval = interval as u32;
        }
    }

    pub fn count(&self) -> Option<u32> {
        match self.termination {
            Termination::Count(n) => Some(n),
            _ => None,
        }
    }

    /// Non-positive values clear `count` without touching `until`
    /// (`spec.md` §3.2 invariant 2).
    pub fn set_count(&mut self, count: i32) {
        if count > 0 {
            self.termination = Termination::Count(count as u32);
        } else if let Termination::Count(_) = self.termination {
            self.termination = Termination::None;
        }
    }

    /// `None` is unset; `Some` with year `9999` is the sentinel for unset
    /// on input (`spec.md` §3.2 invariant 3) and both simply clear `until`
    /// without touching `count`.
    pub fn set_until(&mut self, until: Option<NaiveDateTime>) {
        match until {
            Some(d) if d.year() != 9999 => self.termination = Termination::Until(d),
            _ => {
                if let Termination::Until(_) = self.termination {
                    self.termination = Termination::None;
                }
            }
        }
    }

    /// `None` if `until` is unset (missing or the `9999` sentinel).
    pub fn until(&self) -> Option<NaiveDateTime> {
        match self.termination {
            Termination::Until(d) => Some(d),
            _ => None,
        }
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn weekday_mask(&self) -> WeekdaySet {
        self.weekday_mask
    }

    pub fn set_weekday_mask(&mut self, mask: WeekdaySet) {
        self.weekday_mask = mask;
    }

    pub fn add_weekday(&mut self, weekday: Weekday) {
        self.weekday_mask.insert(weekday);
    }

    pub fn exceptions(&self) -> &DaySet {
        &self.exceptions
    }

    pub fn completions(&self) -> &DaySet {
        &self.completions
    }

    pub fn add_exception(&mut self, year: i32, month: u32, day: u32) {
        self.exceptions.add(year, month, day);
    }

    pub fn delete_exception(&mut self, year: i32, month: u32, day: u32) {
        self.exceptions.delete(year, month, day);
    }

    pub fn has_exception(&self, year: i32, month: u32, day: u32) -> bool {
        self.exceptions.has(year, month, day)
    }

    pub fn add_completion(&mut self, year: i32, month: u32, day: u32) {
        self.completions.add(year, month, day);
    }

    pub fn delete_completion(&mut self, year: i32, month: u32, day: u32) {
        self.completions.delete(year, month, day);
    }

    pub fn has_completion(&self, year: i32, month: u32, day: u32) -> bool {
        self.completions.has(year, month, day)
    }

    pub fn set_exceptions(&mut self, exceptions: DaySet) {
        self.exceptions = exceptions;
    }

    pub fn set_completions(&mut self, completions: DaySet) {
        self.completions = completions;
    }

    /// The earliest occurrence `O` with `O >= pivot`, subject to the
    /// `count`/`until` bounds, or `None` (`spec.md` §4.1).
    pub fn next_after(&self, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
        engine::next_after(self, pivot)
    }

    /// Like [`next_after`](Self::next_after) but skips candidates whose day
    /// key is in `exceptions` or `completions` (`spec.md` §4.1).
    pub fn next_active_after(&self, pivot: NaiveDateTime) -> Option<NaiveDateTime> {
        engine::next_active_after(self, pivot)
    }

    /// Whether any occurrence not covered by `exceptions`/`completions`
    /// remains (`spec.md` §4.1).
    pub fn has_active_occurrence(&self) -> bool {
        engine::has_active_occurrence(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn new_rule_defaults_to_none() {
        let rule = Rule::new(dt(2009, 1, 1));
        assert_eq!(rule.kind(), Kind::None);
        assert_eq!(rule.interval(), 1);
        assert_eq!(rule.count(), None);
        assert_eq!(rule.until(), None);
    }

    #[test]
    fn non_positive_interval_is_ignored() {
        let mut rule = Rule::new(dt(2009, 1, 1));
        rule.set_interval(3);
        rule.set_interval(0);
        rule.set_interval(-5);
        assert_eq!(rule.interval(), 3);
    }

    #[test]
    fn count_and_until_are_mutually_exclusive() {
        let mut rule = Rule::new(dt(2009, 1, 1));
        rule.set_count(5);
        assert_eq!(rule.count(), Some(5));
        rule.set_until(Some(dt(2009, 6, 1)));
        assert_eq!(rule.count(), None);
        assert_eq!(rule.until(), Some(dt(2009, 6, 1)));
        rule.set_count(3);
        assert_eq!(rule.until(), None);
        assert_eq!(rule.count(), Some(3));
    }

    #[test]
    fn clearing_one_leaves_the_other_untouched() {
        let mut rule = Rule::new(dt(2009, 1, 1));
        rule.set_count(5);
        rule.set_until(None);
        assert_eq!(rule.count(), Some(5));

        rule.set_count(0);
        assert_eq!(rule.count(), None);
    }

    #[test]
    fn year_9999_is_treated_as_unset() {
        let mut rule = Rule::new(dt(2009, 1, 1));
        rule.set_until(Some(dt(9999, 12, 31)));
        assert_eq!(rule.until(), None);
    }
}

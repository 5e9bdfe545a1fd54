//! Day-granular exception/completion bookkeeping.
//!
//! Exceptions and completions are semantically interchangeable for the
//! purposes of the active-occurrence search (`spec.md` §4.2) but are stored
//! and exported separately, so [`Rule`](crate::Rule) owns two [`DaySet`]s.

use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// An eight-character `YYYYMMDD` day key (`spec.md` §3.2 invariant 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DayKey(u32);

impl DayKey {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        DayKey((year.max(0) as u32) * 10_000 + month * 100 + day)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month(), date.day())
    }

    /// Parse a literal `YYYYMMDD` string. Returns `None` on malformed input.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() < 8 || !s.as_bytes()[..8].iter().all(u8::is_ascii_digit) {
            return None;
        }
        let year: i32 = s[0..4].parse().ok()?;
        let month: u32 = s[4..6].parse().ok()?;
        let day: u32 = s[6..8].parse().ok()?;
        Some(Self::new(year, month, day))
    }

    /// The calendar date this key identifies, or `None` if the
    /// year/month/day combination is not a valid date (e.g. `20090230`).
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        let year = (self.0 / 10_000) as i32;
        let month = (self.0 / 100) % 100;
        let day = self.0 % 100;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

/// A set of day keys, used for both `exceptions` and `completions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySet(HashSet<DayKey>);

impl DaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, year: i32, month: u32, day: u32) {
        self.0.insert(DayKey::new(year, month, day));
    }

    pub fn delete(&mut self, year: i32, month: u32, day: u32) {
        self.0.remove(&DayKey::new(year, month, day));
    }

    pub fn has(&self, year: i32, month: u32, day: u32) -> bool {
        self.0.contains(&DayKey::new(year, month, day))
    }

    pub fn has_key(&self, key: DayKey) -> bool {
        self.0.contains(&key)
    }

    pub fn has_date(&self, date: NaiveDate) -> bool {
        self.has_key(DayKey::from_date(date))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DayKey> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<DayKey> for DaySet {
    fn from_iter<T: IntoIterator<Item = DayKey>>(iter: T) -> Self {
        DaySet(iter.into_iter().collect())
    }
}

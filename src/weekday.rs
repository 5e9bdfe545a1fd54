//! Weekday bitmask shared by the rule model and both text codecs.
//!
//! Bit *i* (for Sunday=0 … Saturday=6) corresponds to mask value `1 << i`.
//! The bit layout is part of the observable wire protocol (iteration order
//! is visible in both `RRULE` emitters), so it is kept as a plain integer
//! mask rather than an abstract set.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// A bitmask of weekdays, Sunday=bit 0 through Saturday=bit 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeekdaySet(pub u8);

/// Two-letter tokens in Sunday-first order, matching bit position.
pub const TOKENS: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

impl WeekdaySet {
    pub fn empty() -> Self {
        WeekdaySet(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// 0=Sunday … 6=Saturday, matching `spec.md`'s weekday numbering.
    pub fn index_of(weekday: Weekday) -> u32 {
        (weekday.num_days_from_sunday()) % 7
    }

    pub fn weekday_from_index(index: u32) -> Weekday {
        Weekday::try_from(((index + 6) % 7) as u8).expect("index is taken mod 7")
    }

    pub fn insert(&mut self, weekday: Weekday) {
        self.0 |= 1 << Self::index_of(weekday);
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << Self::index_of(weekday)) != 0
    }

    pub fn contains_index(&self, index: u32) -> bool {
        self.0 & (1 << index) != 0
    }

    /// Parse a two-letter token (`SU`, `MO`, ...), case-insensitive.
    pub fn token_to_weekday(token: &str) -> Option<Weekday> {
        let upper = token.to_ascii_uppercase();
        TOKENS
            .iter()
            .position(|t| *t == upper)
            .map(|idx| Self::weekday_from_index(idx as u32))
    }

    pub fn weekday_to_token(weekday: Weekday) -> &'static str {
        TOKENS[Self::index_of(weekday) as usize]
    }

    /// Iterate the selected weekdays in bit order 0..6 (Sunday first).
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        (0..7u32).filter(|i| self.contains_index(*i)).map(Self::weekday_from_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_of_sunday_is_zero() {
        assert_eq!(WeekdaySet::index_of(Weekday::Sun), 0);
        assert_eq!(WeekdaySet::index_of(Weekday::Sat), 6);
    }

    #[test]
    fn token_round_trip() {
        for token in TOKENS {
            let wd = WeekdaySet::token_to_weekday(token).unwrap();
            assert_eq!(WeekdaySet::weekday_to_token(wd), token);
        }
    }

    #[test]
    fn insert_and_contains() {
        let mut mask = WeekdaySet::empty();
        mask.insert(Weekday::Mon);
        mask.insert(Weekday::Wed);
        mask.insert(Weekday::Fri);
        assert!(mask.contains(Weekday::Mon));
        assert!(!mask.contains(Weekday::Tue));
        assert_eq!(
            mask.iter().collect::<Vec<_>>(),
            vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]
        );
    }
}

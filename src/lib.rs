//! # recurrence
//!
//! recurrence is a library for describing how calendar events repeat and for
//! answering two questions about a rule: when does it next occur after a
//! given instant, and is there any occurrence left at all. It is designed to
//! work with [`chrono`].
//!
//! # Rules
//!
//! A [`Rule`] describes how an event repeats: daily, weekly on specific
//! weekdays, monthly by date or by Nth weekday, yearly by date, day-of-year,
//! or Nth weekday of a month.
//!
//! ```
//! use chrono::NaiveDate;
//! use recurrence::{Kind, Rule};
//!
//! let start = NaiveDate::from_ymd_opt(2009, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let mut rule = Rule::new(start);
//! rule.set_kind(Kind::Daily);
//! rule.set_interval(2);
//! rule.set_count(3);
//!
//! let pivot = start;
//! assert_eq!(rule.next_after(pivot), Some(start));
//! ```
//!
//! # Exceptions and completions
//!
//! A rule carries two sets of day keys: [`exceptions`](Rule::exceptions) for
//! days to skip entirely, and [`completions`](Rule::completions) for days
//! already satisfied. Both are treated identically by
//! [`Rule::next_active_after`].
//!
//! # Wire formats
//!
//! Three codecs convert a [`Rule`] to and from external representations:
//!
//! - [`codec::legacy`] — the vCalendar 1.0 line-oriented `RRULE` format.
//! - [`codec::rrule`] — the iCalendar 2.0 key/value `RRULE` format.
//! - [`codec::hash`] — a structured named-field form.

pub mod codec;
pub mod date;
pub mod daykey;
mod engine;
mod parser;
pub mod rule;
pub mod weekday;

pub use crate::daykey::{DayKey, DaySet};
pub use crate::rule::{Kind, Rule, Termination};
pub use crate::weekday::WeekdaySet;

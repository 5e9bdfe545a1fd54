//! Bidirectional conversion between [`crate::Rule`] and three external
//! wire forms (`spec.md` §1, §4.3–§4.5). The codecs are pure serialization
//! layers: they never consult occurrences, only the rule's fields.

pub mod hash;
pub mod legacy;
pub mod rrule;

use chrono::NaiveDateTime;

/// `spec.md` §6.2: the single iCalendar datetime formatter the codecs use
/// to emit `UNTIL`. The calendar envelope serializer itself is out of
/// scope (`spec.md` §1); this is the minimal faithful stand-in for it.
pub fn format_ical_datetime(dt: NaiveDateTime) -> String {
    dt.format("%Y%m%dT%H%M%S").to_string()
}

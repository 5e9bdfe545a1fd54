//! Shared `nom` combinators for the text codecs, generalized from the
//! teacher's `parser.rs`.

use chrono::{NaiveDate, NaiveDateTime};
use nom::{
    bytes::complete::{take_while, take_while_m_n},
    character::{complete::char, is_digit},
    combinator::opt,
    error::Error,
    sequence::tuple,
    Err, IResult,
};

pub fn take_signed_digits(i: &[u8]) -> IResult<&[u8], i32> {
    let (i, negative) = opt(char('-'))(i)?;
    let (i, digits) = take_while(is_digit)(i)?;

    if digits.is_empty() {
        return Err(Err::Error(Error::new(i, nom::error::ErrorKind::Eof)));
    }

    let s = std::str::from_utf8(digits).expect("ascii digits are valid UTF-8");
    let res: i32 = s.parse().map_err(|_| Err::Error(Error::new(i, nom::error::ErrorKind::Digit)))?;

    Ok((i, if negative.is_some() { -res } else { res }))
}

pub fn take_n_digits(i: &[u8], n: usize) -> IResult<&[u8], u32> {
    let (i, digits) = take_while_m_n(n, n, is_digit)(i)?;
    let s = std::str::from_utf8(digits).expect("ascii digits are valid UTF-8");
    let res = s.parse().map_err(|_| Err::Error(Error::new(i, nom::error::ErrorKind::Digit)))?;
    Ok((i, res))
}

/// Parse an eight-digit `YYYYMMDD`, optionally followed by `THHMMSS`.
/// Used by both text codecs for `UNTIL`/terminator dates.
pub fn take_ical_datetime(i: &[u8]) -> IResult<&[u8], NaiveDateTime> {
    let (i, year) = take_n_digits(i, 4)?;
    let (i, month) = take_n_digits(i, 2)?;
    let (i, day) = take_n_digits(i, 2)?;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| Err::Error(Error::new(i, nom::error::ErrorKind::Verify)))?;

    let (i, time) = opt(tuple((char('T'), |i| take_n_digits(i, 2), |i| take_n_digits(i, 2), |i| take_n_digits(i, 2))))(i)?;

    let datetime = match time {
        Some((_, h, m, s)) => date
            .and_hms_opt(h, m, s)
            .ok_or_else(|| Err::Error(Error::new(i, nom::error::ErrorKind::Verify)))?,
        None => date.and_hms_opt(0, 0, 0).unwrap(),
    };

    Ok((i, datetime))
}

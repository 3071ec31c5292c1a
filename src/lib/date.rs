//! Day-precise calendar helpers, with a focus on edge cases
//!
//! Dates are plain `chrono::NaiveDate`s. This module adds what the dashboard
//! needs on top of them: month jumps that truncate the day to fit in the
//! target month, the boundaries of a month, Monday-first weekdays with their
//! localized labels, and `Period`, an inclusive range of dates as selected
//! by the user.

use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use thiserror::Error;

pub type Date = NaiveDate;

/// Weekday with Monday-first week convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Mon = 0,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    /// Canonical display order
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Get day of week
    pub fn of(date: Date) -> Self {
        use chrono::Weekday as W;
        match date.weekday() {
            W::Mon => Weekday::Mon,
            W::Tue => Weekday::Tue,
            W::Wed => Weekday::Wed,
            W::Thu => Weekday::Thu,
            W::Fri => Weekday::Fri,
            W::Sat => Weekday::Sat,
            W::Sun => Weekday::Sun,
        }
    }

    /// Name shown on the charts
    pub fn label(self) -> &'static str {
        use Weekday::*;
        match self {
            Mon => "Segunda",
            Tue => "Terça",
            Wed => "Quarta",
            Thu => "Quinta",
            Fri => "Sexta",
            Sat => "Sábado",
            Sun => "Domingo",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Get date of the last day of the current month
pub fn end_of_month(date: Date) -> Date {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(Date::MAX)
}

/// `count` months before/after `date`
///
/// Day will be truncated to fit in the new month:
/// going back one month from `2024-Mar-31` makes it `2024-Feb-29`.
/// Saturates at the bounds of the supported calendar.
pub fn jump_month(date: Date, count: i32) -> Date {
    let months = Months::new(count.unsigned_abs());
    if count >= 0 {
        date.checked_add_months(months).unwrap_or(Date::MAX)
    } else {
        date.checked_sub_months(months).unwrap_or(Date::MIN)
    }
}

/// Read a date written by a human or exported by a spreadsheet
///
/// Accepts `YYYY-MM-DD` (optionally followed by a time of day) and the
/// day-first `DD/MM/YYYY`.
pub fn parse_date(text: &str) -> Option<Date> {
    let text = text.trim();
    let day_part = match text.char_indices().nth(10) {
        Some((idx, 'T')) | Some((idx, ' ')) => &text[..idx],
        _ => text,
    };
    Date::parse_from_str(day_part, "%Y-%m-%d")
        .or_else(|_| Date::parse_from_str(day_part, "%d/%m/%Y"))
        .ok()
}

/// Ways in which a date range taken from user input can be wrong
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// not of the form `START..END` with two valid dates
    #[error("'{0}' is not a valid date range")]
    Malformed(String),
    /// END strictly before START
    #[error("range ends on {end} before it starts on {start}")]
    Reversed { start: Date, end: Date },
    /// not contained in the dates present in the data
    #[error("{period} is outside of the available data {bounds}")]
    OutOfBounds { period: Period, bounds: Period },
}

impl RangeError {
    /// What message to show to help fix the range error
    pub fn fix_hint(&self) -> String {
        use RangeError::*;
        match self {
            Malformed(_) => "use START..END with dates as YYYY-MM-DD or DD/MM/YYYY".to_string(),
            Reversed { start, end } => format!("did you mean {}..{} ?", end, start),
            OutOfBounds { bounds, .. } => format!(
                "pick dates between {} and {} inclusive",
                bounds.start, bounds.end
            ),
        }
    }
}

/// `Period { start, end }` is the range of dates from `start` to `end` inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: Date,
    pub end: Date,
}

impl Period {
    pub fn new(start: Date, end: Date) -> Result<Self, RangeError> {
        if start > end {
            Err(RangeError::Reversed { start, end })
        } else {
            Ok(Self { start, end })
        }
    }

    /// Parse `START..END`
    ///
    /// Both endpoints are mandatory: a single date or a half-open range
    /// is rejected.
    pub fn parse(text: &str) -> Result<Self, RangeError> {
        let malformed = || RangeError::Malformed(text.trim().to_string());
        let (start, end) = text.split_once("..").ok_or_else(malformed)?;
        let start = parse_date(start).ok_or_else(malformed)?;
        let end = parse_date(end).ok_or_else(malformed)?;
        Self::new(start, end)
    }

    /// Check that the range fits in `bounds`
    pub fn within(self, bounds: Period) -> Result<Self, RangeError> {
        if self.start < bounds.start || self.end > bounds.end {
            Err(RangeError::OutOfBounds {
                period: self,
                bounds,
            })
        } else {
            Ok(self)
        }
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days from `start` to `end` (0 for a single day)
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Comparable period one month earlier
    ///
    /// The start goes back one calendar month (with day truncation),
    /// the end is placed as many days after it as in `self`.
    pub fn previous_month(&self) -> Self {
        let start = jump_month(self.start, -1);
        let end = start
            .checked_add_signed(chrono::Duration::days(self.span_days()))
            .unwrap_or(Date::MAX);
        Self { start, end }
    }

    /// The range stops before the last day of its final month
    pub fn is_partial_month(&self) -> bool {
        self.end < end_of_month(self.end)
    }

    /// `dd/mm até dd/mm`
    pub fn short_label(&self) -> String {
        format!(
            "{} até {}",
            self.start.format("%d/%m"),
            self.end.format("%d/%m")
        )
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (a, b) = (self.start, self.end);
        let whole_months = a.day() == 1 && b == end_of_month(b);
        write!(f, "{}-{}", a.year(), a.format("%b"))?;
        if a.year() != b.year() {
            if !whole_months {
                write!(f, "-{}", a.day())?;
            }
            write!(f, "..{}-{}", b.year(), b.format("%b"))?;
            if !whole_months {
                write!(f, "-{}", b.day())?;
            }
        } else if a.month() != b.month() {
            if !whole_months {
                write!(f, "-{}", a.day())?;
            }
            write!(f, "..{}", b.format("%b"))?;
            if !whole_months {
                write!(f, "-{}", b.day())?;
            }
        } else if !whole_months {
            if a.day() == b.day() {
                write!(f, "-{}", a.day())?;
            } else {
                write!(f, "-{}..{}", a.day(), b.day())?;
            }
        }
        Ok(())
    }
}

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::novel::tracker::error::{Result, TrackerError};

/// Marker written when no prior comparable measurement exists.
pub const NOT_APPLICABLE: &str = "N/A";

/// Typed value of a single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Cell without content.
    #[default]
    Empty,
    /// Numeric value.
    Number(f64),
    /// Plain text.
    Text(String),
    /// Boolean value.
    Bool(bool),
    /// Calendar date without a time component.
    Date(NaiveDate),
    /// Time of day without a date component.
    Time(NaiveTime),
    /// Date and time.
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Returns the numeric content of the cell, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the calendar day of date-like cells. Text is never coerced.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(date) => Some(*date),
            CellValue::DateTime(datetime) => Some(datetime.date()),
            _ => None,
        }
    }

    /// True for cells without content.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Shorthand for the `N/A` sentinel.
    pub fn not_applicable() -> Self {
        CellValue::Text(NOT_APPLICABLE.to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::Date(date) => write!(f, "{}", date.format("%Y/%m/%d")),
            CellValue::Time(time) => write!(f, "{}", time.format("%H:%M:%S")),
            CellValue::DateTime(datetime) => {
                write!(f, "{}", datetime.format("%Y/%m/%d %H:%M:%S"))
            }
        }
    }
}

/// One-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub column: u16,
}

impl CellRef {
    /// Reference to `row` and `column`, both counted from 1.
    pub fn new(row: u32, column: u16) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for CellRef {
    /// Renders the reference in A1 notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.column), self.row)
    }
}

/// Converts a one-based column index into its letter form (`1` → `A`, `27` → `AA`).
pub fn column_name(column: u16) -> String {
    let mut remaining = u32::from(column);
    let mut letters = Vec::new();
    while remaining > 0 {
        let offset = ((remaining - 1) % 26) as u8;
        letters.push(char::from(b'A' + offset));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Content handed to a sheet store for a single cell.
///
/// A deferred difference stays recomputable: the store renders it as an
/// expression over the two referenced cells that falls back to
/// [`NOT_APPLICABLE`] when either operand is not numeric.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Literal(CellValue),
    DeferredDifference { current: CellRef, previous: CellRef },
}

impl From<CellValue> for CellContent {
    fn from(value: CellValue) -> Self {
        CellContent::Literal(value)
    }
}

/// Evaluates a guarded subtraction over two resolved operands.
pub fn guarded_difference(current: &CellValue, previous: &CellValue) -> CellValue {
    match (current.as_number(), previous.as_number()) {
        (Some(current), Some(previous)) => CellValue::Number(current - previous),
        _ => CellValue::not_applicable(),
    }
}

/// Recording policy of a tracking sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    /// One appended row per invocation, with a time column.
    Hourly,
    /// At most one row per calendar date, updated in place.
    Daily,
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetKind::Hourly => write!(f, "hourly"),
            SheetKind::Daily => write!(f, "daily"),
        }
    }
}

/// A character count taken at a specific local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub timestamp: NaiveDateTime,
    pub count: u64,
}

impl Measurement {
    /// Builds a measurement, rejecting negative counts.
    pub fn new(timestamp: NaiveDateTime, count: i64) -> Result<Self> {
        let count = u64::try_from(count).map_err(|_| {
            TrackerError::InvalidMeasurement(format!("character count {count} is negative"))
        })?;
        Ok(Self { timestamp, count })
    }

    /// Calendar day the measurement belongs to.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Time of day the measurement was taken.
    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }
}

//! Capabilities the tracker needs from its external services.
//!
//! The reconciler and the aggregator only talk to these traits, so the hosted
//! workbook and document folder can be swapped for the in-memory fakes in
//! [`crate::io::memory`].

use chrono::{Local, NaiveDateTime};

use crate::novel::tracker::error::Result;
use crate::novel::tracker::model::{CellContent, CellValue};

/// A single worksheet addressed by one-based row and column indexes.
pub trait SheetStore {
    /// Index of the last row holding any content, `0` for an empty sheet.
    fn last_row(&self) -> Result<u32>;

    /// Reads a rectangular block of resolved values. Cells outside the used
    /// area come back as [`CellValue::Empty`].
    fn read_range(
        &self,
        first_row: u32,
        first_column: u16,
        rows: u32,
        columns: u16,
    ) -> Result<Vec<Vec<CellValue>>>;

    /// Writes a literal or a deferred expression into one cell.
    fn write_cell(&mut self, row: u32, column: u16, content: CellContent) -> Result<()>;

    /// Sets the display number format of one cell.
    fn set_number_format(&mut self, row: u32, column: u16, format: &str) -> Result<()>;

    /// Reads the resolved value of one cell.
    fn read_cell(&self, row: u32, column: u16) -> Result<CellValue> {
        let mut block = self.read_range(row, column, 1, 1)?;
        Ok(block
            .pop()
            .and_then(|mut cells| cells.pop())
            .unwrap_or_default())
    }

    /// Reads one column from row 1 through `rows`.
    fn read_column(&self, column: u16, rows: u32) -> Result<Vec<CellValue>> {
        let block = self.read_range(1, column, rows, 1)?;
        Ok(block
            .into_iter()
            .map(|mut cells| cells.pop().unwrap_or_default())
            .collect())
    }
}

/// A workbook holding named sheets.
pub trait Spreadsheet {
    type Sheet: SheetStore;

    /// Names of every sheet in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Resolves a sheet by name, failing with
    /// [`TrackerError::MissingSheet`](crate::TrackerError::MissingSheet).
    fn sheet_mut(&mut self, name: &str) -> Result<&mut Self::Sheet>;

    /// Appends an empty sheet, returning the existing one if the name is taken.
    fn add_sheet(&mut self, name: &str) -> Result<&mut Self::Sheet>;

    /// Persists buffered writes.
    fn commit(&mut self) -> Result<()>;
}

/// Handle to a document exposed by a [`DocumentSource`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DocumentRef {
    pub name: String,
}

impl DocumentRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Read-only collection of manuscript documents.
pub trait DocumentSource {
    fn list_documents(&self) -> Result<Vec<DocumentRef>>;

    fn read_text(&self, document: &DocumentRef) -> Result<String>;
}

/// Source of the local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the system's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

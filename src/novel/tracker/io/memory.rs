use std::collections::BTreeMap;

use crate::novel::tracker::error::{Result, TrackerError};
use crate::novel::tracker::model::{CellContent, CellRef, CellValue, guarded_difference};
use crate::novel::tracker::store::{DocumentRef, DocumentSource, SheetStore, Spreadsheet};

/// Deferred differences referencing other differences are resolved at most
/// this many levels deep.
const MAX_EVALUATION_DEPTH: usize = 8;

/// Content held by a grid cell.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredCell {
    /// Literal value.
    Value(CellValue),
    /// Guarded subtraction over two cells, evaluated whenever it is read.
    Difference { current: CellRef, previous: CellRef },
    /// Formula the tracker does not understand, kept verbatim with the value
    /// last computed by the spreadsheet application.
    Formula { expression: String, cached: CellValue },
}

impl From<CellContent> for StoredCell {
    fn from(content: CellContent) -> Self {
        match content {
            CellContent::Literal(value) => StoredCell::Value(value),
            CellContent::DeferredDifference { current, previous } => {
                StoredCell::Difference { current, previous }
            }
        }
    }
}

/// Worksheet kept entirely in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    name: String,
    cells: BTreeMap<CellRef, StoredCell>,
    formats: BTreeMap<CellRef, String>,
    writes: usize,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builds a sheet whose rows start at row 1 and columns at column 1.
    pub fn with_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut sheet = Self::new(name);
        for (row_idx, row) in rows.into_iter().enumerate() {
            for (col_idx, value) in row.into_iter().enumerate() {
                if !value.is_empty() {
                    sheet.insert(
                        CellRef::new(row_idx as u32 + 1, col_idx as u16 + 1),
                        StoredCell::Value(value),
                    );
                }
            }
        }
        sheet
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Places a cell without counting it as a write.
    pub fn insert(&mut self, cell: CellRef, content: StoredCell) {
        if matches!(content, StoredCell::Value(CellValue::Empty)) {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, content);
        }
    }

    /// Places a number format without counting it as a write.
    pub fn insert_format(&mut self, cell: CellRef, format: impl Into<String>) {
        self.formats.insert(cell, format.into());
    }

    /// Raw content of a cell, before evaluation.
    pub fn stored(&self, row: u32, column: u16) -> Option<&StoredCell> {
        self.cells.get(&CellRef::new(row, column))
    }

    pub fn number_format(&self, row: u32, column: u16) -> Option<&str> {
        self.formats
            .get(&CellRef::new(row, column))
            .map(String::as_str)
    }

    /// Number of cell and format writes performed through [`SheetStore`].
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Iterates over every non-empty cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (&CellRef, &StoredCell)> {
        self.cells.iter()
    }

    /// Resolves the displayed value of a cell.
    pub fn value(&self, cell: CellRef) -> CellValue {
        self.evaluate(cell, 0)
    }

    fn evaluate(&self, cell: CellRef, depth: usize) -> CellValue {
        match self.cells.get(&cell) {
            None => CellValue::Empty,
            Some(StoredCell::Value(value)) => value.clone(),
            Some(StoredCell::Formula { cached, .. }) => cached.clone(),
            Some(StoredCell::Difference { current, previous }) => {
                if depth >= MAX_EVALUATION_DEPTH {
                    return CellValue::not_applicable();
                }
                guarded_difference(
                    &self.evaluate(*current, depth + 1),
                    &self.evaluate(*previous, depth + 1),
                )
            }
        }
    }
}

impl SheetStore for MemorySheet {
    fn last_row(&self) -> Result<u32> {
        Ok(self.cells.keys().map(|cell| cell.row).max().unwrap_or(0))
    }

    fn read_range(
        &self,
        first_row: u32,
        first_column: u16,
        rows: u32,
        columns: u16,
    ) -> Result<Vec<Vec<CellValue>>> {
        Ok((first_row..first_row + rows)
            .map(|row| {
                (first_column..first_column + columns)
                    .map(|column| self.value(CellRef::new(row, column)))
                    .collect()
            })
            .collect())
    }

    fn write_cell(&mut self, row: u32, column: u16, content: CellContent) -> Result<()> {
        if row == 0 || column == 0 {
            return Err(TrackerError::InvalidWorkbook(format!(
                "cell ({row}, {column}) is outside the sheet; indexes are one-based"
            )));
        }
        self.insert(CellRef::new(row, column), content.into());
        self.writes += 1;
        Ok(())
    }

    fn set_number_format(&mut self, row: u32, column: u16, format: &str) -> Result<()> {
        self.formats
            .insert(CellRef::new(row, column), format.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Workbook kept entirely in memory. `commit` only records that it happened.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
    commits: usize,
}

impl MemoryWorkbook {
    pub fn new(sheets: Vec<MemorySheet>) -> Self {
        Self { sheets, commits: 0 }
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|sheet| sheet.name() == name)
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl Spreadsheet for MemoryWorkbook {
    type Sheet = MemorySheet;

    fn sheet_names(&self) -> Vec<String> {
        self.sheets
            .iter()
            .map(|sheet| sheet.name().to_string())
            .collect()
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|sheet| sheet.name() == name)
            .ok_or_else(|| TrackerError::MissingSheet(name.to_string()))
    }

    fn add_sheet(&mut self, name: &str) -> Result<&mut MemorySheet> {
        let index = match self.sheets.iter().position(|sheet| sheet.name() == name) {
            Some(index) => index,
            None => {
                self.sheets.push(MemorySheet::new(name));
                self.sheets.len() - 1
            }
        };
        Ok(&mut self.sheets[index])
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}

/// Document source backed by a list of named texts.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocuments {
    documents: Vec<(String, Option<String>)>,
}

impl MemoryDocuments {
    pub fn new<N, T>(documents: impl IntoIterator<Item = (N, T)>) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        Self {
            documents: documents
                .into_iter()
                .map(|(name, text)| (name.into(), Some(text.into())))
                .collect(),
        }
    }

    /// Adds a document that is listed but fails to read.
    pub fn with_unreadable(mut self, name: impl Into<String>) -> Self {
        self.documents.push((name.into(), None));
        self
    }
}

impl DocumentSource for MemoryDocuments {
    fn list_documents(&self) -> Result<Vec<DocumentRef>> {
        Ok(self
            .documents
            .iter()
            .map(|(name, _)| DocumentRef::new(name.clone()))
            .collect())
    }

    fn read_text(&self, document: &DocumentRef) -> Result<String> {
        match self.documents.iter().find(|(name, _)| *name == document.name) {
            Some((_, Some(text))) => Ok(text.clone()),
            Some((name, None)) => Err(TrackerError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("document '{name}' is unreadable"),
            ))),
            None => Err(TrackerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("document '{}' not found", document.name),
            ))),
        }
    }
}

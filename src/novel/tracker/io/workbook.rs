use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::novel::tracker::error::{Result, TrackerError};
use crate::novel::tracker::io::excel_read;
use crate::novel::tracker::io::excel_write;
use crate::novel::tracker::io::memory::MemorySheet;
use crate::novel::tracker::store::Spreadsheet;

/// Spreadsheet backed by an `.xlsx` file.
///
/// The whole workbook is loaded on open and every write lands in memory;
/// [`Spreadsheet::commit`] rewrites the file in one go, so a run that fails
/// before committing leaves the file untouched.
///
/// Cell values, formulas and their cached results survive a commit. Number
/// formats do not, except the date and time formats implied by calamine's
/// cell types: calamine 0.21 cannot read arbitrary formats back, so a
/// currency or percentage format set in a spreadsheet application is lost
/// when the tracker rewrites the file.
#[derive(Debug)]
pub struct XlsxWorkbook {
    path: PathBuf,
    sheets: Vec<MemorySheet>,
}

impl XlsxWorkbook {
    /// Loads an existing workbook.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TrackerError::MissingInput(path.to_path_buf()));
        }
        let sheets = excel_read::read_workbook(path)?;
        debug!(sheet_count = sheets.len(), "workbook loaded");
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    /// Starts a new, empty workbook that will be written to `path`.
    pub fn create(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            sheets: Vec::new(),
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|sheet| sheet.name() == name)
    }
}

impl Spreadsheet for XlsxWorkbook {
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

    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    fn commit(&mut self) -> Result<()> {
        if self.sheets.is_empty() {
            return Err(TrackerError::InvalidWorkbook(
                "a workbook needs at least one sheet".to_string(),
            ));
        }
        excel_write::write_workbook(&self.path, &self.sheets)?;
        info!(sheet_count = self.sheets.len(), "workbook saved");
        Ok(())
    }
}

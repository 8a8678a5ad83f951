//! Row bookkeeping for a single measurement.
//!
//! A run first collects everything it needs from the sheet into a
//! [`RowPlan`] and only then writes, so the target row is either written in
//! full or not at all.

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::novel::tracker::config::{Config, SheetLayout};
use crate::novel::tracker::error::{Result, TrackerError};
use crate::novel::tracker::model::{CellContent, CellRef, CellValue, Measurement, SheetKind};
use crate::novel::tracker::store::SheetStore;

/// Difference written for the target row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Difference {
    /// No prior comparable measurement; the sentinel is written.
    NotApplicable,
    /// Guarded subtraction against the count in `previous_row`.
    Deferred { previous_row: u32, value: f64 },
}

/// A pending write to one cell of the target row.
#[derive(Debug, Clone, PartialEq)]
pub struct CellWrite {
    pub column: u16,
    pub content: CellContent,
    pub number_format: Option<String>,
}

/// Every write needed to record one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPlan {
    pub row: u32,
    /// `false` when an existing daily row is updated in place.
    pub appended: bool,
    pub difference: Difference,
    pub writes: Vec<CellWrite>,
}

impl RowPlan {
    pub fn apply<S: SheetStore + ?Sized>(&self, sheet: &mut S) -> Result<RecordOutcome> {
        for write in &self.writes {
            sheet.write_cell(self.row, write.column, write.content.clone())?;
            if let Some(format) = &write.number_format {
                sheet.set_number_format(self.row, write.column, format)?;
            }
        }
        Ok(RecordOutcome {
            row: self.row,
            appended: self.appended,
            difference: self.difference,
        })
    }
}

/// Summary of a completed recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordOutcome {
    pub row: u32,
    pub appended: bool,
    pub difference: Difference,
}

/// Decides where a measurement goes and what it is compared against.
#[derive(Debug, Clone)]
pub struct Reconciler {
    kind: SheetKind,
    layout: SheetLayout,
    date_format: String,
    time_format: String,
}

impl Reconciler {
    /// Builds a reconciler using the default date and time formats.
    pub fn new(layout: SheetLayout, kind: SheetKind) -> Result<Self> {
        let defaults = Config::default();
        Self::with_formats(layout, kind, defaults.date_format, defaults.time_format)
    }

    /// Builds a reconciler that stamps date and time cells with the given
    /// number formats. Fails when the layout does not suit `kind`.
    pub fn with_formats(
        layout: SheetLayout,
        kind: SheetKind,
        date_format: impl Into<String>,
        time_format: impl Into<String>,
    ) -> Result<Self> {
        layout.validate(kind)?;
        Ok(Self {
            kind,
            layout,
            date_format: date_format.into(),
            time_format: time_format.into(),
        })
    }

    pub fn from_config(config: &Config, kind: SheetKind) -> Result<Self> {
        Self::with_formats(
            config.layout(kind).clone(),
            kind,
            config.date_format.clone(),
            config.time_format.clone(),
        )
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// Reads the sheet and prepares the writes for `measurement` without
    /// touching it.
    pub fn plan<S: SheetStore + ?Sized>(
        &self,
        sheet: &S,
        measurement: &Measurement,
    ) -> Result<RowPlan> {
        let last_row = sheet.last_row()?;
        let (row, appended) = match self.kind {
            SheetKind::Hourly => (last_row + 1, true),
            SheetKind::Daily => match self.find_row_by_date(sheet, last_row, measurement.date())? {
                Some(row) => (row, false),
                None => (last_row + 1, true),
            },
        };
        debug!(row, appended, last_row, "selected target row");

        let difference = self.difference(sheet, row, measurement)?;

        let mut writes = vec![CellWrite {
            column: self.layout.date_column,
            content: CellValue::Date(measurement.date()).into(),
            number_format: Some(self.date_format.clone()),
        }];
        if self.kind == SheetKind::Hourly {
            let column = self.layout.time_column.ok_or_else(|| {
                TrackerError::InvalidConfig(format!(
                    "hourly sheet '{}' needs a time column",
                    self.layout.name
                ))
            })?;
            writes.push(CellWrite {
                column,
                content: CellValue::Time(measurement.time()).into(),
                number_format: Some(self.time_format.clone()),
            });
        }
        writes.push(CellWrite {
            column: self.layout.count_column,
            content: CellValue::Number(measurement.count as f64).into(),
            number_format: None,
        });
        writes.push(CellWrite {
            column: self.layout.difference_column,
            content: match difference {
                Difference::NotApplicable => CellValue::not_applicable().into(),
                Difference::Deferred { previous_row, .. } => CellContent::DeferredDifference {
                    current: CellRef::new(row, self.layout.count_column),
                    previous: CellRef::new(previous_row, self.layout.count_column),
                },
            },
            number_format: None,
        });

        Ok(RowPlan {
            row,
            appended,
            difference,
            writes,
        })
    }

    /// Plans and applies the writes for `measurement`.
    #[instrument(
        level = "info",
        skip_all,
        fields(kind = %self.kind, sheet = %self.layout.name, count = measurement.count)
    )]
    pub fn record<S: SheetStore + ?Sized>(
        &self,
        sheet: &mut S,
        measurement: &Measurement,
    ) -> Result<RecordOutcome> {
        let plan = self.plan(&*sheet, measurement)?;
        let outcome = plan.apply(sheet)?;
        info!(
            row = outcome.row,
            appended = outcome.appended,
            difference = ?outcome.difference,
            "measurement recorded"
        );
        Ok(outcome)
    }

    /// Finds the row already holding `date`. At most one such row exists, so
    /// the first match is the match.
    fn find_row_by_date<S: SheetStore + ?Sized>(
        &self,
        sheet: &S,
        last_row: u32,
        date: NaiveDate,
    ) -> Result<Option<u32>> {
        if last_row == 0 {
            return Ok(None);
        }
        let dates = sheet.read_column(self.layout.date_column, last_row)?;
        Ok(dates
            .iter()
            .position(|value| value.as_date() == Some(date))
            .map(|index| index as u32 + 1))
    }

    fn difference<S: SheetStore + ?Sized>(
        &self,
        sheet: &S,
        row: u32,
        measurement: &Measurement,
    ) -> Result<Difference> {
        if row <= 1 {
            return Ok(Difference::NotApplicable);
        }

        let previous_rows = row - 1;
        let counts = sheet.read_column(self.layout.count_column, previous_rows)?;
        let previous = match self.kind {
            SheetKind::Hourly => counts
                .last()
                .and_then(CellValue::as_number)
                .map(|count| (previous_rows, count)),
            SheetKind::Daily => {
                let dates = sheet.read_column(self.layout.date_column, previous_rows)?;
                let today = measurement.date();
                dates
                    .iter()
                    .zip(&counts)
                    .enumerate()
                    .rev()
                    .filter(|(_, (date, _))| date.as_date() != Some(today))
                    .find_map(|(index, (_, count))| {
                        count.as_number().map(|count| (index as u32 + 1, count))
                    })
            }
        };

        Ok(match previous {
            Some((previous_row, previous_count)) => Difference::Deferred {
                previous_row,
                value: measurement.count as f64 - previous_count,
            },
            None => Difference::NotApplicable,
        })
    }
}

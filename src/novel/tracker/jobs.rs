use std::fmt;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::novel::tracker::aggregate::aggregate;
use crate::novel::tracker::config::{Config, SheetLayout};
use crate::novel::tracker::error::{Result, TrackerError};
use crate::novel::tracker::model::{CellValue, Measurement, SheetKind};
use crate::novel::tracker::reconcile::{RecordOutcome, Reconciler};
use crate::novel::tracker::store::{Clock, DocumentSource, SheetStore, Spreadsheet};

/// Counts the manuscript and records the total on the sheet for `kind`.
///
/// The target sheet is resolved before anything is counted, and nothing is
/// written unless the count is valid. Writes are committed once at the end.
#[instrument(level = "info", skip(config, workbook, documents, clock))]
pub fn record<W, D, C>(
    kind: SheetKind,
    config: &Config,
    workbook: &mut W,
    documents: &D,
    clock: &C,
) -> Result<RecordOutcome>
where
    W: Spreadsheet + ?Sized,
    D: DocumentSource + ?Sized,
    C: Clock + ?Sized,
{
    let reconciler = Reconciler::from_config(config, kind)?;
    let sheet_name = reconciler.layout().name.clone();
    workbook.sheet_mut(&sheet_name)?;

    let total = aggregate(documents)?;
    let count = i64::try_from(total).map_err(|_| {
        TrackerError::InvalidMeasurement(format!("character count {total} is out of range"))
    })?;
    let measurement = Measurement::new(clock.now(), count)?;

    let sheet = workbook.sheet_mut(&sheet_name)?;
    let outcome = reconciler.record(sheet, &measurement)?;
    workbook.commit()?;
    Ok(outcome)
}

/// Entry point for the once-a-day schedule.
pub fn record_daily<W, D, C>(
    config: &Config,
    workbook: &mut W,
    documents: &D,
    clock: &C,
) -> Result<RecordOutcome>
where
    W: Spreadsheet + ?Sized,
    D: DocumentSource + ?Sized,
    C: Clock + ?Sized,
{
    record(SheetKind::Daily, config, workbook, documents, clock)
}

/// Entry point for the hourly schedule.
pub fn record_hourly<W, D, C>(
    config: &Config,
    workbook: &mut W,
    documents: &D,
    clock: &C,
) -> Result<RecordOutcome>
where
    W: Spreadsheet + ?Sized,
    D: DocumentSource + ?Sized,
    C: Clock + ?Sized,
{
    record(SheetKind::Hourly, config, workbook, documents, clock)
}

/// Counts the manuscript without recording anything.
pub fn count<D: DocumentSource + ?Sized>(documents: &D) -> Result<u64> {
    aggregate(documents)
}

/// Adds the daily and hourly sheets with their header rows. Sheets that
/// already hold data are left alone.
#[instrument(level = "info", skip_all)]
pub fn init_workbook<W: Spreadsheet + ?Sized>(config: &Config, workbook: &mut W) -> Result<()> {
    config.validate()?;
    for layout in [&config.daily, &config.hourly] {
        let sheet = workbook.add_sheet(&layout.name)?;
        if sheet.last_row()? > 0 {
            warn!(sheet = %layout.name, "sheet already holds data, leaving it unchanged");
            continue;
        }
        write_headers(sheet, layout)?;
        info!(sheet = %layout.name, "sheet initialised");
    }
    workbook.commit()
}

fn write_headers<S: SheetStore + ?Sized>(sheet: &mut S, layout: &SheetLayout) -> Result<()> {
    for (column, header) in layout.headers() {
        sheet.write_cell(1, column, CellValue::Text(header.to_string()).into())?;
    }
    Ok(())
}

/// Today's entry of the daily sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyEntry {
    pub row: u32,
    pub count: f64,
    pub difference: CellValue,
}

/// Distance to one cumulative target.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneProgress {
    pub label: String,
    pub target: u64,
    pub remaining: u64,
}

/// Progress toward the configured goals, read from the daily sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub date: NaiveDate,
    pub today: Option<DailyEntry>,
    /// Most recent numeric count on the sheet.
    pub latest_count: Option<f64>,
    pub daily_goal: u64,
    pub milestones: Vec<MilestoneProgress>,
}

impl StatusReport {
    /// Characters written today, when today's difference is known.
    pub fn written_today(&self) -> Option<f64> {
        self.today
            .as_ref()
            .and_then(|entry| entry.difference.as_number())
    }

    pub fn daily_goal_met(&self) -> bool {
        self.written_today()
            .is_some_and(|written| written >= self.daily_goal as f64)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "date: {}", self.date.format("%Y/%m/%d"))?;
        match &self.today {
            Some(entry) => writeln!(
                f,
                "today: {} characters (row {}, difference {})",
                entry.count, entry.row, entry.difference
            )?,
            None => writeln!(f, "today: not recorded yet")?,
        }
        match self.written_today() {
            Some(written) => writeln!(
                f,
                "daily goal: {written}/{} ({})",
                self.daily_goal,
                if self.daily_goal_met() { "met" } else { "not met" }
            )?,
            None => writeln!(f, "daily goal: {} (no difference yet)", self.daily_goal)?,
        }
        for milestone in &self.milestones {
            writeln!(
                f,
                "{}: {} characters to go (target {})",
                milestone.label, milestone.remaining, milestone.target
            )?;
        }
        Ok(())
    }
}

/// Reports today's daily entry and the distance to each goal.
pub fn status<W, C>(config: &Config, workbook: &mut W, clock: &C) -> Result<StatusReport>
where
    W: Spreadsheet + ?Sized,
    C: Clock + ?Sized,
{
    let layout = &config.daily;
    let sheet = workbook.sheet_mut(&layout.name)?;
    let date = clock.now().date();
    let last_row = sheet.last_row()?;

    let dates = sheet.read_column(layout.date_column, last_row)?;
    let counts = sheet.read_column(layout.count_column, last_row)?;

    let today = match dates.iter().position(|value| value.as_date() == Some(date)) {
        Some(index) => {
            let row = index as u32 + 1;
            match counts[index].as_number() {
                Some(count) => Some(DailyEntry {
                    row,
                    count,
                    difference: sheet.read_cell(row, layout.difference_column)?,
                }),
                None => None,
            }
        }
        None => None,
    };
    let latest_count = counts.iter().rev().find_map(CellValue::as_number);

    let reached = latest_count.unwrap_or(0.0).max(0.0) as u64;
    let milestones = config
        .goals
        .milestones
        .iter()
        .map(|milestone| MilestoneProgress {
            label: milestone.label.clone(),
            target: milestone.target,
            remaining: milestone.target.saturating_sub(reached),
        })
        .collect();

    Ok(StatusReport {
        date,
        today,
        latest_count,
        daily_goal: config.goals.daily,
        milestones,
    })
}

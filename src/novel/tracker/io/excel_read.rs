use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;

use crate::novel::tracker::error::{Result, TrackerError};
use crate::novel::tracker::io::memory::{MemorySheet, StoredCell};
use crate::novel::tracker::model::{CellRef, CellValue};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Reads every sheet of the workbook at `path`, keeping values, formulas and
/// the date/time formats implied by calamine's cell types.
pub fn read_workbook(path: &Path) -> Result<Vec<MemorySheet>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let values = read_required_sheet(&mut workbook, &name)?;
        let formulas = workbook.worksheet_formula(&name).transpose()?;
        let sheet = build_sheet(&name, &values, formulas.as_ref());
        debug!(sheet = %name, cells = sheet.cells().count(), "loaded sheet");
        sheets.push(sheet);
    }
    Ok(sheets)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| TrackerError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(TrackerError::from)?;
    Ok(range)
}

fn build_sheet(
    name: &str,
    values: &Range<DataType>,
    formulas: Option<&Range<String>>,
) -> MemorySheet {
    let mut sheet = MemorySheet::new(name);

    if let Some((row0, col0)) = values.start() {
        for (row, col, cell) in values.cells() {
            let value = data_to_cell(cell);
            if value.is_empty() {
                continue;
            }
            let cell_ref = absolute(row0, col0, row, col);
            if let Some(format) = implied_format(&value) {
                sheet.insert_format(cell_ref, format);
            }
            sheet.insert(cell_ref, StoredCell::Value(value));
        }
    }

    if let Some(formulas) = formulas {
        if let Some((row0, col0)) = formulas.start() {
            for (row, col, expression) in formulas.cells() {
                if expression.trim().is_empty() {
                    continue;
                }
                let cell_ref = absolute(row0, col0, row, col);
                let stored = match parse_difference_formula(expression) {
                    Some((current, previous)) => StoredCell::Difference { current, previous },
                    None => {
                        let cached = sheet.value(cell_ref);
                        StoredCell::Formula {
                            expression: expression.trim_start_matches('=').to_string(),
                            cached,
                        }
                    }
                };
                sheet.insert(cell_ref, stored);
            }
        }
    }

    sheet
}

fn absolute(row0: u32, col0: u32, row: usize, col: usize) -> CellRef {
    CellRef::new(row0 + row as u32 + 1, (col0 as usize + col + 1) as u16)
}

/// Converts a calamine cell into the tracker's value model.
pub fn data_to_cell(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Empty,
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::DateTime(serial) => serial_to_cell(*serial),
        other => CellValue::Text(other.to_string()),
    }
}

/// Converts an Excel serial date (days since 1899-12-30) into a date, a
/// time or a date-time depending on which parts are present.
pub fn serial_to_cell(serial: f64) -> CellValue {
    let mut days = serial.trunc() as i64;
    let mut seconds = ((serial - serial.trunc()) * SECONDS_PER_DAY).round() as u32;
    if seconds >= SECONDS_PER_DAY as u32 {
        days += 1;
        seconds = 0;
    }

    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or(NaiveTime::MIN);
    if days == 0 {
        return CellValue::Time(time);
    }

    let date = excel_epoch() + Duration::days(days);
    if seconds == 0 {
        CellValue::Date(date)
    } else {
        CellValue::DateTime(date.and_time(time))
    }
}

pub(crate) fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Display format for date-like values that carry none of their own.
pub(crate) fn implied_format(value: &CellValue) -> Option<&'static str> {
    match value {
        CellValue::Date(_) => Some("yyyy/mm/dd"),
        CellValue::Time(_) => Some("hh:mm:ss"),
        CellValue::DateTime(_) => Some("yyyy/mm/dd hh:mm:ss"),
        _ => None,
    }
}

/// Recognises the guarded subtraction written by the tracker,
/// `IFERROR(C3-C2,"N/A")`, and returns its two operands.
pub fn parse_difference_formula(expression: &str) -> Option<(CellRef, CellRef)> {
    let compact: String = expression
        .trim_start_matches('=')
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect();
    let inner = compact
        .strip_prefix("IFERROR(")?
        .strip_suffix(",\"N/A\")")?;
    let (current, previous) = inner.split_once('-')?;
    Some((parse_a1(current)?, parse_a1(previous)?))
}

/// Parses a relative or absolute A1 reference such as `C3` or `$C$3`.
pub fn parse_a1(reference: &str) -> Option<CellRef> {
    let reference = reference.replace('$', "");
    let split = reference.find(|ch: char| ch.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|ch| ch.is_ascii_uppercase()) {
        return None;
    }

    let mut column: u32 = 0;
    for ch in letters.chars() {
        column = column * 26 + (ch as u32 - 'A' as u32 + 1);
        if column > u32::from(u16::MAX) {
            return None;
        }
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some(CellRef::new(row, column as u16))
}

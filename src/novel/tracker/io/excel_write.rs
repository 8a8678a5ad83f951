use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Timelike};
use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet};

use crate::novel::tracker::error::Result;
use crate::novel::tracker::io::excel_read::{excel_epoch, implied_format};
use crate::novel::tracker::io::memory::{MemorySheet, StoredCell};
use crate::novel::tracker::model::{CellRef, CellValue, NOT_APPLICABLE};

/// Writes the provided sheets to the given path, replacing the file.
pub fn write_workbook(path: &Path, sheets: &[MemorySheet]) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(sheet.name())?;

        for (cell_ref, stored) in sheet.cells() {
            write_stored_cell(worksheet, sheet, *cell_ref, stored)?;
        }
    }

    workbook_writer.save(path)?;
    Ok(())
}

fn write_stored_cell(
    worksheet: &mut Worksheet,
    sheet: &MemorySheet,
    cell_ref: CellRef,
    stored: &StoredCell,
) -> Result<()> {
    let row = cell_ref.row - 1;
    let col = cell_ref.column - 1;
    let format = sheet
        .number_format(cell_ref.row, cell_ref.column)
        .map(|pattern| Format::new().set_num_format(pattern));

    match stored {
        StoredCell::Value(value) => write_value(worksheet, row, col, value, format.as_ref())?,
        StoredCell::Difference { current, previous } => {
            let mut formula = Formula::new(&render_difference_formula(*current, *previous));
            if let Some(result) = cached_result(&sheet.value(cell_ref)) {
                formula = formula.set_result(result);
            }
            write_formula(worksheet, row, col, formula, format.as_ref())?;
        }
        StoredCell::Formula { expression, cached } => {
            let mut formula = Formula::new(&format!("={expression}"));
            if let Some(result) = cached_result(cached) {
                formula = formula.set_result(result);
            }
            write_formula(worksheet, row, col, formula, format.as_ref())?;
        }
    }
    Ok(())
}

/// Text stored as a formula's last computed value. Date-like values are
/// cached as their serial number.
fn cached_result(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Empty => None,
        CellValue::Number(number) => Some(number.to_string()),
        CellValue::Text(text) => Some(text.clone()),
        CellValue::Bool(true) => Some("TRUE".to_string()),
        CellValue::Bool(false) => Some("FALSE".to_string()),
        CellValue::Date(date) => Some(date_serial(*date).to_string()),
        CellValue::Time(time) => Some(time_serial(*time).to_string()),
        CellValue::DateTime(datetime) => {
            Some((date_serial(datetime.date()) + time_serial(datetime.time())).to_string())
        }
    }
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: Option<&Format>,
) -> Result<()> {
    let serial = match value {
        CellValue::Empty => return Ok(()),
        CellValue::Text(text) => {
            worksheet.write_string(row, col, text)?;
            return Ok(());
        }
        CellValue::Bool(flag) => {
            worksheet.write_boolean(row, col, *flag)?;
            return Ok(());
        }
        CellValue::Number(number) => *number,
        CellValue::Date(date) => date_serial(*date),
        CellValue::Time(time) => time_serial(*time),
        CellValue::DateTime(datetime) => {
            date_serial(datetime.date()) + time_serial(datetime.time())
        }
    };

    match (format, implied_format(value)) {
        (Some(format), _) => worksheet.write_number_with_format(row, col, serial, format)?,
        (None, Some(pattern)) => {
            let format = Format::new().set_num_format(pattern);
            worksheet.write_number_with_format(row, col, serial, &format)?
        }
        (None, None) => worksheet.write_number(row, col, serial)?,
    };
    Ok(())
}

fn write_formula(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    formula: Formula,
    format: Option<&Format>,
) -> Result<()> {
    match format {
        Some(format) => worksheet.write_formula_with_format(row, col, formula, format)?,
        None => worksheet.write_formula(row, col, formula)?,
    };
    Ok(())
}

/// Renders a guarded subtraction, e.g. `=IFERROR(C3-C2,"N/A")`.
pub fn render_difference_formula(current: CellRef, previous: CellRef) -> String {
    format!("=IFERROR({current}-{previous},\"{NOT_APPLICABLE}\")")
}

fn date_serial(date: NaiveDate) -> f64 {
    (date - excel_epoch()).num_days() as f64
}

fn time_serial(time: NaiveTime) -> f64 {
    f64::from(time.num_seconds_from_midnight()) / 86_400.0
}

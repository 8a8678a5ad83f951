use chrono::{NaiveDate, NaiveDateTime};
use novel_tracker::TrackerError;
use novel_tracker::config::SheetLayout;
use novel_tracker::io::memory::{MemorySheet, StoredCell};
use novel_tracker::model::{CellRef, CellValue, Measurement, NOT_APPLICABLE, SheetKind};
use novel_tracker::reconcile::{Difference, Reconciler};
use novel_tracker::store::SheetStore;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).expect("valid date")
}

fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    date(month, day).and_hms_opt(hour, 0, 0).expect("valid time")
}

fn measurement(timestamp: NaiveDateTime, count: i64) -> Measurement {
    Measurement::new(timestamp, count).expect("valid measurement")
}

fn daily_reconciler() -> Reconciler {
    Reconciler::new(SheetLayout::daily(), SheetKind::Daily).expect("daily reconciler")
}

fn hourly_reconciler() -> Reconciler {
    Reconciler::new(SheetLayout::hourly(), SheetKind::Hourly).expect("hourly reconciler")
}

fn daily_row(day: NaiveDate, count: f64) -> Vec<CellValue> {
    vec![
        CellValue::Date(day),
        CellValue::Number(count),
        CellValue::Empty,
    ]
}

fn na() -> CellValue {
    CellValue::Text(NOT_APPLICABLE.to_string())
}

#[test]
fn first_row_of_empty_sheet_gets_sentinel() {
    for reconciler in [daily_reconciler(), hourly_reconciler()] {
        let layout = reconciler.layout().clone();
        let mut sheet = MemorySheet::new(layout.name.clone());

        let outcome = reconciler
            .record(&mut sheet, &measurement(at(1, 1, 9), 100))
            .expect("recorded");

        assert_eq!(outcome.row, 1);
        assert!(outcome.appended);
        assert_eq!(outcome.difference, Difference::NotApplicable);
        assert_eq!(sheet.read_cell(1, layout.difference_column).unwrap(), na());
        assert_eq!(
            sheet.read_cell(1, layout.count_column).unwrap(),
            CellValue::Number(100.0)
        );
    }
}

#[test]
fn daily_appends_new_date_and_diffs_against_previous_day() {
    let mut sheet = MemorySheet::with_rows(
        "Daily",
        vec![daily_row(date(1, 1), 100.0), daily_row(date(1, 2), 130.0)],
    );

    let outcome = daily_reconciler()
        .record(&mut sheet, &measurement(at(1, 3, 23), 150))
        .expect("recorded");

    assert_eq!(outcome.row, 3);
    assert_eq!(
        outcome.difference,
        Difference::Deferred {
            previous_row: 2,
            value: 20.0
        }
    );
    assert_eq!(sheet.read_cell(3, 1).unwrap(), CellValue::Date(date(1, 3)));
    assert_eq!(sheet.read_cell(3, 3).unwrap(), CellValue::Number(20.0));
    assert_eq!(
        sheet.stored(3, 3),
        Some(&StoredCell::Difference {
            current: CellRef::new(3, 2),
            previous: CellRef::new(2, 2)
        })
    );
    assert_eq!(sheet.read_cell(1, 2).unwrap(), CellValue::Number(100.0));
    assert_eq!(sheet.read_cell(2, 2).unwrap(), CellValue::Number(130.0));
}

#[test]
fn daily_updates_todays_row_in_place() {
    let mut sheet = MemorySheet::with_rows(
        "Daily",
        vec![daily_row(date(1, 1), 100.0), daily_row(date(1, 2), 120.0)],
    );
    let reconciler = daily_reconciler();

    let first = reconciler
        .record(&mut sheet, &measurement(at(1, 2, 21), 125))
        .expect("first run");
    let second = reconciler
        .record(&mut sheet, &measurement(at(1, 2, 22), 125))
        .expect("second run");

    assert_eq!(first.row, 2);
    assert!(!first.appended);
    assert_eq!(first, second);
    assert_eq!(sheet.last_row().unwrap(), 2);
    assert_eq!(sheet.read_cell(2, 2).unwrap(), CellValue::Number(125.0));
    assert_eq!(sheet.read_cell(2, 3).unwrap(), CellValue::Number(25.0));
}

#[test]
fn daily_lookback_skips_rows_sharing_todays_date() {
    let mut sheet = MemorySheet::with_rows(
        "Daily",
        vec![
            daily_row(date(1, 1), 100.0),
            daily_row(date(1, 2), 120.0),
            daily_row(date(1, 2), 125.0),
        ],
    );

    let outcome = daily_reconciler()
        .record(&mut sheet, &measurement(at(1, 2, 23), 125))
        .expect("recorded");

    assert_eq!(outcome.row, 2);
    assert_eq!(
        outcome.difference,
        Difference::Deferred {
            previous_row: 1,
            value: 25.0
        }
    );

    let mut appended = MemorySheet::with_rows(
        "Daily",
        vec![
            daily_row(date(1, 1), 100.0),
            daily_row(date(1, 2), 120.0),
        ],
    );
    appended.insert(CellRef::new(3, 2), StoredCell::Value(CellValue::Number(125.0)));
    appended.insert(CellRef::new(3, 1), StoredCell::Value(CellValue::Date(date(1, 3))));
    let plan = daily_reconciler()
        .plan(&appended, &measurement(at(1, 3, 23), 140))
        .expect("planned");
    assert_eq!(plan.row, 3);
    assert_eq!(
        plan.difference,
        Difference::Deferred {
            previous_row: 2,
            value: 20.0
        }
    );
}

#[test]
fn daily_lookback_skips_non_numeric_counts_and_headers() {
    let mut sheet = MemorySheet::with_rows(
        "Daily",
        vec![
            vec![
                CellValue::Text("Date".into()),
                CellValue::Text("Count".into()),
                CellValue::Text("Difference".into()),
            ],
            daily_row(date(1, 1), 100.0),
            vec![CellValue::Date(date(1, 2)), CellValue::Text("?".into())],
        ],
    );

    let outcome = daily_reconciler()
        .record(&mut sheet, &measurement(at(1, 3, 23), 180))
        .expect("recorded");

    assert_eq!(outcome.row, 4);
    assert_eq!(
        outcome.difference,
        Difference::Deferred {
            previous_row: 2,
            value: 80.0
        }
    );
}

#[test]
fn no_numeric_predecessor_writes_literal_sentinel() {
    let mut sheet = MemorySheet::with_rows(
        "Daily",
        vec![vec![
            CellValue::Text("Date".into()),
            CellValue::Text("Count".into()),
            CellValue::Text("Difference".into()),
        ]],
    );

    let outcome = daily_reconciler()
        .record(&mut sheet, &measurement(at(1, 1, 23), 50))
        .expect("recorded");

    assert_eq!(outcome.row, 2);
    assert_eq!(outcome.difference, Difference::NotApplicable);
    assert_eq!(sheet.stored(2, 3), Some(&StoredCell::Value(na())));
}

#[test]
fn hourly_always_appends_with_time() {
    let mut sheet = MemorySheet::new("Hourly");
    let reconciler = hourly_reconciler();
    let counts = [100, 100, 140];

    for (hour, count) in counts.iter().enumerate() {
        let outcome = reconciler
            .record(&mut sheet, &measurement(at(1, 1, 9 + hour as u32), *count))
            .expect("recorded");
        assert_eq!(outcome.row, hour as u32 + 1);
        assert!(outcome.appended);
    }

    assert_eq!(sheet.last_row().unwrap(), 3);
    for row in 1..=3 {
        assert!(matches!(sheet.read_cell(row, 2).unwrap(), CellValue::Time(_)));
        assert_eq!(sheet.number_format(row, 2), Some("hh:mm:ss"));
        assert_eq!(sheet.number_format(row, 1), Some("yyyy/mm/dd"));
    }
    assert_eq!(sheet.read_cell(1, 4).unwrap(), na());
    assert_eq!(sheet.read_cell(2, 4).unwrap(), CellValue::Number(0.0));
    assert_eq!(sheet.read_cell(3, 4).unwrap(), CellValue::Number(40.0));
}

#[test]
fn hourly_compares_with_previous_row_even_on_same_timestamp() {
    let mut sheet = MemorySheet::new("Hourly");
    let reconciler = hourly_reconciler();
    let timestamp = at(1, 1, 9);

    reconciler
        .record(&mut sheet, &measurement(timestamp, 100))
        .expect("first");
    let outcome = reconciler
        .record(&mut sheet, &measurement(timestamp, 110))
        .expect("second");

    assert_eq!(
        outcome.difference,
        Difference::Deferred {
            previous_row: 1,
            value: 10.0
        }
    );
}

#[test]
fn hourly_with_non_numeric_previous_row_writes_sentinel() {
    let mut sheet = MemorySheet::with_rows(
        "Hourly",
        vec![vec![
            CellValue::Text("Date".into()),
            CellValue::Text("Time".into()),
            CellValue::Text("Count".into()),
            CellValue::Text("Difference".into()),
        ]],
    );

    let outcome = hourly_reconciler()
        .record(&mut sheet, &measurement(at(1, 1, 9), 10))
        .expect("recorded");

    assert_eq!(outcome.row, 2);
    assert_eq!(outcome.difference, Difference::NotApplicable);
}

#[test]
fn deferred_difference_degrades_when_previous_count_changes() {
    let mut sheet = MemorySheet::with_rows(
        "Daily",
        vec![daily_row(date(1, 1), 100.0), daily_row(date(1, 2), 130.0)],
    );
    daily_reconciler()
        .record(&mut sheet, &measurement(at(1, 3, 23), 150))
        .expect("recorded");

    sheet.insert(
        CellRef::new(2, 2),
        StoredCell::Value(CellValue::Text("lost".into())),
    );

    assert_eq!(sheet.read_cell(3, 3).unwrap(), na());
}

#[test]
fn plan_does_not_touch_the_sheet() {
    let sheet = MemorySheet::with_rows("Daily", vec![daily_row(date(1, 1), 100.0)]);

    let plan = daily_reconciler()
        .plan(&sheet, &measurement(at(1, 2, 23), 120))
        .expect("planned");

    assert_eq!(plan.row, 2);
    assert_eq!(plan.writes.len(), 3);
    assert_eq!(sheet.write_count(), 0);
}

#[test]
fn negative_count_is_an_invalid_measurement() {
    let error = Measurement::new(at(1, 1, 0), -1).expect_err("negative count rejected");

    assert!(matches!(error, TrackerError::InvalidMeasurement(_)));
}

#[test]
fn hourly_layout_requires_time_column() {
    let mut layout = SheetLayout::hourly();
    layout.time_column = None;

    let error = Reconciler::new(layout, SheetKind::Hourly).expect_err("layout rejected");

    assert!(matches!(error, TrackerError::InvalidConfig(_)));
}

#[test]
fn custom_layout_columns_are_respected() {
    let layout = SheetLayout {
        name: "Log".to_string(),
        date_column: 2,
        time_column: None,
        count_column: 5,
        difference_column: 3,
    };
    let reconciler = Reconciler::new(layout, SheetKind::Daily).expect("reconciler");
    let mut sheet = MemorySheet::new("Log");

    reconciler
        .record(&mut sheet, &measurement(at(1, 1, 23), 42))
        .expect("first");
    reconciler
        .record(&mut sheet, &measurement(at(1, 2, 23), 50))
        .expect("second");

    assert_eq!(sheet.read_cell(2, 2).unwrap(), CellValue::Date(date(1, 2)));
    assert_eq!(sheet.read_cell(2, 5).unwrap(), CellValue::Number(50.0));
    assert_eq!(sheet.read_cell(2, 3).unwrap(), CellValue::Number(8.0));
    assert_eq!(sheet.read_cell(2, 1).unwrap(), CellValue::Empty);
}

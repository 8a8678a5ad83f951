use chrono::{NaiveDate, NaiveDateTime};
use novel_tracker::TrackerError;
use novel_tracker::config::Config;
use novel_tracker::io::memory::{MemoryDocuments, MemorySheet, MemoryWorkbook};
use novel_tracker::jobs;
use novel_tracker::model::{CellValue, NOT_APPLICABLE};
use novel_tracker::reconcile::Difference;
use novel_tracker::store::{FixedClock, SheetStore, Spreadsheet};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .and_then(|date| date.and_hms_opt(hour, 30, 0))
        .expect("valid timestamp")
}

fn manuscript(bodies: &[&str]) -> MemoryDocuments {
    MemoryDocuments::new(
        bodies
            .iter()
            .enumerate()
            .map(|(idx, body)| (format!("{idx:02}.md"), format!("---\nn: {idx}\n---\n{body}"))),
    )
}

fn tracker_workbook() -> MemoryWorkbook {
    MemoryWorkbook::new(vec![MemorySheet::new("Daily"), MemorySheet::new("Hourly")])
}

#[test]
fn daily_run_twice_on_same_day_keeps_one_row() {
    let config = Config::default();
    let mut workbook = tracker_workbook();
    let documents = manuscript(&["AB\nCD", "EF GH"]);

    let first = jobs::record_daily(&config, &mut workbook, &documents, &FixedClock(at(1, 21)))
        .expect("first run");
    let second = jobs::record_daily(&config, &mut workbook, &documents, &FixedClock(at(1, 23)))
        .expect("second run");

    assert_eq!(first, second);
    assert_eq!(workbook.commit_count(), 2);
    let sheet = workbook.sheet("Daily").expect("daily sheet");
    assert_eq!(sheet.last_row().unwrap(), 1);
    assert_eq!(sheet.read_cell(1, 2).unwrap(), CellValue::Number(8.0));
    assert_eq!(
        sheet.read_cell(1, 3).unwrap(),
        CellValue::Text(NOT_APPLICABLE.to_string())
    );
}

#[test]
fn hourly_runs_append_one_row_each() {
    let config = Config::default();
    let mut workbook = tracker_workbook();
    let documents = manuscript(&["abc"]);

    for hour in 0..5 {
        let outcome =
            jobs::record_hourly(&config, &mut workbook, &documents, &FixedClock(at(2, hour)))
                .expect("hourly run");
        assert_eq!(outcome.row, hour + 1);
    }

    let sheet = workbook.sheet("Hourly").expect("hourly sheet");
    assert_eq!(sheet.last_row().unwrap(), 5);
    for row in 1..=5 {
        assert!(matches!(sheet.read_cell(row, 2).unwrap(), CellValue::Time(_)));
    }
    assert_eq!(workbook.sheet("Daily").expect("daily sheet").write_count(), 0);
}

#[test]
fn malformed_document_aborts_without_writes() {
    let config = Config::default();
    let mut workbook = tracker_workbook();
    let documents = MemoryDocuments::new([("01.md", "missing header")]);

    let error = jobs::record_daily(&config, &mut workbook, &documents, &FixedClock(at(1, 9)))
        .expect_err("malformed document rejected");

    assert!(matches!(error, TrackerError::MalformedDocument { .. }));
    assert_eq!(workbook.commit_count(), 0);
    assert_eq!(workbook.sheet("Daily").expect("daily sheet").write_count(), 0);
}

#[test]
fn missing_sheet_is_reported_before_counting() {
    let config = Config::default();
    let mut workbook = MemoryWorkbook::new(vec![MemorySheet::new("Hourly")]);
    let documents = MemoryDocuments::new([("01.md", "missing header")]);

    let error = jobs::record_daily(&config, &mut workbook, &documents, &FixedClock(at(1, 9)))
        .expect_err("missing sheet rejected");

    match error {
        TrackerError::MissingSheet(name) => assert_eq!(name, "Daily"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn count_reports_total_without_a_workbook() {
    let documents = manuscript(&["一二三", "四 五"]);

    assert_eq!(jobs::count(&documents).expect("counted"), 5);
}

#[test]
fn init_writes_headers_and_keeps_existing_data() {
    let config = Config::default();
    let mut workbook = MemoryWorkbook::new(vec![MemorySheet::with_rows(
        "Daily",
        vec![vec![CellValue::Text("kept".into())]],
    )]);

    jobs::init_workbook(&config, &mut workbook).expect("initialised");

    assert_eq!(workbook.sheet_names(), vec!["Daily", "Hourly"]);
    let daily = workbook.sheet("Daily").expect("daily sheet");
    assert_eq!(daily.read_cell(1, 1).unwrap(), CellValue::Text("kept".into()));
    let hourly = workbook.sheet("Hourly").expect("hourly sheet");
    assert_eq!(
        hourly.read_range(1, 1, 1, 4).unwrap(),
        vec![vec![
            CellValue::Text("Date".into()),
            CellValue::Text("Time".into()),
            CellValue::Text("Count".into()),
            CellValue::Text("Difference".into()),
        ]]
    );
    assert_eq!(workbook.commit_count(), 1);
}

#[test]
fn recording_after_init_treats_header_as_non_comparable() {
    let config = Config::default();
    let mut workbook = MemoryWorkbook::default();
    jobs::init_workbook(&config, &mut workbook).expect("initialised");

    let first = jobs::record_daily(
        &config,
        &mut workbook,
        &manuscript(&["abcd"]),
        &FixedClock(at(1, 23)),
    )
    .expect("first day");
    let second = jobs::record_daily(
        &config,
        &mut workbook,
        &manuscript(&["abcdefg"]),
        &FixedClock(at(2, 23)),
    )
    .expect("second day");

    assert_eq!(first.row, 2);
    assert_eq!(first.difference, Difference::NotApplicable);
    assert_eq!(second.row, 3);
    assert_eq!(
        second.difference,
        Difference::Deferred {
            previous_row: 2,
            value: 3.0
        }
    );
}

#[test]
fn status_reports_goal_progress() {
    let mut config = Config::default();
    config.goals.daily = 3;
    let mut workbook = tracker_workbook();
    jobs::record_daily(&config, &mut workbook, &manuscript(&["ab"]), &FixedClock(at(1, 23)))
        .expect("first day");
    jobs::record_daily(&config, &mut workbook, &manuscript(&["abcdef"]), &FixedClock(at(2, 23)))
        .expect("second day");

    let report = jobs::status(&config, &mut workbook, &FixedClock(at(2, 23))).expect("status");

    let today = report.today.as_ref().expect("today recorded");
    assert_eq!(today.row, 2);
    assert_eq!(today.count, 6.0);
    assert_eq!(report.written_today(), Some(4.0));
    assert!(report.daily_goal_met());
    assert_eq!(report.latest_count, Some(6.0));
    assert_eq!(report.milestones[0].remaining, 100_000 - 6);
    assert!(report.to_string().contains("daily goal: 4/3 (met)"));
}

#[test]
fn status_without_todays_row() {
    let config = Config::default();
    let mut workbook = tracker_workbook();

    let report = jobs::status(&config, &mut workbook, &FixedClock(at(3, 8))).expect("status");

    assert!(report.today.is_none());
    assert!(!report.daily_goal_met());
    assert!(report.to_string().contains("today: not recorded yet"));
}

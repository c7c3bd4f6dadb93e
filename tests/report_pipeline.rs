use chrono::NaiveDate;
use tempfile::TempDir;
use uuid::Uuid;

use farmbook::models::{FinanceKind, FinanceRecord};
use farmbook::money::FormatPolicy;
use farmbook::report::{self, ReportKind, SectionBody};
use farmbook::store::Store;
use farmbook::summary::lifetime_summary;
use farmbook::{pdf, report::compose};

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn finance(tag: &str, cents: i64, recorded_at: &str) -> FinanceRecord {
    FinanceRecord {
        id: Uuid::new_v4(),
        tag: tag.to_string(),
        amount_cents: cents,
        recorded_at: recorded_at.to_string(),
    }
}

fn seeded_store() -> (TempDir, Store) {
    let dir = TempDir::new().expect("temp dir");
    let store = Store::new(dir.path().join("farm_data.xlsx"));
    store.ensure_exists().expect("initialize workbook");
    store
        .add_finance(
            FinanceKind::Revenue,
            finance("Milk Sale", 500000, "2024-01-10 09:00:00"),
        )
        .expect("add revenue");
    store
        .add_finance(
            FinanceKind::Expenditure,
            finance("Feed", 320000, "2024-03-05 14:30:00"),
        )
        .expect("add expenditure");
    (dir, store)
}

#[test]
fn store_to_pdf_pipeline() {
    let (_dir, store) = seeded_store();
    let policy = FormatPolicy::default();

    // Lifetime summary is independent of any report period.
    let summary = lifetime_summary(&store);
    assert_eq!(summary.total_revenue_cents, 500000);
    assert_eq!(summary.total_expenditure_cents, 320000);
    assert_eq!(summary.profit_or_loss_cents, 180000);

    // March covers the expenditure but none of the revenue.
    let report = compose(
        &store,
        ReportKind::All,
        day("2024-03-01"),
        day("2024-03-31"),
        summary,
        &policy,
    )
    .expect("compose report");

    assert_eq!(report.sections.len(), 3);
    match &report.sections[0].body {
        SectionBody::Empty { message } => {
            assert_eq!(message, "No revenue records found for this period.");
        }
        SectionBody::Table { .. } => panic!("revenue section should be a placeholder"),
    }
    match &report.sections[1].body {
        SectionBody::Table { rows, .. } => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0][0], "Feed");
            assert_eq!(rows[0][1], "3,200.00");
        }
        SectionBody::Empty { .. } => panic!("expenditure section should be populated"),
    }

    // The unfiltered summary still shows the full profit.
    assert_eq!(report.summary.profit_or_loss_cents, 180000);

    let bytes = pdf::render(&report, &policy).expect("render pdf");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn inverted_range_is_rejected_without_reading_the_store() {
    let dir = TempDir::new().expect("temp dir");
    // Never created: any table load would fail, so a rejection proves the
    // range check runs first.
    let store = Store::new(dir.path().join("missing.xlsx"));
    let err = compose(
        &store,
        ReportKind::All,
        day("2024-04-01"),
        day("2024-03-01"),
        farmbook::summary::FinancialSummary::default(),
        &FormatPolicy::default(),
    )
    .unwrap_err();
    assert!(matches!(err, farmbook::error::Error::InvalidRange { .. }));
}

#[test]
fn new_revenue_lands_at_the_last_position_with_grouped_amount() {
    let (_dir, store) = seeded_store();
    let record = finance("Milk Sale", 150000, "2024-03-20 07:45:00");
    store
        .add_finance(FinanceKind::Revenue, record.clone())
        .expect("add revenue");

    let revenue = store
        .load_finance(FinanceKind::Revenue)
        .expect("load revenue");
    assert_eq!(revenue.last(), Some(&record));

    let report = compose(
        &store,
        ReportKind::Revenue,
        day("2024-03-01"),
        day("2024-03-31"),
        lifetime_summary(&store),
        &FormatPolicy::default(),
    )
    .expect("compose report");
    match &report.sections[0].body {
        SectionBody::Table { rows, .. } => {
            assert_eq!(rows[0], vec!["Milk Sale", "1,500.00", "2024-03-20 07:45:00"]);
        }
        SectionBody::Empty { .. } => panic!("revenue section should be populated"),
    }
}

#[test]
fn report_kinds_map_to_expected_sections() {
    let (_dir, store) = seeded_store();
    let policy = FormatPolicy::default();
    let summary = lifetime_summary(&store);

    for (kind, expected) in [
        (ReportKind::Revenue, vec!["Revenue Records"]),
        (ReportKind::Expenditure, vec!["Expenditure Records"]),
        (ReportKind::Classification, vec!["Classification Records"]),
        (
            ReportKind::All,
            vec![
                "Revenue Records",
                "Expenditure Records",
                "Classification Records",
            ],
        ),
    ] {
        let report = report::compose(
            &store,
            kind,
            day("2024-01-01"),
            day("2024-12-31"),
            summary,
            &policy,
        )
        .expect("compose report");
        let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, expected, "section titles for {kind}");
    }
}

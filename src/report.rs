use std::fmt;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::filter::filter_by_date;
use crate::models::{ClassificationRecord, FinanceKind, FinanceRecord};
use crate::money::FormatPolicy;
use crate::summary::FinancialSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Revenue,
    Expenditure,
    Classification,
    All,
}

impl ReportKind {
    pub fn parse(raw: &str) -> Option<ReportKind> {
        match raw.trim() {
            "Revenue" => Some(ReportKind::Revenue),
            "Expenditure" => Some(ReportKind::Expenditure),
            "Classification" => Some(ReportKind::Classification),
            "All" => Some(ReportKind::All),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Revenue => "Revenue",
            ReportKind::Expenditure => "Expenditure",
            ReportKind::Classification => "Classification",
            ReportKind::All => "All",
        }
    }

    fn includes_finance(self, kind: FinanceKind) -> bool {
        match self {
            ReportKind::All => true,
            ReportKind::Revenue => kind == FinanceKind::Revenue,
            ReportKind::Expenditure => kind == FinanceKind::Expenditure,
            ReportKind::Classification => false,
        }
    }

    fn includes_classification(self) -> bool {
        matches!(self, ReportKind::Classification | ReportKind::All)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// The composer must not touch any table before its range check passes.
pub trait TableSource {
    fn finance(&self, kind: FinanceKind) -> Result<Vec<FinanceRecord>>;
    fn classification(&self) -> Result<Vec<ClassificationRecord>>;
}

// Financial tables carry a larger header than the wide livestock table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Financial,
    Livestock,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Empty {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub kind: SectionKind,
    pub body: SectionBody,
}

// The summary is the lifetime total, not scoped to the period.
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub summary: FinancialSummary,
    pub sections: Vec<Section>,
}

// Section order is fixed regardless of the requested kind.
pub fn compose(
    source: &impl TableSource,
    kind: ReportKind,
    start: NaiveDate,
    end: NaiveDate,
    summary: FinancialSummary,
    policy: &FormatPolicy,
) -> Result<Report> {
    if start > end {
        return Err(Error::InvalidRange { start, end });
    }

    let mut sections = Vec::new();
    for finance in [FinanceKind::Revenue, FinanceKind::Expenditure] {
        if kind.includes_finance(finance) {
            let records = source.finance(finance)?;
            let in_range = filter_by_date(&records, start, end);
            sections.push(finance_section(finance, &in_range, policy));
        }
    }
    if kind.includes_classification() {
        let records = source.classification()?;
        let in_range = filter_by_date(&records, start, end);
        sections.push(classification_section(&in_range, policy));
    }

    Ok(Report {
        title: format!("Farm Report - {kind}"),
        start,
        end,
        summary,
        sections,
    })
}

fn finance_section(kind: FinanceKind, records: &[FinanceRecord], policy: &FormatPolicy) -> Section {
    let title = format!("{} Records", kind.label());
    if records.is_empty() {
        return Section {
            title,
            kind: SectionKind::Financial,
            body: empty_body(&kind.label().to_lowercase()),
        };
    }
    let header = vec![
        "Name".to_string(),
        format!("Amount ({})", policy.currency_symbol),
        "Date".to_string(),
    ];
    let rows = records
        .iter()
        .map(|record| {
            vec![
                record.tag.clone(),
                policy.amount(record.amount_cents),
                record.recorded_at.clone(),
            ]
        })
        .collect();
    Section {
        title,
        kind: SectionKind::Financial,
        body: SectionBody::Table { header, rows },
    }
}

fn classification_section(records: &[ClassificationRecord], policy: &FormatPolicy) -> Section {
    let title = "Classification Records".to_string();
    if records.is_empty() {
        return Section {
            title,
            kind: SectionKind::Livestock,
            body: empty_body("classification"),
        };
    }
    let header = vec![
        "Name".to_string(),
        "Gender".to_string(),
        "Breed".to_string(),
        "Weight (kg)".to_string(),
        "New Borns".to_string(),
        "Dead Count".to_string(),
        "Vaccination Date".to_string(),
    ];
    let rows = records
        .iter()
        .map(|record| {
            vec![
                record.name.clone(),
                record.gender.to_string(),
                record.breed.clone(),
                policy.weight(record.weight_kg),
                record.newborns.to_string(),
                record.dead_count.to_string(),
                record.vaccination_date.clone(),
            ]
        })
        .collect();
    Section {
        title,
        kind: SectionKind::Livestock,
        body: SectionBody::Table { header, rows },
    }
}

fn empty_body(category: &str) -> SectionBody {
    SectionBody::Empty {
        message: format!("No {category} records found for this period."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use std::cell::Cell;
    use uuid::Uuid;

    struct FakeSource {
        revenue: Vec<FinanceRecord>,
        expenditure: Vec<FinanceRecord>,
        classification: Vec<ClassificationRecord>,
        loads: Cell<usize>,
    }

    impl FakeSource {
        fn empty() -> Self {
            FakeSource {
                revenue: Vec::new(),
                expenditure: Vec::new(),
                classification: Vec::new(),
                loads: Cell::new(0),
            }
        }
    }

    impl TableSource for FakeSource {
        fn finance(&self, kind: FinanceKind) -> crate::error::Result<Vec<FinanceRecord>> {
            self.loads.set(self.loads.get() + 1);
            Ok(match kind {
                FinanceKind::Revenue => self.revenue.clone(),
                FinanceKind::Expenditure => self.expenditure.clone(),
            })
        }

        fn classification(&self) -> crate::error::Result<Vec<ClassificationRecord>> {
            self.loads.set(self.loads.get() + 1);
            Ok(self.classification.clone())
        }
    }

    fn finance(tag: &str, cents: i64, recorded_at: &str) -> FinanceRecord {
        FinanceRecord {
            id: Uuid::new_v4(),
            tag: tag.to_string(),
            amount_cents: cents,
            recorded_at: recorded_at.to_string(),
        }
    }

    fn animal(name: &str, details: Option<&str>, recorded_at: &str) -> ClassificationRecord {
        ClassificationRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            gender: Gender::Female,
            breed: "Jersey".to_string(),
            newborns: 1,
            weight_kg: 410.5,
            dead_count: 0,
            vaccination_date: "2024-02-15".to_string(),
            details: details.map(str::to_string),
            recorded_at: recorded_at.to_string(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn policy() -> FormatPolicy {
        FormatPolicy::default()
    }

    #[test]
    fn rejects_inverted_range_before_touching_tables() {
        let source = FakeSource::empty();
        let err = compose(
            &source,
            ReportKind::All,
            day("2024-03-31"),
            day("2024-03-01"),
            FinancialSummary::default(),
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
        assert_eq!(source.loads.get(), 0);
    }

    #[test]
    fn all_yields_three_sections_in_fixed_order() {
        let source = FakeSource::empty();
        let report = compose(
            &source,
            ReportKind::All,
            day("2024-03-01"),
            day("2024-03-31"),
            FinancialSummary::default(),
            &policy(),
        )
        .unwrap();
        let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Revenue Records",
                "Expenditure Records",
                "Classification Records"
            ]
        );
        assert_eq!(report.title, "Farm Report - All");
    }

    #[test]
    fn single_kind_yields_single_section() {
        let source = FakeSource::empty();
        let report = compose(
            &source,
            ReportKind::Expenditure,
            day("2024-03-01"),
            day("2024-03-31"),
            FinancialSummary::default(),
            &policy(),
        )
        .unwrap();
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].title, "Expenditure Records");
        assert_eq!(source.loads.get(), 1);
    }

    #[test]
    fn out_of_range_records_become_a_placeholder_not_an_empty_table() {
        let mut source = FakeSource::empty();
        source.revenue = vec![finance("Milk Sale", 150000, "2024-01-10 09:00:00")];
        let report = compose(
            &source,
            ReportKind::Revenue,
            day("2024-03-01"),
            day("2024-03-31"),
            FinancialSummary::default(),
            &policy(),
        )
        .unwrap();
        match &report.sections[0].body {
            SectionBody::Empty { message } => {
                assert_eq!(message, "No revenue records found for this period.");
            }
            SectionBody::Table { .. } => panic!("expected placeholder section"),
        }
    }

    #[test]
    fn finance_rows_format_money_with_grouping() {
        let mut source = FakeSource::empty();
        source.revenue = vec![finance("Milk Sale", 150000, "2024-03-10 09:00:00")];
        let report = compose(
            &source,
            ReportKind::Revenue,
            day("2024-03-01"),
            day("2024-03-31"),
            FinancialSummary::default(),
            &policy(),
        )
        .unwrap();
        match &report.sections[0].body {
            SectionBody::Table { header, rows } => {
                assert_eq!(header[1], "Amount (₹)");
                assert_eq!(rows[0], vec!["Milk Sale", "1,500.00", "2024-03-10 09:00:00"]);
            }
            SectionBody::Empty { .. } => panic!("expected a populated table"),
        }
    }

    #[test]
    fn classification_rows_survive_missing_details() {
        let mut source = FakeSource::empty();
        source.classification = vec![animal("Daisy", None, "2024-03-10 09:00:00")];
        let report = compose(
            &source,
            ReportKind::Classification,
            day("2024-03-01"),
            day("2024-03-31"),
            FinancialSummary::default(),
            &policy(),
        )
        .unwrap();
        match &report.sections[0].body {
            SectionBody::Table { header, rows } => {
                assert_eq!(header.len(), 7);
                assert_eq!(
                    rows[0],
                    vec!["Daisy", "Female", "Jersey", "410.5", "1", "0", "2024-02-15"]
                );
            }
            SectionBody::Empty { .. } => panic!("expected a populated table"),
        }
    }

    #[test]
    fn summary_is_carried_unfiltered() {
        let source = FakeSource::empty();
        let summary = FinancialSummary {
            total_revenue_cents: 500000,
            total_expenditure_cents: 320000,
            profit_or_loss_cents: 180000,
        };
        let report = compose(
            &source,
            ReportKind::All,
            day("2024-03-01"),
            day("2024-03-31"),
            summary,
            &policy(),
        )
        .unwrap();
        assert_eq!(report.summary.profit_or_loss_cents, 180000);
    }
}

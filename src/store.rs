use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    ClassificationRecord, FinanceKind, FinanceRecord, Gender, Tables, TIMESTAMP_FORMAT,
};
use crate::report::TableSource;

pub const CLASSIFICATION_SHEET: &str = "Classification";

const FINANCE_HEADER: [&str; 4] = ["Id", "Tag", "Amount", "Date"];
const CLASSIFICATION_HEADER: [&str; 10] = [
    "Id",
    "Name",
    "Gender",
    "Breed",
    "New Borns",
    "Weight",
    "Dead Count",
    "Vaccination Date",
    "Details",
    "Date",
];

// Every mutation is a load-entire-workbook, mutate, rewrite cycle. No
// locking against other processes touching the file.
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Store {
        Store { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.save_all(&Tables::default())
    }

    pub fn load_all(&self) -> Result<Tables> {
        let mut workbook = self.open()?;
        let mut assigned = false;
        let tables = Tables {
            revenue: read_finance(&mut workbook, FinanceKind::Revenue, &mut assigned)?,
            expenditure: read_finance(&mut workbook, FinanceKind::Expenditure, &mut assigned)?,
            classification: read_classification(&mut workbook, &mut assigned)?,
        };
        drop(workbook);
        // Rows pasted in by hand carry no id; write the assigned ones back so
        // the edit and delete links rendered from this load stay valid.
        if assigned {
            self.save_all(&tables)?;
        }
        Ok(tables)
    }

    pub fn load_finance(&self, kind: FinanceKind) -> Result<Vec<FinanceRecord>> {
        let mut tables = self.load_all()?;
        Ok(std::mem::take(tables.finance_mut(kind)))
    }

    pub fn load_classification(&self) -> Result<Vec<ClassificationRecord>> {
        Ok(self.load_all()?.classification)
    }

    pub fn save_all(&self, tables: &Tables) -> Result<()> {
        let mut workbook = Workbook::new();
        for kind in [FinanceKind::Revenue, FinanceKind::Expenditure] {
            write_finance(workbook.add_worksheet(), kind, tables.finance(kind))?;
        }
        write_classification(workbook.add_worksheet(), &tables.classification)?;
        workbook
            .save(&self.path)
            .map_err(|err| Error::StoreUnavailable(err.to_string()))
    }

    pub fn add_finance(&self, kind: FinanceKind, record: FinanceRecord) -> Result<()> {
        let mut tables = self.load_all()?;
        tables.finance_mut(kind).push(record);
        self.save_all(&tables)
    }

    // Tag and amount only; the creation timestamp keeps the record in its
    // report period.
    pub fn update_finance(
        &self,
        kind: FinanceKind,
        id: Uuid,
        tag: &str,
        amount_cents: i64,
    ) -> Result<()> {
        let mut tables = self.load_all()?;
        let record = tables
            .finance_mut(kind)
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(Error::UnknownRecord {
                sheet: kind.sheet_name(),
                id,
            })?;
        record.tag = tag.to_string();
        record.amount_cents = amount_cents;
        self.save_all(&tables)
    }

    pub fn delete_finance(&self, kind: FinanceKind, id: Uuid) -> Result<()> {
        let mut tables = self.load_all()?;
        let records = tables.finance_mut(kind);
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(Error::UnknownRecord {
                sheet: kind.sheet_name(),
                id,
            });
        }
        self.save_all(&tables)
    }

    pub fn find_finance(&self, kind: FinanceKind, id: Uuid) -> Result<FinanceRecord> {
        self.load_finance(kind)?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or(Error::UnknownRecord {
                sheet: kind.sheet_name(),
                id,
            })
    }

    pub fn add_classification(&self, record: ClassificationRecord) -> Result<()> {
        let mut tables = self.load_all()?;
        tables.classification.push(record);
        self.save_all(&tables)
    }

    // Replaces every field except id and creation timestamp.
    pub fn update_classification(&self, id: Uuid, updated: ClassificationRecord) -> Result<()> {
        let mut tables = self.load_all()?;
        let record = tables
            .classification
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(Error::UnknownRecord {
                sheet: CLASSIFICATION_SHEET,
                id,
            })?;
        let recorded_at = record.recorded_at.clone();
        *record = ClassificationRecord {
            id,
            recorded_at,
            ..updated
        };
        self.save_all(&tables)
    }

    pub fn delete_classification(&self, id: Uuid) -> Result<()> {
        let mut tables = self.load_all()?;
        let before = tables.classification.len();
        tables.classification.retain(|record| record.id != id);
        if tables.classification.len() == before {
            return Err(Error::UnknownRecord {
                sheet: CLASSIFICATION_SHEET,
                id,
            });
        }
        self.save_all(&tables)
    }

    pub fn find_classification(&self, id: Uuid) -> Result<ClassificationRecord> {
        self.load_classification()?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or(Error::UnknownRecord {
                sheet: CLASSIFICATION_SHEET,
                id,
            })
    }

    fn open(&self) -> Result<Xlsx<BufReader<File>>> {
        let workbook: Xlsx<BufReader<File>> =
            open_workbook(&self.path)
                .map_err(|err: calamine::XlsxError| Error::StoreUnavailable(err.to_string()))?;
        Ok(workbook)
    }
}

impl TableSource for Store {
    fn finance(&self, kind: FinanceKind) -> Result<Vec<FinanceRecord>> {
        self.load_finance(kind)
    }

    fn classification(&self) -> Result<Vec<ClassificationRecord>> {
        self.load_classification()
    }
}

fn sheet_range(workbook: &mut Xlsx<BufReader<File>>, name: &str) -> Result<Range<Data>> {
    workbook
        .worksheet_range(name)
        .map_err(|err| Error::StoreUnavailable(format!("sheet {name}: {err}")))
}

fn read_finance(
    workbook: &mut Xlsx<BufReader<File>>,
    kind: FinanceKind,
    assigned: &mut bool,
) -> Result<Vec<FinanceRecord>> {
    let range = sheet_range(workbook, kind.sheet_name())?;
    let mut records = Vec::new();
    for row in range.rows().skip(1) {
        if is_blank(row) {
            continue;
        }
        records.push(FinanceRecord {
            id: cell_id(row.first(), assigned),
            tag: cell_text(row.get(1)),
            amount_cents: to_cents(cell_number(row.get(2)).unwrap_or(0.0)),
            recorded_at: cell_text(row.get(3)),
        });
    }
    Ok(records)
}

fn read_classification(
    workbook: &mut Xlsx<BufReader<File>>,
    assigned: &mut bool,
) -> Result<Vec<ClassificationRecord>> {
    let range = sheet_range(workbook, CLASSIFICATION_SHEET)?;
    let mut records = Vec::new();
    for row in range.rows().skip(1) {
        if is_blank(row) {
            continue;
        }
        let details = cell_text(row.get(8));
        records.push(ClassificationRecord {
            id: cell_id(row.first(), assigned),
            name: cell_text(row.get(1)),
            gender: Gender::parse(&cell_text(row.get(2))),
            breed: cell_text(row.get(3)),
            newborns: cell_count(row.get(4)),
            weight_kg: cell_number(row.get(5)).unwrap_or(0.0),
            dead_count: cell_count(row.get(6)),
            vaccination_date: cell_text(row.get(7)),
            details: if details.is_empty() { None } else { Some(details) },
            recorded_at: cell_text(row.get(9)),
        });
    }
    Ok(records)
}

fn write_finance(sheet: &mut Worksheet, kind: FinanceKind, records: &[FinanceRecord]) -> Result<()> {
    sheet.set_name(kind.sheet_name()).map_err(store_err)?;
    for (column, title) in FINANCE_HEADER.iter().enumerate() {
        sheet.write(0, column as u16, *title).map_err(store_err)?;
    }
    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write(row, 0, record.id.to_string()).map_err(store_err)?;
        sheet.write(row, 1, record.tag.as_str()).map_err(store_err)?;
        sheet
            .write(row, 2, record.amount_cents as f64 / 100.0)
            .map_err(store_err)?;
        sheet
            .write(row, 3, record.recorded_at.as_str())
            .map_err(store_err)?;
    }
    Ok(())
}

fn write_classification(sheet: &mut Worksheet, records: &[ClassificationRecord]) -> Result<()> {
    sheet.set_name(CLASSIFICATION_SHEET).map_err(store_err)?;
    for (column, title) in CLASSIFICATION_HEADER.iter().enumerate() {
        sheet.write(0, column as u16, *title).map_err(store_err)?;
    }
    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write(row, 0, record.id.to_string()).map_err(store_err)?;
        sheet.write(row, 1, record.name.as_str()).map_err(store_err)?;
        sheet.write(row, 2, record.gender.as_str()).map_err(store_err)?;
        sheet.write(row, 3, record.breed.as_str()).map_err(store_err)?;
        sheet.write(row, 4, record.newborns).map_err(store_err)?;
        sheet.write(row, 5, record.weight_kg).map_err(store_err)?;
        sheet.write(row, 6, record.dead_count).map_err(store_err)?;
        sheet
            .write(row, 7, record.vaccination_date.as_str())
            .map_err(store_err)?;
        sheet
            .write(row, 8, record.details.as_deref().unwrap_or(""))
            .map_err(store_err)?;
        sheet
            .write(row, 9, record.recorded_at.as_str())
            .map_err(store_err)?;
    }
    Ok(())
}

fn store_err(err: XlsxError) -> Error {
    Error::StoreUnavailable(err.to_string())
}

fn is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| matches!(cell, Data::Empty))
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::DateTime(dt)) => dt
            .as_datetime()
            .map(|value| value.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default(),
        Some(Data::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn cell_number(cell: Option<&Data>) -> Option<f64> {
    match cell {
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cell_count(cell: Option<&Data>) -> u32 {
    cell_number(cell)
        .map(|value| value.round().max(0.0) as u32)
        .unwrap_or(0)
}

fn cell_id(cell: Option<&Data>, assigned: &mut bool) -> Uuid {
    match Uuid::parse_str(cell_text(cell).trim()) {
        Ok(id) => id,
        Err(_) => {
            *assigned = true;
            Uuid::new_v4()
        }
    }
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FinanceKind {
    Revenue,
    Expenditure,
}

impl FinanceKind {
    pub fn sheet_name(self) -> &'static str {
        match self {
            FinanceKind::Revenue => "Revenue",
            FinanceKind::Expenditure => "Expenditure",
        }
    }

    pub fn label(self) -> &'static str {
        self.sheet_name()
    }

    pub fn slug(self) -> &'static str {
        match self {
            FinanceKind::Revenue => "revenue",
            FinanceKind::Expenditure => "expenditure",
        }
    }
}

impl fmt::Display for FinanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    // Workbook rows may be hand-edited; anything unrecognized is Unknown.
    pub fn parse(raw: &str) -> Gender {
        match raw.trim().to_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinanceRecord {
    pub id: Uuid,
    pub tag: String,
    pub amount_cents: i64,
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRecord {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub breed: String,
    pub newborns: u32,
    pub weight_kg: f64,
    pub dead_count: u32,
    pub vaccination_date: String,
    pub details: Option<String>,
    pub recorded_at: String,
}

// Creation timestamp only; domain dates like vaccination date stay out.
pub trait Recorded {
    fn recorded_at(&self) -> &str;
}

impl Recorded for FinanceRecord {
    fn recorded_at(&self) -> &str {
        &self.recorded_at
    }
}

impl Recorded for ClassificationRecord {
    fn recorded_at(&self) -> &str {
        &self.recorded_at
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub revenue: Vec<FinanceRecord>,
    pub expenditure: Vec<FinanceRecord>,
    pub classification: Vec<ClassificationRecord>,
}

impl Tables {
    pub fn finance(&self, kind: FinanceKind) -> &[FinanceRecord] {
        match kind {
            FinanceKind::Revenue => &self.revenue,
            FinanceKind::Expenditure => &self.expenditure,
        }
    }

    pub fn finance_mut(&mut self, kind: FinanceKind) -> &mut Vec<FinanceRecord> {
        match kind {
            FinanceKind::Revenue => &mut self.revenue,
            FinanceKind::Expenditure => &mut self.expenditure,
        }
    }
}

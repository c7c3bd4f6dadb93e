use log::warn;
use serde::Serialize;

use crate::models::{FinanceKind, FinanceRecord};
use crate::store::Store;

// Lifetime totals, never date-filtered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    pub total_revenue_cents: i64,
    pub total_expenditure_cents: i64,
    pub profit_or_loss_cents: i64,
}

pub fn sum_amounts(records: &[FinanceRecord]) -> i64 {
    records.iter().map(|record| record.amount_cents).sum()
}

pub fn summarize(revenue: &[FinanceRecord], expenditure: &[FinanceRecord]) -> FinancialSummary {
    let total_revenue_cents = sum_amounts(revenue);
    let total_expenditure_cents = sum_amounts(expenditure);
    FinancialSummary {
        total_revenue_cents,
        total_expenditure_cents,
        profit_or_loss_cents: total_revenue_cents - total_expenditure_cents,
    }
}

// Degrades to zero totals when the store cannot be read; the header metric
// must never take the page down.
pub fn lifetime_summary(store: &Store) -> FinancialSummary {
    let revenue = store.load_finance(FinanceKind::Revenue);
    let expenditure = store.load_finance(FinanceKind::Expenditure);
    match (revenue, expenditure) {
        (Ok(revenue), Ok(expenditure)) => summarize(&revenue, &expenditure),
        (Err(err), _) | (_, Err(err)) => {
            warn!("financial summary unavailable, showing zero totals: {err}");
            FinancialSummary::default()
        }
    }
}

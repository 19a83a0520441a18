// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use cashbook::application::LedgerService;
use cashbook::domain::{Cents, TransactionDraft, TransactionType};
use cashbook::storage::MemoryStore;
use chrono::NaiveDate;

/// Helper to open a ledger over an in-memory store, returning a handle on
/// the store so tests can inspect what was written
pub async fn test_service() -> (LedgerService, MemoryStore) {
    let store = MemoryStore::new();
    let service = LedgerService::open(Box::new(store.clone())).await;
    (service, store)
}

/// Helper to parse a date string in YYYY-MM-DD form
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub fn draft(date_str: &str, txn_type: TransactionType, amount: Cents) -> TransactionDraft {
    TransactionDraft::new(date(date_str), txn_type, amount)
}

pub fn expense(date_str: &str, amount: Cents) -> TransactionDraft {
    draft(date_str, TransactionType::Expense, amount)
}

pub fn credit(date_str: &str, amount: Cents) -> TransactionDraft {
    draft(date_str, TransactionType::Credit, amount)
}

/// Balances of the working copy, in canonical order
pub fn balances(service: &LedgerService) -> Vec<Cents> {
    service.transactions().iter().map(|t| t.balance_cents).collect()
}

/// Ids of the working copy, in canonical order
pub fn ids(service: &LedgerService) -> Vec<i64> {
    service.transactions().iter().map(|t| t.id).collect()
}

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{Cents, Direction, Transaction, TransactionId, TransactionType};

/// Signed amount a transaction of this type adds to the running balance.
pub fn contribution(txn_type: &TransactionType, amount_cents: Cents) -> Cents {
    match txn_type.direction() {
        Direction::Inflow => amount_cents,
        Direction::Outflow => amount_cents.saturating_neg(),
        Direction::Neutral => 0,
    }
}

/// Canonical order: ascending date, then ascending id. Rows with a missing
/// date come after every dated row.
pub fn canonical_cmp(a: &Transaction, b: &Transaction) -> Ordering {
    let date_order = match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    date_order.then(a.id.cmp(&b.id))
}

pub fn sort_canonical(transactions: &mut [Transaction]) {
    transactions.sort_by(canonical_cmp);
}

/// Where the row at `index` lands once `transactions` is sorted canonically.
///
/// The sort is stable, so rows comparing equal keep their relative order.
pub fn canonical_position(transactions: &[Transaction], index: usize) -> usize {
    let target = &transactions[index];
    transactions
        .iter()
        .enumerate()
        .filter(|(i, t)| match canonical_cmp(t, target) {
            Ordering::Less => true,
            Ordering::Equal => *i < index,
            Ordering::Greater => false,
        })
        .count()
}

/// Sort into canonical order and rewrite every running balance.
///
/// Total and idempotent: whatever balances the input carried are discarded.
/// The fold saturates at the `i64` range instead of overflowing.
pub fn recompute(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
    sort_canonical(&mut transactions);

    let mut balance: Cents = 0;
    for transaction in &mut transactions {
        balance = balance
            .saturating_add(contribution(&transaction.txn_type, transaction.amount_cents));
        transaction.balance_cents = balance;
    }

    transactions
}

/// Balance after the last row in canonical order.
pub fn closing_balance(transactions: &[Transaction]) -> Cents {
    transactions.last().map(|t| t.balance_cents).unwrap_or(0)
}

/// Id for the next new transaction: one past the largest id in use.
///
/// When no row carries a usable (positive) id, or the largest one cannot be
/// incremented, falls back to the first id from the row count plus one that
/// no row uses.
pub fn next_id(transactions: &[Transaction]) -> TransactionId {
    let next = transactions
        .iter()
        .map(|t| t.id)
        .filter(|id| *id > 0)
        .max()
        .and_then(|max| max.checked_add(1));
    if let Some(id) = next {
        return id;
    }

    let used: BTreeSet<TransactionId> = transactions.iter().map(|t| t.id).collect();
    // At most `len` ids are taken, so a free one exists within `len + 1` steps
    let mut candidate = transactions.len() as TransactionId + 1;
    while used.contains(&candidate) {
        candidate += 1;
    }
    candidate
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceMismatch {
    pub id: TransactionId,
    pub stored: Cents,
    pub expected: Cents,
}

/// Consistency of a table as stored, before any recomputation.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub row_count: usize,
    pub balance_mismatches: Vec<BalanceMismatch>,
    /// Adjacent row pairs that violate canonical order
    pub out_of_order: usize,
    pub duplicate_ids: Vec<TransactionId>,
    pub missing_dates: usize,
    pub unknown_types: Vec<TransactionId>,
    pub stored_closing_balance: Cents,
    pub expected_closing_balance: Cents,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.balance_mismatches.is_empty() && self.out_of_order == 0 && self.duplicate_ids.is_empty()
    }
}

/// Compare stored rows against what `recompute` would produce.
///
/// Balances are checked in canonical order, so a table that is merely
/// unsorted but otherwise correct reports both the ordering violations and
/// any balances that move once sorted.
pub fn verify(stored: &[Transaction]) -> IntegrityReport {
    let out_of_order = stored
        .windows(2)
        .filter(|pair| canonical_cmp(&pair[0], &pair[1]) == Ordering::Greater)
        .count();

    let mut id_counts: BTreeMap<TransactionId, usize> = BTreeMap::new();
    for transaction in stored {
        *id_counts.entry(transaction.id).or_insert(0) += 1;
    }
    let duplicate_ids = id_counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();

    let mut sorted = stored.to_vec();
    sort_canonical(&mut sorted);
    let stored_closing_balance = closing_balance(&sorted);
    let expected = recompute(sorted.clone());

    let balance_mismatches = sorted
        .iter()
        .zip(&expected)
        .filter(|(s, e)| s.balance_cents != e.balance_cents)
        .map(|(s, e)| BalanceMismatch {
            id: s.id,
            stored: s.balance_cents,
            expected: e.balance_cents,
        })
        .collect();

    IntegrityReport {
        row_count: stored.len(),
        balance_mismatches,
        out_of_order,
        duplicate_ids,
        missing_dates: stored.iter().filter(|t| t.date.is_none()).count(),
        unknown_types: stored
            .iter()
            .filter(|t| !t.txn_type.is_known())
            .map(|t| t.id)
            .collect(),
        stored_closing_balance,
        expected_closing_balance: closing_balance(&expected),
    }
}

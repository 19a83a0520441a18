use chrono::NaiveDate;

use crate::domain::{
    Cents, Coercion, IntegrityReport, MAX_AMOUNT_CENTS, Transaction, TransactionDraft,
    TransactionId, canonical_position, closing_balance, decode_rows, encode_rows, format_currency,
    next_id, recompute, verify,
};
use crate::storage::{RowStore, read_or_empty};

use super::reporting::{self, CategoryFilter, CategoryReport, MonthSummary};
use super::AppError;

/// Handle on one account book.
///
/// Holds the working copy of the table in canonical order, together with the
/// store it came from. Every mutation recomputes the whole table and
/// overwrites the store before the working copy changes.
pub struct LedgerService {
    store: Box<dyn RowStore>,
    transactions: Vec<Transaction>,
}

/// Outcome of reloading the table from the store.
pub struct SyncResult {
    pub row_count: usize,
    pub closing_balance: Cents,
    pub coercions: Vec<Coercion>,
}

/// The stored table's consistency, plus any cells that could not be read.
pub struct CheckResult {
    pub report: IntegrityReport,
    pub coercions: Vec<Coercion>,
}

impl LedgerService {
    /// Load the ledger from `store`. An unreadable store yields an empty
    /// ledger; nothing is written.
    pub async fn open(store: Box<dyn RowStore>) -> Self {
        let rows = read_or_empty(store.as_ref()).await;
        let decoded = decode_rows(&rows);
        let transactions = recompute(decoded.transactions);

        tracing::info!(
            store = %store.describe(),
            rows = transactions.len(),
            coerced = decoded.coercions.len(),
            "opened ledger"
        );

        Self {
            store,
            transactions,
        }
    }

    /// All transactions in canonical order, with balances.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn closing_balance(&self) -> Cents {
        closing_balance(&self.transactions)
    }

    pub fn get(&self, id: TransactionId) -> Result<&Transaction, AppError> {
        self.transactions
            .iter()
            .find(|t| t.id == id)
            .ok_or(AppError::TransactionNotFound(id))
    }

    // ========================
    // Write operations
    // ========================

    /// Record a new transaction. The id is assigned here.
    pub async fn add(&mut self, draft: TransactionDraft) -> Result<Transaction, AppError> {
        validate_amount(draft.amount_cents)?;

        let id = next_id(&self.transactions);
        let mut candidate = self.transactions.clone();
        candidate.push(Transaction::from_draft(id, draft));
        let index = candidate.len() - 1;

        let added = self.commit_row(candidate, index).await?;
        tracing::info!(id, "added transaction");
        Ok(added)
    }

    /// Replace every field of transaction `id` except the id itself.
    pub async fn edit(
        &mut self,
        id: TransactionId,
        draft: TransactionDraft,
    ) -> Result<Transaction, AppError> {
        validate_amount(draft.amount_cents)?;

        let mut candidate = self.transactions.clone();
        let index = candidate
            .iter()
            .position(|t| t.id == id)
            .ok_or(AppError::TransactionNotFound(id))?;
        candidate[index].apply(draft);

        let edited = self.commit_row(candidate, index).await?;
        tracing::info!(id, "edited transaction");
        Ok(edited)
    }

    /// Remove every row carrying `id`. Returns the removed rows.
    pub async fn delete(&mut self, id: TransactionId) -> Result<Vec<Transaction>, AppError> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.transactions.iter().cloned().partition(|t| t.id == id);
        if removed.is_empty() {
            return Err(AppError::TransactionNotFound(id));
        }

        self.commit(kept).await?;
        tracing::info!(id, removed = removed.len(), "deleted transaction");
        Ok(removed)
    }

    /// Reload the table from the store, recompute it and write it back.
    pub async fn sync(&mut self) -> Result<SyncResult, AppError> {
        let rows = read_or_empty(self.store.as_ref()).await;
        let decoded = decode_rows(&rows);

        self.commit(decoded.transactions).await?;

        Ok(SyncResult {
            row_count: self.transactions.len(),
            closing_balance: self.closing_balance(),
            coercions: decoded.coercions,
        })
    }

    /// Commit `candidate` and return the row that sat at `index`, with its
    /// recomputed balance.
    async fn commit_row(
        &mut self,
        candidate: Vec<Transaction>,
        index: usize,
    ) -> Result<Transaction, AppError> {
        let position = canonical_position(&candidate, index);
        self.commit(candidate).await?;
        Ok(self.transactions[position].clone())
    }

    /// Recompute `candidate`, persist it, then adopt it as the working copy.
    async fn commit(&mut self, candidate: Vec<Transaction>) -> Result<(), AppError> {
        let recomputed = recompute(candidate);
        let rows = encode_rows(&recomputed);

        if let Err(source) = self.store.write_rows(&rows).await {
            tracing::error!(
                store = %self.store.describe(),
                error = ?source,
                "failed to persist ledger; keeping previous state"
            );
            return Err(AppError::Persist {
                store: self.store.describe(),
                source,
            });
        }

        tracing::debug!(rows = recomputed.len(), "persisted ledger");
        self.transactions = recomputed;
        Ok(())
    }

    // ========================
    // Read-side operations
    // ========================

    /// Verify the table as currently stored, without changing it.
    pub async fn check(&self) -> Result<CheckResult, AppError> {
        let rows = self.store.read_rows().await?;
        let decoded = decode_rows(&rows);
        Ok(CheckResult {
            report: verify(&decoded.transactions),
            coercions: decoded.coercions,
        })
    }

    pub fn available_months(&self) -> Vec<String> {
        reporting::available_months(&self.transactions)
    }

    /// First and last dated entries, if any row has a date.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        reporting::date_span(&self.transactions)
    }

    /// Per-type totals for a month label such as "January 2024".
    pub fn month_summary(&self, month: &str) -> MonthSummary {
        reporting::month_summary(&self.transactions, month)
    }

    pub fn category_report(&self, filter: &CategoryFilter) -> CategoryReport {
        reporting::category_report(&self.transactions, filter)
    }
}

fn validate_amount(amount_cents: Cents) -> Result<(), AppError> {
    if amount_cents < 0 {
        return Err(AppError::InvalidAmount(
            "Amount must not be negative".to_string(),
        ));
    }
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(AppError::InvalidAmount(format!(
            "Amount must not exceed {}",
            format_currency(MAX_AMOUNT_CENTS)
        )));
    }
    Ok(())
}

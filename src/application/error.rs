use thiserror::Error;

use crate::domain::TransactionId;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The store rejected the recomputed table. The ledger kept its previous
    /// state; nothing was partially applied.
    #[error("Failed to save the ledger to {store}: {source:#}")]
    Persist {
        store: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

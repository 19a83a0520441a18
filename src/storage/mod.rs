mod csv_file;
mod memory;
mod sqlite;

pub use csv_file::*;
pub use memory::*;
pub use sqlite::*;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::SheetRow;

/// SQL migration for the row table
pub const MIGRATION_001_LEDGER_ROWS: &str = include_str!("migrations/001_ledger_rows.sql");

/// The external table the ledger lives in.
///
/// Stores only move rows; they never interpret them. Every write replaces
/// the whole table with the rows given, in the order given.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Read every row of the table.
    async fn read_rows(&self) -> Result<Vec<SheetRow>>;

    /// Overwrite the table with `rows`.
    async fn write_rows(&self, rows: &[SheetRow]) -> Result<()>;

    /// Short human-readable name of the backing table, for logs.
    fn describe(&self) -> String;
}

/// Read the table, substituting an empty one if the store cannot be read.
pub async fn read_or_empty(store: &dyn RowStore) -> Vec<SheetRow> {
    match store.read_rows().await {
        Ok(rows) => {
            tracing::debug!(store = %store.describe(), rows = rows.len(), "read table");
            rows
        }
        Err(error) => {
            tracing::warn!(
                store = %store.describe(),
                error = ?error,
                "could not read table, starting from an empty one"
            );
            Vec::new()
        }
    }
}

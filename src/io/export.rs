use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Cents, Transaction, encode_rows};
use crate::storage::write_table;

/// Full ledger snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub closing_balance: Cents,
    pub transactions: Vec<Transaction>,
}

/// Exporter for converting the ledger to portable formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export the table to CSV in canonical order, with the store's columns
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let rows = encode_rows(self.service.transactions());
        write_table(&rows, writer)?;
        Ok(rows.len())
    }

    /// Export the ledger as a JSON snapshot
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            closing_balance: self.service.closing_balance(),
            transactions: self.service.transactions().to_vec(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}

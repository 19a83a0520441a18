use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;

use super::RowStore;
use crate::domain::{
    COL_AMOUNT, COL_BALANCE, COL_CATEGORY, COL_DATE, COL_DESCRIPTION, COL_ID, COL_MODE, COL_PROOF,
    COL_REMARKS, COL_TYPE, COLUMNS, Cell, SheetRow,
};

/// A table kept in a CSV file with the standard column headers.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with just the header row, unless it already exists.
    pub fn init(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        write_table(&[], file)?;
        Ok(true)
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[async_trait]
impl RowStore for CsvStore {
    async fn read_rows(&self) -> Result<Vec<SheetRow>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        read_table(file).with_context(|| format!("Failed to read {}", self.path.display()))
    }

    async fn write_rows(&self, rows: &[SheetRow]) -> Result<()> {
        // Write beside the target and rename, so readers never see half a table
        let tmp = self.temp_path();
        let file =
            File::create(&tmp).with_context(|| format!("Failed to create {}", tmp.display()))?;
        write_table(rows, BufWriter::new(file))
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

/// Positions of the known columns in a particular file's header.
struct ColumnMap {
    date: usize,
    id: Option<usize>,
    txn_type: Option<usize>,
    category: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
    mode: Option<usize>,
    proof: Option<usize>,
    balance: Option<usize>,
    remarks: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Ok(Self {
            date: find(COL_DATE).ok_or_else(|| anyhow!("Table has no {} column", COL_DATE))?,
            id: find(COL_ID),
            txn_type: find(COL_TYPE),
            category: find(COL_CATEGORY),
            description: find(COL_DESCRIPTION),
            amount: find(COL_AMOUNT),
            mode: find(COL_MODE),
            proof: find(COL_PROOF),
            balance: find(COL_BALANCE),
            remarks: find(COL_REMARKS),
        })
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: Option<usize>) -> &'r str {
    index.and_then(|i| record.get(i)).unwrap_or("")
}

/// Parse a CSV table. Header names are trimmed; columns are found by name,
/// so their order and any extra columns do not matter. Only `DATE` is
/// required.
pub fn read_table<R: Read>(reader: R) -> Result<Vec<SheetRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(csv_reader.headers()?)?;

    let mut rows = Vec::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error on line {}", line_num + 2))?;

        rows.push(SheetRow {
            date: Cell::text(field(&record, Some(columns.date))),
            id: Cell::text(field(&record, columns.id)),
            txn_type: field(&record, columns.txn_type).to_string(),
            category: field(&record, columns.category).to_string(),
            description: field(&record, columns.description).to_string(),
            amount: Cell::text(field(&record, columns.amount)),
            mode: field(&record, columns.mode).to_string(),
            proof: field(&record, columns.proof).to_string(),
            balance: Cell::text(field(&record, columns.balance)),
            remarks: field(&record, columns.remarks).to_string(),
        });
    }

    Ok(rows)
}

/// Serialize a table with the standard header, rows in the order given.
pub fn write_table<W: Write>(rows: &[SheetRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(COLUMNS)?;

    for row in rows {
        csv_writer.write_record([
            row.date.to_string(),
            row.id.to_string(),
            row.txn_type.clone(),
            row.category.clone(),
            row.description.clone(),
            row.amount.to_string(),
            row.mode.clone(),
            row.proof.clone(),
            row.balance.to_string(),
            row.remarks.clone(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

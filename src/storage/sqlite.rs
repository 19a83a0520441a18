use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, TypeInfo, ValueRef};

use super::{MIGRATION_001_LEDGER_ROWS, RowStore};
use crate::domain::{Cell, SheetRow};

type RowQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A table kept in a SQLite database, one row per ledger row.
pub struct SqliteStore {
    pool: SqlitePool,
    label: String,
}

impl SqliteStore {
    /// Create a new store over the given SQLite connection pool.
    pub fn new(pool: SqlitePool, label: impl Into<String>) -> Self {
        Self {
            pool,
            label: label.into(),
        }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool, database_url))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_LEDGER_ROWS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Open the database file at `path`, creating it and its table if needed.
    pub async fn open(path: &str) -> Result<Self> {
        let store = Self::connect(&format!("sqlite:{}?mode=rwc", path)).await?;
        store.migrate().await?;
        Ok(store)
    }

    fn read_cell(row: &SqliteRow, column: &str) -> Result<Cell> {
        let raw = row
            .try_get_raw(column)
            .with_context(|| format!("Missing column {}", column))?;
        if raw.is_null() {
            return Ok(Cell::Empty);
        }

        let type_name = raw.type_info().name().to_string();
        let cell = match type_name.as_str() {
            "INTEGER" => Cell::from(row.try_get::<i64, _>(column)?),
            "REAL" => Cell::Number(row.try_get::<f64, _>(column)?),
            _ => Cell::text(row.try_get::<String, _>(column)?),
        };
        Ok(cell)
    }

    fn bind_cell<'q>(query: RowQuery<'q>, cell: &'q Cell) -> RowQuery<'q> {
        match cell {
            Cell::Empty => query.bind(None::<String>),
            Cell::Number(value) => query.bind(*value),
            Cell::Text(text) => query.bind(text.as_str()),
        }
    }

    fn row_to_sheet_row(row: &SqliteRow) -> Result<SheetRow> {
        Ok(SheetRow {
            date: Self::read_cell(row, "date")?,
            id: Self::read_cell(row, "trn_id")?,
            txn_type: row.get("trn_type"),
            category: row.get("category"),
            description: row.get("description"),
            amount: Self::read_cell(row, "amount")?,
            mode: row.get("trn_mode"),
            proof: row.get("proof"),
            balance: Self::read_cell(row, "balance")?,
            remarks: row.get("remarks"),
        })
    }
}

#[async_trait]
impl RowStore for SqliteStore {
    async fn read_rows(&self) -> Result<Vec<SheetRow>> {
        let rows = sqlx::query(
            r#"
            SELECT date, trn_id, trn_type, category, description, amount, trn_mode, proof, balance, remarks
            FROM ledger_rows
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to read ledger rows")?;

        rows.iter().map(Self::row_to_sheet_row).collect()
    }

    async fn write_rows(&self, rows: &[SheetRow]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM ledger_rows")
            .execute(&mut *tx)
            .await
            .context("Failed to clear ledger rows")?;

        for (position, row) in rows.iter().enumerate() {
            let query = sqlx::query(
                r#"
                INSERT INTO ledger_rows (position, date, trn_id, trn_type, category, description, amount, trn_mode, proof, balance, remarks)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(position as i64);
            let query = Self::bind_cell(query, &row.date);
            let query = Self::bind_cell(query, &row.id);
            let query = query
                .bind(&row.txn_type)
                .bind(&row.category)
                .bind(&row.description);
            let query = Self::bind_cell(query, &row.amount);
            let query = query.bind(&row.mode).bind(&row.proof);
            let query = Self::bind_cell(query, &row.balance);

            query
                .bind(&row.remarks)
                .execute(&mut *tx)
                .await
                .context("Failed to insert ledger row")?;
        }

        tx.commit().await.context("Failed to commit ledger rows")?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

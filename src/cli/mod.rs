use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::application::{CategoryFilter, LedgerService};
use crate::domain::{
    Cell, Cents, PaymentMode, Proof, Transaction, TransactionDraft, TransactionId,
    TransactionType, format_cents, format_currency, month_label, parse_day_first,
    try_normalize_amount,
};
use crate::io::Exporter;
use crate::storage::{CsvStore, RowStore, SqliteStore};

/// Cashbook - petty-cash account book
#[derive(Parser)]
#[command(name = "cashbook")]
#[command(about = "A petty-cash account book that keeps its running balance consistent")]
#[command(version)]
pub struct Cli {
    /// Store location: a CSV file or a SQLite database file
    #[arg(
        short,
        long,
        global = true,
        env = "CASHBOOK_STORE",
        default_value = "cashbook.csv"
    )]
    pub store: String,

    /// Storage backend (auto picks SQLite for .db/.sqlite files)
    #[arg(
        long,
        global = true,
        env = "CASHBOOK_BACKEND",
        value_enum,
        default_value_t = Backend::Auto
    )]
    pub backend: Backend,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Auto,
    Csv,
    Sqlite,
}

impl Backend {
    /// Settle `Auto` from the store path's extension.
    pub fn resolve(self, path: &str) -> Backend {
        match self {
            Backend::Auto => {
                let ext = Path::new(path)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_ascii_lowercase());
                match ext.as_deref() {
                    Some("db" | "sqlite" | "sqlite3") => Backend::Sqlite,
                    _ => Backend::Csv,
                }
            }
            other => other,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty store
    Init,

    /// Record a new transaction
    Add {
        /// Amount (e.g. "500", "1,200.50" or "₹1,200.50")
        amount: String,

        /// Type: EXPENSE, CREDIT, ADV-IN, ADV-OUT, ADV-PEN
        #[arg(short = 't', long = "type", default_value = "EXPENSE")]
        txn_type: String,

        /// Date (DD/MM/YYYY or YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Category (defaults to one matching the type)
        #[arg(short, long)]
        category: Option<String>,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Mode: CASH or E-TRANSACTION
        #[arg(short, long, default_value = "CASH")]
        mode: String,

        /// Proof: BILL, VOUCHER or NA
        #[arg(short, long, default_value = "BILL")]
        proof: String,

        /// Remarks
        #[arg(short, long)]
        remarks: Option<String>,
    },

    /// Change fields of an existing transaction
    Edit {
        /// Transaction ID
        id: TransactionId,

        #[arg(short, long)]
        amount: Option<String>,

        #[arg(short = 't', long = "type")]
        txn_type: Option<String>,

        #[arg(long)]
        date: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        mode: Option<String>,

        #[arg(short, long)]
        proof: Option<String>,

        #[arg(short, long)]
        remarks: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: TransactionId,
    },

    /// List transactions, newest first
    List {
        /// Only this month (e.g. "January 2024")
        #[arg(long)]
        month: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one transaction in full
    Show {
        /// Transaction ID
        id: TransactionId,
    },

    /// Show the current balance
    Balance,

    /// Per-type totals for a month
    Summary {
        /// Month label (e.g. "January 2024", defaults to the latest month)
        #[arg(long)]
        month: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// List the months that have transactions
    Months,

    /// Totals per category
    Categories {
        /// Start date, inclusive
        #[arg(long)]
        from: Option<String>,

        /// End date, inclusive
        #[arg(long)]
        to: Option<String>,

        /// Types to include (repeatable, defaults to EXPENSE and ADV-OUT)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Reload the store, recompute every balance and write it back
    Sync,

    /// Verify the stored table without changing it
    Check,

    /// Export the ledger to CSV or JSON
    Export {
        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    async fn open_store(&self) -> Result<Box<dyn RowStore>> {
        let store: Box<dyn RowStore> = match self.backend.resolve(&self.store) {
            Backend::Sqlite => Box::new(SqliteStore::open(&self.store).await?),
            _ => Box::new(CsvStore::new(&self.store)),
        };
        Ok(store)
    }

    async fn open_service(&self) -> Result<LedgerService> {
        let store = self.open_store().await?;
        Ok(LedgerService::open(store).await)
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => match self.backend.resolve(&self.store) {
                Backend::Sqlite => {
                    SqliteStore::open(&self.store).await?;
                    println!("Store initialized: {}", self.store);
                }
                _ => {
                    if CsvStore::new(&self.store).init()? {
                        println!("Store initialized: {}", self.store);
                    } else {
                        println!("Store already exists: {}", self.store);
                    }
                }
            },

            Commands::Add {
                ref amount,
                ref txn_type,
                ref date,
                ref category,
                ref description,
                ref mode,
                ref proof,
                ref remarks,
            } => {
                let mut service = self.open_service().await?;

                let date = match date {
                    Some(d) => parse_date_arg(d)?,
                    None => Local::now().date_naive(),
                };
                let mut draft = TransactionDraft::new(
                    date,
                    TransactionType::parse(txn_type),
                    parse_amount(amount)?,
                )
                .with_mode(PaymentMode::parse(mode))
                .with_proof(Proof::parse(proof));
                if let Some(c) = category {
                    draft = draft.with_category(c.as_str());
                }
                if let Some(d) = description {
                    draft = draft.with_description(d.as_str());
                }
                if let Some(r) = remarks {
                    draft = draft.with_remarks(r.as_str());
                }

                let transaction = service.add(draft).await?;
                println!(
                    "Added #{}: {} {} on {}",
                    transaction.id,
                    transaction.txn_type,
                    format_currency(transaction.amount_cents),
                    display_date(transaction.date)
                );
                println!("Balance: {}", format_currency(service.closing_balance()));
            }

            Commands::Edit {
                id,
                ref amount,
                ref txn_type,
                ref date,
                ref category,
                ref description,
                ref mode,
                ref proof,
                ref remarks,
            } => {
                let mut service = self.open_service().await?;
                let existing = service.get(id)?;

                let date = date.as_deref().map(parse_date_arg).transpose()?;
                let mut draft = existing.to_draft(date).ok_or_else(|| {
                    anyhow!("Transaction #{} has no readable date; pass --date", id)
                })?;

                if let Some(a) = amount {
                    draft.amount_cents = parse_amount(a)?;
                }
                if let Some(t) = txn_type {
                    draft.txn_type = TransactionType::parse(t);
                }
                if let Some(c) = category {
                    draft.category = c.clone();
                }
                if let Some(d) = description {
                    draft.description = d.clone();
                }
                if let Some(m) = mode {
                    draft.mode = PaymentMode::parse(m);
                }
                if let Some(p) = proof {
                    draft.proof = Proof::parse(p);
                }
                if let Some(r) = remarks {
                    draft.remarks = r.clone();
                }

                let transaction = service.edit(id, draft).await?;
                println!("Updated #{}", transaction.id);
                println!("Balance: {}", format_currency(service.closing_balance()));
            }

            Commands::Delete { id } => {
                let mut service = self.open_service().await?;
                let removed = service.delete(id).await?;
                println!("Deleted #{} ({} row(s))", id, removed.len());
                println!("Balance: {}", format_currency(service.closing_balance()));
            }

            Commands::List { ref month, limit } => {
                let service = self.open_service().await?;
                run_list_command(&service, month.as_deref(), limit);
            }

            Commands::Show { id } => {
                let service = self.open_service().await?;
                print_transaction(service.get(id)?);
            }

            Commands::Balance => {
                let service = self.open_service().await?;
                if service.is_empty() {
                    println!("No transactions.");
                }
                println!("Total balance: {}", format_currency(service.closing_balance()));
                if let Some((first, last)) = service.date_span() {
                    println!(
                        "Period: {} to {}",
                        display_date(Some(first)),
                        display_date(Some(last))
                    );
                }
            }

            Commands::Summary {
                ref month,
                ref format,
            } => {
                let service = self.open_service().await?;
                run_summary_command(&service, month.clone(), format)?;
            }

            Commands::Months => {
                let service = self.open_service().await?;
                let months = service.available_months();
                if months.is_empty() {
                    println!("No transactions.");
                }
                for month in months {
                    println!("{}", month);
                }
            }

            Commands::Categories {
                ref from,
                ref to,
                ref types,
                ref format,
            } => {
                let service = self.open_service().await?;
                let mut filter = CategoryFilter {
                    from: from.as_deref().map(parse_date_arg).transpose()?,
                    to: to.as_deref().map(parse_date_arg).transpose()?,
                    ..Default::default()
                };
                if !types.is_empty() {
                    filter.types = types.iter().map(|t| TransactionType::parse(t)).collect();
                }
                run_categories_command(&service, &filter, format)?;
            }

            Commands::Sync => {
                let mut service = self.open_service().await?;
                let result = service.sync().await?;
                println!(
                    "Synced {} row(s). Balance: {}",
                    result.row_count,
                    format_currency(result.closing_balance)
                );
                if !result.coercions.is_empty() {
                    println!("\nCells read as defaults:");
                    for coercion in &result.coercions {
                        println!("  - {}", coercion);
                    }
                }
            }

            Commands::Check => {
                let service = self.open_service().await?;
                run_check_command(&service).await?;
            }

            Commands::Export {
                ref format,
                ref output,
            } => {
                let service = self.open_service().await?;
                run_export_command(&service, format, output.as_deref())?;
            }
        }

        Ok(())
    }
}

fn run_list_command(service: &LedgerService, month: Option<&str>, limit: Option<usize>) {
    let rows: Vec<&Transaction> = service
        .transactions()
        .iter()
        .rev()
        .filter(|t| match month {
            Some(m) => t.date.is_some_and(|d| month_label(d) == m),
            None => true,
        })
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    if rows.is_empty() {
        println!("No transactions.");
        return;
    }

    println!(
        "{:>5} {:<12} {:<8} {:<24} {:<24} {:>12} {:>12}",
        "ID", "DATE", "TYPE", "CATEGORY", "DESCRIPTION", "AMOUNT", "BALANCE"
    );
    println!("{}", "-".repeat(103));
    for t in rows {
        println!(
            "{:>5} {:<12} {:<8} {:<24} {:<24} {:>12} {:>12}",
            t.id,
            display_date(t.date),
            truncate(t.txn_type.as_str(), 8),
            truncate(&t.category, 24),
            truncate(&t.description, 24),
            format_cents(t.amount_cents),
            format_cents(t.balance_cents)
        );
    }
}

fn print_transaction(t: &Transaction) {
    println!("Transaction #{}", t.id);
    println!("  Date:        {}", display_date(t.date));
    println!("  Type:        {}", t.txn_type);
    println!("  Category:    {}", t.category);
    println!("  Description: {}", t.description);
    println!("  Amount:      {}", format_currency(t.amount_cents));
    println!("  Mode:        {}", t.mode);
    println!("  Proof:       {}", t.proof);
    println!("  Remarks:     {}", t.remarks);
    println!("  Balance:     {}", format_currency(t.balance_cents));
}

fn run_summary_command(service: &LedgerService, month: Option<String>, format: &str) -> Result<()> {
    let Some(month) = month.or_else(|| service.available_months().into_iter().next()) else {
        println!("No transactions.");
        return Ok(());
    };

    let summary = service.month_summary(&month);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            println!("{}", summary.month);
            println!("Total balance: {}", format_currency(service.closing_balance()));
            println!();
            println!("{:<14} {:>15} {:>6}", "TYPE", "TOTAL", "COUNT");
            println!("{}", "-".repeat(37));
            for txn_type in TransactionType::KNOWN {
                let count = summary
                    .totals
                    .iter()
                    .find(|t| t.txn_type == txn_type)
                    .map(|t| t.count)
                    .unwrap_or(0);
                println!(
                    "{:<14} {:>15} {:>6}",
                    txn_type.as_str(),
                    format_cents(summary.total_for(&txn_type)),
                    count
                );
            }
            for other in summary.totals.iter().filter(|t| !t.txn_type.is_known()) {
                println!(
                    "{:<14} {:>15} {:>6}",
                    truncate(other.txn_type.as_str(), 14),
                    format_cents(other.total),
                    other.count
                );
            }
        }
    }

    Ok(())
}

fn run_categories_command(
    service: &LedgerService,
    filter: &CategoryFilter,
    format: &str,
) -> Result<()> {
    let report = service.category_report(filter);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "csv" => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(["category", "total", "count", "percentage"])?;
            for cat in &report.categories {
                writer.write_record([
                    cat.category.clone(),
                    format_cents(cat.total),
                    cat.count.to_string(),
                    format!("{:.2}", cat.percentage),
                ])?;
            }
            writer.flush()?;
        }
        _ => {
            if report.categories.is_empty() {
                println!("No data available.");
                return Ok(());
            }
            println!("Total selected: {}", format_currency(report.total));
            println!();
            println!("{:<40} {:>12} {:>6} {:>7}", "CATEGORY", "TOTAL", "COUNT", "%");
            println!("{}", "-".repeat(68));
            for cat in &report.categories {
                println!(
                    "{:<40} {:>12} {:>6} {:>6.1}%",
                    truncate(&cat.category, 40),
                    format_cents(cat.total),
                    cat.count,
                    cat.percentage
                );
            }
        }
    }

    Ok(())
}

async fn run_check_command(service: &LedgerService) -> Result<()> {
    println!("Checking stored table...\n");

    let result = service.check().await?;
    let report = &result.report;

    println!("Rows:             {}", report.row_count);
    println!("Stored balance:   {}", format_currency(report.stored_closing_balance));
    println!("Expected balance: {}", format_currency(report.expected_closing_balance));
    println!();

    if report.missing_dates > 0 {
        println!("Note: {} row(s) without a readable date", report.missing_dates);
    }
    if !report.unknown_types.is_empty() {
        println!(
            "Note: {} row(s) with an unrecognized type (no effect on balance)",
            report.unknown_types.len()
        );
    }
    for coercion in &result.coercions {
        println!("Note: {}", coercion);
    }

    if report.is_healthy() {
        println!("Ledger is consistent.");
        return Ok(());
    }

    println!("Issues found:");
    if report.out_of_order > 0 {
        println!("  - {} row(s) out of date/id order", report.out_of_order);
    }
    for id in &report.duplicate_ids {
        println!("  - id {} is used more than once", id);
    }
    for mismatch in &report.balance_mismatches {
        println!(
            "  - #{} balance is {}, expected {}",
            mismatch.id,
            format_cents(mismatch.stored),
            format_cents(mismatch.expected)
        );
    }
    println!("\nRun `cashbook sync` to rewrite every balance.");
    anyhow::bail!("Ledger integrity check failed")
}

fn run_export_command(service: &LedgerService, format: &str, output: Option<&str>) -> Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        )),
        None => Box::new(io::stdout()),
    };

    let exporter = Exporter::new(service);
    match format {
        "csv" => {
            let count = exporter.export_csv(writer)?;
            eprintln!("Exported {} transactions", count);
        }
        "json" => {
            let snapshot = exporter.export_json(writer)?;
            eprintln!("Exported {} transactions", snapshot.transactions.len());
        }
        other => anyhow::bail!("Unknown export format '{}'. Valid: csv, json", other),
    }

    Ok(())
}

fn parse_amount(input: &str) -> Result<Cents> {
    try_normalize_amount(&Cell::text(input))
        .map_err(|e| anyhow!("Invalid amount '{}': {}", input, e))
}

fn parse_date_arg(input: &str) -> Result<NaiveDate> {
    if input.eq_ignore_ascii_case("today") {
        return Ok(Local::now().date_naive());
    }
    parse_day_first(input)
        .ok_or_else(|| anyhow!("Invalid date '{}'. Use DD/MM/YYYY or YYYY-MM-DD", input))
}

fn display_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

use std::fmt;

use serde::Serialize;

use super::{
    Cell, Cents, MAX_AMOUNT_CENTS, PaymentMode, Proof, Transaction, TransactionId,
    TransactionType, cents_to_f64, format_cents, format_date, parse_day_first,
    try_normalize_amount, try_normalize_cents,
};

pub const COL_DATE: &str = "DATE";
pub const COL_ID: &str = "TRN. ID";
pub const COL_TYPE: &str = "TRN. TYPE";
pub const COL_CATEGORY: &str = "CATEGORY";
pub const COL_DESCRIPTION: &str = "DESCRIPTION";
pub const COL_AMOUNT: &str = "AMOUNT";
pub const COL_MODE: &str = "TRN. MODE";
pub const COL_PROOF: &str = "BILL/VOUCHER";
pub const COL_BALANCE: &str = "BALANCE";
pub const COL_REMARKS: &str = "REMARKS";

/// Column schema of the backing table, in storage order.
pub const COLUMNS: [&str; 10] = [
    COL_DATE,
    COL_ID,
    COL_TYPE,
    COL_CATEGORY,
    COL_DESCRIPTION,
    COL_AMOUNT,
    COL_MODE,
    COL_PROOF,
    COL_BALANCE,
    COL_REMARKS,
];

/// One row of the backing table exactly as the store holds it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    pub date: Cell,
    pub id: Cell,
    pub txn_type: String,
    pub category: String,
    pub description: String,
    pub amount: Cell,
    pub mode: String,
    pub proof: String,
    pub balance: Cell,
    pub remarks: String,
}

/// A field that could not be read and was replaced by its safe default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coercion {
    /// Zero-based position of the row in the table as read
    pub row: usize,
    pub column: &'static str,
    pub raw: String,
    pub fallback: &'static str,
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: {} {:?} read as {}",
            self.row + 1,
            self.column,
            self.raw,
            self.fallback
        )
    }
}

/// Rows decoded into transactions, plus every default that had to be applied.
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    pub transactions: Vec<Transaction>,
    pub coercions: Vec<Coercion>,
}

impl SheetRow {
    /// Encode a transaction into the table's cell layout.
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            date: Cell::text(format_date(transaction.date)),
            id: id_cell(transaction.id),
            txn_type: transaction.txn_type.as_str().to_string(),
            category: transaction.category.clone(),
            description: transaction.description.clone(),
            amount: money_cell(transaction.amount_cents),
            mode: transaction.mode.as_str().to_string(),
            proof: transaction.proof.as_str().to_string(),
            balance: money_cell(transaction.balance_cents),
            remarks: transaction.remarks.clone(),
        }
    }

    /// Decode this row, recording a coercion for every unreadable field.
    /// Never fails.
    pub fn decode(&self, row: usize, coercions: &mut Vec<Coercion>) -> Transaction {
        let mut coerce = |column: &'static str, raw: &Cell, fallback: &'static str| {
            tracing::warn!(row, column, raw = %raw, fallback, "coerced unreadable cell");
            coercions.push(Coercion {
                row,
                column,
                raw: raw.to_string(),
                fallback,
            });
        };

        let id = parse_id(&self.id).unwrap_or_else(|| {
            coerce(COL_ID, &self.id, "0");
            0
        });

        let date = match &self.date {
            Cell::Empty => None,
            cell => {
                let parsed = parse_day_first(&cell.to_string());
                if parsed.is_none() {
                    coerce(COL_DATE, cell, "missing date");
                }
                parsed
            }
        };

        let amount_cents = try_normalize_amount(&self.amount).unwrap_or_else(|_| {
            coerce(COL_AMOUNT, &self.amount, "0");
            0
        });

        let balance_cents = try_normalize_cents(&self.balance).unwrap_or_else(|_| {
            coerce(COL_BALANCE, &self.balance, "0");
            0
        });

        Transaction {
            id,
            date,
            txn_type: TransactionType::parse(&self.txn_type),
            category: self.category.clone(),
            description: self.description.clone(),
            amount_cents,
            mode: PaymentMode::parse(&self.mode),
            proof: Proof::parse(&self.proof),
            remarks: self.remarks.clone(),
            balance_cents,
        }
    }
}

/// Decode a whole table in its stored order.
pub fn decode_rows(rows: &[SheetRow]) -> Decoded {
    let mut coercions = Vec::new();
    let transactions = rows
        .iter()
        .enumerate()
        .map(|(i, row)| row.decode(i, &mut coercions))
        .collect();
    Decoded {
        transactions,
        coercions,
    }
}

/// Encode transactions into table rows, preserving their order.
pub fn encode_rows(transactions: &[Transaction]) -> Vec<SheetRow> {
    transactions.iter().map(SheetRow::from_transaction).collect()
}

/// Numeric cell for an amount, or plain decimal text once the value is too
/// large to survive a round trip through `f64`.
fn money_cell(cents: Cents) -> Cell {
    if cents.unsigned_abs() <= MAX_AMOUNT_CENTS.unsigned_abs() {
        Cell::Number(cents_to_f64(cents))
    } else {
        Cell::Text(format_cents(cents))
    }
}

/// Largest id magnitude an `f64` cell holds exactly.
const MAX_EXACT_ID: TransactionId = 1 << 53;

/// Numeric cell for an id, or its digits as text when `f64` would round it.
fn id_cell(id: TransactionId) -> Cell {
    if id.unsigned_abs() < MAX_EXACT_ID.unsigned_abs() {
        Cell::from(id)
    } else {
        Cell::Text(id.to_string())
    }
}

/// Read an id cell. Integral numbers and integral numeric text such as
/// "7" or "7.0" are accepted.
fn parse_id(cell: &Cell) -> Option<TransactionId> {
    let value = match cell {
        Cell::Empty => return None,
        Cell::Number(value) => *value,
        Cell::Text(text) => {
            let text = text.trim();
            if let Ok(id) = text.parse::<TransactionId>() {
                return Some(id);
            }
            text.parse::<f64>().ok()?
        }
    };

    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_ID as f64 {
        Some(value as TransactionId)
    } else {
        None
    }
}

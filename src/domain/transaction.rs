use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Cents;

pub type TransactionId = i64;

/// Suggested categories offered for new entries. Not enforced.
pub const CATEGORIES: &[&str] = &[
    "TEA / SNACKS / WATERCAN",
    "COURIER / MAILING",
    "XEROX / PRINT / OFFICE STATIONERY",
    "STAFF FOOD / BUS FARE / TRAVEL EXPENSE",
    "PLANT MAINTENANCE",
    "FUEL ALLOWANCE / BUS FARE / TRAVEL ALLOWANCES",
    "GRASS CUTTER - SPARES / SUPPLIES & SERVICE",
    "MODULE CLEANING - ACCESSORIES & PLUMBING ITEMS",
    "PETROL PURCHASE",
    "DIESEL PURCHASE",
    "OFFICE & WASHROOM - HOUSEKEEPING MATERIALS",
    "POOJA ITEMS / WEEKLY POOJA EXPENSES",
    "CREDIT",
    "ADV-IN",
    "ADV-OUT",
    "ADV-PEN",
    "OTHERS",
];

/// Which way a transaction moves the running balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inflow,
    Outflow,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    Expense,
    Credit,
    /// Advance received
    AdvanceIn,
    /// Advance paid out
    AdvanceOut,
    /// Advance pending settlement; informational only
    AdvancePending,
    /// Unrecognized type text, kept verbatim so an overwrite loses nothing
    Other(String),
}

impl TransactionType {
    pub const KNOWN: [TransactionType; 5] = [
        TransactionType::Expense,
        TransactionType::Credit,
        TransactionType::AdvanceIn,
        TransactionType::AdvanceOut,
        TransactionType::AdvancePending,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Expense => "EXPENSE",
            TransactionType::Credit => "CREDIT",
            TransactionType::AdvanceIn => "ADV-IN",
            TransactionType::AdvanceOut => "ADV-OUT",
            TransactionType::AdvancePending => "ADV-PEN",
            TransactionType::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "EXPENSE" => TransactionType::Expense,
            "CREDIT" => TransactionType::Credit,
            "ADV-IN" => TransactionType::AdvanceIn,
            "ADV-OUT" => TransactionType::AdvanceOut,
            "ADV-PEN" => TransactionType::AdvancePending,
            _ => TransactionType::Other(s.to_string()),
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            TransactionType::Credit | TransactionType::AdvanceIn => Direction::Inflow,
            TransactionType::Expense | TransactionType::AdvanceOut => Direction::Outflow,
            TransactionType::AdvancePending | TransactionType::Other(_) => Direction::Neutral,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TransactionType::Other(_))
    }

    /// Category preselected for a new entry of this type.
    pub fn default_category(&self) -> &'static str {
        CATEGORIES
            .iter()
            .find(|c| **c == self.as_str())
            .copied()
            .unwrap_or(CATEGORIES[0])
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for TransactionType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<TransactionType> for String {
    fn from(t: TransactionType) -> Self {
        t.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMode {
    Cash,
    ETransaction,
    Other(String),
}

impl PaymentMode {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::ETransaction => "E-TRANSACTION",
            PaymentMode::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "CASH" => PaymentMode::Cash,
            "E-TRANSACTION" => PaymentMode::ETransaction,
            _ => PaymentMode::Other(s.to_string()),
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for PaymentMode {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<PaymentMode> for String {
    fn from(m: PaymentMode) -> Self {
        m.as_str().to_string()
    }
}

/// Supporting document kept for a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Proof {
    Bill,
    Voucher,
    NotApplicable,
    Other(String),
}

impl Proof {
    pub fn as_str(&self) -> &str {
        match self {
            Proof::Bill => "BILL",
            Proof::Voucher => "VOUCHER",
            Proof::NotApplicable => "NA",
            Proof::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "BILL" => Proof::Bill,
            "VOUCHER" => Proof::Voucher,
            "NA" => Proof::NotApplicable,
            _ => Proof::Other(s.to_string()),
        }
    }
}

impl std::fmt::Display for Proof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for Proof {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Proof> for String {
    fn from(p: Proof) -> Self {
        p.as_str().to_string()
    }
}

/// One row of the account book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// `None` when the stored date could not be read
    pub date: Option<NaiveDate>,
    pub txn_type: TransactionType,
    pub category: String,
    pub description: String,
    /// Unsigned magnitude; the direction comes from `txn_type`
    pub amount_cents: Cents,
    pub mode: PaymentMode,
    pub proof: Proof,
    pub remarks: String,
    /// Running balance after this row. Derived, never set by the user.
    pub balance_cents: Cents,
}

impl Transaction {
    /// Create a transaction with the balance left as a placeholder.
    pub fn new(
        id: TransactionId,
        date: Option<NaiveDate>,
        txn_type: TransactionType,
        amount_cents: Cents,
    ) -> Self {
        let category = txn_type.default_category().to_string();
        Self {
            id,
            date,
            txn_type,
            category,
            description: String::new(),
            amount_cents,
            mode: PaymentMode::Cash,
            proof: Proof::Bill,
            remarks: String::new(),
            balance_cents: 0,
        }
    }

    pub fn from_draft(id: TransactionId, draft: TransactionDraft) -> Self {
        let mut transaction = Self::new(id, None, TransactionType::Expense, 0);
        transaction.apply(draft);
        transaction
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_mode(mut self, mode: PaymentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_proof(mut self, proof: Proof) -> Self {
        self.proof = proof;
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    /// Replace every user-editable field with the draft's values.
    pub fn apply(&mut self, draft: TransactionDraft) {
        self.date = Some(draft.date);
        self.txn_type = draft.txn_type;
        self.category = draft.category;
        self.description = draft.description;
        self.amount_cents = draft.amount_cents;
        self.mode = draft.mode;
        self.proof = draft.proof;
        self.remarks = draft.remarks;
    }

    /// The editable fields of this transaction, as a starting point for an
    /// edit. `date` overrides the stored date; with neither there is no draft.
    pub fn to_draft(&self, date: Option<NaiveDate>) -> Option<TransactionDraft> {
        Some(TransactionDraft {
            date: date.or(self.date)?,
            txn_type: self.txn_type.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            amount_cents: self.amount_cents,
            mode: self.mode.clone(),
            proof: self.proof.clone(),
            remarks: self.remarks.clone(),
        })
    }
}

/// User-supplied fields for creating or replacing a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub date: NaiveDate,
    pub txn_type: TransactionType,
    pub category: String,
    pub description: String,
    pub amount_cents: Cents,
    pub mode: PaymentMode,
    pub proof: Proof,
    pub remarks: String,
}

impl TransactionDraft {
    /// A draft with the form defaults: category follows the type, cash, bill.
    pub fn new(date: NaiveDate, txn_type: TransactionType, amount_cents: Cents) -> Self {
        Self {
            date,
            category: txn_type.default_category().to_string(),
            txn_type,
            description: String::new(),
            amount_cents,
            mode: PaymentMode::Cash,
            proof: Proof::Bill,
            remarks: String::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_mode(mut self, mode: PaymentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_proof(mut self, proof: Proof) -> Self {
        self.proof = proof;
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }
}

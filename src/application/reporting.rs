use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, Transaction, TransactionType, month_label};

/// Per-type totals for one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthSummary {
    pub month: String,
    pub totals: Vec<TypeTotal>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeTotal {
    pub txn_type: TransactionType,
    pub total: Cents,
    pub count: usize,
}

impl MonthSummary {
    /// Sum of amounts of the given type this month, 0 if none.
    pub fn total_for(&self, txn_type: &TransactionType) -> Cents {
        self.totals
            .iter()
            .find(|t| &t.txn_type == txn_type)
            .map(|t| t.total)
            .unwrap_or(0)
    }
}

/// Which rows a category breakdown covers.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    /// Inclusive lower bound
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound
    pub to: Option<NaiveDate>,
    pub types: Vec<TransactionType>,
}

impl Default for CategoryFilter {
    /// Spending view: expenses and advances paid out, all dates.
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            types: vec![TransactionType::Expense, TransactionType::AdvanceOut],
        }
    }
}

impl CategoryFilter {
    fn matches(&self, transaction: &Transaction) -> bool {
        if !self.types.contains(&transaction.txn_type) {
            return false;
        }
        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        match transaction.date {
            Some(date) => {
                self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub categories: Vec<CategorySummary>,
    pub total: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: usize,
    pub percentage: f64,
}

/// Month labels present in the ledger, most recent first.
pub fn available_months(transactions: &[Transaction]) -> Vec<String> {
    let months: BTreeSet<NaiveDate> = transactions
        .iter()
        .filter_map(|t| t.date)
        .filter_map(|d| d.with_day0(0))
        .collect();

    months.into_iter().rev().map(month_label).collect()
}

/// Earliest and latest dates in the ledger.
pub fn date_span(transactions: &[Transaction]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = transactions.iter().filter_map(|t| t.date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

/// Sum amounts per transaction type for the month with the given label.
pub fn month_summary(transactions: &[Transaction], month: &str) -> MonthSummary {
    let mut totals: BTreeMap<TransactionType, (Cents, usize)> = BTreeMap::new();
    let mut count = 0;

    for transaction in transactions {
        let in_month = transaction
            .date
            .is_some_and(|date| month_label(date) == month);
        if !in_month {
            continue;
        }
        let entry = totals.entry(transaction.txn_type.clone()).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(transaction.amount_cents);
        entry.1 += 1;
        count += 1;
    }

    // Type ordering puts the known types first, then unknown ones by name
    let totals = totals
        .into_iter()
        .map(|(txn_type, (total, count))| TypeTotal {
            txn_type,
            total,
            count,
        })
        .collect();

    MonthSummary {
        month: month.to_string(),
        totals,
        count,
    }
}

/// Total amounts per category over the filtered rows, largest first.
pub fn category_report(transactions: &[Transaction], filter: &CategoryFilter) -> CategoryReport {
    let mut groups: BTreeMap<&str, (Cents, usize)> = BTreeMap::new();
    for transaction in transactions.iter().filter(|t| filter.matches(t)) {
        let entry = groups.entry(transaction.category.as_str()).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(transaction.amount_cents);
        entry.1 += 1;
    }

    let total: Cents = groups
        .values()
        .fold(0, |acc: Cents, (sum, _)| acc.saturating_add(*sum));

    let mut categories: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(category, (sum, count))| CategorySummary {
            category: category.to_string(),
            total: sum,
            count,
            percentage: if total != 0 {
                (sum as f64 / total as f64) * 100.0
            } else {
                0.0
            },
        })
        .collect();

    // BTreeMap already ordered names; the stable sort keeps that for ties
    categories.sort_by(|a, b| b.total.cmp(&a.total));

    CategoryReport {
        from: filter.from,
        to: filter.to,
        categories,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn txn(
        id: i64,
        date: Option<NaiveDate>,
        t: TransactionType,
        category: &str,
        amount: Cents,
    ) -> Transaction {
        Transaction::new(id, date, t, amount).with_category(category)
    }

    fn sample() -> Vec<Transaction> {
        vec![
            txn(1, day(2023, 12, 30), TransactionType::Credit, "CREDIT", 500000),
            txn(2, day(2024, 1, 2), TransactionType::Expense, "PETROL PURCHASE", 120000),
            txn(3, day(2024, 1, 9), TransactionType::Expense, "COURIER / MAILING", 30000),
            txn(4, day(2024, 1, 15), TransactionType::AdvanceOut, "ADV-OUT", 200000),
            txn(5, day(2024, 1, 20), TransactionType::Expense, "PETROL PURCHASE", 90000),
            txn(6, day(2024, 1, 21), TransactionType::AdvancePending, "ADV-PEN", 50000),
            txn(7, None, TransactionType::Expense, "OTHERS", 999),
            txn(8, day(2024, 2, 1), TransactionType::AdvanceIn, "ADV-IN", 10000),
        ]
    }

    #[test]
    fn test_available_months_newest_first() {
        assert_eq!(
            available_months(&sample()),
            vec!["February 2024", "January 2024", "December 2023"]
        );
        assert!(available_months(&[]).is_empty());
    }

    #[test]
    fn test_month_summary_per_type() {
        let summary = month_summary(&sample(), "January 2024");
        assert_eq!(summary.count, 5);
        assert_eq!(summary.total_for(&TransactionType::Expense), 240000);
        assert_eq!(summary.total_for(&TransactionType::AdvanceOut), 200000);
        assert_eq!(summary.total_for(&TransactionType::AdvancePending), 50000);
        assert_eq!(summary.total_for(&TransactionType::Credit), 0);
        assert_eq!(summary.totals[0].txn_type, TransactionType::Expense);
    }

    #[test]
    fn test_month_summary_unknown_month_is_empty() {
        let summary = month_summary(&sample(), "March 2030");
        assert_eq!(summary.count, 0);
        assert!(summary.totals.is_empty());
    }

    #[test]
    fn test_category_report_defaults_to_spending() {
        let report = category_report(&sample(), &CategoryFilter::default());
        let names: Vec<_> = report.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(
            names,
            vec!["PETROL PURCHASE", "ADV-OUT", "COURIER / MAILING", "OTHERS"]
        );
        assert_eq!(report.total, 440999);
        assert_eq!(report.categories[0].count, 2);
    }

    #[test]
    fn test_category_report_date_range_is_inclusive_and_drops_missing_dates() {
        let filter = CategoryFilter {
            from: day(2024, 1, 9),
            to: day(2024, 1, 15),
            ..Default::default()
        };
        let report = category_report(&sample(), &filter);
        let names: Vec<_> = report.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["ADV-OUT", "COURIER / MAILING"]);
        assert_eq!(report.total, 230000);
        let pct: f64 = report.categories.iter().map(|c| c.percentage).sum();
        assert!((pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_ties_break_by_name() {
        let rows = vec![
            txn(1, day(2024, 1, 1), TransactionType::Expense, "ZETA", 100),
            txn(2, day(2024, 1, 1), TransactionType::Expense, "ALPHA", 100),
        ];
        let report = category_report(&rows, &CategoryFilter::default());
        assert_eq!(report.categories[0].category, "ALPHA");
    }

    #[test]
    fn test_date_span() {
        assert_eq!(
            date_span(&sample()),
            Some((day(2023, 12, 30).unwrap(), day(2024, 2, 1).unwrap()))
        );
        assert_eq!(date_span(&[]), None);
    }

    #[test]
    fn test_totals_saturate_on_huge_amounts() {
        let rows = vec![
            txn(1, day(2024, 1, 1), TransactionType::Expense, "A", i64::MAX),
            txn(2, day(2024, 1, 2), TransactionType::Expense, "A", i64::MAX),
            txn(3, day(2024, 1, 3), TransactionType::Expense, "B", i64::MAX),
        ];

        let summary = month_summary(&rows, "January 2024");
        assert_eq!(summary.total_for(&TransactionType::Expense), i64::MAX);

        let report = category_report(&rows, &CategoryFilter::default());
        assert_eq!(report.total, i64::MAX);
        assert_eq!(report.categories[0].total, i64::MAX);
    }
}

mod common;

use anyhow::Result;
use cashbook::application::{CategoryFilter, LedgerService};
use cashbook::domain::TransactionType;
use common::*;

/// Two months of petty cash: a float, fuel, office supplies and advances
async fn sample_ledger() -> Result<LedgerService> {
    let (mut service, _store) = test_service().await;

    service.add(credit("2024-01-01", 500000)).await?;
    service
        .add(expense("2024-01-05", 90000).with_category("PETROL"))
        .await?;
    service
        .add(expense("2024-01-12", 150000).with_category("STATIONERY"))
        .await?;
    service
        .add(draft("2024-01-20", TransactionType::AdvanceOut, 200000).with_category("DRIVER"))
        .await?;
    service
        .add(draft("2024-02-02", TransactionType::AdvanceIn, 50000).with_category("DRIVER"))
        .await?;
    service
        .add(expense("2024-02-10", 60000).with_category("PETROL"))
        .await?;
    service
        .add(draft("2024-02-15", TransactionType::AdvancePending, 70000))
        .await?;

    Ok(service)
}

#[tokio::test]
async fn test_available_months_newest_first() -> Result<()> {
    let service = sample_ledger().await?;

    assert_eq!(
        service.available_months(),
        vec!["February 2024".to_string(), "January 2024".to_string()]
    );

    Ok(())
}

#[tokio::test]
async fn test_date_span() -> Result<()> {
    let service = sample_ledger().await?;

    assert_eq!(
        service.date_span(),
        Some((date("2024-01-01"), date("2024-02-15")))
    );

    let (empty, _store) = test_service().await;
    assert_eq!(empty.date_span(), None);

    Ok(())
}

#[tokio::test]
async fn test_month_summary_totals_by_type() -> Result<()> {
    let service = sample_ledger().await?;

    let january = service.month_summary("January 2024");
    assert_eq!(january.count, 4);
    assert_eq!(january.total_for(&TransactionType::Credit), 500000);
    assert_eq!(january.total_for(&TransactionType::Expense), 240000);
    assert_eq!(january.total_for(&TransactionType::AdvanceOut), 200000);
    assert_eq!(january.total_for(&TransactionType::AdvanceIn), 0);

    let february = service.month_summary("February 2024");
    assert_eq!(february.count, 3);
    assert_eq!(february.total_for(&TransactionType::AdvanceIn), 50000);
    assert_eq!(february.total_for(&TransactionType::AdvancePending), 70000);

    Ok(())
}

#[tokio::test]
async fn test_month_summary_unknown_month_is_empty() -> Result<()> {
    let service = sample_ledger().await?;

    let summary = service.month_summary("March 2024");

    assert_eq!(summary.count, 0);
    assert!(summary.totals.is_empty());
    assert_eq!(summary.total_for(&TransactionType::Expense), 0);

    Ok(())
}

#[tokio::test]
async fn test_category_report_defaults_to_spending() -> Result<()> {
    let service = sample_ledger().await?;

    let report = service.category_report(&CategoryFilter::default());

    // PETROL 900 + 600, STATIONERY 1500, DRIVER advance out 2000
    assert_eq!(report.total, 500000);
    let names: Vec<&str> = report.categories.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["DRIVER", "PETROL", "STATIONERY"]);

    let petrol = &report.categories[1];
    assert_eq!(petrol.total, 150000);
    assert_eq!(petrol.count, 2);
    assert!((petrol.percentage - 30.0).abs() < 1e-9);

    let sum: f64 = report.categories.iter().map(|c| c.percentage).sum();
    assert!((sum - 100.0).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn test_category_report_date_range() -> Result<()> {
    let service = sample_ledger().await?;

    let filter = CategoryFilter {
        from: Some(date("2024-02-01")),
        to: Some(date("2024-02-29")),
        ..Default::default()
    };
    let report = service.category_report(&filter);

    assert_eq!(report.total, 60000);
    assert_eq!(report.categories.len(), 1);
    assert_eq!(report.categories[0].category, "PETROL");
    assert_eq!(report.from, Some(date("2024-02-01")));

    Ok(())
}

#[tokio::test]
async fn test_category_report_custom_types() -> Result<()> {
    let service = sample_ledger().await?;

    let filter = CategoryFilter {
        types: vec![TransactionType::AdvanceIn, TransactionType::AdvanceOut],
        ..Default::default()
    };
    let report = service.category_report(&filter);

    assert_eq!(report.categories.len(), 1);
    assert_eq!(report.categories[0].category, "DRIVER");
    assert_eq!(report.categories[0].count, 2);
    assert_eq!(report.total, 250000);

    Ok(())
}

#[tokio::test]
async fn test_reports_on_empty_ledger() -> Result<()> {
    let (service, _store) = test_service().await;

    assert!(service.available_months().is_empty());
    let report = service.category_report(&CategoryFilter::default());
    assert!(report.categories.is_empty());
    assert_eq!(report.total, 0);

    Ok(())
}

mod common;

use std::fs;

use anyhow::Result;
use cashbook::application::LedgerService;
use cashbook::domain::TransactionType;
use cashbook::storage::{CsvStore, RowStore, SqliteStore};
use common::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_csv_ledger_survives_reopen() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("cashbook.csv");
    let store = CsvStore::new(&path);
    assert!(store.init()?);
    assert!(!store.init()?);

    let mut service = LedgerService::open(Box::new(store)).await;
    service.add(credit("2024-01-01", 100000)).await?;
    service
        .add(expense("2024-01-02", 30050).with_description("Tea, snacks"))
        .await?;

    let reopened = LedgerService::open(Box::new(CsvStore::new(&path))).await;
    assert_eq!(ids(&reopened), vec![1, 2]);
    assert_eq!(balances(&reopened), vec![100000, 69950]);
    assert_eq!(reopened.get(2)?.description, "Tea, snacks");

    Ok(())
}

#[tokio::test]
async fn test_csv_header_is_written_first() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("cashbook.csv");

    let mut service = LedgerService::open(Box::new(CsvStore::new(&path))).await;
    service.add(credit("2024-01-01", 100000)).await?;

    let content = fs::read_to_string(&path)?;
    let header = content.lines().next().unwrap();
    assert_eq!(
        header,
        "DATE,TRN. ID,TRN. TYPE,CATEGORY,DESCRIPTION,AMOUNT,TRN. MODE,BILL/VOUCHER,BALANCE,REMARKS"
    );
    assert!(!temp.path().join("cashbook.csv.tmp").exists());

    Ok(())
}

#[tokio::test]
async fn test_csv_hand_edited_table_is_repaired_by_sync() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("cashbook.csv");
    fs::write(
        &path,
        " DATE , TRN. ID ,TRN. TYPE,CATEGORY,AMOUNT , BALANCE\n\
         10/01/2024,2,EXPENSE,PETROL,\"₹1,200.50\",999\n\
         05/01/2024,1,CREDIT,CASH FROM BANK,\"5,000\",\n\
         12/01/2024,3,ADV-PEN,DRIVER,300,\n",
    )?;

    let mut service = LedgerService::open(Box::new(CsvStore::new(&path))).await;
    let result = service.sync().await?;

    assert_eq!(result.row_count, 3);
    assert_eq!(result.closing_balance, 379950);
    assert!(result.coercions.is_empty());

    let check = service.check().await?;
    assert!(check.report.is_healthy());

    let reopened = LedgerService::open(Box::new(CsvStore::new(&path))).await;
    assert_eq!(ids(&reopened), vec![1, 2, 3]);
    assert_eq!(balances(&reopened), vec![500000, 379950, 379950]);
    assert_eq!(
        reopened.get(3)?.txn_type,
        TransactionType::AdvancePending
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_csv_file_opens_empty() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("nowhere.csv");

    let store = CsvStore::new(&path);
    assert!(store.read_rows().await.is_err());

    let mut service = LedgerService::open(Box::new(store)).await;
    assert!(service.is_empty());

    // The first write creates the file
    service.add(credit("2024-01-01", 1000)).await?;
    assert!(path.exists());

    Ok(())
}

#[tokio::test]
async fn test_sqlite_ledger_survives_reopen() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("cashbook.db");
    let path = path.to_str().unwrap();

    let mut service = LedgerService::open(Box::new(SqliteStore::open(path).await?)).await;
    service.add(credit("2024-01-01", 100000)).await?;
    service.add(expense("2024-01-03", 25000)).await?;
    service.add(expense("2024-01-02", 5000)).await?;
    service.delete(1).await?;
    service.add(credit("2024-01-01", 200000)).await?;

    let reopened = LedgerService::open(Box::new(SqliteStore::open(path).await?)).await;
    assert_eq!(ids(&reopened), vec![4, 3, 2]);
    assert_eq!(balances(&reopened), vec![200000, 195000, 170000]);

    let check = reopened.check().await?;
    assert!(check.report.is_healthy());
    assert_eq!(check.report.row_count, 3);

    Ok(())
}

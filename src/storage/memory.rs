use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;

use super::RowStore;
use crate::domain::SheetRow;

#[derive(Default)]
struct Inner {
    rows: Mutex<Vec<SheetRow>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

/// In-memory table. Clones share the same rows, so a test can hand one
/// clone to a ledger and inspect the other.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<SheetRow>) -> Self {
        let store = Self::new();
        store.set_rows(rows);
        store
    }

    pub fn rows(&self) -> Vec<SheetRow> {
        self.lock().clone()
    }

    pub fn set_rows(&self, rows: Vec<SheetRow>) {
        *self.lock() = rows;
    }

    /// Make every subsequent read fail, as an unreachable store would.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SheetRow>> {
        // A panic while holding the lock cannot leave the Vec half-written
        self.inner
            .rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn read_rows(&self) -> Result<Vec<SheetRow>> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            bail!("memory store is unreachable");
        }
        Ok(self.rows())
    }

    async fn write_rows(&self, rows: &[SheetRow]) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            bail!("memory store rejected the write");
        }
        self.set_rows(rows.to_vec());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

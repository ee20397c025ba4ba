//! Durable append-only journal.
//!
//! Persists the transaction log as line-delimited JSON: one entry per
//! line, appended and synced on every write, replayed into memory on
//! open. The file is never rewritten in place; the log's write-once
//! contract makes appending the only mutation.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use shared_types::{CustomerAddress, GroupId, Page, PageRequest, StoreError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::entities::{GroupTokenTransaction, TransactionKind};
use crate::ports::stores::TransactionLog;

/// File-backed implementation of `TransactionLog`.
pub struct FileJournal {
    path: PathBuf,
    inner: Mutex<JournalInner>,
}

struct JournalInner {
    file: File,
    entries: Vec<GroupTokenTransaction>,
    seen_ids: HashSet<Uuid>,
}

impl FileJournal {
    /// Open (or create) a journal at `path`, replaying existing entries.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let entries = Self::load_entries(&path)?;
        let seen_ids = entries.iter().map(|e| e.id).collect();

        if !entries.is_empty() {
            info!(
                path = %path.display(),
                entries = entries.len(),
                "journal replayed"
            );
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        Ok(Self {
            path,
            inner: Mutex::new(JournalInner {
                file,
                entries,
                seen_ids,
            }),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_entries(path: &Path) -> Result<Vec<GroupTokenTransaction>, StoreError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut entries = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<GroupTokenTransaction>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    // A torn trailing line from an interrupted append is
                    // tolerated; everything before it is intact.
                    warn!(
                        path = %path.display(),
                        line = line_no + 1,
                        error = %e,
                        "stopping journal replay at unreadable line"
                    );
                    break;
                }
            }
        }
        Ok(entries)
    }
}

impl TransactionLog for FileJournal {
    fn append(&self, entry: GroupTokenTransaction) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;

        if inner.seen_ids.contains(&entry.id) {
            return Err(StoreError::DuplicateEntry {
                id: entry.id.to_string(),
            });
        }

        let line = serde_json::to_string(&entry).map_err(|e| StoreError::Io {
            message: e.to_string(),
        })?;
        writeln!(inner.file, "{line}").map_err(io_err)?;
        inner.file.sync_data().map_err(io_err)?;

        inner.seen_ids.insert(entry.id);
        inner.entries.push(entry);
        Ok(())
    }

    fn list_by_group(
        &self,
        group: &GroupId,
        kind: Option<TransactionKind>,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        let matching: Vec<_> = inner
            .entries
            .iter()
            .rev()
            .filter(|e| &e.group_id == group && kind.map_or(true, |k| e.kind == k))
            .cloned()
            .collect();
        Ok(Page::from_slice(matching, page))
    }

    fn list_by_customer_in_group(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
        page: PageRequest,
    ) -> Result<Page<GroupTokenTransaction>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        let matching: Vec<_> = inner
            .entries
            .iter()
            .rev()
            .filter(|e| &e.group_id == group && &e.customer_address == customer)
            .cloned()
            .collect();
        Ok(Page::from_slice(matching, page))
    }

    fn snapshot_group(&self, group: &GroupId) -> Result<Vec<GroupTokenTransaction>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| &e.group_id == group)
            .cloned()
            .collect())
    }

    fn snapshot_customer(
        &self,
        customer: &CustomerAddress,
        group: &GroupId,
    ) -> Result<Vec<GroupTokenTransaction>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| &e.group_id == group && &e.customer_address == customer)
            .cloned()
            .collect())
    }
}

fn io_err(e: std::io::Error) -> StoreError {
    StoreError::Io {
        message: e.to_string(),
    }
}

//! Local key-value persistence.
//!
//! The persisted layout is one string key holding a JSON array of expenses
//! plus a small set of plain-string plan flag keys. Stores only move strings;
//! (de)serialization lives with the callers so the adapter stays a dumb
//! key-value surface.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use crate::{Expense, LedgerError};

/// Key holding the JSON array of expenses.
pub const EXPENSES_KEY: &str = "expenses";
/// Key holding the plan tier name.
pub const PLAN_KEY: &str = "user_plan";
/// Key holding the opaque subscription identifier.
pub const SUBSCRIPTION_KEY: &str = "subscription_id";
/// Key holding the plan expiration timestamp (RFC 3339).
pub const EXPIRATION_KEY: &str = "plan_expiration";

/// Durable string-keyed storage.
///
/// Reads distinguish "absent" (`Ok(None)`) from failure; writes surface the
/// underlying error (for example a full disk) instead of swallowing it.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&mut self, key: &str) -> io::Result<()>;
}

/// File-backed store: one file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.key_path(key), value)
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Loads the expense collection.
///
/// An absent key is an empty ledger. Unparsable content is logged and also
/// treated as empty, never surfaced as an error; the next successful save
/// overwrites it.
pub fn load_expenses<S: KeyValueStore>(store: &S) -> Result<Vec<Expense>, LedgerError> {
    let Some(content) = store.read(EXPENSES_KEY)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(&content) {
        Ok(expenses) => Ok(expenses),
        Err(err) => {
            tracing::warn!("discarding unparsable expense collection: {err}");
            Ok(Vec::new())
        }
    }
}

/// Persists the full expense collection under [`EXPENSES_KEY`].
pub fn save_expenses<S: KeyValueStore>(
    store: &mut S,
    expenses: &[Expense],
) -> Result<(), LedgerError> {
    let payload = serde_json::to_string(expenses)?;
    store.write(EXPENSES_KEY, &payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{Amount, Category, ExpenseDraft};

    fn sample() -> Expense {
        Expense::new(
            1,
            ExpenseDraft::new(
                Amount::from_cents(1000),
                Category::Food,
                NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            ),
            "2024-03-15T10:00:00Z".parse().unwrap(),
        )
    }

    #[test]
    fn absent_key_is_empty_collection() {
        let store = MemoryStore::new();
        assert_eq!(load_expenses(&store).unwrap(), Vec::new());
    }

    #[test]
    fn unparsable_content_is_empty_collection() {
        let mut store = MemoryStore::new();
        store.write(EXPENSES_KEY, "{not json").unwrap();
        assert_eq!(load_expenses(&store).unwrap(), Vec::new());
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut store = MemoryStore::new();
        save_expenses(&mut store, &[sample()]).unwrap();
        assert_eq!(load_expenses(&store).unwrap(), vec![sample()]);
    }

    #[test]
    fn file_store_reads_absent_key_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert_eq!(store.read("missing").unwrap(), None);

        store.write(PLAN_KEY, "pro").unwrap();
        assert_eq!(store.read(PLAN_KEY).unwrap().as_deref(), Some("pro"));

        store.remove(PLAN_KEY).unwrap();
        assert_eq!(store.read(PLAN_KEY).unwrap(), None);
        // Removing again stays quiet.
        store.remove(PLAN_KEY).unwrap();
    }
}

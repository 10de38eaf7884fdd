use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{StorageError, StorageResult};
use crate::models::LedgerData;
use crate::seed;

/// Fixed logical names of the persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Expenses,
    Wallet,
    Budget,
    ThresholdAlert,
    Goals,
    Notifications,
}

impl RecordKey {
    pub const ALL: [RecordKey; 6] = [
        RecordKey::Expenses,
        RecordKey::Wallet,
        RecordKey::Budget,
        RecordKey::ThresholdAlert,
        RecordKey::Goals,
        RecordKey::Notifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::Expenses => "expenses",
            RecordKey::Wallet => "wallet",
            RecordKey::Budget => "budget",
            RecordKey::ThresholdAlert => "thresholdAlert",
            RecordKey::Goals => "goals",
            RecordKey::Notifications => "notifications",
        }
    }
}

/// Durable string-keyed record store. Values are serialized JSON.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

/// One JSON file per record inside a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(dir.display().to_string(), e))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StorageError::io(path.display().to_string(), e))
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.record_path(key);
        fs::write(&path, value).map_err(|e| StorageError::io(path.display().to_string(), e))
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path.display().to_string(), e)),
        }
    }
}

/// Volatile store, handy for tests and for running without a data directory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.records.remove(key);
        Ok(())
    }
}

/// Reads and parses one record. Absent, unreadable and malformed records all
/// come back as `None`.
pub fn load_record<T, S>(store: &S, key: RecordKey) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key.as_str()) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No stored {} record, using defaults", key.as_str());
            return None;
        }
        Err(e) => {
            warn!("Reading {} failed, using defaults: {}", key.as_str(), e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Parsing {} failed, using defaults: {}", key.as_str(), e);
            None
        }
    }
}

pub fn save_record<T, S>(store: &mut S, key: RecordKey, value: &T) -> StorageResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(value)?;
    store.set(key.as_str(), &json)
}

/// Loads every record, substituting the seeded default for each one that
/// is missing or corrupt.
pub fn load_ledger_data<S: KeyValueStore + ?Sized>(store: &S) -> LedgerData {
    LedgerData {
        expenses: load_record(store, RecordKey::Expenses).unwrap_or_else(seed::expenses),
        wallet: load_record(store, RecordKey::Wallet).unwrap_or_else(seed::wallet),
        budget: load_record(store, RecordKey::Budget).unwrap_or_else(seed::budget),
        threshold_alert: load_record(store, RecordKey::ThresholdAlert)
            .unwrap_or_else(seed::threshold_alert),
        goals: load_record(store, RecordKey::Goals).unwrap_or_else(seed::goals),
        notifications: load_record(store, RecordKey::Notifications)
            .unwrap_or_else(seed::notifications),
    }
}

/// Writes the selected records of `data`.
pub fn save_ledger_data<S: KeyValueStore + ?Sized>(
    store: &mut S,
    data: &LedgerData,
    keys: &[RecordKey],
) -> StorageResult<()> {
    for key in keys {
        match key {
            RecordKey::Expenses => save_record(store, *key, &data.expenses)?,
            RecordKey::Wallet => save_record(store, *key, &data.wallet)?,
            RecordKey::Budget => save_record(store, *key, &data.budget)?,
            RecordKey::ThresholdAlert => save_record(store, *key, &data.threshold_alert)?,
            RecordKey::Goals => save_record(store, *key, &data.goals)?,
            RecordKey::Notifications => save_record(store, *key, &data.notifications)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetPeriod, Wallet};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn empty_store_loads_seeded_defaults() {
        let store = MemoryStore::new();
        let data = load_ledger_data(&store);
        assert_eq!(data, seed::ledger_data());
    }

    #[test]
    fn malformed_record_falls_back_only_for_that_key() {
        let mut store = MemoryStore::new();
        store.set("wallet", "{not json").unwrap();
        store
            .set("budget", r#"{"amount": 250, "period": "weekly"}"#)
            .unwrap();

        let data = load_ledger_data(&store);
        assert_eq!(data.wallet, seed::wallet());
        assert_eq!(data.budget.amount, dec!(250));
        assert_eq!(data.budget.period, BudgetPeriod::Weekly);
    }

    #[test]
    fn records_use_the_fixed_key_names() {
        let mut store = MemoryStore::new();
        save_ledger_data(&mut store, &seed::ledger_data(), &RecordKey::ALL).unwrap();

        for key in [
            "expenses",
            "wallet",
            "budget",
            "thresholdAlert",
            "goals",
            "notifications",
        ] {
            assert!(store.get(key).unwrap().is_some(), "missing {key}");
        }
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn expense_dates_are_iso_strings_and_reload() {
        let mut store = MemoryStore::new();
        let expenses = seed::expenses();
        save_record(&mut store, RecordKey::Expenses, &expenses).unwrap();

        let raw = store.get("expenses").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value[0]["date"].as_str().unwrap().starts_with("2025-04-20T"));

        let loaded: Vec<crate::models::Expense> =
            load_record(&store, RecordKey::Expenses).unwrap();
        assert_eq!(loaded.len(), expenses.len());
        assert_eq!(loaded[0].date, expenses[0].date);
        assert_eq!(loaded[2].receipt.as_deref(), Some("receipt1.jpg"));
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("data")).unwrap();
        assert!(store.get("wallet").unwrap().is_none());

        let wallet = Wallet {
            balance: dec!(12.5),
            currency: "EUR".into(),
        };
        save_record(&mut store, RecordKey::Wallet, &wallet).unwrap();
        assert!(store.path().join("wallet.json").exists());

        let loaded: Wallet = load_record(&store, RecordKey::Wallet).unwrap();
        assert_eq!(loaded, wallet);

        store.remove("wallet").unwrap();
        store.remove("wallet").unwrap();
        assert!(store.get("wallet").unwrap().is_none());
    }

    #[test]
    fn amounts_reload_exactly_as_json_numbers() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();
        let wallet = Wallet {
            balance: dec!(123456789012345.67),
            currency: "INR".into(),
        };
        let mut expenses = seed::expenses();
        expenses[0].amount = dec!(1234567890.123456789);
        expenses[1].amount = Decimal::MAX;
        save_record(&mut store, RecordKey::Wallet, &wallet).unwrap();
        save_record(&mut store, RecordKey::Expenses, &expenses).unwrap();

        let raw = store.get("wallet").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["balance"].is_number());
        assert!(raw.contains("123456789012345.67"));

        let reopened = FileStore::new(dir.path()).unwrap();
        let loaded: Wallet = load_record(&reopened, RecordKey::Wallet).unwrap();
        assert_eq!(loaded.balance, dec!(123456789012345.67));
        let loaded: Vec<crate::models::Expense> =
            load_record(&reopened, RecordKey::Expenses).unwrap();
        assert_eq!(loaded[0].amount, dec!(1234567890.123456789));
        assert_eq!(loaded[1].amount, Decimal::MAX);
    }
}

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use super::model::LicenseKey;

const KEYS: TableDefinition<i64, &str> = TableDefinition::new("keys");
const COUNTERS: TableDefinition<&str, i64> = TableDefinition::new("counters");
const KEY_SEQ: &str = "key_seq";

/// Thread-safe handle to the redb store.
///
/// Holds no state between requests beyond the database itself — every read
/// re-queries storage. Concurrency safety is delegated entirely to redb's
/// transactions.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at `path`, ensuring tables exist.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).context("open redb database")?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(KEYS)?;
        write_txn.open_table(COUNTERS)?;
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Insert a key string and return its assigned id.
    ///
    /// The id comes from a persistent sequence bumped in the same write
    /// transaction as the row, so ids are monotonic and never reused even
    /// after deletes.
    pub fn insert(&self, key: &str) -> Result<i64> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut counters = write_txn.open_table(COUNTERS)?;
            let id = counters.get(KEY_SEQ)?.map(|g| g.value()).unwrap_or(0) + 1;
            counters.insert(KEY_SEQ, id)?;

            let mut keys = write_txn.open_table(KEYS)?;
            keys.insert(id, key)?;
            id
        };
        write_txn.commit()?;

        debug!(id, "stored key");
        Ok(id)
    }

    /// List every key in insertion (id) order.
    pub fn list(&self) -> Result<Vec<LicenseKey>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KEYS)?;

        let mut keys = Vec::new();
        for item in table.iter()? {
            let (k, v) = item?;
            keys.push(LicenseKey {
                id: k.value(),
                key: v.value().to_owned(),
            });
        }
        Ok(keys)
    }

    /// Fetch a single key by id. The id is the table's key, so this is a
    /// point lookup rather than a scan.
    pub fn get(&self, id: i64) -> Result<Option<LicenseKey>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KEYS)?;

        Ok(table.get(id)?.map(|guard| LicenseKey {
            id,
            key: guard.value().to_owned(),
        }))
    }

    /// Delete a key by id. Returns whether a row existed; deleting an absent
    /// id is a no-op, not an error.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(KEYS)?;
            let existed = table.remove(id)?.is_some();
            existed
        };
        write_txn.commit()?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_store() -> (Store, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = Store::open(&path).unwrap();
        (store, dir)
    }

    #[test]
    fn insert_assigns_monotonic_ids() {
        let (s, _dir) = make_store();
        assert_eq!(s.insert("AAA-111").unwrap(), 1);
        assert_eq!(s.insert("BBB-222").unwrap(), 2);
        assert_eq!(s.insert("CCC-333").unwrap(), 3);
    }

    #[test]
    fn insert_then_list_contains_value() {
        let (s, _dir) = make_store();
        s.insert("ABC-123").unwrap();
        let keys = s.list().unwrap();
        assert!(keys.iter().any(|k| k.key == "ABC-123"));
    }

    #[test]
    fn list_empty_store() {
        let (s, _dir) = make_store();
        assert!(s.list().unwrap().is_empty());
    }

    #[test]
    fn list_preserves_insertion_order() {
        let (s, _dir) = make_store();
        s.insert("first").unwrap();
        s.insert("second").unwrap();
        s.insert("third").unwrap();
        let keys: Vec<String> = s.list().unwrap().into_iter().map(|k| k.key).collect();
        assert_eq!(keys, ["first", "second", "third"]);
    }

    #[test]
    fn duplicate_values_permitted() {
        let (s, _dir) = make_store();
        let a = s.insert("SAME").unwrap();
        let b = s.insert("SAME").unwrap();
        assert_ne!(a, b);
        assert_eq!(s.list().unwrap().len(), 2);
    }

    #[test]
    fn get_by_id() {
        let (s, _dir) = make_store();
        let id = s.insert("XYZ-999").unwrap();
        let key = s.get(id).unwrap().unwrap();
        assert_eq!(key, LicenseKey { id, key: "XYZ-999".into() });
    }

    #[test]
    fn get_missing_is_none() {
        let (s, _dir) = make_store();
        assert!(s.get(1).unwrap().is_none());
    }

    #[test]
    fn delete_existing_and_missing() {
        let (s, _dir) = make_store();
        let id = s.insert("DEL-ME").unwrap();
        assert!(s.delete(id).unwrap());
        assert!(!s.delete(id).unwrap());
        assert!(!s.delete(999_999).unwrap());
        assert!(s.get(id).unwrap().is_none());
    }

    #[test]
    fn ids_not_reused_after_delete() {
        let (s, _dir) = make_store();
        let first = s.insert("one").unwrap();
        s.delete(first).unwrap();
        let second = s.insert("two").unwrap();
        assert!(second > first);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let id = {
            let s = Store::open(&path).unwrap();
            s.insert("DURABLE").unwrap()
        };

        let s = Store::open(&path).unwrap();
        let key = s.get(id).unwrap().unwrap();
        assert_eq!(key.key, "DURABLE");
        // The sequence survives too.
        assert_eq!(s.insert("NEXT").unwrap(), id + 1);
    }
}

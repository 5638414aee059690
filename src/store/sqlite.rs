use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{BrowseError, Result};
use crate::store::PreferenceStore;

pub struct SqlitePreferenceStore {
    conn: Mutex<Connection>,
}

impl SqlitePreferenceStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| BrowseError::Database(e.to_string()))
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| BrowseError::Database(e.to_string()))?;

        Ok(())
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_bytes(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_key_is_none() {
        let store = SqlitePreferenceStore::in_memory().unwrap();
        assert_eq!(store.get_bytes("nope").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let store = SqlitePreferenceStore::in_memory().unwrap();
        store.set_bytes("k", b"one").unwrap();
        store.set_bytes("k", b"two").unwrap();
        assert_eq!(store.get_bytes("k").unwrap(), Some(b"two".to_vec()));

        store.remove("k").unwrap();
        assert_eq!(store.get_bytes("k").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.db");

        {
            let store = SqlitePreferenceStore::new(&path).unwrap();
            store.set_bytes("BrowseForwardPreferences", b"{}").unwrap();
        }

        let store = SqlitePreferenceStore::new(&path).unwrap();
        assert_eq!(
            store.get_bytes("BrowseForwardPreferences").unwrap(),
            Some(b"{}".to_vec())
        );
    }
}

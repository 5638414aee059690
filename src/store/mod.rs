pub mod memory;
pub mod sqlite;

use crate::app::Result;

pub use memory::MemoryPreferenceStore;
pub use sqlite::SqlitePreferenceStore;

/// Small persisted key-value settings. Callers own the encoding of values.
pub trait PreferenceStore: Send + Sync {
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set_bytes(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

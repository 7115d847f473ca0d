//! Typed sub database views
//!
//! Each view binds a named sub database of an LMDBer to a key schema
//! (tuple keys joined with a separator) and a value schema (raw bytes, a
//! fully qualified CESR primitive, a concatenation of several, or an
//! insertion ordered duplicate set of such values).

pub mod catcesr;
pub mod cesr;
pub mod dup;
pub mod ioset;
pub mod serder;

use crate::errors::MatterError;
use crate::vir::db::dbing::{BytesDatabase, LMDBer};
use crate::vir::db::errors::DBError;
use std::sync::Arc;

/// Errors raised by the typed sub database views
#[derive(Debug, thiserror::Error)]
pub enum SuberError {
    #[error("Database error: {0}")]
    DBError(#[from] DBError),

    #[error("Matter error: {0}")]
    MatterError(#[from] MatterError),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Value conversion error: {0}")]
    ValueConversionError(String),
}

/// Base functionality shared by every typed view
pub struct SuberBase<'db> {
    pub db: Arc<&'db LMDBer>,
    pub sdb: BytesDatabase,
    pub sep: u8,
}

impl<'db> SuberBase<'db> {
    /// Opens (creating on first use) the named sub database. Sub database
    /// names end with a non Base64 character, conventionally '.', to
    /// avoid namespace collisions with qb64 prefixes.
    pub fn new(
        db: Arc<&'db LMDBer>,
        subkey: &str,
        sep: Option<u8>,
        dupsort: Option<bool>,
    ) -> Result<Self, SuberError> {
        let sdb = db.create_database(Some(subkey), dupsort)?;
        Ok(Self {
            db,
            sdb,
            sep: sep.unwrap_or(b'.'),
        })
    }

    /// Joins key components with the separator into one DB key. An empty
    /// trailing component produces a trailing separator for prefix scans.
    pub fn to_key<K: AsRef<[u8]>>(&self, keys: &[K]) -> Vec<u8> {
        let mut result = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                result.push(self.sep);
            }
            result.extend_from_slice(key.as_ref());
        }
        result
    }

    /// Splits a DB key at separators into its components
    pub fn to_keys(&self, key: &[u8]) -> Vec<Vec<u8>> {
        key.split(|&b| b == self.sep)
            .map(|part| part.to_vec())
            .collect()
    }

    /// Removes all entries whose keys start with the joined keys prefix.
    /// Returns true when any entry was removed.
    pub fn trim<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, SuberError> {
        let key = self.to_key(keys);
        Ok(self.db.del_top_val(&self.sdb, &key)?)
    }

    /// Returns count of all entries in the sub database
    pub fn cnt_all(&self) -> Result<usize, SuberError> {
        Ok(self.db.cnt(&self.sdb)?)
    }
}

/// Suber stores one raw value per key
pub struct Suber<'db> {
    pub base: SuberBase<'db>,
}

impl<'db> Suber<'db> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: SuberBase::new(db, subkey, sep, Some(false))?,
        })
    }

    /// Writes val at keys if absent. Returns false on key collision
    /// without raising.
    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], val: &[u8]) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.put_val(&self.base.sdb, &key, val)?)
    }

    /// Writes val at keys, overwriting any existing value
    pub fn pin<K: AsRef<[u8]>>(&self, keys: &[K], val: &[u8]) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.set_val(&self.base.sdb, &key, val)?)
    }

    /// Returns value at keys if any
    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<Vec<u8>>, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.get_val(&self.base.sdb, &key)?)
    }

    /// Removes entry at keys. Returns true when the entry existed.
    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.del_val(&self.base.sdb, &key)?)
    }

    /// Returns (key components, value) items whose keys start with the
    /// joined keys prefix, in lexicographic order
    pub fn get_item_iter<K: AsRef<[u8]>>(
        &self,
        keys: &[K],
    ) -> Result<Vec<(Vec<Vec<u8>>, Vec<u8>)>, SuberError> {
        let key = self.base.to_key(keys);
        let mut items = Vec::new();
        self.base.db.get_top_items_iter(&self.base.sdb, &key, |k, v| {
            items.push((self.base.to_keys(k), v.to_vec()));
            Ok(true)
        })?;
        Ok(items)
    }

    pub fn trim<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, SuberError> {
        self.base.trim(keys)
    }

    pub fn cnt_all(&self) -> Result<usize, SuberError> {
        self.base.cnt_all()
    }
}

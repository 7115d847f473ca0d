//! Keyed record objects over a sub database
//!
//! Komer maps keys to serde record structs serialized as JSON, the way
//! registry names map to registry records.

use crate::vir::db::dbing::LMDBer;
use crate::vir::db::subing::{SuberBase, SuberError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// Komer stores one serde JSON record per key
pub struct Komer<'db, T: Serialize + DeserializeOwned> {
    pub base: SuberBase<'db>,
    _record: PhantomData<T>,
}

impl<'db, T: Serialize + DeserializeOwned> Komer<'db, T> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: SuberBase::new(db, subkey, sep, Some(false))?,
            _record: PhantomData,
        })
    }

    fn ser(&self, val: &T) -> Result<Vec<u8>, SuberError> {
        serde_json::to_vec(val)
            .map_err(|e| SuberError::ValueConversionError(format!("Record serialize: {}", e)))
    }

    fn des(&self, val: &[u8]) -> Result<T, SuberError> {
        serde_json::from_slice(val)
            .map_err(|e| SuberError::DeserializationError(format!("Record deserialize: {}", e)))
    }

    /// Writes record at keys if absent. Returns false on key collision.
    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], val: &T) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.put_val(&self.base.sdb, &key, &self.ser(val)?)?)
    }

    /// Writes record at keys, overwriting any existing record
    pub fn pin<K: AsRef<[u8]>>(&self, keys: &[K], val: &T) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.set_val(&self.base.sdb, &key, &self.ser(val)?)?)
    }

    /// Returns record at keys if any
    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<T>, SuberError> {
        let key = self.base.to_key(keys);
        match self.base.db.get_val(&self.base.sdb, &key)? {
            Some(val) => Ok(Some(self.des(&val)?)),
            None => Ok(None),
        }
    }

    /// Removes record at keys. Returns true when the record existed.
    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.del_val(&self.base.sdb, &key)?)
    }

    /// Returns (key components, record) items whose keys start with the
    /// joined keys prefix
    pub fn get_item_iter<K: AsRef<[u8]>>(
        &self,
        keys: &[K],
    ) -> Result<Vec<(Vec<Vec<u8>>, T)>, SuberError> {
        let key = self.base.to_key(keys);
        let mut raw_items = Vec::new();
        self.base.db.get_top_items_iter(&self.base.sdb, &key, |k, v| {
            raw_items.push((self.base.to_keys(k), v.to_vec()));
            Ok(true)
        })?;
        let mut items = Vec::with_capacity(raw_items.len());
        for (keys, val) in raw_items {
            items.push((keys, self.des(&val)?));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct PetRecord {
        name: String,
        legs: u32,
    }

    #[test]
    fn test_komer() {
        let lmdber = LMDBer::builder().name("test_db").temp(true).build().unwrap();
        let komer: Komer<PetRecord> = Komer::new(Arc::new(&lmdber), "pets.", None).unwrap();

        let rec = PetRecord {
            name: "rex".to_string(),
            legs: 4,
        };
        assert!(komer.put(&["rex"], &rec).unwrap());
        assert!(!komer.put(&["rex"], &rec).unwrap());
        assert_eq!(komer.get(&["rex"]).unwrap(), Some(rec.clone()));

        let upd = PetRecord {
            name: "rex".to_string(),
            legs: 3,
        };
        assert!(komer.pin(&["rex"], &upd).unwrap());
        assert_eq!(komer.get(&["rex"]).unwrap(), Some(upd));

        assert!(komer.rem(&["rex"]).unwrap());
        assert_eq!(komer.get(&["rex"]).unwrap(), None);
    }
}

use crate::vir::core::serdering::Rawifiable;
use crate::vir::db::dbing::LMDBer;
use crate::vir::db::subing::{SuberBase, SuberError};
use std::marker::PhantomData;
use std::sync::Arc;

/// SerderSuber stores one serialized field map wrapper per key.
/// Serialization is the wrapper's raw bytes; deserialization re-inhales
/// via from_raw.
pub struct SerderSuber<'db, S: Rawifiable> {
    pub base: SuberBase<'db>,
    _serder: PhantomData<S>,
}

impl<'db, S: Rawifiable> SerderSuber<'db, S> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: SuberBase::new(db, subkey, sep, Some(false))?,
            _serder: PhantomData,
        })
    }

    fn des(&self, val: &[u8]) -> Result<S, SuberError> {
        S::from_raw(val).map_err(|e| {
            SuberError::DeserializationError(format!("Failed to deserialize Serder: {}", e))
        })
    }

    /// Writes val at keys if absent. Returns false on key collision.
    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], val: &S) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.put_val(&self.base.sdb, &key, val.raw())?)
    }

    /// Writes val at keys, overwriting any existing value
    pub fn pin<K: AsRef<[u8]>>(&self, keys: &[K], val: &S) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.set_val(&self.base.sdb, &key, val.raw())?)
    }

    /// Returns wrapper at keys if any
    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<S>, SuberError> {
        let key = self.base.to_key(keys);
        match self.base.db.get_val(&self.base.sdb, &key)? {
            Some(val) => Ok(Some(self.des(&val)?)),
            None => Ok(None),
        }
    }

    /// Removes entry at keys. Returns true when the entry existed.
    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.del_val(&self.base.sdb, &key)?)
    }

    /// Returns (key components, wrapper) items whose keys start with the
    /// joined keys prefix
    pub fn get_item_iter<K: AsRef<[u8]>>(
        &self,
        keys: &[K],
    ) -> Result<Vec<(Vec<Vec<u8>>, S)>, SuberError> {
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

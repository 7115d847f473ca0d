use crate::cesr::{Matter, Parsable};
use crate::vir::db::dbing::LMDBer;
use crate::vir::db::subing::{SuberBase, SuberError};
use std::marker::PhantomData;
use std::sync::Arc;

/// IoSetSuber stores an insertion ordered set of raw values per key over
/// a dupsort=false sub database. Each stored value carries a hidden
/// 32 hex insertion ordinal key suffix, appended and stripped
/// transparently, so that iteration order equals insertion order.
pub struct IoSetSuber<'db> {
    pub base: SuberBase<'db>,
}

impl<'db> IoSetSuber<'db> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: SuberBase::new(db, subkey, sep, Some(false))?,
        })
    }

    /// Adds each val not already present to the set at keys
    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], vals: &[&[u8]]) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.put_io_set_vals(&self.base.sdb, &key, vals)?)
    }

    /// Adds val idempotently to the set at keys
    pub fn add<K: AsRef<[u8]>>(&self, keys: &[K], val: &[u8]) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.add_io_set_val(&self.base.sdb, &key, val)?)
    }

    /// Returns the set at keys in insertion order
    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<Vec<u8>>, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.get_io_set_vals(&self.base.sdb, &key)?)
    }

    /// Returns the last inserted value at keys
    pub fn get_last<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<Vec<u8>>, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.get_io_set_val_last(&self.base.sdb, &key)?)
    }

    /// Returns count of values in the set at keys
    pub fn cnt<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<usize, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.cnt_io_set_vals(&self.base.sdb, &key)?)
    }

    /// Deletes val from the set when val is Some, else the whole set
    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K], val: Option<&[u8]>) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        match val {
            Some(val) => Ok(self.base.db.del_io_set_val(&self.base.sdb, &key, val)?),
            None => Ok(self.base.db.del_io_set_vals(&self.base.sdb, &key)?),
        }
    }

    /// Returns (key components, value) items whose apparent keys start
    /// with the joined keys prefix. The hidden insertion ordinal never
    /// appears in the returned keys.
    pub fn get_item_iter<K: AsRef<[u8]>>(
        &self,
        keys: &[K],
    ) -> Result<Vec<(Vec<Vec<u8>>, Vec<u8>)>, SuberError> {
        let key = self.base.to_key(keys);
        let mut items = Vec::new();
        self.base
            .db
            .get_top_io_set_items_iter(&self.base.sdb, &key, |k, v| {
                items.push((self.base.to_keys(k), v.to_vec()));
                Ok(true)
            })?;
        Ok(items)
    }
}

/// CesrIoSetSuber stores an insertion ordered set of fully qualified CESR
/// primitives per key
pub struct CesrIoSetSuber<'db, M: Matter + Parsable> {
    pub base: IoSetSuber<'db>,
    _matter: PhantomData<M>,
}

impl<'db, M: Matter + Parsable> CesrIoSetSuber<'db, M> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: IoSetSuber::new(db, subkey, sep)?,
            _matter: PhantomData,
        })
    }

    pub fn add<K: AsRef<[u8]>>(&self, keys: &[K], val: &M) -> Result<bool, SuberError> {
        self.base.add(keys, &val.qb64b())
    }

    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<M>, SuberError> {
        let vals = self.base.get(keys)?;
        let mut out = Vec::with_capacity(vals.len());
        for val in vals {
            out.push(M::from_qb64b(&mut val.clone(), None)?);
        }
        Ok(out)
    }

    pub fn cnt<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<usize, SuberError> {
        self.base.cnt(keys)
    }

    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K], val: Option<&M>) -> Result<bool, SuberError> {
        match val {
            Some(val) => self.base.rem(keys, Some(&val.qb64b())),
            None => self.base.rem(keys, None),
        }
    }

    /// Returns (key components, primitive) items whose apparent keys
    /// start with the joined keys prefix, insertion ordered within a key
    pub fn get_item_iter<K: AsRef<[u8]>>(
        &self,
        keys: &[K],
    ) -> Result<Vec<(Vec<Vec<u8>>, M)>, SuberError> {
        let raw_items = self.base.get_item_iter(keys)?;
        let mut items = Vec::with_capacity(raw_items.len());
        for (keys, val) in raw_items {
            items.push((keys, M::from_qb64b(&mut val.clone(), None)?));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_set_suber_order() {
        let lmdber = LMDBer::builder().name("test_db").temp(true).build().unwrap();
        let suber = IoSetSuber::new(Arc::new(&lmdber), "baks.", None).unwrap();

        let keys: &[&[u8]] = &[b"pre", b"dig"];
        assert!(suber.add(keys, b"zeta").unwrap());
        assert!(suber.add(keys, b"alpha").unwrap());
        assert!(suber.add(keys, b"midway").unwrap());
        assert!(!suber.add(keys, b"alpha").unwrap());

        // insertion order, not lexicographic
        assert_eq!(
            suber.get(keys).unwrap(),
            vec![b"zeta".to_vec(), b"alpha".to_vec(), b"midway".to_vec()]
        );
        assert_eq!(suber.get_last(keys).unwrap(), Some(b"midway".to_vec()));
        assert_eq!(suber.cnt(keys).unwrap(), 3);

        assert!(suber.rem(keys, Some(b"alpha")).unwrap());
        assert_eq!(
            suber.get(keys).unwrap(),
            vec![b"zeta".to_vec(), b"midway".to_vec()]
        );
        assert!(suber.rem(keys, None).unwrap());
        assert_eq!(suber.cnt(keys).unwrap(), 0);
    }

    #[test]
    fn test_io_set_item_iter_hides_ordinal() {
        let lmdber = LMDBer::builder().name("test_db").temp(true).build().unwrap();
        let suber = IoSetSuber::new(Arc::new(&lmdber), "ssgs.", None).unwrap();

        suber.add(&["said", "p1"], b"sig0").unwrap();
        suber.add(&["said", "p1"], b"sig1").unwrap();
        suber.add(&["said", "p2"], b"sig2").unwrap();

        let items = suber.get_item_iter(&["said", ""]).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].0, vec![b"said".to_vec(), b"p1".to_vec()]);
        assert_eq!(items[0].1, b"sig0".to_vec());
        assert_eq!(items[1].1, b"sig1".to_vec());
        assert_eq!(items[2].0, vec![b"said".to_vec(), b"p2".to_vec()]);
    }
}

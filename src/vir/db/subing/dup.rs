use crate::cesr::{Matter, Parsable};
use crate::vir::db::dbing::LMDBer;
use crate::vir::db::subing::{SuberBase, SuberError};
use std::marker::PhantomData;
use std::sync::Arc;

/// DupSuber stores a duplicate set of raw values per key over a dupsort
/// sub database. Duplicates are unique (key, val) pairs retrieved in
/// lexicographic order by value, not insertion order.
pub struct DupSuber<'db> {
    pub base: SuberBase<'db>,
}

impl<'db> DupSuber<'db> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: SuberBase::new(db, subkey, sep, Some(true))?,
        })
    }

    /// Adds each val as a dup at keys. Returns true when any was added.
    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], vals: &[&[u8]]) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.put_vals(&self.base.sdb, &key, vals)?)
    }

    /// Adds val as a dup at keys. Returns false when the pair exists.
    pub fn add<K: AsRef<[u8]>>(&self, keys: &[K], val: &[u8]) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.add_val(&self.base.sdb, &key, val)?)
    }

    /// Returns all dup values at keys in lexicographic order
    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<Vec<u8>>, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.get_vals(&self.base.sdb, &key)?)
    }

    /// Returns count of dup values at keys
    pub fn cnt<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<usize, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.cnt_vals(&self.base.sdb, &key)?)
    }

    /// Deletes dup val at keys when val is Some, else all values at keys
    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K], val: Option<&[u8]>) -> Result<bool, SuberError> {
        let key = self.base.to_key(keys);
        Ok(self.base.db.del_vals(&self.base.sdb, &key, val)?)
    }
}

/// CesrDupSuber stores a duplicate set of fully qualified CESR primitives
/// per key in lexicographic order
pub struct CesrDupSuber<'db, M: Matter + Parsable> {
    pub base: DupSuber<'db>,
    _matter: PhantomData<M>,
}

impl<'db, M: Matter + Parsable> CesrDupSuber<'db, M> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: DupSuber::new(db, subkey, sep)?,
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
}

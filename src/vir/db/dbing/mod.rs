//! LMDB environment wrapper
//!
//! LMDBer owns an LMDB environment with named sub databases and exposes
//! the operation families the typed Suber views are built from: plain
//! single values, dup sorted duplicate sets, ordinal suffixed keys, and
//! insertion ordered sets over a hidden ordinal suffix.

pub mod keys;

use crate::vir::db::dbing::keys::{on_key, split_on_key, suffix, unsuffix};
use crate::vir::db::errors::DBError;
use heed::{Database, DatabaseFlags, Env, EnvOpenOptions};
use std::fs;
use std::ops::Bound;
use std::path::PathBuf;
use std::sync::Arc;

/// Database storing bytes for both keys and values
pub type BytesDatabase = Database<heed::types::Bytes, heed::types::Bytes>;

/// Builder for LMDBer instances
pub struct LMDBerBuilder {
    name: String,
    temp: bool,
    reopen: bool,
    head_dir_path: Option<PathBuf>,
}

impl Default for LMDBerBuilder {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            temp: false,
            reopen: true,
            head_dir_path: None,
        }
    }
}

impl LMDBerBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn temp(mut self, temp: bool) -> Self {
        self.temp = temp;
        self
    }

    pub fn reopen(mut self, reopen: bool) -> Self {
        self.reopen = reopen;
        self
    }

    pub fn head_dir_path(mut self, path: PathBuf) -> Self {
        self.head_dir_path = Some(path);
        self
    }

    pub fn build(self) -> Result<LMDBer, DBError> {
        let mut lmdber = LMDBer {
            name: self.name,
            temp: self.temp,
            head_dir_path: self.head_dir_path,
            path: None,
            tempdir: None,
            env: None,
            opened: false,
        };
        if self.reopen {
            lmdber.reopen()?;
        }
        Ok(lmdber)
    }
}

/// LMDBer wraps an LMDB environment holding the named sub databases of a
/// registry store
pub struct LMDBer {
    name: String,
    temp: bool,
    head_dir_path: Option<PathBuf>,
    path: Option<PathBuf>,
    tempdir: Option<tempfile::TempDir>,
    env: Option<Arc<Env>>,
    opened: bool,
}

impl LMDBer {
    /// Maximum number of named sub databases
    pub const MAX_NAMED_DBS: u32 = 96;
    /// Memory map size, 100MB
    pub const MAP_SIZE: usize = 104_857_600;
    /// Tail directory path under the head directory
    pub const TAIL_DIR_PATH: &'static str = ".vir/db";
    /// Prefix for temporary database directories
    pub const TEMP_PREFIX: &'static str = "vir_lmdb_";

    pub fn builder() -> LMDBerBuilder {
        LMDBerBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn temp(&self) -> bool {
        self.temp
    }

    pub fn opened(&self) -> bool {
        self.opened
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn env(&self) -> Option<&Arc<Env>> {
        self.env.as_ref()
    }

    /// Opens (or reopens) the LMDB environment
    pub fn reopen(&mut self) -> Result<bool, DBError> {
        if self.env.is_some() {
            self.close(false)?;
        }

        let dir_path = if self.temp {
            let tempdir = tempfile::Builder::new()
                .prefix(Self::TEMP_PREFIX)
                .tempdir()
                .map_err(|e| DBError::IoError(format!("{}", e)))?;
            let path = tempdir.path().join(&self.name);
            self.tempdir = Some(tempdir);
            path
        } else {
            let head = match &self.head_dir_path {
                Some(p) => p.clone(),
                None => dirs::home_dir()
                    .ok_or_else(|| DBError::PathError("No home directory".to_string()))?,
            };
            head.join(Self::TAIL_DIR_PATH).join(&self.name)
        };

        fs::create_dir_all(&dir_path).map_err(|e| DBError::IoError(format!("{}", e)))?;

        let mut env_builder = EnvOpenOptions::new();
        env_builder
            .map_size(Self::MAP_SIZE)
            .max_dbs(Self::MAX_NAMED_DBS);
        let env = unsafe { Arc::new(env_builder.open(&dir_path)?) };

        self.path = Some(dir_path);
        self.env = Some(env);
        self.opened = true;
        Ok(self.opened)
    }

    /// Closes the environment, clearing the directory when clear is true
    pub fn close(&mut self, clear: bool) -> Result<bool, DBError> {
        if let Some(env) = self.env.take() {
            drop(env);
        }
        self.opened = false;
        if clear {
            if let Some(path) = &self.path {
                if let Err(e) = fs::remove_dir_all(path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        return Err(DBError::IoError(format!("{}", e)));
                    }
                }
            }
        }
        self.tempdir = None;
        Ok(true)
    }

    /// Creates (opening if already present) a named sub database
    pub fn create_database(
        &self,
        name: Option<&str>,
        dupsort: Option<bool>,
    ) -> Result<BytesDatabase, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let mut txn = env.write_txn()?;
        let dupsort = dupsort.unwrap_or(false);

        let mut binding = env
            .database_options()
            .types::<heed::types::Bytes, heed::types::Bytes>();
        let options = binding.name(name.unwrap_or(""));
        if dupsort {
            options.flags(DatabaseFlags::DUP_SORT);
        }
        let db = options.create(&mut txn)?;
        txn.commit()?;
        Ok(db)
    }

    // Plain value operations

    /// Writes val at key if absent. Returns true when written, false when
    /// the key already exists.
    pub fn put_val(&self, db: &BytesDatabase, key: &[u8], val: &[u8]) -> Result<bool, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let mut wtxn = env.write_txn()?;
        if db.get(&wtxn, key)?.is_some() {
            wtxn.abort();
            return Ok(false);
        }
        db.put(&mut wtxn, key, val)?;
        wtxn.commit()?;
        Ok(true)
    }

    /// Writes val at key, overwriting any existing value
    pub fn set_val(&self, db: &BytesDatabase, key: &[u8], val: &[u8]) -> Result<bool, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let mut wtxn = env.write_txn()?;
        db.put(&mut wtxn, key, val)?;
        wtxn.commit()?;
        Ok(true)
    }

    /// Returns value at key, or None when no entry
    pub fn get_val(&self, db: &BytesDatabase, key: &[u8]) -> Result<Option<Vec<u8>>, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let rtxn = env.read_txn()?;
        Ok(db.get(&rtxn, key)?.map(|v| v.to_vec()))
    }

    /// Deletes value at key. Returns true when the key existed.
    pub fn del_val(&self, db: &BytesDatabase, key: &[u8]) -> Result<bool, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let mut wtxn = env.write_txn()?;
        let deleted = db.delete(&mut wtxn, key)?;
        wtxn.commit()?;
        Ok(deleted)
    }

    /// Returns count of all entries in db
    pub fn cnt(&self, db: &BytesDatabase) -> Result<usize, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let rtxn = env.read_txn()?;
        Ok(db.len(&rtxn)? as usize)
    }

    /// Iterates entries whose keys start with prefix, in lexicographic
    /// order, invoking cb with each (key, val). Iteration stops when cb
    /// returns false.
    pub fn get_top_items_iter<F>(
        &self,
        db: &BytesDatabase,
        prefix: &[u8],
        mut cb: F,
    ) -> Result<usize, DBError>
    where
        F: FnMut(&[u8], &[u8]) -> Result<bool, DBError>,
    {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let rtxn = env.read_txn()?;
        let range = (Bound::Included(prefix), Bound::Unbounded);
        let iter = db.range(&rtxn, &range)?;
        let mut count = 0;
        for result in iter {
            let (k, v) = result?;
            if !k.starts_with(prefix) {
                break;
            }
            count += 1;
            if !cb(k, v)? {
                break;
            }
        }
        Ok(count)
    }

    /// Deletes all entries whose keys start with prefix. Returns true
    /// when any entry was deleted.
    pub fn del_top_val(&self, db: &BytesDatabase, prefix: &[u8]) -> Result<bool, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let mut wtxn = env.write_txn()?;
        let mut keys_to_delete = Vec::new();
        {
            let range = (Bound::Included(prefix), Bound::Unbounded);
            let iter = db.range(&wtxn, &range)?;
            for result in iter {
                let (k, _) = result?;
                if !k.starts_with(prefix) {
                    break;
                }
                keys_to_delete.push(k.to_vec());
            }
        }
        let deleted = !keys_to_delete.is_empty();
        for key in keys_to_delete {
            db.delete(&mut wtxn, &key)?;
        }
        if deleted {
            wtxn.commit()?;
        } else {
            wtxn.abort();
        }
        Ok(deleted)
    }

    // Duplicate set operations for sub databases with dupsort=true.
    // Duplicates are unique (key, val) pairs kept in lexicographic order
    // by value.

    /// Adds each val as a dup at key. Returns true when any val was added.
    pub fn put_vals(&self, db: &BytesDatabase, key: &[u8], vals: &[&[u8]]) -> Result<bool, DBError> {
        let mut result = false;
        for val in vals {
            if self.add_val(db, key, val)? {
                result = true;
            }
        }
        Ok(result)
    }

    /// Adds val as a dup at key. Returns false when the (key, val) pair
    /// already exists.
    pub fn add_val(&self, db: &BytesDatabase, key: &[u8], val: &[u8]) -> Result<bool, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let mut wtxn = env.write_txn()?;
        let mut found = false;
        if let Some(iter) = db.get_duplicates(&wtxn, &key)? {
            for result in iter {
                let (_, v) = result?;
                if v == val {
                    found = true;
                    break;
                }
            }
        }
        if found {
            wtxn.abort();
            return Ok(false);
        }
        db.put(&mut wtxn, key, val)?;
        wtxn.commit()?;
        Ok(true)
    }

    /// Returns all dup values at key in lexicographic order
    pub fn get_vals(&self, db: &BytesDatabase, key: &[u8]) -> Result<Vec<Vec<u8>>, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let rtxn = env.read_txn()?;
        let mut vals = Vec::new();
        if let Some(iter) = db.get_duplicates(&rtxn, &key)? {
            for result in iter {
                let (_, v) = result?;
                vals.push(v.to_vec());
            }
        }
        Ok(vals)
    }

    /// Iterates dup values at key in lexicographic order
    pub fn get_vals_iter<F>(&self, db: &BytesDatabase, key: &[u8], mut cb: F) -> Result<(), DBError>
    where
        F: FnMut(&[u8]) -> Result<bool, DBError>,
    {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let rtxn = env.read_txn()?;
        if let Some(iter) = db.get_duplicates(&rtxn, &key)? {
            for result in iter {
                let (_, v) = result?;
                if !cb(v)? {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Returns count of dup values at key
    pub fn cnt_vals(&self, db: &BytesDatabase, key: &[u8]) -> Result<usize, DBError> {
        let mut count = 0;
        self.get_vals_iter(db, key, |_| {
            count += 1;
            Ok(true)
        })?;
        Ok(count)
    }

    /// Deletes dup val at key when val is Some, else all values at key.
    /// Returns true when anything was deleted.
    pub fn del_vals(
        &self,
        db: &BytesDatabase,
        key: &[u8],
        val: Option<&[u8]>,
    ) -> Result<bool, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let mut wtxn = env.write_txn()?;
        let deleted = match val {
            Some(val) => db.delete_one_duplicate(&mut wtxn, key, val)?,
            None => db.delete(&mut wtxn, key)?,
        };
        wtxn.commit()?;
        Ok(deleted)
    }

    // Ordinal keyed operations over keys of the form key + sep + 32 hex on

    /// Iterates (key, on, val) triples with the same key prefix and
    /// ordinal suffix >= on, in ordinal order
    pub fn get_on_item_iter<F>(
        &self,
        db: &BytesDatabase,
        key: &[u8],
        on: u64,
        mut cb: F,
    ) -> Result<(), DBError>
    where
        F: FnMut(&[u8], u64, &[u8]) -> Result<bool, DBError>,
    {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let rtxn = env.read_txn()?;
        let onkey = on_key(key, on, None);
        let range = (Bound::Included(onkey.as_slice()), Bound::Unbounded);
        let iter = db.range(&rtxn, &range)?;
        for result in iter {
            let (ckey, cval) = result?;
            let (top, cn) = match split_on_key(ckey, None) {
                Ok(split) => split,
                Err(_) => break,
            };
            if top != key {
                break;
            }
            if !cb(&top, cn, cval)? {
                break;
            }
        }
        Ok(())
    }

    /// Returns count of ordinal keyed values at key with ordinal >= on
    pub fn cnt_on_vals(&self, db: &BytesDatabase, key: &[u8], on: u64) -> Result<usize, DBError> {
        let mut count = 0;
        self.get_on_item_iter(db, key, on, |_, _, _| {
            count += 1;
            Ok(true)
        })?;
        Ok(count)
    }

    // Insertion ordered set operations over sub databases with
    // dupsort=false. Each value is stored under the apparent key plus a
    // hidden 32 hex insertion ordinal suffix, appended and stripped
    // transparently, so that iteration order equals insertion order.

    /// Adds each val not already present to the insertion ordered set at
    /// key. Returns true when any val was added.
    pub fn put_io_set_vals(
        &self,
        db: &BytesDatabase,
        key: &[u8],
        vals: &[&[u8]],
    ) -> Result<bool, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let mut wtxn = env.write_txn()?;
        let mut ion = 0u64;
        let mut existing: Vec<Vec<u8>> = Vec::new();
        {
            let start = suffix(key, 0, None);
            let range = (Bound::Included(start.as_slice()), Bound::Unbounded);
            let iter = db.range(&wtxn, &range)?;
            for entry in iter {
                let (iokey, val) = entry?;
                let (ckey, cion) = match unsuffix(iokey, None) {
                    Ok(split) => split,
                    Err(_) => break,
                };
                if ckey != key {
                    break;
                }
                existing.push(val.to_vec());
                ion = cion + 1;
            }
        }
        let mut result = false;
        for val in vals {
            if !existing.iter().any(|v| v == val) {
                let iokey = suffix(key, ion, None);
                db.put(&mut wtxn, &iokey, val)?;
                existing.push(val.to_vec());
                ion += 1;
                result = true;
            }
        }
        wtxn.commit()?;
        Ok(result)
    }

    /// Adds val idempotently to the insertion ordered set at key.
    /// Returns false when val is already in the set.
    pub fn add_io_set_val(&self, db: &BytesDatabase, key: &[u8], val: &[u8]) -> Result<bool, DBError> {
        self.put_io_set_vals(db, key, &[val])
    }

    /// Returns the insertion ordered set of values at key
    pub fn get_io_set_vals(&self, db: &BytesDatabase, key: &[u8]) -> Result<Vec<Vec<u8>>, DBError> {
        let mut vals = Vec::new();
        self.get_io_set_vals_iter(db, key, |val| {
            vals.push(val.to_vec());
            Ok(true)
        })?;
        Ok(vals)
    }

    /// Iterates the insertion ordered set of values at key
    pub fn get_io_set_vals_iter<F>(
        &self,
        db: &BytesDatabase,
        key: &[u8],
        mut cb: F,
    ) -> Result<(), DBError>
    where
        F: FnMut(&[u8]) -> Result<bool, DBError>,
    {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let rtxn = env.read_txn()?;
        let start = suffix(key, 0, None);
        let range = (Bound::Included(start.as_slice()), Bound::Unbounded);
        let iter = db.range(&rtxn, &range)?;
        for entry in iter {
            let (iokey, val) = entry?;
            let (ckey, _) = match unsuffix(iokey, None) {
                Ok(split) => split,
                Err(_) => break,
            };
            if ckey != key {
                break;
            }
            if !cb(val)? {
                break;
            }
        }
        Ok(())
    }

    /// Returns the last inserted value at key, or None when the set is
    /// empty
    pub fn get_io_set_val_last(
        &self,
        db: &BytesDatabase,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, DBError> {
        let mut last = None;
        self.get_io_set_vals_iter(db, key, |val| {
            last = Some(val.to_vec());
            Ok(true)
        })?;
        Ok(last)
    }

    /// Returns count of values in the insertion ordered set at key
    pub fn cnt_io_set_vals(&self, db: &BytesDatabase, key: &[u8]) -> Result<usize, DBError> {
        let mut count = 0;
        self.get_io_set_vals_iter(db, key, |_| {
            count += 1;
            Ok(true)
        })?;
        Ok(count)
    }

    /// Deletes all values in the insertion ordered set at key. Returns
    /// true when any value was deleted.
    pub fn del_io_set_vals(&self, db: &BytesDatabase, key: &[u8]) -> Result<bool, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let mut wtxn = env.write_txn()?;
        let mut keys_to_delete = Vec::new();
        {
            let start = suffix(key, 0, None);
            let range = (Bound::Included(start.as_slice()), Bound::Unbounded);
            let iter = db.range(&wtxn, &range)?;
            for entry in iter {
                let (iokey, _) = entry?;
                let (ckey, _) = match unsuffix(iokey, None) {
                    Ok(split) => split,
                    Err(_) => break,
                };
                if ckey != key {
                    break;
                }
                keys_to_delete.push(iokey.to_vec());
            }
        }
        let deleted = !keys_to_delete.is_empty();
        for iokey in keys_to_delete {
            db.delete(&mut wtxn, &iokey)?;
        }
        wtxn.commit()?;
        Ok(deleted)
    }

    /// Deletes val from the insertion ordered set at key if present.
    /// Linear scan since the insertion ordinal of val is unknown.
    pub fn del_io_set_val(&self, db: &BytesDatabase, key: &[u8], val: &[u8]) -> Result<bool, DBError> {
        let env = self.env.as_ref().ok_or(DBError::DbClosed)?;
        let mut wtxn = env.write_txn()?;
        let mut key_to_delete = None;
        {
            let start = suffix(key, 0, None);
            let range = (Bound::Included(start.as_slice()), Bound::Unbounded);
            let iter = db.range(&wtxn, &range)?;
            for entry in iter {
                let (iokey, cval) = entry?;
                let (ckey, _) = match unsuffix(iokey, None) {
                    Ok(split) => split,
                    Err(_) => break,
                };
                if ckey != key {
                    break;
                }
                if cval == val {
                    key_to_delete = Some(iokey.to_vec());
                    break;
                }
            }
        }
        match key_to_delete {
            Some(iokey) => {
                db.delete(&mut wtxn, &iokey)?;
                wtxn.commit()?;
                Ok(true)
            }
            None => {
                wtxn.abort();
                Ok(false)
            }
        }
    }

    /// Iterates insertion ordered set items whose apparent keys start with
    /// prefix, invoking cb with (apparent key, val). Within one apparent
    /// key the values arrive in insertion order.
    pub fn get_top_io_set_items_iter<F>(
        &self,
        db: &BytesDatabase,
        prefix: &[u8],
        mut cb: F,
    ) -> Result<(), DBError>
    where
        F: FnMut(&[u8], &[u8]) -> Result<bool, DBError>,
    {
        self.get_top_items_iter(db, prefix, |iokey, val| {
            let (key, _) = unsuffix(iokey, None)?;
            cb(&key, val)
        })
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened() -> LMDBer {
        LMDBer::builder()
            .name("test_db")
            .temp(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_plain_vals() {
        let lmdber = opened();
        assert!(lmdber.opened());
        let db = lmdber.create_database(Some("seen."), None).unwrap();

        let key = b"ABC.DEF";
        assert!(lmdber.put_val(&db, key, b"alpha").unwrap());
        assert!(!lmdber.put_val(&db, key, b"beta").unwrap());
        assert_eq!(lmdber.get_val(&db, key).unwrap(), Some(b"alpha".to_vec()));

        assert!(lmdber.set_val(&db, key, b"beta").unwrap());
        assert_eq!(lmdber.get_val(&db, key).unwrap(), Some(b"beta".to_vec()));

        assert!(lmdber.del_val(&db, key).unwrap());
        assert!(!lmdber.del_val(&db, key).unwrap());
        assert_eq!(lmdber.get_val(&db, key).unwrap(), None);
    }

    #[test]
    fn test_dup_vals_lexicographic() {
        let lmdber = opened();
        let db = lmdber.create_database(Some("sigs."), Some(true)).unwrap();
        let key = b"pre.dig";

        assert!(lmdber.add_val(&db, key, b"z").unwrap());
        assert!(lmdber.add_val(&db, key, b"m").unwrap());
        assert!(lmdber.add_val(&db, key, b"a").unwrap());
        assert!(!lmdber.add_val(&db, key, b"m").unwrap());

        let vals = lmdber.get_vals(&db, key).unwrap();
        assert_eq!(vals, vec![b"a".to_vec(), b"m".to_vec(), b"z".to_vec()]);
        assert_eq!(lmdber.cnt_vals(&db, key).unwrap(), 3);

        assert!(lmdber.del_vals(&db, key, Some(b"m")).unwrap());
        assert_eq!(lmdber.cnt_vals(&db, key).unwrap(), 2);
        assert!(lmdber.del_vals(&db, key, None).unwrap());
        assert_eq!(lmdber.cnt_vals(&db, key).unwrap(), 0);
    }

    #[test]
    fn test_on_item_iter() {
        let lmdber = opened();
        let db = lmdber.create_database(Some("tels."), None).unwrap();
        let pre = b"EpreA";

        for sn in 0u64..4 {
            let key = on_key(pre, sn, None);
            lmdber
                .put_val(&db, &key, format!("dig{}", sn).as_bytes())
                .unwrap();
        }
        // another prefix must not leak into the scan
        lmdber
            .put_val(&db, &on_key(b"EpreB", 0, None), b"other")
            .unwrap();

        let mut seen = Vec::new();
        lmdber
            .get_on_item_iter(&db, pre, 1, |_, on, val| {
                seen.push((on, val.to_vec()));
                Ok(true)
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                (1, b"dig1".to_vec()),
                (2, b"dig2".to_vec()),
                (3, b"dig3".to_vec())
            ]
        );
        assert_eq!(lmdber.cnt_on_vals(&db, pre, 0).unwrap(), 4);
        assert_eq!(lmdber.cnt_on_vals(&db, pre, 2).unwrap(), 2);
    }

    #[test]
    fn test_io_set_insertion_order() {
        let lmdber = opened();
        let db = lmdber.create_database(Some("baks."), None).unwrap();
        let key = b"pre.dig";

        assert!(lmdber.add_io_set_val(&db, key, b"zeta").unwrap());
        assert!(lmdber.add_io_set_val(&db, key, b"alpha").unwrap());
        assert!(!lmdber.add_io_set_val(&db, key, b"zeta").unwrap());

        let vals = lmdber.get_io_set_vals(&db, key).unwrap();
        assert_eq!(vals, vec![b"zeta".to_vec(), b"alpha".to_vec()]);
        assert_eq!(
            lmdber.get_io_set_val_last(&db, key).unwrap(),
            Some(b"alpha".to_vec())
        );
        assert_eq!(lmdber.cnt_io_set_vals(&db, key).unwrap(), 2);

        assert!(lmdber.del_io_set_val(&db, key, b"zeta").unwrap());
        assert!(!lmdber.del_io_set_val(&db, key, b"zeta").unwrap());
        assert_eq!(
            lmdber.get_io_set_vals(&db, key).unwrap(),
            vec![b"alpha".to_vec()]
        );
        assert!(lmdber.del_io_set_vals(&db, key).unwrap());
        assert!(lmdber.get_io_set_vals(&db, key).unwrap().is_empty());
    }

    #[test]
    fn test_top_io_set_items() {
        let lmdber = opened();
        let db = lmdber.create_database(Some("ssgs."), None).unwrap();

        lmdber.add_io_set_val(&db, b"said.p1", b"s1").unwrap();
        lmdber.add_io_set_val(&db, b"said.p1", b"s2").unwrap();
        lmdber.add_io_set_val(&db, b"said.p2", b"s3").unwrap();
        lmdber.add_io_set_val(&db, b"other.p1", b"s4").unwrap();

        let mut items = Vec::new();
        lmdber
            .get_top_io_set_items_iter(&db, b"said.", |key, val| {
                items.push((key.to_vec(), val.to_vec()));
                Ok(true)
            })
            .unwrap();
        assert_eq!(
            items,
            vec![
                (b"said.p1".to_vec(), b"s1".to_vec()),
                (b"said.p1".to_vec(), b"s2".to_vec()),
                (b"said.p2".to_vec(), b"s3".to_vec()),
            ]
        );
    }
}

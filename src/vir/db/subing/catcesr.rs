use crate::cesr::cigar::Cigar;
use crate::cesr::prefixer::Prefixer;
use crate::cesr::saider::Saider;
use crate::cesr::seqner::Seqner;
use crate::cesr::verfer::Verfer;
use crate::cesr::{Matter, Parsable};
use crate::errors::MatterError;
use crate::vir::db::dbing::LMDBer;
use crate::vir::db::subing::ioset::IoSetSuber;
use crate::vir::db::subing::SuberError;
use std::marker::PhantomData;
use std::sync::Arc;

/// A fixed group of fully qualified primitives stored as the
/// concatenation of their qb64 serializations
pub trait CesrGroup: Sized {
    /// Concatenated qb64b of all group members
    fn to_cat(&self) -> Vec<u8>;

    /// Parses the group by extracting each member from the front of the
    /// concatenation in order
    fn from_cat(data: &mut Vec<u8>) -> Result<Self, MatterError>;
}

impl CesrGroup for (Verfer, Cigar) {
    fn to_cat(&self) -> Vec<u8> {
        let mut buf = self.0.qb64b();
        buf.extend(self.1.qb64b());
        buf
    }

    fn from_cat(data: &mut Vec<u8>) -> Result<Self, MatterError> {
        let verfer = Verfer::from_qb64b(data, Some(true))?;
        let cigar = Cigar::from_qb64b(data, Some(true))?;
        Ok((verfer, cigar))
    }
}

impl CesrGroup for (Prefixer, Seqner, Saider) {
    fn to_cat(&self) -> Vec<u8> {
        let mut buf = self.0.qb64b();
        buf.extend(self.1.qb64b());
        buf.extend(self.2.qb64b());
        buf
    }

    fn from_cat(data: &mut Vec<u8>) -> Result<Self, MatterError> {
        let prefixer = Prefixer::from_qb64b(data, Some(true))?;
        let seqner = Seqner::from_qb64b(data, Some(true))?;
        let saider = Saider::from_qb64b(data, Some(true))?;
        Ok((prefixer, seqner, saider))
    }
}

/// CatCesrIoSetSuber stores an insertion ordered set whose values are
/// concatenations of several fully qualified primitives, e.g. the
/// (verfer, cigar) couples of nontransferable signers or the
/// (prefixer, seqner, saider) triples of escrow records
pub struct CatCesrIoSetSuber<'db, G: CesrGroup> {
    pub base: IoSetSuber<'db>,
    _group: PhantomData<G>,
}

impl<'db, G: CesrGroup> CatCesrIoSetSuber<'db, G> {
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str, sep: Option<u8>) -> Result<Self, SuberError> {
        Ok(Self {
            base: IoSetSuber::new(db, subkey, sep)?,
            _group: PhantomData,
        })
    }

    pub fn put<K: AsRef<[u8]>>(&self, keys: &[K], vals: &[&G]) -> Result<bool, SuberError> {
        let cats: Vec<Vec<u8>> = vals.iter().map(|g| g.to_cat()).collect();
        let refs: Vec<&[u8]> = cats.iter().map(Vec::as_slice).collect();
        self.base.put(keys, &refs)
    }

    pub fn add<K: AsRef<[u8]>>(&self, keys: &[K], val: &G) -> Result<bool, SuberError> {
        self.base.add(keys, &val.to_cat())
    }

    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<G>, SuberError> {
        let vals = self.base.get(keys)?;
        let mut out = Vec::with_capacity(vals.len());
        for val in vals {
            out.push(G::from_cat(&mut val.clone())?);
        }
        Ok(out)
    }

    pub fn get_last<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Option<G>, SuberError> {
        match self.base.get_last(keys)? {
            Some(val) => Ok(Some(G::from_cat(&mut val.clone())?)),
            None => Ok(None),
        }
    }

    pub fn cnt<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<usize, SuberError> {
        self.base.cnt(keys)
    }

    pub fn rem<K: AsRef<[u8]>>(&self, keys: &[K], val: Option<&G>) -> Result<bool, SuberError> {
        match val {
            Some(val) => self.base.rem(keys, Some(&val.to_cat())),
            None => self.base.rem(keys, None),
        }
    }

    /// Returns (key components, group) items whose apparent keys start
    /// with the joined keys prefix, insertion ordered within a key
    pub fn get_item_iter<K: AsRef<[u8]>>(
        &self,
        keys: &[K],
    ) -> Result<Vec<(Vec<Vec<u8>>, G)>, SuberError> {
        let raw_items = self.base.get_item_iter(keys)?;
        let mut items = Vec::with_capacity(raw_items.len());
        for (keys, val) in raw_items {
            items.push((keys, G::from_cat(&mut val.clone())?));
        }
        Ok(items)
    }
}

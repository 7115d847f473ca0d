//! VIR - Verifiable Issuance(Revocation) Registry store
//!
//! Reger sets up the named sub databases for the registry: the canonical
//! transaction event logs with their bodies, backer signatures, backer
//! lists, and anchors; the escrow tables for out of order, partially
//! witnessed, and anchorless events; and the credential store with its
//! sad pathed signature sets.

use crate::cesr::cigar::Cigar;
use crate::cesr::counting::{ctr_dex_1_0, BaseCounter, Counter};
use crate::cesr::dater::Dater;
use crate::cesr::indexing::siger::Siger;
use crate::cesr::pather::Pather;
use crate::cesr::prefixer::Prefixer;
use crate::cesr::saider::Saider;
use crate::cesr::seqner::Seqner;
use crate::cesr::verfer::Verfer;
use crate::cesr::Matter;
use crate::vir::db::dbing::keys::dg_key;
use crate::vir::db::dbing::LMDBer;
use crate::vir::db::errors::DBError;
use crate::vir::db::escrowing::Broker;
use crate::vir::db::koming::Komer;
use crate::vir::db::subing::catcesr::CatCesrIoSetSuber;
use crate::vir::db::subing::cesr::CesrSuber;
use crate::vir::db::subing::dup::{CesrDupSuber, DupSuber};
use crate::vir::db::subing::ioset::{CesrIoSetSuber, IoSetSuber};
use crate::vir::db::subing::Suber;
use crate::vir::vc::proving::{Creder, CrederSuber};
use crate::vir::vdr::eventing::{RegStateRecord, Tever};
use crate::vir::VIRError;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::sync::Arc;

/// Transferable sad path signature group: (pather, prefixer, seqner,
/// saider, sigers) where the middle triple names the signer's key state
/// establishment event
pub type Tsg = (Pather, Prefixer, Seqner, Saider, Vec<Siger>);

/// Registry record keyed by registry name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub registry_key: String,
    pub prefix: String,
}

/// Returns an opened LMDBer suitable for backing a Reger
pub fn open_reger(name: &str, temp: bool) -> Result<LMDBer, DBError> {
    LMDBer::builder().name(name).temp(temp).build()
}

/// Reger sets up the named sub databases for the VIR
pub struct Reger<'db> {
    lmdber: Arc<&'db LMDBer>,

    /// registry prefixes opened this process, insertion ordered
    pub registries: RefCell<IndexSet<String>>,

    // read through cache of registry state objects
    tevers: RefCell<IndexMap<String, Tever>>,

    /// serialized TEL event bodies keyed by dgKey, one value per key
    pub tvts: Suber<'db>,
    /// canonical log mapping snKey to event digest, one value per key
    pub tels: Suber<'db>,
    /// anchor seal source couples keyed by dgKey, one value per key
    pub ancs: Suber<'db>,
    /// indexed backer signatures keyed by dgKey, lexicographic dups
    pub tibs: DupSuber<'db>,
    /// ordered backer list keyed by dgKey, insertion ordered dups
    pub baks: IoSetSuber<'db>,
    /// out of order escrow mapping snKey to digest
    pub oots: Suber<'db>,
    /// partially witnessed escrow mapping snKey to digest
    pub twes: Suber<'db>,
    /// anchorless escrow mapping snKey to digest
    pub taes: Suber<'db>,
    /// first seen datetime of each event keyed by dgKey
    pub tets: CesrSuber<'db, Dater>,
    /// registry state snapshots keyed by registry prefix
    pub stts: Komer<'db, RegStateRecord>,

    /// credential bodies keyed by said
    pub creds: CrederSuber<'db>,
    /// sad pathed transferable signatures keyed by the quin key
    /// (said, pather, prefixer, 32 hex sn, saider), insertion ordered
    pub spsgs: CesrIoSetSuber<'db, Siger>,
    /// sad pathed nontransferable (verfer, cigar) couples keyed by
    /// (said, pather), insertion ordered
    pub spcgs: CatCesrIoSetSuber<'db, (Verfer, Cigar)>,

    /// fully verified credential marker keyed by said
    pub saved: CesrSuber<'db, Saider>,
    /// credential saids by issuer prefix
    pub issus: CesrDupSuber<'db, Saider>,
    /// credential saids by subject prefix
    pub subjs: CesrDupSuber<'db, Saider>,
    /// credential saids by schema said
    pub schms: CesrDupSuber<'db, Saider>,

    /// partially signed credential escrow stamps
    pub pse: CesrSuber<'db, Dater>,
    /// missing registry escrow stamps
    pub mre: CesrSuber<'db, Dater>,
    /// missing issuer escrow stamps
    pub mie: CesrSuber<'db, Dater>,
    /// broken chain escrow stamps
    pub mce: CesrSuber<'db, Dater>,
    /// missing schema escrow stamps
    pub mse: CesrSuber<'db, Dater>,

    /// registry transaction state notice escrows
    pub txnsb: Broker<'db>,
    /// registry records keyed by registry name
    pub regs: Komer<'db, RegistryRecord>,

    /// TEL partial witness escrow of (prefixer, seqner, saider) triples
    pub tpwe: CatCesrIoSetSuber<'db, (Prefixer, Seqner, Saider)>,
    /// TEL multisig anchor escrow of (prefixer, seqner, saider) triples
    pub tmse: CatCesrIoSetSuber<'db, (Prefixer, Seqner, Saider)>,
    /// TEL event dissemination escrow of (prefixer, seqner, saider) triples
    pub tede: CatCesrIoSetSuber<'db, (Prefixer, Seqner, Saider)>,

    /// completed TEL event saids keyed by snKey
    pub ctel: CesrSuber<'db, Saider>,
    /// credential issuance escrow
    pub crie: CrederSuber<'db>,
    /// credential missing signature escrow
    pub cmse: CrederSuber<'db>,
    /// completed credentials
    pub ccrd: CrederSuber<'db>,
}

impl<'db> Reger<'db> {
    /// Opens all named sub databases within the main DB environment.
    /// Names end with "." so sub DB names avoid namespace collisions
    /// with Base64 identifier prefixes.
    pub fn new(lmdber: Arc<&'db LMDBer>) -> Result<Self, VIRError> {
        Ok(Reger {
            registries: RefCell::new(IndexSet::new()),
            tevers: RefCell::new(IndexMap::new()),

            tvts: Suber::new(lmdber.clone(), "tvts.", None)?,
            tels: Suber::new(lmdber.clone(), "tels.", None)?,
            ancs: Suber::new(lmdber.clone(), "ancs.", None)?,
            tibs: DupSuber::new(lmdber.clone(), "tibs.", None)?,
            baks: IoSetSuber::new(lmdber.clone(), "baks.", None)?,
            oots: Suber::new(lmdber.clone(), "oots.", None)?,
            twes: Suber::new(lmdber.clone(), "twes.", None)?,
            taes: Suber::new(lmdber.clone(), "taes.", None)?,
            tets: CesrSuber::new(lmdber.clone(), "tets.", None)?,
            stts: Komer::new(lmdber.clone(), "stts.", None)?,

            creds: CrederSuber::new(lmdber.clone(), "creds.", None)?,
            spsgs: CesrIoSetSuber::new(lmdber.clone(), "ssgs.", None)?,
            spcgs: CatCesrIoSetSuber::new(lmdber.clone(), "scgs.", None)?,

            saved: CesrSuber::new(lmdber.clone(), "saved.", None)?,
            issus: CesrDupSuber::new(lmdber.clone(), "issus.", None)?,
            subjs: CesrDupSuber::new(lmdber.clone(), "subjs.", None)?,
            schms: CesrDupSuber::new(lmdber.clone(), "schms.", None)?,

            pse: CesrSuber::new(lmdber.clone(), "pse.", None)?,
            mre: CesrSuber::new(lmdber.clone(), "mre.", None)?,
            mie: CesrSuber::new(lmdber.clone(), "mie.", None)?,
            mce: CesrSuber::new(lmdber.clone(), "mce.", None)?,
            mse: CesrSuber::new(lmdber.clone(), "mse.", None)?,

            txnsb: Broker::new(lmdber.clone(), "txn.")?,
            regs: Komer::new(lmdber.clone(), "regs.", None)?,

            tpwe: CatCesrIoSetSuber::new(lmdber.clone(), "tpwe.", None)?,
            tmse: CatCesrIoSetSuber::new(lmdber.clone(), "tmse.", None)?,
            tede: CatCesrIoSetSuber::new(lmdber.clone(), "tede.", None)?,

            ctel: CesrSuber::new(lmdber.clone(), "ctel.", None)?,
            crie: CrederSuber::new(lmdber.clone(), "drie.", None)?,
            cmse: CrederSuber::new(lmdber.clone(), "cmse.", None)?,
            ccrd: CrederSuber::new(lmdber.clone(), "ccrd.", None)?,

            lmdber,
        })
    }

    // Event body operations, dgKey

    /// Writes serialized TEL event bytes val to key if absent
    pub fn put_tvt(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.tvts.put(&[key], val)?)
    }

    /// Writes serialized TEL event bytes val to key, overwriting
    pub fn set_tvt(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.tvts.pin(&[key], val)?)
    }

    /// Returns event bytes at key, None if no entry
    pub fn get_tvt(&self, key: &[u8]) -> Result<Option<Vec<u8>>, VIRError> {
        Ok(self.tvts.get(&[key])?)
    }

    /// Deletes event bytes at key, true if key existed
    pub fn del_tvt(&self, key: &[u8]) -> Result<bool, VIRError> {
        Ok(self.tvts.rem(&[key])?)
    }

    // Canonical log operations, snKey

    /// Writes event digest val to key if absent
    pub fn put_tel(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.tels.put(&[key], val)?)
    }

    /// Writes event digest val to key, overwriting
    pub fn set_tel(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.tels.pin(&[key], val)?)
    }

    /// Returns digest at key, None if no entry
    pub fn get_tel(&self, key: &[u8]) -> Result<Option<Vec<u8>>, VIRError> {
        Ok(self.tels.get(&[key])?)
    }

    /// Deletes digest at key, true if key existed
    pub fn del_tel(&self, key: &[u8]) -> Result<bool, VIRError> {
        Ok(self.tels.rem(&[key])?)
    }

    /// Iterates (sn, dig) duples for all events with prefix pre starting
    /// at ordinal fn, in first seen order
    pub fn get_tel_item_pre_iter<F>(&self, pre: &[u8], fn_ord: u64, cb: F) -> Result<(), VIRError>
    where
        F: FnMut(u64, &[u8]) -> Result<bool, DBError>,
    {
        let mut cb = cb;
        self.lmdber
            .get_on_item_iter(&self.tels.base.sdb, pre, fn_ord, |_, on, val| cb(on, val))?;
        Ok(())
    }

    /// Returns count of log entries for pre with ordinal >= fn
    pub fn cnt_tels(&self, pre: &[u8], fn_ord: u64) -> Result<usize, VIRError> {
        Ok(self.lmdber.cnt_on_vals(&self.tels.base.sdb, pre, fn_ord)?)
    }

    // Backer signature operations, dgKey, lexicographic dups

    /// Adds each indexed backer signature as a dup at key
    pub fn put_tibs(&self, key: &[u8], vals: &[&[u8]]) -> Result<bool, VIRError> {
        Ok(self.tibs.put(&[key], vals)?)
    }

    /// Adds indexed backer signature val as a dup at key
    pub fn add_tib(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.tibs.add(&[key], val)?)
    }

    /// Returns indexed backer signatures at key in lexicographic order
    pub fn get_tibs(&self, key: &[u8]) -> Result<Vec<Vec<u8>>, VIRError> {
        Ok(self.tibs.get(&[key])?)
    }

    /// Returns count of indexed backer signatures at key
    pub fn cnt_tibs(&self, key: &[u8]) -> Result<usize, VIRError> {
        Ok(self.tibs.cnt(&[key])?)
    }

    /// Deletes dup val at key, or all values when val is None
    pub fn del_tibs(&self, key: &[u8], val: Option<&[u8]>) -> Result<bool, VIRError> {
        Ok(self.tibs.rem(&[key], val)?)
    }

    // Anchor operations, dgKey

    /// Writes anchor seal source couple val to key if absent
    pub fn put_anc(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.ancs.put(&[key], val)?)
    }

    /// Writes anchor seal source couple val to key, overwriting
    pub fn set_anc(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.ancs.pin(&[key], val)?)
    }

    /// Returns anchor couple at key, None if no entry
    pub fn get_anc(&self, key: &[u8]) -> Result<Option<Vec<u8>>, VIRError> {
        Ok(self.ancs.get(&[key])?)
    }

    /// Deletes anchor couple at key, true if key existed
    pub fn del_anc(&self, key: &[u8]) -> Result<bool, VIRError> {
        Ok(self.ancs.rem(&[key])?)
    }

    // Backer list operations, dgKey, insertion ordered dups

    /// Adds each backer prefix to the ordered list at key
    pub fn put_baks(&self, key: &[u8], vals: &[&[u8]]) -> Result<bool, VIRError> {
        Ok(self.baks.put(&[key], vals)?)
    }

    /// Adds backer prefix val to the ordered list at key
    pub fn add_bak(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.baks.add(&[key], val)?)
    }

    /// Returns backer prefixes at key in insertion order
    pub fn get_baks(&self, key: &[u8]) -> Result<Vec<Vec<u8>>, VIRError> {
        Ok(self.baks.get(&[key])?)
    }

    /// Returns count of backer prefixes at key
    pub fn cnt_baks(&self, key: &[u8]) -> Result<usize, VIRError> {
        Ok(self.baks.cnt(&[key])?)
    }

    /// Deletes all backer prefixes at key
    pub fn del_baks(&self, key: &[u8]) -> Result<bool, VIRError> {
        Ok(self.baks.rem(&[key], None)?)
    }

    /// Deletes backer prefix val at key
    pub fn del_bak(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.baks.rem(&[key], Some(val))?)
    }

    // Escrow table operations, snKey

    /// Writes out of order escrow digest val to key if absent
    pub fn put_oot(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.oots.put(&[key], val)?)
    }

    /// Writes out of order escrow digest val to key, overwriting
    pub fn set_oot(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.oots.pin(&[key], val)?)
    }

    /// Returns out of order escrow digest at key
    pub fn get_oot(&self, key: &[u8]) -> Result<Option<Vec<u8>>, VIRError> {
        Ok(self.oots.get(&[key])?)
    }

    /// Deletes out of order escrow digest at key
    pub fn del_oot(&self, key: &[u8]) -> Result<bool, VIRError> {
        Ok(self.oots.rem(&[key])?)
    }

    /// Returns all out of order escrow items as (key components, digest)
    pub fn get_oot_item_iter(&self) -> Result<Vec<(Vec<Vec<u8>>, Vec<u8>)>, VIRError> {
        Ok(self.oots.get_item_iter(&[&b""[..]])?)
    }

    /// Writes partially witnessed escrow digest val to key if absent
    pub fn put_twe(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.twes.put(&[key], val)?)
    }

    /// Writes partially witnessed escrow digest val to key, overwriting
    pub fn set_twe(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.twes.pin(&[key], val)?)
    }

    /// Returns partially witnessed escrow digest at key
    pub fn get_twe(&self, key: &[u8]) -> Result<Option<Vec<u8>>, VIRError> {
        Ok(self.twes.get(&[key])?)
    }

    /// Deletes partially witnessed escrow digest at key
    pub fn del_twe(&self, key: &[u8]) -> Result<bool, VIRError> {
        Ok(self.twes.rem(&[key])?)
    }

    /// Writes anchorless escrow digest val to key if absent
    pub fn put_tae(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.taes.put(&[key], val)?)
    }

    /// Writes anchorless escrow digest val to key, overwriting
    pub fn set_tae(&self, key: &[u8], val: &[u8]) -> Result<bool, VIRError> {
        Ok(self.taes.pin(&[key], val)?)
    }

    /// Returns anchorless escrow digest at key
    pub fn get_tae(&self, key: &[u8]) -> Result<Option<Vec<u8>>, VIRError> {
        Ok(self.taes.get(&[key])?)
    }

    /// Deletes anchorless escrow digest at key
    pub fn del_tae(&self, key: &[u8]) -> Result<bool, VIRError> {
        Ok(self.taes.rem(&[key])?)
    }

    /// Returns all anchorless escrow items as (key components, digest)
    pub fn get_tae_item_iter(&self) -> Result<Vec<(Vec<Vec<u8>>, Vec<u8>)>, VIRError> {
        Ok(self.taes.get_item_iter(&[&b""[..]])?)
    }

    // First seen datetime operations, dgKey

    /// Writes first seen datetime for the event at key
    pub fn put_tet(&self, key: &[u8], val: &Dater) -> Result<bool, VIRError> {
        Ok(self.tets.put(&[key], val)?)
    }

    /// Returns first seen datetime for the event at key
    pub fn get_tet(&self, key: &[u8]) -> Result<Option<Dater>, VIRError> {
        Ok(self.tets.get(&[key])?)
    }

    // Replay

    /// Returns first seen event messages with attachments for the TEL
    /// prefix pre starting at first seen ordinal fn. Essentially a replay
    /// in first seen order with attachments.
    pub fn clone_pre_iter(&self, pre: &[u8], fn_ord: u64) -> Result<Vec<Vec<u8>>, VIRError> {
        let mut duples = Vec::new();
        self.get_tel_item_pre_iter(pre, fn_ord, |on, dig| {
            duples.push((on, dig.to_vec()));
            Ok(true)
        })?;

        let mut msgs = Vec::with_capacity(duples.len());
        for (_, dig) in duples {
            let dgkey = dg_key(pre, &dig);
            let raw = self.get_tvt(&dgkey)?.ok_or_else(|| {
                VIRError::MissingEntryError(format!(
                    "Missing event for dig={}",
                    String::from_utf8_lossy(&dig)
                ))
            })?;
            let mut msg = raw;
            let mut atc = Vec::new();

            // indexed backer signatures
            let tibs = self.get_tibs(&dgkey)?;
            if !tibs.is_empty() {
                atc.extend(
                    BaseCounter::new(ctr_dex_1_0::WITNESS_IDX_SIGS, tibs.len() as u64)?.qb64b(),
                );
                for tib in &tibs {
                    atc.extend_from_slice(tib);
                }
            }

            // authorizer (delegator/issuer) seal source couple
            if let Some(couple) = self.get_anc(&dgkey)? {
                atc.extend(BaseCounter::new(ctr_dex_1_0::SEAL_SOURCE_COUPLES, 1)?.qb64b());
                atc.extend_from_slice(&couple);
            }

            // prepend pipelining counter to attachments
            if atc.len() % 4 != 0 {
                return Err(VIRError::FramingError(format!(
                    "Invalid attachments size={}, nonintegral quadlets",
                    atc.len()
                )));
            }
            msg.extend(
                BaseCounter::new(ctr_dex_1_0::ATTACHMENT_GROUP, (atc.len() / 4) as u64)?.qb64b(),
            );
            msg.extend(atc);
            msgs.push(msg);
        }
        Ok(msgs)
    }

    // Credential store

    /// Saves the base credential and its sad pathed signature sets
    pub fn log_cred(
        &self,
        creder: &Creder,
        sadsigers: &[Tsg],
        sadcigars: &[(Pather, Cigar)],
    ) -> Result<(), VIRError> {
        let said = creder
            .said()
            .ok_or_else(|| VIRError::ValueError("Credential without said".to_string()))?
            .to_string();
        self.creds.put(&[said.as_bytes()], creder)?;

        for (pather, cigar) in sadcigars {
            let verfer = cigar.verfer().cloned().ok_or_else(|| {
                VIRError::ValueError("Nontransferable signature without verfer".to_string())
            })?;
            let keys = [said.clone(), pather.qb64()];
            self.spcgs.add(&keys, &(verfer, cigar.clone()))?;
        }

        // want sn in numerical order so use padded hex
        for (pather, prefixer, seqner, saider, sigers) in sadsigers {
            let quinkeys = [
                said.clone(),
                pather.qb64(),
                prefixer.qb64(),
                format!("{:032x}", seqner.sn()),
                saider.qb64(),
            ];
            for siger in sigers {
                self.spsgs.add(&quinkeys, siger)?;
            }
        }
        Ok(())
    }

    /// Loads the base credential and its CESR proof signatures. When root
    /// is supplied all signature paths are transposed to that root, for
    /// embedding the credential as a sub document of another SAD.
    pub fn clone_cred(
        &self,
        said: &str,
        root: Option<&Pather>,
    ) -> Result<(Creder, Vec<Tsg>, Vec<(Pather, Cigar)>), VIRError> {
        let creder = self
            .creds
            .get(&[said.as_bytes()])?
            .ok_or_else(|| VIRError::MissingEntryError(format!("Missing credential said={}", said)))?;

        let mut sadcigars = Vec::new();
        for (keys, (verfer, mut cigar)) in self.spcgs.get_item_iter(&[said, ""])? {
            if keys.len() < 2 {
                continue;
            }
            let mut pather = Pather::from_qb64(&String::from_utf8_lossy(&keys[1]))?;
            if let Some(root) = root {
                pather = pather.root(root)?;
            }
            cigar.set_verfer(verfer);
            sadcigars.push((pather, cigar));
        }

        let mut sadsigers: Vec<Tsg> = Vec::new();
        let mut sigers: Vec<Siger> = Vec::new();
        let mut old: Option<Vec<Vec<u8>>> = None;
        for (keys, siger) in self.spsgs.get_item_iter(&[said, ""])? {
            if keys.len() < 5 {
                continue;
            }
            let quad = keys[1..].to_vec();
            if old.as_ref() != Some(&quad) {
                if let Some(prior) = old.take() {
                    if !sigers.is_empty() {
                        sadsigers.push(self.to_tsg(&prior, std::mem::take(&mut sigers), root)?);
                    }
                }
                old = Some(quad);
            }
            sigers.push(siger);
        }
        if let Some(prior) = old {
            if !sigers.is_empty() {
                sadsigers.push(self.to_tsg(&prior, sigers, root)?);
            }
        }

        Ok((creder, sadsigers, sadcigars))
    }

    // Reassembles one transferable signature group from its quad key
    fn to_tsg(
        &self,
        quad: &[Vec<u8>],
        sigers: Vec<Siger>,
        root: Option<&Pather>,
    ) -> Result<Tsg, VIRError> {
        let mut pather = Pather::from_qb64(&String::from_utf8_lossy(&quad[0]))?;
        if let Some(root) = root {
            pather = pather.root(root)?;
        }
        let prefixer = Prefixer::from_qb64(&String::from_utf8_lossy(&quad[1]))?;
        let snh = String::from_utf8_lossy(&quad[2]).to_string();
        let sn = u64::from_str_radix(&snh, 16)
            .map_err(|e| VIRError::ValueError(format!("Invalid hex sn {}: {}", snh, e)))?;
        let seqner = Seqner::new(sn)?;
        let saider = Saider::from_qb64(&String::from_utf8_lossy(&quad[3]))?;
        Ok((pather, prefixer, seqner, saider, sigers))
    }

    /// Returns fully expanded credentials with chained credentials
    /// attached, one keyed dict per said
    pub fn clone_creds(&self, saids: &[Saider]) -> Result<Vec<Value>, VIRError> {
        let mut visited = IndexSet::new();
        self.clone_creds_inner(saids, &mut visited)
    }

    fn clone_creds_inner(
        &self,
        saids: &[Saider],
        visited: &mut IndexSet<String>,
    ) -> Result<Vec<Value>, VIRError> {
        let mut creds = Vec::new();
        for saider in saids {
            let key = saider.qb64();
            // chained credentials may cycle, visit each said once
            if !visited.insert(key.clone()) {
                continue;
            }
            let (creder, sadsigers, sadcigars) = self.clone_cred(&key, None)?;

            let chain_saids: Vec<Saider> = creder
                .edges()
                .iter()
                .map(|said| Saider::from_qb64(said))
                .collect::<Result<_, _>>()?;
            let chains = self.clone_creds_inner(&chain_saids, visited)?;

            let regk = creder.status().ok_or_else(|| {
                VIRError::ValueError(format!("Credential {} without registry", key))
            })?;
            let status = self.tever(regk)?.vc_state(self, &key)?;

            let cred = json!({
                "sad": creder.crd(),
                "pre": creder.issuer(),
                "sadsigers": sadsigers
                    .iter()
                    .map(|(pather, prefixer, seqner, saider, _)| {
                        json!({
                            "path": pather.text(),
                            "pre": prefixer.qb64(),
                            "sn": seqner.sn(),
                            "d": saider.qb64(),
                        })
                    })
                    .collect::<Vec<_>>(),
                "sadcigars": sadcigars
                    .iter()
                    .map(|(pather, cigar)| {
                        json!({"path": pather.text(), "cigar": cigar.qb64()})
                    })
                    .collect::<Vec<_>>(),
                "chains": chains,
                "status": status,
            });
            creds.push(cred);
        }
        Ok(creds)
    }

    /// Returns (creder, raw) pairs for every source credential chained
    /// from creder's e edges that is present in the store, depth first.
    /// The walker keeps a visited set of saids so chains with cycles
    /// terminate.
    pub fn sources(&self, creder: &Creder) -> Result<Vec<(Creder, Vec<u8>)>, VIRError> {
        let mut visited = IndexSet::new();
        if let Some(said) = creder.said() {
            visited.insert(said.to_string());
        }
        self.sources_inner(creder, &mut visited)
    }

    fn sources_inner(
        &self,
        creder: &Creder,
        visited: &mut IndexSet<String>,
    ) -> Result<Vec<(Creder, Vec<u8>)>, VIRError> {
        let mut sources = Vec::new();
        for said in creder.edges() {
            if !visited.insert(said.clone()) {
                continue;
            }
            let (screder, _, _) = self.clone_cred(&said, None)?;
            let craw = screder.raw().to_vec();
            sources.push((screder.clone(), craw));
            let mut chained = self.sources_inner(&screder, visited)?;
            sources.append(&mut chained);
        }
        Ok(sources)
    }

    // Tever cache: read through rehydration of registry state objects

    /// Returns the registry state object for pre. On a cache miss the
    /// persisted state is consulted; a missing state or a state whose
    /// referenced events are not locally present raises NotFoundError.
    pub fn tever(&self, pre: &str) -> Result<Tever, VIRError> {
        if let Some(tever) = self.tevers.borrow().get(pre) {
            return Ok(tever.clone());
        }
        let state = self
            .stts
            .get(&[pre.as_bytes()])?
            .ok_or_else(|| VIRError::NotFoundError(format!("Unknown registry={}", pre)))?;
        let tever = Tever::from_state(state, self)
            .map_err(|_| VIRError::NotFoundError(format!("Unknown registry={}", pre)))?;
        self.tevers
            .borrow_mut()
            .insert(pre.to_string(), tever.clone());
        Ok(tever)
    }

    /// Inserts the registry state object for pre, writing through to the
    /// persisted state
    pub fn set_tever(&self, tever: Tever) -> Result<(), VIRError> {
        let pre = tever.pre().to_string();
        self.stts.pin(&[pre.as_bytes()], tever.state())?;
        self.tevers.borrow_mut().insert(pre, tever);
        Ok(())
    }

    /// Removes both the cache entry and the persisted state for pre
    pub fn del_tever(&self, pre: &str) -> Result<bool, VIRError> {
        self.tevers.borrow_mut().shift_remove(pre);
        Ok(self.stts.rem(&[pre.as_bytes()])?)
    }

    /// Membership check that triggers read through
    pub fn has_tever(&self, pre: &str) -> bool {
        self.tever(pre).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cesr::indexing::Indexer;
    use crate::cesr::mtr_dex;
    use crate::vir::db::dbing::keys::sn_key;
    use crate::vir::core::serdering::Serder;
    use crate::vir::vdr::eventing::RegStateRecord;

    fn opened() -> LMDBer {
        open_reger("test_reg", true).unwrap()
    }

    fn iss_serder(vcpre: &str, regk: &str, sn: u64) -> Serder {
        Serder::from_ked(json!({
            "v": "",
            "t": if sn == 0 { "iss" } else { "rev" },
            "d": "",
            "i": vcpre,
            "s": format!("{:x}", sn),
            "ri": regk,
            "dt": "2021-02-13T19:16:50.750302+00:00",
        }))
        .unwrap()
    }

    fn vcp_serder(regk: &str, issuer: &str) -> Serder {
        Serder::from_ked(json!({
            "v": "",
            "t": "vcp",
            "d": "",
            "i": regk,
            "ii": issuer,
            "s": "0",
            "b": [],
            "bt": "0",
            "c": [],
        }))
        .unwrap()
    }

    // writes one TEL event into the canonical log with its body
    fn write_tel_event(reger: &Reger, pre: &str, sn: u64, serder: &Serder) -> Vec<u8> {
        let dig = serder.saidb();
        reger.put_tel(&sn_key(pre.as_bytes(), sn), &dig).unwrap();
        reger
            .put_tvt(&dg_key(pre.as_bytes(), &dig), serder.raw())
            .unwrap();
        dig
    }

    // seeds a registry: persisted state plus inception event in the log
    fn seed_registry(reger: &Reger, regk: &str, issuer: &str) {
        let vcp = vcp_serder(regk, issuer);
        write_tel_event(reger, regk, 0, &vcp);
        let state = RegStateRecord {
            i: regk.to_string(),
            s: "0".to_string(),
            d: vcp.said().unwrap().to_string(),
            ii: issuer.to_string(),
            b: vec![],
            bt: 0,
            c: vec![],
            a: json!({}),
        };
        reger.stts.put(&[regk.as_bytes()], &state).unwrap();
    }

    fn sample_crd(issuer: &str, regk: &str, edges: &[&str], tag: &str) -> Creder {
        let e: Vec<Value> = edges
            .iter()
            .map(|said| json!({"source": {"d": said}}))
            .collect();
        Creder::from_crd(json!({
            "v": "",
            "d": "",
            "i": issuer,
            "ri": regk,
            "s": "ESchemaSaidAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "a": {"i": "ESubjectPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "tag": tag},
            "e": e,
        }))
        .unwrap()
    }

    #[test]
    fn test_reger_event_tables() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();

        let pre = b"EregistryPre";
        let dig = b"EeventDigest";
        let dgkey = dg_key(pre, dig);
        let snkey = sn_key(pre, 0);

        assert!(reger.put_tvt(&dgkey, b"rawevent").unwrap());
        assert!(!reger.put_tvt(&dgkey, b"other").unwrap());
        assert_eq!(reger.get_tvt(&dgkey).unwrap(), Some(b"rawevent".to_vec()));
        assert!(reger.set_tvt(&dgkey, b"rewritten").unwrap());
        assert_eq!(reger.get_tvt(&dgkey).unwrap(), Some(b"rewritten".to_vec()));

        assert!(reger.put_tel(&snkey, dig).unwrap());
        assert_eq!(reger.get_tel(&snkey).unwrap(), Some(dig.to_vec()));

        assert!(reger.put_anc(&dgkey, b"couple").unwrap());
        assert_eq!(reger.get_anc(&dgkey).unwrap(), Some(b"couple".to_vec()));
        assert!(reger.del_anc(&dgkey).unwrap());
        assert_eq!(reger.get_anc(&dgkey).unwrap(), None);

        // escrow tables
        assert!(reger.put_oot(&snkey, dig).unwrap());
        assert_eq!(reger.get_oot(&snkey).unwrap(), Some(dig.to_vec()));
        assert!(reger.put_twe(&snkey, dig).unwrap());
        assert!(reger.del_twe(&snkey).unwrap());
        assert!(reger.put_tae(&snkey, dig).unwrap());
        let items = reger.get_tae_item_iter().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].1, dig.to_vec());
        assert!(reger.del_tae(&snkey).unwrap());

        let dater = Dater::new(Some("2021-02-13T19:16:50.750302+00:00")).unwrap();
        assert!(reger.put_tet(&dgkey, &dater).unwrap());
        assert_eq!(reger.get_tet(&dgkey).unwrap().unwrap().dts(), dater.dts());

        assert!(reger.del_tvt(&dgkey).unwrap());
        assert!(reger.del_tel(&snkey).unwrap());
        assert!(reger.del_oot(&snkey).unwrap());
    }

    #[test]
    fn test_baks_order_and_tibs_order() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();
        let dgkey = dg_key(b"Epre", b"Edig");

        // backer list keeps insertion order
        reger.add_bak(&dgkey, b"BwitC").unwrap();
        reger.add_bak(&dgkey, b"BwitA").unwrap();
        assert!(!reger.add_bak(&dgkey, b"BwitC").unwrap());
        assert_eq!(
            reger.get_baks(&dgkey).unwrap(),
            vec![b"BwitC".to_vec(), b"BwitA".to_vec()]
        );
        assert_eq!(reger.cnt_baks(&dgkey).unwrap(), 2);
        assert!(reger.del_bak(&dgkey, b"BwitC").unwrap());
        assert!(reger.del_baks(&dgkey).unwrap());

        // backer signatures come back in lexicographic order
        let sig_b = Siger::new(&[3u8; 64], 1, None).unwrap();
        let sig_a = Siger::new(&[2u8; 64], 0, None).unwrap();
        reger.add_tib(&dgkey, &Indexer::qb64b(&sig_b)).unwrap();
        reger.add_tib(&dgkey, &Indexer::qb64b(&sig_a)).unwrap();
        let tibs = reger.get_tibs(&dgkey).unwrap();
        assert_eq!(tibs.len(), 2);
        assert!(tibs[0] < tibs[1]);
        assert_eq!(reger.cnt_tibs(&dgkey).unwrap(), 2);
    }

    #[test]
    fn test_cnt_tels_and_ordinals() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();
        let pre = "EvcPre";

        for sn in 0u64..3 {
            let serder = iss_serder(pre, "EregPre", sn);
            write_tel_event(&reger, pre, sn, &serder);
        }

        assert_eq!(reger.cnt_tels(pre.as_bytes(), 0).unwrap(), 3);
        assert_eq!(reger.cnt_tels(pre.as_bytes(), 2).unwrap(), 1);

        // ordinals arrive gapless from the requested fn
        let mut ons = Vec::new();
        reger
            .get_tel_item_pre_iter(pre.as_bytes(), 0, |on, _| {
                ons.push(on);
                Ok(true)
            })
            .unwrap();
        assert_eq!(ons, vec![0, 1, 2]);
    }

    #[test]
    fn test_clone_pre_iter_framing() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();
        let pre = "EregPre";

        let serder = vcp_serder(pre, "EissuerPre");
        let dig = write_tel_event(&reger, pre, 0, &serder);
        let dgkey = dg_key(pre.as_bytes(), &dig);

        // two backer signatures and one anchor couple
        let sig0 = Indexer::qb64b(&Siger::new(&[4u8; 64], 0, None).unwrap());
        let sig1 = Indexer::qb64b(&Siger::new(&[5u8; 64], 1, None).unwrap());
        reger.add_tib(&dgkey, &sig0).unwrap();
        reger.add_tib(&dgkey, &sig1).unwrap();
        let mut couple = Seqner::new(0).unwrap().qb64b();
        couple.extend(Saider::new_with_ser(b"anchoring event").unwrap().qb64b());
        reger.put_anc(&dgkey, &couple).unwrap();

        let msgs = reger.clone_pre_iter(pre.as_bytes(), 0).unwrap();
        assert_eq!(msgs.len(), 1);
        let msg = &msgs[0];
        assert!(msg.starts_with(serder.raw()));

        let mut atc = msg[serder.raw().len()..].to_vec();
        let outer = BaseCounter::from_qb64b(&mut atc, Some(true)).unwrap();
        assert_eq!(outer.code(), ctr_dex_1_0::ATTACHMENT_GROUP);
        assert_eq!(outer.count() as usize * 4, atc.len());

        let wigs = BaseCounter::from_qb64b(&mut atc, Some(true)).unwrap();
        assert_eq!(wigs.code(), ctr_dex_1_0::WITNESS_IDX_SIGS);
        assert_eq!(wigs.count(), 2);
        let tibs = reger.get_tibs(&dgkey).unwrap();
        assert_eq!(&atc[..88], tibs[0].as_slice());
        assert_eq!(&atc[88..176], tibs[1].as_slice());
        atc.drain(..176);

        let seal = BaseCounter::from_qb64b(&mut atc, Some(true)).unwrap();
        assert_eq!(seal.code(), ctr_dex_1_0::SEAL_SOURCE_COUPLES);
        assert_eq!(seal.count(), 1);
        assert_eq!(atc, couple);
    }

    #[test]
    fn test_clone_pre_iter_missing_entry() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();
        let pre = b"EregPre";

        // log references a digest with no stored body
        reger.put_tel(&sn_key(pre, 0), b"EmissingDig").unwrap();
        let err = reger.clone_pre_iter(pre, 0).unwrap_err();
        assert!(matches!(err, VIRError::MissingEntryError(_)));
    }

    #[test]
    fn test_log_cred_clone_cred_round_trip() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();

        let creder = sample_crd(
            "EIssuerPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "ERegistryPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            &[],
            "base",
        );
        let said = creder.said().unwrap().to_string();

        let pather = Pather::new(&[]).unwrap();
        let verfer = Verfer::new(&[1u8; 32], mtr_dex::ED25519N).unwrap();
        let cigar = Cigar::new(&[6u8; 64], None, Some(verfer.clone())).unwrap();
        let sadcigars = vec![(pather.clone(), cigar.clone())];

        let prefixer =
            Prefixer::from_qb64("DSignerPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").unwrap();
        let seqner = Seqner::new(0).unwrap();
        let saider = Saider::new_with_ser(b"signer est evt").unwrap();
        let sigers = vec![
            Siger::new(&[7u8; 64], 0, None).unwrap(),
            Siger::new(&[8u8; 64], 1, None).unwrap(),
        ];
        let sadsigers = vec![(
            pather.clone(),
            prefixer.clone(),
            seqner.clone(),
            saider.clone(),
            sigers.clone(),
        )];

        reger.log_cred(&creder, &sadsigers, &sadcigars).unwrap();

        let (clone, csigers, ccigars) = reger.clone_cred(&said, None).unwrap();
        assert_eq!(clone.said(), creder.said());
        assert_eq!(clone.raw(), creder.raw());

        assert_eq!(ccigars.len(), 1);
        assert_eq!(ccigars[0].0.text(), pather.text());
        assert_eq!(ccigars[0].1.raw(), cigar.raw());
        assert_eq!(ccigars[0].1.verfer().unwrap().qb64(), verfer.qb64());

        assert_eq!(csigers.len(), 1);
        let (cpather, cprefixer, cseqner, csaider, csigs) = &csigers[0];
        assert_eq!(cpather.text(), pather.text());
        assert_eq!(cprefixer.qb64(), prefixer.qb64());
        assert_eq!(cseqner.sn(), 0);
        assert_eq!(csaider.qb64(), saider.qb64());
        // signatures within a group come back in insertion order
        assert_eq!(csigs.len(), 2);
        assert_eq!(Indexer::raw(&csigs[0]), Indexer::raw(&sigers[0]));
        assert_eq!(Indexer::raw(&csigs[1]), Indexer::raw(&sigers[1]));

        // transposition re-roots every signature path
        let root = Pather::new(&["a"]).unwrap();
        let (_, rsigers, rcigars) = reger.clone_cred(&said, Some(&root)).unwrap();
        assert_eq!(rcigars[0].0.text(), "-a");
        assert_eq!(rsigers[0].0.text(), "-a");
    }

    #[test]
    fn test_sn_hex_dup_ordering() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();

        let creder = sample_crd(
            "EIssuerPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "ERegistryPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            &[],
            "snorder",
        );
        let said = creder.said().unwrap().to_string();
        let pather = Pather::new(&[]).unwrap();
        let prefixer =
            Prefixer::from_qb64("DSignerPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").unwrap();
        let saider = Saider::new_with_ser(b"signer est evt").unwrap();

        // insert the higher sequence number first; the 32 hex padding
        // makes lexicographic key order equal numeric order
        let sadsigers: Vec<Tsg> = vec![
            (
                pather.clone(),
                prefixer.clone(),
                Seqner::new(12).unwrap(),
                saider.clone(),
                vec![Siger::new(&[1u8; 64], 0, None).unwrap()],
            ),
            (
                pather.clone(),
                prefixer.clone(),
                Seqner::new(2).unwrap(),
                saider.clone(),
                vec![Siger::new(&[2u8; 64], 0, None).unwrap()],
            ),
        ];
        reger.log_cred(&creder, &sadsigers, &[]).unwrap();

        let (_, csigers, _) = reger.clone_cred(&said, None).unwrap();
        let sns: Vec<u64> = csigers.iter().map(|(_, _, s, _, _)| s.sn()).collect();
        assert_eq!(sns, vec![2, 12]);
    }

    #[test]
    fn test_tever_cache_read_through() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();
        let regk = "ERegistryPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        let issuer = "EIssuerPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

        // unknown registry
        assert!(matches!(
            reger.tever("EUnknownRegistry").unwrap_err(),
            VIRError::NotFoundError(_)
        ));
        assert!(!reger.has_tever("EUnknownRegistry"));

        seed_registry(&reger, regk, issuer);

        // membership check triggers read through
        assert!(reger.has_tever(regk));
        let tever = reger.tever(regk).unwrap();
        assert_eq!(tever.pre(), regk);
        assert_eq!(tever.issuer(), issuer);

        // delete evicts both cache entry and persisted state
        assert!(reger.del_tever(regk).unwrap());
        assert!(!reger.has_tever(regk));
    }

    #[test]
    fn test_tever_state_without_events_is_not_found() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();
        let regk = "ERegistryPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

        // persisted state with no locally present events
        let state = RegStateRecord {
            i: regk.to_string(),
            s: "0".to_string(),
            d: "EdangleDig".to_string(),
            ii: "EIssuer".to_string(),
            b: vec![],
            bt: 0,
            c: vec![],
            a: json!({}),
        };
        reger.stts.put(&[regk.as_bytes()], &state).unwrap();
        assert!(matches!(
            reger.tever(regk).unwrap_err(),
            VIRError::NotFoundError(_)
        ));
    }

    #[test]
    fn test_clone_creds_with_chain() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();
        let regk = "ERegistryPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        let issuer = "EIssuerPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        seed_registry(&reger, regk, issuer);

        let source = sample_crd(issuer, regk, &[], "source");
        let ssaid = source.said().unwrap().to_string();
        let holder = sample_crd(issuer, regk, &[&ssaid], "holder");
        let hsaid = holder.said().unwrap().to_string();
        reger.log_cred(&source, &[], &[]).unwrap();
        reger.log_cred(&holder, &[], &[]).unwrap();

        // issuance TEL events for both credentials
        for vcpre in [&ssaid, &hsaid] {
            let iss = iss_serder(vcpre, regk, 0);
            write_tel_event(&reger, vcpre, 0, &iss);
        }

        let saiders = vec![Saider::from_qb64(&hsaid).unwrap()];
        let creds = reger.clone_creds(&saiders).unwrap();
        assert_eq!(creds.len(), 1);

        let cred = &creds[0];
        assert_eq!(cred["pre"], issuer);
        assert_eq!(cred["sad"]["d"], hsaid);
        assert_eq!(cred["status"]["et"], "iss");
        assert_eq!(cred["status"]["ri"], regk);
        let chains = cred["chains"].as_array().unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0]["sad"]["d"], ssaid);
    }

    #[test]
    fn test_sources_visits_each_said_once() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();
        let regk = "ERegistryPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        let issuer = "EIssuerPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

        let leaf = sample_crd(issuer, regk, &[], "leaf");
        let lsaid = leaf.said().unwrap().to_string();
        // two edges referencing the same chained credential
        let root = sample_crd(issuer, regk, &[&lsaid, &lsaid], "root");
        reger.log_cred(&leaf, &[], &[]).unwrap();
        reger.log_cred(&root, &[], &[]).unwrap();

        let sources = reger.sources(&root).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].0.said(), Some(lsaid.as_str()));
        assert_eq!(sources[0].1, leaf.raw().to_vec());
    }

    #[test]
    fn test_registry_record_komer() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();

        let record = RegistryRecord {
            registry_key: "ERegistryPre".to_string(),
            prefix: "EIssuerPre".to_string(),
        };
        assert!(reger.regs.put(&["issuances"], &record).unwrap());
        assert_eq!(reger.regs.get(&["issuances"]).unwrap(), Some(record));

        reger.registries.borrow_mut().insert("ERegistryPre".to_string());
        assert!(reger.registries.borrow().contains("ERegistryPre"));
    }

    #[test]
    fn test_escrow_triples() {
        let lmdber = opened();
        let reger = Reger::new(Arc::new(&lmdber)).unwrap();

        let triple = (
            Prefixer::from_qb64("DSignerPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").unwrap(),
            Seqner::new(1).unwrap(),
            Saider::new_with_ser(b"escrowed evt").unwrap(),
        );
        let keys: &[&[u8]] = &[b"EregPre", b"EvcPre"];
        assert!(reger.tpwe.add(keys, &triple).unwrap());
        assert!(!reger.tpwe.add(keys, &triple).unwrap());
        let got = reger.tpwe.get(keys).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].1.sn(), 1);
        assert!(reger.tpwe.rem(keys, Some(&triple)).unwrap());
        assert_eq!(reger.tpwe.cnt(keys).unwrap(), 0);
    }
}

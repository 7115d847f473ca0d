//! Registry state objects
//!
//! A Tever is the in-memory registry state for one transaction event log:
//! the latest validated registry configuration (backer list, threshold,
//! anchor) plus lookups into the registry store for per-credential
//! transaction state.

use crate::vir::core::serdering::Serder;
use crate::vir::db::dbing::keys::dg_key;
use crate::vir::db::viring::Reger;
use crate::vir::{ilks, VIRError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted snapshot of the latest validated registry configuration,
/// keyed by registry prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegStateRecord {
    /// registry identifier prefix
    pub i: String,
    /// sequence number of latest management event, lowercase hex
    pub s: String,
    /// said of latest management event
    pub d: String,
    /// issuer identifier prefix
    pub ii: String,
    /// ordered backer list
    pub b: Vec<String>,
    /// backer threshold
    pub bt: u32,
    /// configuration traits
    pub c: Vec<String>,
    /// anchor seal into the issuer KEL
    pub a: Value,
}

/// Current transaction state of one credential TEL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionStateRecord {
    /// credential identifier
    pub i: String,
    /// sequence number of latest TEL event, lowercase hex
    pub s: String,
    /// said of latest TEL event
    pub d: String,
    /// registry identifier prefix
    pub ri: String,
    /// datetime of latest TEL event
    pub dt: String,
    /// ilk of latest TEL event, iss/rev/bis/brv
    pub et: String,
}

/// Tever is the in-memory registry state object
#[derive(Debug, Clone)]
pub struct Tever {
    state: RegStateRecord,
}

impl Tever {
    /// Reconstructs a Tever from its persisted state. Fails with
    /// MissingEntryError when the registry inception event referenced by
    /// the state is not locally present.
    pub fn from_state(state: RegStateRecord, reger: &Reger) -> Result<Self, VIRError> {
        let pre = state.i.as_bytes();
        let dig = reger
            .get_tel(&crate::vir::db::dbing::keys::sn_key(pre, 0))?
            .ok_or_else(|| {
                VIRError::MissingEntryError(format!(
                    "Missing inception event in TEL for registry={}",
                    state.i
                ))
            })?;
        if reger.get_tvt(&dg_key(pre, &dig))?.is_none() {
            return Err(VIRError::MissingEntryError(format!(
                "Missing event body for dig={}",
                String::from_utf8_lossy(&dig)
            )));
        }
        Ok(Self { state })
    }

    /// Registry identifier prefix
    pub fn pre(&self) -> &str {
        &self.state.i
    }

    /// Said of the latest management event
    pub fn said(&self) -> &str {
        &self.state.d
    }

    /// Issuer identifier prefix
    pub fn issuer(&self) -> &str {
        &self.state.ii
    }

    /// Ordered backer list
    pub fn baks(&self) -> &[String] {
        &self.state.b
    }

    /// Backer threshold
    pub fn toad(&self) -> u32 {
        self.state.bt
    }

    /// Persisted state snapshot
    pub fn state(&self) -> &RegStateRecord {
        &self.state
    }

    /// Returns the current transaction state of the credential TEL for
    /// vcpre within this registry, assembled from the canonical log and
    /// the stored event bodies
    pub fn vc_state(&self, reger: &Reger, vcpre: &str) -> Result<TransactionStateRecord, VIRError> {
        let mut latest: Option<(u64, Vec<u8>)> = None;
        reger.get_tel_item_pre_iter(vcpre.as_bytes(), 0, |sn, dig| {
            latest = Some((sn, dig.to_vec()));
            Ok(true)
        })?;
        let (sn, dig) = latest.ok_or_else(|| {
            VIRError::NotFoundError(format!("No TEL events for vc={}", vcpre))
        })?;

        let dgkey = dg_key(vcpre.as_bytes(), &dig);
        let raw = reger.get_tvt(&dgkey)?.ok_or_else(|| {
            VIRError::MissingEntryError(format!(
                "Missing event for dig={}",
                String::from_utf8_lossy(&dig)
            ))
        })?;
        let serder = Serder::from_raw(&raw)?;
        let et = serder.ilk().unwrap_or_default().to_string();
        if ![ilks::ISS, ilks::REV, ilks::BIS, ilks::BRV].contains(&et.as_str()) {
            return Err(VIRError::ValidationError(format!(
                "Invalid TEL event ilk={} for vc={}",
                et, vcpre
            )));
        }
        let dt = match reger.get_tet(&dgkey)? {
            Some(dater) => dater.dts(),
            None => serder
                .ked()
                .get("dt")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
        Ok(TransactionStateRecord {
            i: vcpre.to_string(),
            s: format!("{:x}", sn),
            d: serder.said().unwrap_or_default().to_string(),
            ri: self.state.i.clone(),
            dt,
            et,
        })
    }
}

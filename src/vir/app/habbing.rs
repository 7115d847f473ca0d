//! Identity habitat collaborator
//!
//! A habitat is a local identity plus its persisted view of key event
//! logs, used both as signer and as resolver of endpoints. Key
//! management and signature production live behind the trait; envelope
//! assembly over the produced signatures is provided here.

use crate::cesr::counting::{ctr_dex_1_0, BaseCounter, Counter};
use crate::cesr::dater::now_iso8601;
use crate::cesr::indexing::siger::Siger;
use crate::cesr::indexing::Indexer;
use crate::hio::hicting::Mict;
use crate::vir::core::serdering::Serder;
use crate::vir::VIRError;
use indexmap::IndexSet;
use serde_json::json;

/// Database key for an authorized endpoint provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    /// attributable controller identifier (qb64 prefix)
    pub cid: String,
    /// role such as controller, agent, mailbox, witness
    pub role: String,
    /// identifier of the controller acting in the role
    pub eid: String,
}

impl EndpointKey {
    pub fn new(cid: impl Into<String>, role: impl Into<String>, eid: impl Into<String>) -> Self {
        Self {
            cid: cid.into(),
            role: role.into(),
            eid: eid.into(),
        }
    }
}

/// Authorization state of one endpoint provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointRecord {
    pub allowed: bool,
    pub enabled: bool,
    pub name: String,
}

/// Latest key state of an identifier as needed by the delivery engine
#[derive(Debug, Clone)]
pub struct KeyState {
    /// latest establishment event
    pub serder: Serder,
    /// current witness list
    pub wits: Vec<String>,
    /// delegator prefix when delegated
    pub delegator: Option<String>,
}

/// Habitat exposes the local identity surface the delivery engine needs:
/// prefix and key state, endpoint and URL indexes, first seen cloning of
/// its own KEL, receipt indexes, and endorsement.
pub trait Habitat {
    /// Own identifier prefix
    fn pre(&self) -> &str;

    /// All prefixes controlled by this process
    fn prefixes(&self) -> IndexSet<String>;

    /// Own latest key state
    fn kever(&self) -> &KeyState;

    /// Latest key state for any locally known identifier
    fn kevers(&self, pre: &str) -> Option<KeyState>;

    /// Signs ser with the current signing keys
    fn sign(&self, ser: &[u8]) -> Result<Vec<Siger>, VIRError>;

    /// End role authorizations for cid as (key, record) pairs
    fn ends_item_iter(&self, cid: &str) -> Vec<(EndpointKey, EndpointRecord)>;

    /// URL locations for the endpoint provider eid as scheme to url
    fn fetch_urls(&self, eid: &str) -> Mict<String, String>;

    /// Own KEL as first seen event messages with attachments
    fn clone_pre_iter(&self) -> Result<Vec<Vec<u8>>, VIRError>;

    /// One first seen event message with attachments for pre at ordinal
    fn clone_evt_msg(&self, pre: &str, fn_ord: u64) -> Result<Vec<u8>, VIRError>;

    /// Nontransferable receipt couples at the digest key
    fn rcts(&self, dgkey: &[u8]) -> Result<Vec<Vec<u8>>, VIRError>;

    /// Transferable receipt quadruples at the digest key
    fn vrcs(&self, dgkey: &[u8]) -> Result<Vec<Vec<u8>>, VIRError>;

    /// Managing member prefix for a group habitat
    fn mhab_pre(&self) -> Option<String> {
        None
    }

    /// Delegator prefix when delegated
    fn delegator(&self) -> Option<String> {
        self.kever().delegator.clone()
    }

    /// Endorses serder with own signatures. With last the signatures are
    /// framed as a transferable last establishment group keyed by own
    /// prefix, else as a bare controller indexed group.
    fn endorse(&self, serder: &Serder, last: bool, _pipelined: bool) -> Result<Vec<u8>, VIRError> {
        let sigers = self.sign(serder.raw())?;
        let mut msg = serder.raw().to_vec();
        if last {
            msg.extend(BaseCounter::new(ctr_dex_1_0::TRANS_LAST_IDX_SIG_GROUPS, 1)?.qb64b());
            msg.extend(self.pre().as_bytes());
        }
        msg.extend(
            BaseCounter::new(ctr_dex_1_0::CONTROLLER_IDX_SIGS, sigers.len() as u64)?.qb64b(),
        );
        for siger in &sigers {
            msg.extend(Indexer::qb64b(siger));
        }
        Ok(msg)
    }

    /// Signed reply asserting the end role binding for cid
    fn reply_end_role(&self, cid: &str) -> Result<Vec<u8>, VIRError> {
        let serder = Serder::from_ked(json!({
            "v": "",
            "t": "rpy",
            "d": "",
            "dt": now_iso8601(),
            "r": "/end/role/add",
            "a": {"cid": cid, "role": "controller", "eid": self.pre()},
        }))?;
        self.endorse(&serder, true, false)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockHab;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endorse_last_framing() {
        let hab = MockHab::new("EHabPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", vec![]);
        let serder = Serder::from_ked(json!({"v": "", "t": "exn", "d": "", "r": "/fwd"})).unwrap();
        let msg = hab.endorse(&serder, true, false).unwrap();

        let mut rest = msg[serder.size()..].to_vec();
        let counter = BaseCounter::from_qb64b(&mut rest, Some(true)).unwrap();
        assert_eq!(counter.code(), ctr_dex_1_0::TRANS_LAST_IDX_SIG_GROUPS);
        assert_eq!(counter.count(), 1);
        assert!(rest.starts_with(hab.pre().as_bytes()));
        rest.drain(..hab.pre().len());
        let counter = BaseCounter::from_qb64b(&mut rest, Some(true)).unwrap();
        assert_eq!(counter.code(), ctr_dex_1_0::CONTROLLER_IDX_SIGS);
        assert_eq!(counter.count(), 1);
        assert_eq!(rest.len(), 88);
    }

    #[test]
    fn test_reply_end_role_starts_with_reply() {
        let hab = MockHab::new("EHabPreAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", vec![]);
        let msg = hab.reply_end_role(hab.pre()).unwrap();
        let serder = Serder::from_raw(&msg).unwrap();
        assert_eq!(serder.ilk(), Some("rpy"));
        assert_eq!(serder.ked()["a"]["cid"], hab.pre());
    }
}

//! Credential wrapper and proof assembly
//!
//! A Creder wraps one self-addressing ACDC credential document. Proof
//! assembly builds the CESR attachment framing for a credential's
//! signature quadruple.

use crate::cesr::counting::{ctr_dex_1_0, BaseCounter, Counter};
use crate::cesr::indexing::siger::Siger;
use crate::cesr::prefixer::Prefixer;
use crate::cesr::saider::Saider;
use crate::cesr::seqner::Seqner;
use crate::cesr::Matter;
use crate::vir::core::serdering::{Rawifiable, Serder};
use crate::vir::db::subing::serder::SerderSuber;
use crate::vir::{protos, Kinds, VIRError};
use serde_json::Value;

/// Creder wraps a self-addressing credential document
#[derive(Debug, Clone, PartialEq)]
pub struct Creder {
    base: Serder,
}

impl Creder {
    /// Inhales a Creder from its raw serialization
    pub fn from_raw(raw: &[u8]) -> Result<Self, VIRError> {
        let base = Serder::from_raw(raw)?;
        if base.proto() != protos::ACDC {
            return Err(VIRError::ValidationError(format!(
                "Invalid protocol={} for credential",
                base.proto()
            )));
        }
        Ok(Self { base })
    }

    /// Makifies a Creder from a credential field map
    pub fn from_crd(crd: Value) -> Result<Self, VIRError> {
        Ok(Self {
            base: Serder::from_sad(crd, protos::ACDC, Kinds::Json)?,
        })
    }

    /// Credential field map
    pub fn crd(&self) -> &Value {
        self.base.ked()
    }

    pub fn raw(&self) -> &[u8] {
        self.base.raw()
    }

    pub fn size(&self) -> usize {
        self.base.size()
    }

    /// Self-addressing identifier of the credential
    pub fn said(&self) -> Option<&str> {
        self.base.said()
    }

    /// Self-addressing identifier as bytes
    pub fn saidb(&self) -> Vec<u8> {
        self.base.saidb()
    }

    /// Issuer identifier prefix, the i field
    pub fn issuer(&self) -> Option<&str> {
        self.base.ked().get("i").and_then(Value::as_str)
    }

    /// Schema said, the s field
    pub fn schema(&self) -> Option<&str> {
        self.base.ked().get("s").and_then(Value::as_str)
    }

    /// Subject identifier prefix, the a.i field
    pub fn subject(&self) -> Option<&str> {
        self.base
            .ked()
            .get("a")
            .and_then(|a| a.get("i"))
            .and_then(Value::as_str)
    }

    /// Registry identifier prefix, the ri field
    pub fn status(&self) -> Option<&str> {
        self.base.ked().get("ri").and_then(Value::as_str)
    }

    /// Edge chain saids in document order from the e section. Each edge
    /// is a single entry map whose value carries the chained credential
    /// said under d.
    pub fn edges(&self) -> Vec<String> {
        let mut saids = Vec::new();
        match self.base.ked().get("e") {
            Some(Value::Array(sources)) => {
                for source in sources {
                    if let Value::Object(map) = source {
                        for data in map.values() {
                            if let Some(said) = data.get("d").and_then(Value::as_str) {
                                saids.push(said.to_string());
                            }
                        }
                    }
                }
            }
            Some(Value::Object(map)) => {
                for data in map.values() {
                    if let Some(said) = data.get("d").and_then(Value::as_str) {
                        saids.push(said.to_string());
                    }
                }
            }
            _ => {}
        }
        saids
    }
}

impl Rawifiable for Creder {
    fn from_raw(raw: &[u8]) -> Result<Self, VIRError> {
        Creder::from_raw(raw)
    }

    fn raw(&self) -> &[u8] {
        self.base.raw()
    }
}

/// CrederSuber stores one credential body per said
pub type CrederSuber<'db> = SerderSuber<'db, Creder>;

/// Creates the CESR proof attachment from the quadruple of seal plus
/// signatures on the credential
pub fn build_proof(
    prefixer: &Prefixer,
    seqner: &Seqner,
    saider: &Saider,
    sigers: &[Siger],
) -> Result<Vec<u8>, VIRError> {
    let mut prf = Vec::new();
    prf.extend(BaseCounter::new(ctr_dex_1_0::TRANS_IDX_SIG_GROUPS, 1)?.qb64b());
    prf.extend(prefixer.qb64b());
    prf.extend(seqner.qb64b());
    prf.extend(saider.qb64b());
    prf.extend(BaseCounter::new(ctr_dex_1_0::CONTROLLER_IDX_SIGS, sigers.len() as u64)?.qb64b());
    for siger in sigers {
        prf.extend(crate::cesr::indexing::Indexer::qb64b(siger));
    }
    Ok(prf)
}

/// Creates a CESR message with proof attachment for the credential
pub fn messagize(creder: &Creder, proof: &[u8]) -> Result<Vec<u8>, VIRError> {
    let mut craw = creder.raw().to_vec();
    if proof.len() % 4 != 0 {
        return Err(VIRError::FramingError(format!(
            "Invalid attachments size={}, nonintegral quadlets",
            proof.len()
        )));
    }
    craw.extend(
        BaseCounter::new(ctr_dex_1_0::ATTACHMENT_GROUP, (proof.len() / 4) as u64)?.qb64b(),
    );
    craw.extend_from_slice(proof);
    Ok(craw)
}

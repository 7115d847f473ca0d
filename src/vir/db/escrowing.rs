//! Escrow broker for registry transaction state notices
//!
//! A Broker groups the sub databases needed to escrow a transaction
//! state notice pending validation: the notice serialization, its
//! datetime stamp, its signatures, and the escrow index itself keyed by
//! route. Escrow insertion is not an error path; it is a normal
//! quiescent state awaiting resolution.

use crate::cesr::cigar::Cigar;
use crate::cesr::dater::Dater;
use crate::cesr::indexing::siger::Siger;
use crate::cesr::saider::Saider;
use crate::cesr::verfer::Verfer;
use crate::vir::core::serdering::Serder;
use crate::vir::db::subing::catcesr::CatCesrIoSetSuber;
use crate::vir::db::dbing::LMDBer;
use crate::vir::db::subing::cesr::CesrSuber;
use crate::vir::db::subing::ioset::CesrIoSetSuber;
use crate::vir::db::subing::serder::SerderSuber;
use crate::vir::db::subing::SuberError;
use std::sync::Arc;

/// Broker holds the escrow sub databases for transaction state notices
pub struct Broker<'db> {
    /// escrow index: route -> saids of escrowed notices, insertion ordered
    pub escs: CesrIoSetSuber<'db, Saider>,
    /// datetime stamp of each escrowed notice, keyed by (pre, said)
    pub dtss: CesrSuber<'db, Dater>,
    /// escrowed notice serializations keyed by said
    pub srdrs: SerderSuber<'db, Serder>,
    /// transferable indexed signatures on each notice, keyed by (pre, said)
    pub tigs: CesrIoSetSuber<'db, Siger>,
    /// nontransferable (verfer, cigar) couples on each notice
    pub cigs: CatCesrIoSetSuber<'db, (Verfer, Cigar)>,
}

impl<'db> Broker<'db> {
    /// Opens the escrow sub databases under the subkey namespace
    pub fn new(db: Arc<&'db LMDBer>, subkey: &str) -> Result<Self, SuberError> {
        Ok(Self {
            escs: CesrIoSetSuber::new(db.clone(), &format!("{}escs.", subkey), None)?,
            dtss: CesrSuber::new(db.clone(), &format!("{}dtss.", subkey), None)?,
            srdrs: SerderSuber::new(db.clone(), &format!("{}srdrs.", subkey), None)?,
            tigs: CesrIoSetSuber::new(db.clone(), &format!("{}tigs.", subkey), None)?,
            cigs: CatCesrIoSetSuber::new(db, &format!("{}cigs.", subkey), None)?,
        })
    }

    /// Escrows a transaction state notice under route with its stamp and
    /// signatures
    pub fn escrow_state_notice(
        &self,
        route: &str,
        pre: &str,
        serder: &Serder,
        dater: &Dater,
        sigers: &[Siger],
        cigars: &[(Verfer, Cigar)],
    ) -> Result<(), SuberError> {
        let said = serder.said().unwrap_or_default().to_string();
        self.srdrs.pin(&[said.as_bytes()], serder)?;
        self.dtss.pin(&[pre.as_bytes(), said.as_bytes()], dater)?;
        for siger in sigers {
            self.tigs.add(&[pre.as_bytes(), said.as_bytes()], siger)?;
        }
        for couple in cigars {
            self.cigs.add(&[pre.as_bytes(), said.as_bytes()], couple)?;
        }
        let saider = Saider::from_qb64(&said)?;
        self.escs.add(&[route.as_bytes()], &saider)?;
        Ok(())
    }

    /// Returns the saids escrowed under route in insertion order
    pub fn get_escrows(&self, route: &str) -> Result<Vec<Saider>, SuberError> {
        self.escs.get(&[route.as_bytes()])
    }

    /// Removes a notice from escrow under route, leaving the notice body
    /// in place for promotion
    pub fn unescrow(&self, route: &str, saider: &Saider) -> Result<bool, SuberError> {
        self.escs.rem(&[route.as_bytes()], Some(saider))
    }
}

//! Counter codes for counted attachment framing
//!
//! Counters are the group framing primitives of the CESR text domain.
//! Each counter is a two char hard code plus a two char Base64 count.

use crate::cesr::{b64_to_int, hard_size, int_to_b64};
use crate::errors::MatterError;

/// Counter derivation codes, CESR version 1
#[allow(dead_code)]
pub mod ctr_dex_1_0 {
    /// Qualified Base64 indexed controller signatures
    pub const CONTROLLER_IDX_SIGS: &str = "-A";
    /// Qualified Base64 indexed witness (backer) signatures
    pub const WITNESS_IDX_SIGS: &str = "-B";
    /// Composed Base64 group, pre+snu+dig+ControllerIdxSigs group
    pub const TRANS_IDX_SIG_GROUPS: &str = "-F";
    /// Composed Base64 couple, snu+dig of given issuer/delegator event
    pub const SEAL_SOURCE_COUPLES: &str = "-G";
    /// Composed Base64 group, pre+ControllerIdxSigs group
    pub const TRANS_LAST_IDX_SIG_GROUPS: &str = "-H";
    /// Composed grouped pathed material quadlets (4 chars each)
    pub const PATHED_MATERIAL_GROUP: &str = "-L";
    /// Composed grouped attached material quadlets (4 chars each)
    pub const ATTACHMENT_GROUP: &str = "-V";

    /// Tuple of all defined counter codes
    pub const TUPLE: [&str; 7] = [
        CONTROLLER_IDX_SIGS,
        WITNESS_IDX_SIGS,
        TRANS_IDX_SIG_GROUPS,
        SEAL_SOURCE_COUPLES,
        TRANS_LAST_IDX_SIG_GROUPS,
        PATHED_MATERIAL_GROUP,
        ATTACHMENT_GROUP,
    ];
}

const CTR_HS: usize = 2; // hard code size
const CTR_SS: usize = 2; // soft count size
const CTR_FS: usize = CTR_HS + CTR_SS;
const MAX_COUNT: u64 = 64 * 64 - 1;

/// Core trait for counter framing primitives
pub trait Counter {
    /// Counter derivation code
    fn code(&self) -> &str;

    /// Count of framed items or quadlets depending on code semantics
    fn count(&self) -> u64;

    /// Fully qualified Base64 representation
    fn qb64(&self) -> String;

    /// Fully qualified Base64 representation as bytes
    fn qb64b(&self) -> Vec<u8> {
        self.qb64().into_bytes()
    }

    /// Number of characters in the fully qualified representation
    fn full_size(&self) -> usize {
        CTR_FS
    }
}

/// Common implementation for counter primitives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseCounter {
    code: String,
    count: u64,
}

impl BaseCounter {
    /// Creates a new counter from code and count
    pub fn new(code: &str, count: u64) -> Result<Self, MatterError> {
        if !ctr_dex_1_0::TUPLE.contains(&code) {
            return Err(MatterError::InvalidCode(format!(
                "Unsupported counter code={}",
                code
            )));
        }
        if count > MAX_COUNT {
            return Err(MatterError::InvalidVarIndex(format!(
                "Invalid count={} for code={}",
                count, code
            )));
        }
        Ok(Self {
            code: code.to_string(),
            count,
        })
    }

    /// Creates a counter from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        if qb64.len() < CTR_FS {
            return Err(MatterError::ShortageError(format!(
                "Need {} more characters.",
                CTR_FS - qb64.len()
            )));
        }
        let first = qb64.chars().next().ok_or(MatterError::EmptyMaterial)?;
        if first != '-' {
            // surface the same diagnosis as Matter extraction
            hard_size(first)?;
            return Err(MatterError::UnexpectedCode(format!(
                "Expected counter code start, got {}",
                first
            )));
        }
        let hard = &qb64[..CTR_HS];
        if !ctr_dex_1_0::TUPLE.contains(&hard) {
            return Err(MatterError::UnexpectedCode(format!(
                "Unsupported counter code={}",
                hard
            )));
        }
        let count = b64_to_int(&qb64[CTR_HS..CTR_FS])?;
        Ok(Self {
            code: hard.to_string(),
            count,
        })
    }

    /// Parses a counter from qb64 bytes, stripping consumed chars when strip
    pub fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| MatterError::EncodingError(format!("Invalid UTF-8 in qb64: {}", e)))?;
        let counter = Self::from_qb64(text)?;
        if strip.unwrap_or(false) {
            data.drain(..CTR_FS);
        }
        Ok(counter)
    }
}

impl Counter for BaseCounter {
    fn code(&self) -> &str {
        &self.code
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn qb64(&self) -> String {
        format!("{}{}", self.code, int_to_b64(self.count, CTR_SS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_round_trip() {
        let counter = BaseCounter::new(ctr_dex_1_0::CONTROLLER_IDX_SIGS, 1).unwrap();
        assert_eq!(counter.qb64(), "-AAB");
        assert_eq!(counter.full_size(), 4);

        let counter = BaseCounter::new(ctr_dex_1_0::WITNESS_IDX_SIGS, 2).unwrap();
        assert_eq!(counter.qb64(), "-BAC");

        let again = BaseCounter::from_qb64("-BAC").unwrap();
        assert_eq!(again.code(), ctr_dex_1_0::WITNESS_IDX_SIGS);
        assert_eq!(again.count(), 2);

        let counter = BaseCounter::new(ctr_dex_1_0::ATTACHMENT_GROUP, 64).unwrap();
        assert_eq!(counter.qb64(), "-VBA");
    }

    #[test]
    fn test_counter_strip_and_rejects() {
        let mut buf = b"-GAB0AAAAAAAAAAAAAAAAAAAAAAB".to_vec();
        let counter = BaseCounter::from_qb64b(&mut buf, Some(true)).unwrap();
        assert_eq!(counter.code(), ctr_dex_1_0::SEAL_SOURCE_COUPLES);
        assert_eq!(counter.count(), 1);
        assert_eq!(buf.len(), 24);

        assert!(BaseCounter::new("-Z", 1).is_err());
        assert!(BaseCounter::new(ctr_dex_1_0::ATTACHMENT_GROUP, MAX_COUNT + 1).is_err());
        assert!(BaseCounter::from_qb64("EABC").is_err());
    }
}

use crate::cesr::{mtr_dex, BaseMatter, Matter, Parsable};
use crate::errors::MatterError;

/// Seqner is Matter subclass holding a sequence number or first seen
/// ordinal as a fully qualified 128 bit primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seqner {
    base: BaseMatter,
}

impl Seqner {
    /// Creates a new Seqner from a sequence number
    pub fn new(sn: u64) -> Result<Self, MatterError> {
        let mut raw = [0u8; 16];
        raw[8..].copy_from_slice(&sn.to_be_bytes());
        Ok(Self {
            base: BaseMatter::new(&raw, mtr_dex::SALT_128)?,
        })
    }

    /// Creates a Seqner from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64(qb64)?;
        if base.code() != mtr_dex::SALT_128 {
            return Err(MatterError::InvalidCode(base.code().to_string()));
        }
        Ok(Self { base })
    }

    /// Returns the sequence number
    pub fn sn(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.base.raw()[8..16]);
        u64::from_be_bytes(bytes)
    }

    /// Returns the lowercase hex string of the sequence number
    pub fn snh(&self) -> String {
        format!("{:x}", self.sn())
    }
}

impl Matter for Seqner {
    fn code(&self) -> &str {
        self.base.code()
    }
    fn raw(&self) -> &[u8] {
        self.base.raw()
    }
    fn qb64(&self) -> String {
        self.base.qb64()
    }
}

impl Parsable for Seqner {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64b(data, strip)?,
        })
    }
}

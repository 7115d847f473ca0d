use crate::cesr::{BaseMatter, Matter, Parsable};
use crate::errors::MatterError;

/// Verfer is Matter subclass holding a verifier public key.
/// Signature verification itself is delegated to an external verifier
/// collaborator; Verfer only qualifies the key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verfer {
    base: BaseMatter,
}

impl Verfer {
    /// Creates a Verfer from raw key bytes and a derivation code
    pub fn new(raw: &[u8], code: &str) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::new(raw, code)?,
        })
    }

    /// Creates a Verfer from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64(qb64)?,
        })
    }
}

impl Matter for Verfer {
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

impl Parsable for Verfer {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64b(data, strip)?,
        })
    }
}

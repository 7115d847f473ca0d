use crate::cesr::verfer::Verfer;
use crate::cesr::{mtr_dex, BaseMatter, Matter, Parsable};
use crate::errors::MatterError;

/// Cigar is Matter subclass holding a nonindexed signature.
/// From Matter .raw is the signature and .code is the signature cipher
/// suite. Adds .verfer to hold the associated verifier public key; for a
/// nontransferable signer the verfer qb64 doubles as the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cigar {
    base: BaseMatter,
    verfer: Option<Verfer>,
}

impl Cigar {
    /// Creates a Cigar from raw signature bytes and optional verfer
    pub fn new(raw: &[u8], code: Option<&str>, verfer: Option<Verfer>) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::new(raw, code.unwrap_or(mtr_dex::ED25519_SIG))?,
            verfer,
        })
    }

    /// Creates a Cigar from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64(qb64)?,
            verfer: None,
        })
    }

    /// Returns the associated verifier key if any
    pub fn verfer(&self) -> Option<&Verfer> {
        self.verfer.as_ref()
    }

    /// Sets the associated verifier key
    pub fn set_verfer(&mut self, verfer: Verfer) {
        self.verfer = Some(verfer);
    }
}

impl Matter for Cigar {
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

impl Parsable for Cigar {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64b(data, strip)?,
            verfer: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cigar() {
        let sig = [5u8; 64];
        let verfer = Verfer::new(&[1u8; 32], mtr_dex::ED25519N).unwrap();
        let cigar = Cigar::new(&sig, None, Some(verfer.clone())).unwrap();
        assert_eq!(cigar.code(), mtr_dex::ED25519_SIG);
        assert_eq!(cigar.qb64().len(), 88);
        assert_eq!(cigar.verfer().unwrap().qb64(), verfer.qb64());

        let again = Cigar::from_qb64(&cigar.qb64()).unwrap();
        assert_eq!(again.raw(), cigar.raw());
        assert!(again.verfer().is_none());
    }
}

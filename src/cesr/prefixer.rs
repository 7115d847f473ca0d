use crate::cesr::{BaseMatter, Matter, Parsable};
use crate::errors::MatterError;

/// Prefixer is Matter subclass for an autonomic identifier (AID) prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefixer {
    base: BaseMatter,
}

impl Prefixer {
    /// Creates a Prefixer from raw bytes and a derivation code
    pub fn new(raw: &[u8], code: &str) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::new(raw, code)?,
        })
    }

    /// Creates a Prefixer from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64(qb64)?,
        })
    }
}

impl Matter for Prefixer {
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

impl Parsable for Prefixer {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64b(data, strip)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cesr::mtr_dex;

    #[test]
    fn test_prefixer_transferability() {
        let raw = [9u8; 32];
        let nontrans = Prefixer::new(&raw, mtr_dex::ED25519N).unwrap();
        assert!(!nontrans.is_transferable());
        assert!(nontrans.qb64().starts_with('B'));

        let trans = Prefixer::new(&raw, mtr_dex::ED25519).unwrap();
        assert!(trans.is_transferable());

        let again = Prefixer::from_qb64(&trans.qb64()).unwrap();
        assert_eq!(again.raw(), trans.raw());
    }
}

use crate::cesr::indexing::{idx_dex, BaseIndexer, Indexer};
use crate::cesr::verfer::Verfer;
use crate::errors::MatterError;

/// Siger is Indexer subclass holding an indexed signature with an
/// optional verfer property for the associated verifier public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Siger {
    base: BaseIndexer,
    verfer: Option<Verfer>,
}

impl Siger {
    /// Creates a Siger from raw signature bytes, index, and optional verfer
    pub fn new(raw: &[u8], index: u32, verfer: Option<Verfer>) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseIndexer::new(raw, idx_dex::ED25519_SIG, index)?,
            verfer,
        })
    }

    /// Creates a Siger from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseIndexer::from_qb64(qb64)?,
            verfer: None,
        })
    }

    /// Returns the associated verifier key if any
    pub fn verfer(&self) -> Option<&Verfer> {
        self.verfer.as_ref()
    }
}

impl Indexer for Siger {
    fn code(&self) -> &str {
        self.base.code()
    }
    fn raw(&self) -> &[u8] {
        self.base.raw()
    }
    fn index(&self) -> u32 {
        self.base.index()
    }
    fn qb64(&self) -> String {
        self.base.qb64()
    }
}

// Sigers are stored through the same typed sub-database views as Matter
// primitives, so expose the Matter surface over the indexed base.
impl crate::cesr::Matter for Siger {
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

impl crate::cesr::Parsable for Siger {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| MatterError::EncodingError(format!("Invalid UTF-8 in qb64: {}", e)))?;
        let siger = Self::from_qb64(text)?;
        if strip.unwrap_or(false) {
            let fs = Indexer::full_size(&siger);
            data.drain(..fs);
        }
        Ok(siger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_siger() {
        let raw = [4u8; 64];
        let siger = Siger::new(&raw, 0, None).unwrap();
        assert_eq!(siger.index(), 0);
        assert_eq!(siger.qb64().len(), 88);

        let again = Siger::from_qb64(&siger.qb64()).unwrap();
        assert_eq!(again.raw(), siger.raw());
        assert_eq!(again.index(), 0);
    }
}

use crate::cesr::{mtr_dex, BaseMatter, Matter, Parsable};
use crate::errors::MatterError;

/// Diger is Matter subclass holding a digest of serialized content.
/// Default derivation is Blake3-256.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diger {
    base: BaseMatter,
}

impl Diger {
    /// Creates a new Diger by digesting the serialization ser
    pub fn new_with_ser(ser: &[u8], code: Option<&str>) -> Result<Self, MatterError> {
        let code = code.unwrap_or(mtr_dex::BLAKE3_256);
        let raw = match code {
            mtr_dex::BLAKE3_256 => blake3::hash(ser).as_bytes().to_vec(),
            _ => return Err(MatterError::InvalidCode(code.to_string())),
        };
        Ok(Self {
            base: BaseMatter::new(&raw, code)?,
        })
    }

    /// Creates a new Diger from raw digest bytes and code
    pub fn new(raw: &[u8], code: Option<&str>) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::new(raw, code.unwrap_or(mtr_dex::BLAKE3_256))?,
        })
    }

    /// Creates a Diger from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64(qb64)?,
        })
    }

    /// Returns true when this digest matches the serialization ser
    pub fn verify(&self, ser: &[u8]) -> bool {
        match self.code() {
            mtr_dex::BLAKE3_256 => blake3::hash(ser).as_bytes() == self.raw(),
            _ => false,
        }
    }
}

impl Matter for Diger {
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

impl Parsable for Diger {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64b(data, strip)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diger_digest_and_verify() {
        let ser = b"abcdefghijklmnopqrstuvwxyz";
        let diger = Diger::new_with_ser(ser, None).unwrap();
        assert_eq!(diger.code(), mtr_dex::BLAKE3_256);
        assert_eq!(diger.qb64().len(), 44);
        assert!(diger.verify(ser));
        assert!(!diger.verify(b"tampered"));

        let again = Diger::from_qb64(&diger.qb64()).unwrap();
        assert_eq!(again.raw(), diger.raw());
    }
}

use crate::cesr::{mtr_dex, BaseMatter, Matter, Parsable};
use crate::errors::MatterError;

/// Saider is Matter subclass for a self-addressing identifier derived
/// from the serialization of the content it identifies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saider {
    base: BaseMatter,
}

impl Saider {
    /// Creates a Saider by digesting the serialization ser
    pub fn new_with_ser(ser: &[u8]) -> Result<Self, MatterError> {
        let raw = blake3::hash(ser).as_bytes().to_vec();
        Ok(Self {
            base: BaseMatter::new(&raw, mtr_dex::BLAKE3_256)?,
        })
    }

    /// Creates a Saider from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64(qb64)?,
        })
    }

    /// Returns true when this said matches the serialization ser
    pub fn verify(&self, ser: &[u8]) -> bool {
        blake3::hash(ser).as_bytes() == self.raw()
    }
}

impl Matter for Saider {
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

impl Parsable for Saider {
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
    fn test_saider() {
        let ser = b"{\"d\":\"############################################\"}";
        let saider = Saider::new_with_ser(ser).unwrap();
        assert!(saider.qb64().starts_with('E'));
        assert!(saider.verify(ser));

        let again = Saider::from_qb64(&saider.qb64()).unwrap();
        assert_eq!(again, saider);
    }
}

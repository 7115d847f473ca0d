//! Serializable/deserializable self-addressing documents
//!
//! A Serder wraps one serialized field map (SAD) with its version string,
//! serialization kind, size, and self-addressing identifier. JSON is the
//! canonical kind; CBOR and MessagePack serializations are accepted.

use crate::cesr::saider::Saider;
use crate::cesr::Matter;
use crate::vir::{protos, smell, versify, Kinds, Smellage, VIRError, Versionage, VERSION};
use serde_json::Value;

/// Label of the primary self-addressing field
pub const SAID_LABEL: &str = "d";

/// Placeholder filled into saidive fields while deriving the digest
pub const SAID_DUMMY: &str = "############################################";

/// Trait for types reconstructible from their raw serialization, used by
/// the Serder keyed sub database views
pub trait Rawifiable: Sized {
    fn from_raw(raw: &[u8]) -> Result<Self, VIRError>;
    fn raw(&self) -> &[u8];
}

/// Serder is the wrapper for a serialized self-addressing field map
#[derive(Debug, Clone, PartialEq)]
pub struct Serder {
    raw: Vec<u8>,
    ked: Value,
    proto: String,
    vrsn: Versionage,
    kind: Kinds,
    size: usize,
    said: Option<String>,
}

impl Serder {
    /// Inhales a Serder from its raw serialization
    pub fn from_raw(raw: &[u8]) -> Result<Self, VIRError> {
        let Smellage {
            proto,
            vrsn,
            kind,
            size,
        } = smell(raw)?;
        if raw.len() < size {
            return Err(VIRError::DeserializeError(format!(
                "Short raw: need {} bytes, have {}",
                size,
                raw.len()
            )));
        }
        let raw = raw[..size].to_vec();
        let ked = deserialize(&raw, kind)?;
        let said = ked
            .get(SAID_LABEL)
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Self {
            raw,
            ked,
            proto,
            vrsn,
            kind,
            size,
            said,
        })
    }

    /// Makifies a Serder from a field map: sizes the version string,
    /// derives the self-addressing digest over the dummied serialization,
    /// and fills it into the said label
    pub fn from_sad(mut ked: Value, proto: &str, kind: Kinds) -> Result<Self, VIRError> {
        let map = ked
            .as_object_mut()
            .ok_or_else(|| VIRError::ValueError("SAD must be a field map".to_string()))?;
        map.insert(
            "v".to_string(),
            Value::String(versify(proto, VERSION, kind, 0)),
        );
        // keep the size stable across the dummy pass
        let saidive = map.contains_key(SAID_LABEL);
        if saidive {
            map.insert(SAID_LABEL.to_string(), Value::String(SAID_DUMMY.to_string()));
        }

        let dummy_raw = serialize(&ked, kind)?;
        let size = dummy_raw.len();
        let vs = versify(proto, VERSION, kind, size);
        let map = ked.as_object_mut().expect("field map verified above");
        map.insert("v".to_string(), Value::String(vs));

        let said = if saidive {
            let sized_raw = serialize(&ked, kind)?;
            let saider = Saider::new_with_ser(&sized_raw)?;
            let qb64 = saider.qb64();
            let map = ked.as_object_mut().expect("field map verified above");
            map.insert(SAID_LABEL.to_string(), Value::String(qb64.clone()));
            Some(qb64)
        } else {
            None
        };

        let raw = serialize(&ked, kind)?;
        if raw.len() != size {
            return Err(VIRError::ValueError(format!(
                "Dummied size {} differs from final size {}",
                size,
                raw.len()
            )));
        }
        Ok(Self {
            raw,
            ked,
            proto: proto.to_string(),
            vrsn: VERSION,
            kind,
            size,
            said,
        })
    }

    /// Makifies a KERI protocol JSON Serder from a field map
    pub fn from_ked(ked: Value) -> Result<Self, VIRError> {
        Self::from_sad(ked, protos::KERI, Kinds::Json)
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn ked(&self) -> &Value {
        &self.ked
    }

    pub fn proto(&self) -> &str {
        &self.proto
    }

    pub fn vrsn(&self) -> Versionage {
        self.vrsn
    }

    pub fn kind(&self) -> Kinds {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Self-addressing identifier of this document
    pub fn said(&self) -> Option<&str> {
        self.said.as_deref()
    }

    /// Self-addressing identifier as bytes
    pub fn saidb(&self) -> Vec<u8> {
        self.said.clone().unwrap_or_default().into_bytes()
    }

    /// Packet type (ilk) field
    pub fn ilk(&self) -> Option<&str> {
        self.ked.get("t").and_then(Value::as_str)
    }

    /// Identifier prefix field
    pub fn pre(&self) -> Option<&str> {
        self.ked.get("i").and_then(Value::as_str)
    }

    /// Sequence number field, hex encoded
    pub fn snh(&self) -> Option<&str> {
        self.ked.get("s").and_then(Value::as_str)
    }
}

impl Rawifiable for Serder {
    fn from_raw(raw: &[u8]) -> Result<Self, VIRError> {
        Serder::from_raw(raw)
    }

    fn raw(&self) -> &[u8] {
        &self.raw
    }
}

fn serialize(ked: &Value, kind: Kinds) -> Result<Vec<u8>, VIRError> {
    match kind {
        Kinds::Json => serde_json::to_vec(ked)
            .map_err(|e| VIRError::DeserializeError(format!("JSON serialize: {}", e))),
        Kinds::Cbor => serde_cbor::to_vec(ked)
            .map_err(|e| VIRError::DeserializeError(format!("CBOR serialize: {}", e))),
        Kinds::Mgpk => rmp_serde::to_vec(ked)
            .map_err(|e| VIRError::DeserializeError(format!("MGPK serialize: {}", e))),
    }
}

fn deserialize(raw: &[u8], kind: Kinds) -> Result<Value, VIRError> {
    match kind {
        Kinds::Json => serde_json::from_slice(raw)
            .map_err(|e| VIRError::DeserializeError(format!("JSON deserialize: {}", e))),
        Kinds::Cbor => serde_cbor::from_slice(raw)
            .map_err(|e| VIRError::DeserializeError(format!("CBOR deserialize: {}", e))),
        Kinds::Mgpk => rmp_serde::from_slice(raw)
            .map_err(|e| VIRError::DeserializeError(format!("MGPK deserialize: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serder_makify_round_trip() {
        let ked = json!({
            "v": "",
            "t": "iss",
            "d": "",
            "i": "EFakeVcSaidAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "s": "0",
            "ri": "EFakeRegSaidAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
        });
        let serder = Serder::from_ked(ked).unwrap();
        assert_eq!(serder.proto(), protos::KERI);
        assert_eq!(serder.kind(), Kinds::Json);
        assert_eq!(serder.ilk(), Some("iss"));
        assert_eq!(serder.size(), serder.raw().len());
        let said = serder.said().unwrap().to_string();
        assert_eq!(said.len(), 44);
        assert!(said.starts_with('E'));

        let again = Serder::from_raw(serder.raw()).unwrap();
        assert_eq!(again.said(), Some(said.as_str()));
        assert_eq!(again.ked(), serder.ked());
        assert_eq!(again.size(), serder.size());
    }

    #[test]
    fn test_serder_trailing_bytes_ignored() {
        let serder = Serder::from_ked(json!({"v": "", "t": "exn", "d": ""})).unwrap();
        let mut buf = serder.raw().to_vec();
        buf.extend_from_slice(b"-VAA");
        let again = Serder::from_raw(&buf).unwrap();
        assert_eq!(again.raw(), serder.raw());
    }

    #[test]
    fn test_serder_bad_version() {
        assert!(Serder::from_raw(b"{\"v\":\"bogus\"}").is_err());
    }

    #[test]
    fn test_serder_without_said_label() {
        let serder = Serder::from_sad(
            json!({"v": "", "t": "rpy", "r": "/end/role/add"}),
            protos::KERI,
            Kinds::Json,
        )
        .unwrap();
        assert_eq!(serder.said(), None);
        assert_eq!(serder.ilk(), Some("rpy"));
    }
}

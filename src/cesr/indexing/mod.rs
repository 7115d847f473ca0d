//! Indexed CESR material
//!
//! Indexed primitives carry an offset into a key or backer list in the
//! soft part of their derivation code.

pub mod siger;

use crate::cesr::{decode_b64, encode_b64, int_to_b64, B64_CHARS};
use crate::errors::MatterError;

/// Derivation codes for indexed material
pub mod idx_dex {
    /// Ed25519 indexed signature, current and prior next identical
    pub const ED25519_SIG: &str = "A";
}

/// Size information for indexed codes: (hard, soft, full) char sizes
fn idx_sizes(code: &str) -> Result<(usize, usize, usize), MatterError> {
    match code {
        idx_dex::ED25519_SIG => Ok((1, 1, 88)),
        _ => Err(MatterError::InvalidCode(code.to_string())),
    }
}

/// Core trait for indexed cryptographic material
pub trait Indexer {
    /// Derivation code
    fn code(&self) -> &str;

    /// Raw material bytes
    fn raw(&self) -> &[u8];

    /// Offset into the relevant key or backer list
    fn index(&self) -> u32;

    /// Fully qualified Base64 representation
    fn qb64(&self) -> String;

    /// Fully qualified Base64 representation as bytes
    fn qb64b(&self) -> Vec<u8> {
        self.qb64().into_bytes()
    }

    /// Number of characters in the fully qualified representation
    fn full_size(&self) -> usize {
        self.qb64().len()
    }
}

/// Common implementation for all Indexer types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseIndexer {
    code: String,
    raw: Vec<u8>,
    index: u32,
}

impl BaseIndexer {
    /// Creates a new BaseIndexer from raw bytes, code, and index
    pub fn new(raw: &[u8], code: &str, index: u32) -> Result<Self, MatterError> {
        let (hs, ss, fs) = idx_sizes(code)?;
        let cs = hs + ss;
        let rs = (fs - cs) * 3 / 4;
        if raw.len() != rs {
            return Err(MatterError::InvalidRawSize(format!(
                "Invalid raw size for code {}: expected {}, got {}",
                code,
                rs,
                raw.len()
            )));
        }
        if index as u64 > 63 {
            return Err(MatterError::InvalidVarIndex(format!(
                "Invalid index={} for code={}",
                index, code
            )));
        }
        Ok(Self {
            code: code.to_string(),
            raw: raw.to_vec(),
            index,
        })
    }

    /// Creates from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        Self::exfil(qb64).map(|(i, _)| i)
    }

    fn exfil(qb64: &str) -> Result<(Self, usize), MatterError> {
        if qb64.is_empty() {
            return Err(MatterError::EmptyMaterial);
        }
        let hard = &qb64[..1];
        let (hs, ss, fs) = idx_sizes(hard)?;
        let cs = hs + ss;
        if qb64.len() < fs {
            return Err(MatterError::ShortageError(format!(
                "Need {} more characters.",
                fs - qb64.len()
            )));
        }
        let soft = qb64.as_bytes()[hs];
        let index = B64_CHARS
            .iter()
            .position(|&b| b == soft)
            .ok_or_else(|| MatterError::EncodingError(format!("Invalid index char={}", soft as char)))?
            as u32;
        let ps = cs % 4;
        let mut base = "A".repeat(ps);
        base.push_str(&qb64[cs..fs]);
        let paw = decode_b64(&base)?;
        Ok((
            Self {
                code: hard.to_string(),
                raw: paw[ps..].to_vec(),
                index,
            },
            fs,
        ))
    }

    fn infil(&self) -> Result<String, MatterError> {
        let (hs, ss, fs) = idx_sizes(&self.code)?;
        let cs = hs + ss;
        let ps = (3 - (self.raw.len() % 3)) % 3;
        if ps != cs % 4 {
            return Err(MatterError::InvalidCodeSize(format!(
                "Mismatched pad size for code {}",
                self.code
            )));
        }
        let mut padded = vec![0u8; ps];
        padded.extend_from_slice(&self.raw);
        let encoded = encode_b64(&padded);
        let mut both = format!("{}{}", self.code, int_to_b64(self.index as u64, ss));
        both.push_str(&encoded[ps..]);
        if both.len() != fs {
            return Err(MatterError::InvalidCodeSize(format!(
                "Invalid full size={} for code {}",
                both.len(),
                self.code
            )));
        }
        Ok(both)
    }
}

impl Indexer for BaseIndexer {
    fn code(&self) -> &str {
        &self.code
    }
    fn raw(&self) -> &[u8] {
        &self.raw
    }
    fn index(&self) -> u32 {
        self.index
    }
    fn qb64(&self) -> String {
        self.infil().unwrap_or_default()
    }
}

//! CESR primitive handling
//!
//! Provides the core trait and base implementation for fully qualified
//! cryptographic material in the text (qb64) domain, plus the derivation
//! code tables used by this crate.

pub mod cigar;
pub mod counting;
pub mod dater;
pub mod diger;
pub mod indexing;
pub mod pather;
pub mod prefixer;
pub mod saider;
pub mod seqner;
pub mod verfer;

use crate::errors::MatterError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Base64 URL-safe alphabet in CESR ordinal order
pub const B64_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Derivation codes for Matter
pub mod mtr_dex {
    pub const ED25519_SEED: &str = "A";
    pub const ED25519N: &str = "B";
    pub const X25519: &str = "C";
    pub const ED25519: &str = "D";
    pub const BLAKE3_256: &str = "E";
    pub const SALT_128: &str = "0A";
    pub const ED25519_SIG: &str = "0B";
    pub const STR_B64_L0: &str = "4A";
    pub const STR_B64_L1: &str = "5A";
    pub const STR_B64_L2: &str = "6A";
    pub const DATETIME: &str = "1AAG";
}

/// Digestive derivation codes
pub const DIG_CODES: &[&str] = &[mtr_dex::BLAKE3_256];

/// Non-transferable derivation codes
pub const NON_TRANS_CODES: &[&str] = &[mtr_dex::ED25519N];

/// Size information for a derivation code
///
/// hs is hard size, ss is soft size, fs is full size (None when variable
/// sized), ls is lead byte size.
#[derive(Debug, Clone, Copy)]
pub struct Sizage {
    pub hs: usize,
    pub ss: usize,
    pub fs: Option<usize>,
    pub ls: usize,
}

/// Returns size information for code
pub fn sizes(code: &str) -> Result<Sizage, MatterError> {
    let szg = match code {
        "A" | "B" | "C" | "D" | "E" => Sizage { hs: 1, ss: 0, fs: Some(44), ls: 0 },
        "0A" => Sizage { hs: 2, ss: 0, fs: Some(24), ls: 0 },
        "0B" => Sizage { hs: 2, ss: 0, fs: Some(88), ls: 0 },
        "4A" => Sizage { hs: 2, ss: 2, fs: None, ls: 0 },
        "5A" => Sizage { hs: 2, ss: 2, fs: None, ls: 1 },
        "6A" => Sizage { hs: 2, ss: 2, fs: None, ls: 2 },
        "1AAG" => Sizage { hs: 4, ss: 0, fs: Some(36), ls: 0 },
        _ => return Err(MatterError::InvalidCode(code.to_string())),
    };
    Ok(szg)
}

/// Returns raw size in bytes for a fixed size code
pub fn raw_size(code: &str) -> Result<usize, MatterError> {
    let szg = sizes(code)?;
    let fs = szg
        .fs
        .ok_or_else(|| MatterError::InvalidCodeSize(format!("Variable sized code={}", code)))?;
    let cs = szg.hs + szg.ss;
    Ok((fs - cs) * 3 / 4 - szg.ls)
}

/// Returns hard code size given the first character of a code
pub fn hard_size(first: char) -> Result<usize, MatterError> {
    match first {
        'A'..='Z' | 'a'..='z' => Ok(1),
        '0' | '4' | '5' | '6' => Ok(2),
        '1' | '2' | '3' | '7' | '8' | '9' => Ok(4),
        '-' => Err(MatterError::UnexpectedCode(
            "Unexpected count code start while extracting Matter".to_string(),
        )),
        '_' => Err(MatterError::UnexpectedCode(
            "Unexpected op code start while extracting Matter".to_string(),
        )),
        _ => Err(MatterError::InvalidCode(format!(
            "Invalid code start char={}",
            first
        ))),
    }
}

/// Converts an unsigned integer to a Base64 string of length l
pub fn int_to_b64(i: u64, l: usize) -> String {
    let mut chars = Vec::new();
    let mut n = i;
    loop {
        chars.push(B64_CHARS[(n % 64) as usize] as char);
        n /= 64;
        if n == 0 {
            break;
        }
    }
    while chars.len() < l {
        chars.push('A');
    }
    chars.reverse();
    chars.into_iter().collect()
}

/// Converts a Base64 string to an unsigned integer
pub fn b64_to_int(s: &str) -> Result<u64, MatterError> {
    let mut i: u64 = 0;
    for c in s.bytes() {
        let idx = B64_CHARS
            .iter()
            .position(|&b| b == c)
            .ok_or_else(|| MatterError::EncodingError(format!("Invalid Base64 char={}", c as char)))?;
        i = i
            .checked_mul(64)
            .and_then(|v| v.checked_add(idx as u64))
            .ok_or_else(|| MatterError::ValueError("Base64 int overflow".to_string()))?;
    }
    Ok(i)
}

/// Decodes unpadded URL-safe Base64 text to bytes
pub fn decode_b64(text: &str) -> Result<Vec<u8>, MatterError> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| MatterError::EncodingError(format!("{}", e)))
}

/// Encodes bytes as unpadded URL-safe Base64 text
pub fn encode_b64(raw: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(raw)
}

/// Core trait for fully qualified cryptographic material
pub trait Matter {
    /// Derivation code
    fn code(&self) -> &str;

    /// Raw material bytes
    fn raw(&self) -> &[u8];

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

    /// Whether the material is a transferable identifier
    fn is_transferable(&self) -> bool {
        !NON_TRANS_CODES.contains(&self.code())
    }

    /// Whether the material is a digest
    fn is_digestive(&self) -> bool {
        DIG_CODES.contains(&self.code())
    }
}

/// Trait for material parseable from the front of a qb64 byte stream
pub trait Parsable: Sized {
    /// Extracts an instance from the front of data, stripping the consumed
    /// characters when strip is true
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError>;
}

/// Common implementation for all Matter types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseMatter {
    code: String,
    raw: Vec<u8>,
}

impl BaseMatter {
    /// Creates a new BaseMatter from raw bytes and a derivation code
    pub fn new(raw: &[u8], code: &str) -> Result<Self, MatterError> {
        let szg = sizes(code)?;
        if let Some(_fs) = szg.fs {
            let rs = raw_size(code)?;
            if raw.len() != rs {
                return Err(MatterError::InvalidRawSize(format!(
                    "Invalid raw size for code {}: expected {}, got {}",
                    code,
                    rs,
                    raw.len()
                )));
            }
        } else if (szg.ls + raw.len()) % 3 != 0 {
            return Err(MatterError::InvalidRawSize(format!(
                "Invalid raw size={} for variable code {}",
                raw.len(),
                code
            )));
        }
        Ok(Self {
            code: code.to_string(),
            raw: raw.to_vec(),
        })
    }

    /// Creates from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        Self::exfil(qb64).map(|(m, _)| m)
    }

    // Extracts (matter, consumed chars) from the front of qb64 text
    fn exfil(qb64: &str) -> Result<(Self, usize), MatterError> {
        if qb64.is_empty() {
            return Err(MatterError::EmptyMaterial);
        }
        let first = qb64.chars().next().ok_or(MatterError::EmptyMaterial)?;
        let hs = hard_size(first)?;
        if qb64.len() < hs {
            return Err(MatterError::ShortageError(format!(
                "Need {} more characters.",
                hs - qb64.len()
            )));
        }
        let hard = &qb64[..hs];
        let szg = sizes(hard)?;
        let cs = szg.hs + szg.ss;

        let fs = match szg.fs {
            Some(fs) => fs,
            None => {
                // variable sized, soft holds quadlet count of value part
                if qb64.len() < cs {
                    return Err(MatterError::ShortageError(format!(
                        "Need {} more characters.",
                        cs - qb64.len()
                    )));
                }
                let soft = &qb64[szg.hs..cs];
                let quadlets = b64_to_int(soft)? as usize;
                cs + quadlets * 4
            }
        };
        if qb64.len() < fs {
            return Err(MatterError::ShortageError(format!(
                "Need {} more characters.",
                fs - qb64.len()
            )));
        }

        let raw = if szg.fs.is_some() {
            let ps = cs % 4; // net pad size for fixed size codes
            let mut base = "A".repeat(ps);
            base.push_str(&qb64[cs..fs]);
            let paw = decode_b64(&base)?;
            paw[ps + szg.ls..].to_vec()
        } else {
            let paw = decode_b64(&qb64[cs..fs])?;
            paw[szg.ls..].to_vec()
        };

        Ok((
            Self {
                code: hard.to_string(),
                raw,
            },
            fs,
        ))
    }

    // Fully qualified Base64 text from code and raw
    fn infil(&self) -> Result<String, MatterError> {
        let szg = sizes(&self.code)?;
        let cs = szg.hs + szg.ss;
        let rs = self.raw.len();

        if szg.fs.is_none() {
            // variable sized: soft is quadlet count of value part
            if (szg.ls + rs) % 3 != 0 {
                return Err(MatterError::InvalidRawSize(format!(
                    "Nonintegral quadlets for code {} raw size {}",
                    self.code, rs
                )));
            }
            let quadlets = (szg.ls + rs) / 3;
            let mut padded = vec![0u8; szg.ls];
            padded.extend_from_slice(&self.raw);
            let mut both = format!("{}{}", self.code, int_to_b64(quadlets as u64, szg.ss));
            both.push_str(&encode_b64(&padded));
            return Ok(both);
        }

        let ps = (3 - ((rs + szg.ls) % 3)) % 3;
        if ps != cs % 4 {
            return Err(MatterError::InvalidCodeSize(format!(
                "Mismatched pad size for code {}",
                self.code
            )));
        }
        let mut padded = vec![0u8; ps + szg.ls];
        padded.extend_from_slice(&self.raw);
        let encoded = encode_b64(&padded);
        let mut both = self.code.clone();
        both.push_str(&encoded[ps..]);
        if both.len() % 4 != 0 || Some(both.len()) != szg.fs {
            return Err(MatterError::InvalidCodeSize(format!(
                "Invalid full size={} for code {}",
                both.len(),
                self.code
            )));
        }
        Ok(both)
    }
}

impl Matter for BaseMatter {
    fn code(&self) -> &str {
        &self.code
    }

    fn raw(&self) -> &[u8] {
        &self.raw
    }

    fn qb64(&self) -> String {
        // infil only fails for mismatched code tables which new() precludes
        self.infil().unwrap_or_default()
    }
}

impl Parsable for BaseMatter {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| MatterError::EncodingError(format!("Invalid UTF-8 in qb64: {}", e)))?;
        let (matter, fs) = Self::exfil(text)?;
        if strip.unwrap_or(false) {
            data.drain(..fs);
        }
        Ok(matter)
    }
}

use crate::cesr::{decode_b64, encode_b64, mtr_dex, BaseMatter, Matter, Parsable};
use crate::errors::MatterError;
use chrono::{DateTime, SecondsFormat, Utc};

/// Dater is Matter subclass holding an extended ISO-8601 datetime.
///
/// The datetime text is carried in the Base64 value domain by substituting
/// 'c' for ':', 'd' for '.', and 'p' for '+' so the 32 char stamp maps
/// directly onto Base64 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dater {
    base: BaseMatter,
}

impl Dater {
    /// Creates a Dater from an ISO-8601 datetime string, defaulting to now
    pub fn new(dts: Option<&str>) -> Result<Self, MatterError> {
        let dts = match dts {
            Some(d) => d.to_string(),
            None => now_iso8601(),
        };
        if dts.len() != 32 {
            return Err(MatterError::ValueError(format!(
                "Invalid ISO-8601 datetime stamp = {}",
                dts
            )));
        }
        let bext: String = dts
            .chars()
            .map(|c| match c {
                ':' => 'c',
                '.' => 'd',
                '+' => 'p',
                other => other,
            })
            .collect();
        let raw = decode_b64(&bext)?;
        Ok(Self {
            base: BaseMatter::new(&raw, mtr_dex::DATETIME)?,
        })
    }

    /// Creates a Dater from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64(qb64)?,
        })
    }

    /// Returns the ISO-8601 datetime stamp text
    pub fn dts(&self) -> String {
        encode_b64(self.base.raw())
            .chars()
            .map(|c| match c {
                'c' => ':',
                'd' => '.',
                'p' => '+',
                other => other,
            })
            .collect()
    }

    /// Returns the parsed datetime
    pub fn datetime(&self) -> Result<DateTime<Utc>, MatterError> {
        DateTime::parse_from_rfc3339(&self.dts())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MatterError::ValueError(format!("Invalid datetime: {}", e)))
    }
}

/// Returns the current UTC time as a 32 char extended ISO-8601 stamp
pub fn now_iso8601() -> String {
    Utc::now()
        .to_rfc3339_opts(SecondsFormat::Micros, false)
        .replace('Z', "+00:00")
}

impl Matter for Dater {
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

impl Parsable for Dater {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64b(data, strip)?,
        })
    }
}

//! VIR - Verifiable Issuance/Revocation Registry
//!
//! Shared protocol constants, error kinds, and version string handling.

pub mod app;
pub mod core;
pub mod db;
pub mod vc;
pub mod vdr;

use crate::errors::MatterError;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of characters in a full version string
pub const VERFULLSPAN: usize = 17;

/// Maximum offset of the version string within a serialization
pub const MAXVSOFFSET: usize = 12;

/// Minimum buffer size needed to "smell" the version string
pub const SMELLSIZE: usize = MAXVSOFFSET + VERFULLSPAN;

/// Regular expression pattern for the version string
pub const VEREX: &str =
    r"(?P<proto>[A-Z]{4})(?P<major>[0-9a-f])(?P<minor>[0-9a-f])(?P<kind>[A-Z]{4})(?P<size>[0-9a-f]{6})_";

/// Compiled regular expression for version detection
pub static REVER: Lazy<Regex> =
    Lazy::new(|| Regex::new(VEREX).expect("Failed to compile version regex"));

/// Top level error kinds for the registry core
#[derive(Error, Debug)]
pub enum VIRError {
    /// Reference to a body or anchor that is not present; stops a replay
    #[error("Missing entry error: {0}")]
    MissingEntryError(String),

    /// Non quadlet attachment length or malformed counter
    #[error("Framing error: {0}")]
    FramingError(String),

    /// Endpoint resolution failed or addressed peer unreachable
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Cache miss that cannot be rehydrated
    #[error("Not found error: {0}")]
    NotFoundError(String),

    /// Anchor or signature mismatch
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Version error: {0}")]
    VersionError(String),

    #[error("Kind error: {0}")]
    KindError(String),

    #[error("Value error: {0}")]
    ValueError(String),

    #[error("Deserialization error: {0}")]
    DeserializeError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Matter error: {0}")]
    MatterError(#[from] MatterError),

    #[error("DB error: {0}")]
    DBError(#[from] crate::vir::db::errors::DBError),

    #[error("Suber error: {0}")]
    SuberError(#[from] crate::vir::db::subing::SuberError),
}

/// End role kinds for endpoint authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Roles {
    Controller,
    Witness,
    Registrar,
    Watcher,
    Judge,
    Juror,
    Peer,
    Mailbox,
    Agent,
}

impl Roles {
    pub fn as_str(&self) -> &'static str {
        match self {
            Roles::Controller => "controller",
            Roles::Witness => "witness",
            Roles::Registrar => "registrar",
            Roles::Watcher => "watcher",
            Roles::Judge => "judge",
            Roles::Juror => "juror",
            Roles::Peer => "peer",
            Roles::Mailbox => "mailbox",
            Roles::Agent => "agent",
        }
    }
}

impl fmt::Display for Roles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Roles {
    type Err = VIRError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "controller" => Ok(Roles::Controller),
            "witness" => Ok(Roles::Witness),
            "registrar" => Ok(Roles::Registrar),
            "watcher" => Ok(Roles::Watcher),
            "judge" => Ok(Roles::Judge),
            "juror" => Ok(Roles::Juror),
            "peer" => Ok(Roles::Peer),
            "mailbox" => Ok(Roles::Mailbox),
            "agent" => Ok(Roles::Agent),
            _ => Err(VIRError::ValueError(format!("Invalid role = {}", s))),
        }
    }
}

/// Message ilks (packet types) handled by the registry core
pub mod ilks {
    pub const ICP: &str = "icp";
    pub const ROT: &str = "rot";
    pub const IXN: &str = "ixn";
    pub const RPY: &str = "rpy";
    pub const EXN: &str = "exn";
    pub const VCP: &str = "vcp";
    pub const VRT: &str = "vrt";
    pub const ISS: &str = "iss";
    pub const REV: &str = "rev";
    pub const BIS: &str = "bis";
    pub const BRV: &str = "brv";
}

/// Protocol identifiers
pub mod protos {
    pub const KERI: &str = "KERI";
    pub const ACDC: &str = "ACDC";
}

/// Serialization kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kinds {
    Json,
    Cbor,
    Mgpk,
}

impl Kinds {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kinds::Json => "JSON",
            Kinds::Cbor => "CBOR",
            Kinds::Mgpk => "MGPK",
        }
    }
}

impl FromStr for Kinds {
    type Err = VIRError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JSON" => Ok(Kinds::Json),
            "CBOR" => Ok(Kinds::Cbor),
            "MGPK" => Ok(Kinds::Mgpk),
            _ => Err(VIRError::KindError(s.to_string())),
        }
    }
}

/// Protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Versionage {
    pub major: u8,
    pub minor: u8,
}

/// Current protocol version
pub const VERSION: Versionage = Versionage { major: 1, minor: 0 };

/// Parsed version string fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smellage {
    pub proto: String,
    pub vrsn: Versionage,
    pub kind: Kinds,
    pub size: usize,
}

/// Returns a version string for proto, version, kind, and size
pub fn versify(proto: &str, vrsn: Versionage, kind: Kinds, size: usize) -> String {
    format!(
        "{}{:x}{:x}{}{:06x}_",
        proto,
        vrsn.major,
        vrsn.minor,
        kind.as_str(),
        size
    )
}

/// Parses a version string into its fields
pub fn deversify(vs: &str) -> Result<Smellage, VIRError> {
    smell(vs.as_bytes())
}

/// Extracts the version string fields from the start of a serialization
pub fn smell(raw: &[u8]) -> Result<Smellage, VIRError> {
    let window = &raw[..raw.len().min(SMELLSIZE)];
    let caps = REVER.captures(window).ok_or_else(|| {
        VIRError::VersionError(format!(
            "Invalid version string in = {}",
            String::from_utf8_lossy(window)
        ))
    })?;
    let take = |name: &str| -> String {
        String::from_utf8_lossy(caps.name(name).map(|m| m.as_bytes()).unwrap_or(b"")).to_string()
    };
    let proto = take("proto");
    if proto != protos::KERI && proto != protos::ACDC {
        return Err(VIRError::VersionError(format!("Invalid protocol = {}", proto)));
    }
    let major = u8::from_str_radix(&take("major"), 16)
        .map_err(|e| VIRError::VersionError(format!("Invalid major version: {}", e)))?;
    let minor = u8::from_str_radix(&take("minor"), 16)
        .map_err(|e| VIRError::VersionError(format!("Invalid minor version: {}", e)))?;
    let kind = Kinds::from_str(&take("kind"))?;
    let size = usize::from_str_radix(&take("size"), 16)
        .map_err(|e| VIRError::VersionError(format!("Invalid size: {}", e)))?;
    Ok(Smellage {
        proto,
        vrsn: Versionage { major, minor },
        kind,
        size,
    })
}

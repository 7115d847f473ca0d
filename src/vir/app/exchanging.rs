//! Peer to peer exchange messages
//!
//! An exchange message (exn) carries a route, query modifiers, and an
//! embedded payload under the a field.

use crate::cesr::dater::now_iso8601;
use crate::vir::core::serdering::Serder;
use crate::vir::VIRError;
use serde_json::{json, Value};

/// Creates an exchange message with the payload embedded at the a field
pub fn exchange(
    route: &str,
    modifiers: Value,
    payload: Value,
    date: Option<&str>,
) -> Result<Serder, VIRError> {
    let dt = match date {
        Some(d) => d.to_string(),
        None => now_iso8601(),
    };
    Serder::from_ked(json!({
        "v": "",
        "t": "exn",
        "d": "",
        "dt": dt,
        "r": route,
        "q": modifiers,
        "a": payload,
    }))
}

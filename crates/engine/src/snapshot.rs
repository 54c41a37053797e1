//! Snapshot record format
//!
//! A store persists as one durable record: a plain JSON object mapping
//! entry keys to entry values, stored under a namespaced record key
//! (marker + store name). The marker keeps the sweep from ever touching
//! unrelated keys in a shared backend.
//!
//! Decoding is best-effort: malformed text means "no prior state", and a
//! handful of legacy key names that older record formats co-mingled with
//! data are dropped per key.

use mirrorkv_core::{Error, Result, Value};
use std::collections::BTreeMap;

/// Marker prefixed to every record key written by the mirroring layer
pub const RECORD_MARKER: &str = "_MC_";

/// Key names older record formats could carry alongside data entries.
/// Skipped on replay so a saved key can never shadow a store operation.
const LEGACY_OPERATION_NAMES: [&str; 6] = [
    "setItem",
    "getItem",
    "removeItem",
    "destroy",
    "clear",
    "save",
];

/// Build the namespaced record key for a store name
pub fn record_key(name: &str) -> String {
    format!("{RECORD_MARKER}{name}")
}

/// Extract the store name from a record key, if the key carries the marker
pub fn store_name(key: &str) -> Option<&str> {
    key.strip_prefix(RECORD_MARKER)
}

/// Encode a store's entries as a JSON record
///
/// # Errors
///
/// Returns `Error::Serialization` if any entry holds a non-finite float
/// anywhere in its value tree; JSON has no spelling for those, and quietly
/// writing `null` instead would corrupt the mirror. The caller abandons
/// the write attempt and the store stays usable.
pub fn encode(entries: &BTreeMap<String, Value>) -> Result<String> {
    for (key, value) in entries {
        if !value.is_json_representable() {
            return Err(Error::Serialization(format!(
                "entry '{key}' holds a non-finite float"
            )));
        }
    }
    Ok(serde_json::to_string(entries)?)
}

/// Decode a JSON record into store entries
///
/// Returns `None` for malformed text (treated as no prior state). Legacy
/// operation-name keys are silently dropped per key.
pub fn decode(text: &str) -> Option<BTreeMap<String, Value>> {
    let mut entries: BTreeMap<String, Value> = serde_json::from_str(text).ok()?;
    for name in LEGACY_OPERATION_NAMES {
        entries.remove(name);
    }
    Some(entries)
}

use serde_json::Value;
use tracing::warn;

use crate::api::Campaign;

/// Envelope keys that may wrap the campaign array.
const ENVELOPE_KEYS: &[&str] = &["campaigns", "items", "data"];

/// Turns a `GET /campaigns/` body into a campaign list.
///
/// Accepts a bare array or an object wrapping one under `campaigns`, `items`
/// or `data`. Any other shape (null, scalar, unrelated object) is an empty
/// list. Every object element becomes a campaign, unreadable fields taking
/// their defaults; only non-object elements are skipped.
pub fn normalize_campaigns(body: &Value) -> Vec<Campaign> {
    let Some(items) = collection(body) else {
        if !body.is_null() {
            warn!("Unexpected campaign list shape; treating as empty");
        }
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                warn!(index, "Skipping non-object campaign entry");
                return None;
            }
            serde_json::from_value::<Campaign>(item.clone())
                .inspect_err(|e| warn!(index, "Skipping undecodable campaign: {e}"))
                .ok()
        })
        .collect()
}

fn collection(body: &Value) -> Option<&Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(map) => ENVELOPE_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

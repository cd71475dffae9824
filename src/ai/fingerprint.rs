use ahash::AHasher;
use serde::Serialize;
use std::hash::Hasher;

const DOMAIN_FEEDBACK: u8 = 1;

/// Stable key for a feedback request under a given model.
///
/// Object keys are sorted before hashing so logically equal payloads collide.
pub fn feedback_key(model: &str, request: &impl Serialize) -> Option<u64> {
    let mut normalized = serde_json::to_value(request).ok()?;
    if normalized.is_null() {
        return None;
    }
    normalized.sort_all_objects();
    let bytes = serde_json::to_vec(&normalized).ok()?;

    let mut hasher = AHasher::default();
    hasher.write_u8(DOMAIN_FEEDBACK);
    hasher.write(model.as_bytes());
    hasher.write_u8(0);
    hasher.write(&bytes);
    Some(hasher.finish())
}

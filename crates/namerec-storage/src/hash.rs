//! Deterministic fingerprinting of a feature index using blake3.
//!
//! The fingerprint covers every key and kind in index order, so any
//! reordering, insertion, or rename changes it. Weights are excluded: the
//! fingerprint identifies the coordinate system, not a point in it.

use namerec_core::FeatureIndex;

/// Each field is length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
fn update_field(hasher: &mut blake3::Hasher, text: &str) {
    hasher.update(&(text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());
}

/// Computes the blake3 fingerprint of `features`.
pub fn fingerprint(features: &FeatureIndex) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(features.len() as u64).to_le_bytes());
    for (_, key, kind) in features.iter() {
        update_field(&mut hasher, &key.left);
        update_field(&mut hasher, &key.relation);
        update_field(&mut hasher, &key.right);
        update_field(&mut hasher, kind.as_str());
    }
    hasher.finalize()
}

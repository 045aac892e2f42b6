//! Short content-derived identifiers.
//!
//! An id is `<prefix>-<hex>`, where the hex is taken from a BLAKE3 digest of
//! the record's text and a nanosecond timestamp. Six hex characters are
//! used unless that collides with an existing id, in which case the suffix
//! grows until it is unique.

use blake3::Hasher;

const MIN_HEX: usize = 6;

/// Generate an id not present in `taken`.
pub fn generate<'a>(
    prefix: &str,
    seed: &str,
    taken: impl Iterator<Item = &'a str> + Clone,
) -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    derive(prefix, seed, nanos, taken)
}

fn derive<'a>(
    prefix: &str,
    seed: &str,
    salt: i64,
    taken: impl Iterator<Item = &'a str> + Clone,
) -> String {
    let mut hasher = Hasher::new();
    hasher.update(prefix.as_bytes());
    hasher.update(b":");
    hasher.update(seed.as_bytes());
    hasher.update(&salt.to_le_bytes());
    let hex = hasher.finalize().to_hex().to_string();

    for len in MIN_HEX..=hex.len() {
        let candidate = format!("{prefix}-{}", &hex[..len]);
        if !taken.clone().any(|id| id == candidate) {
            return candidate;
        }
    }
    // A full 64-character digest collision; fall back to a counter suffix.
    (1..)
        .map(|n| format!("{prefix}-{hex}-{n}"))
        .find(|candidate| !taken.clone().any(|id| id == candidate))
        .unwrap_or_else(|| format!("{prefix}-{hex}"))
}

//! Entity tag generation.

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate an opaque entity tag.
///
/// A high-resolution clock reading combined with a process-wide counter is
/// passed through a one-way hash; the counter keeps back-to-back calls
/// distinct even when the clock reading repeats. Tags carry no other
/// structure and must only be compared for equality.
pub fn new_tag() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(nanos.to_be_bytes());
    hasher.update(sequence.to_be_bytes());
    hex::encode(hasher.finalize())
}

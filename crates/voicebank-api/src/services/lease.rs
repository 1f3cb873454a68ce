//! Per-pair upload leases.
//!
//! The canonical file path is shared state guarded only by a
//! check-then-write sequence, so two concurrent uploads for the same
//! `(client_id, sentence_id)` could both pass the duplicate check. The
//! lease closes that window in-process: the first upload holds the pair
//! until its request finishes, the second fails acquisition before writing
//! a single byte. The database unique key remains the cross-process
//! backstop.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

type Registry = Arc<Mutex<HashSet<(String, String)>>>;

#[derive(Clone, Default)]
pub struct UploadLeases {
    inner: Registry,
}

impl UploadLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the pair. `None` means another in-flight upload holds
    /// it. The claim is released when the returned guard drops.
    pub fn acquire(&self, client_id: &str, sentence_id: &str) -> Option<UploadLease> {
        let key = (client_id.to_string(), sentence_id.to_string());
        let mut held = self.inner.lock().expect("lease registry poisoned");
        if !held.insert(key.clone()) {
            return None;
        }
        Some(UploadLease {
            registry: self.inner.clone(),
            key,
        })
    }
}

/// RAII claim on one `(client_id, sentence_id)` pair.
pub struct UploadLease {
    registry: Registry,
    key: (String, String),
}

impl Drop for UploadLease {
    fn drop(&mut self) {
        if let Ok(mut held) = self.registry.lock() {
            held.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquisition_of_a_held_pair_fails() {
        let leases = UploadLeases::new();
        let first = leases.acquire("client-a", "s-1");
        assert!(first.is_some());
        assert!(leases.acquire("client-a", "s-1").is_none());
        // A different pair is unaffected.
        assert!(leases.acquire("client-a", "s-2").is_some());
    }

    #[test]
    fn dropping_the_guard_releases_the_pair() {
        let leases = UploadLeases::new();
        let lease = leases.acquire("client-a", "s-1");
        drop(lease);
        assert!(leases.acquire("client-a", "s-1").is_some());
    }
}

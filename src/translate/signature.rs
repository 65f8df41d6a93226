//! Thin wrapper over `thoughtsig-core`'s signature cache, sized per §3/§9
//! (2 h TTL, unbounded capacity is not used — the cache is capped to bound
//! memory even though the spec only names a TTL).

use thoughtsig_core::ThoughtSignatureEngine;

const SIGNATURE_TTL_SECS: u64 = 2 * 60 * 60;
const SIGNATURE_CACHE_CAPACITY: u64 = 10_000;

#[derive(Clone)]
pub struct SignatureStore {
    engine: std::sync::Arc<ThoughtSignatureEngine>,
}

impl SignatureStore {
    pub fn new() -> Self {
        Self {
            engine: std::sync::Arc::new(ThoughtSignatureEngine::new(
                SIGNATURE_TTL_SECS,
                SIGNATURE_CACHE_CAPACITY,
            )),
        }
    }

    /// Records a signature seen on an outbound tool-call part (§4.2.3).
    /// Signatures shorter than the minimum real length are ignored as
    /// upstream placeholders.
    pub fn record_outbound(&self, tool_use_id: &str, signature: &str) {
        self.engine.put_signature(tool_use_id, signature);
    }

    /// Fills an inbound tool-call part lacking a signature: returns the
    /// cached value if present, otherwise the inert sentinel upstream
    /// accepts in its place.
    pub fn fill_inbound(&self, tool_use_id: &str) -> std::sync::Arc<str> {
        self.engine.get_or_fallback(tool_use_id)
    }
}

impl Default for SignatureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_real_signature() {
        let store = SignatureStore::new();
        let sig = "x".repeat(64);
        store.record_outbound("tool_use_1", &sig);
        assert_eq!(&*store.fill_inbound("tool_use_1"), sig.as_str());
    }

    #[test]
    fn falls_back_to_sentinel_when_uncached() {
        let store = SignatureStore::new();
        assert_eq!(&*store.fill_inbound("never_seen"), "skip_thought_signature_validator");
    }

    #[test]
    fn short_signatures_are_ignored() {
        let store = SignatureStore::new();
        store.record_outbound("tool_use_2", "short");
        assert_eq!(&*store.fill_inbound("tool_use_2"), "skip_thought_signature_validator");
    }
}

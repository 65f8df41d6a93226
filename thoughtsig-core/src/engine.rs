use moka::sync::Cache;
use std::{sync::Arc, time::Duration};

/// Thought signatures are cached by `tool_use_id`: the public-facing
/// tool-call id that round-trips through OpenAI/Anthropic/Gemini clients,
/// which otherwise strip the opaque `thoughtSignature` field they don't
/// understand.
pub type CacheKey = String;
pub type ThoughtSignature = Arc<str>;
pub type SignatureCacheStore = Cache<CacheKey, ThoughtSignature>;

/// Signatures shorter than this are placeholders, not real signatures, and
/// are never written to the cache.
pub const MIN_REAL_SIGNATURE_LEN: usize = 50;

pub struct ThoughtSignatureEngine {
    cache: SignatureCacheStore,
    dummy_signature: ThoughtSignature,
}

impl ThoughtSignatureEngine {
    pub fn new(ttl_secs: u64, max_capacity: u64) -> Self {
        let cache = SignatureCacheStore::builder()
            .time_to_live(Duration::from_secs(ttl_secs.max(1)))
            .max_capacity(max_capacity.max(1))
            .build();
        let dummy_signature: ThoughtSignature = Arc::from("skip_thought_signature_validator");

        Self {
            cache,
            dummy_signature,
        }
    }

    pub fn get_signature(&self, tool_use_id: &str) -> Option<ThoughtSignature> {
        self.cache.get(tool_use_id)
    }

    /// Records a signature seen on an outbound tool-call, unless it looks
    /// like a placeholder (too short to be real).
    pub fn put_signature(&self, tool_use_id: impl Into<CacheKey>, signature: impl AsRef<str>) {
        let signature = signature.as_ref();
        if signature.len() < MIN_REAL_SIGNATURE_LEN {
            return;
        }
        self.cache
            .insert(tool_use_id.into(), Arc::from(signature));
    }

    /// Looks up a cached signature for inbound refill, falling back to the
    /// inert sentinel value when nothing is known.
    pub fn get_or_fallback(&self, tool_use_id: &str) -> ThoughtSignature {
        self.get_signature(tool_use_id)
            .unwrap_or_else(|| self.fallback_signature())
    }

    pub fn fallback_signature(&self) -> ThoughtSignature {
        self.dummy_signature.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_signature_returns_none_when_no_cache() {
        let engine = ThoughtSignatureEngine::new(3600, 1024);
        assert!(engine.get_signature("tool_use_1").is_none());
    }

    #[test]
    fn get_signature_hits_cache_when_present() {
        let engine = ThoughtSignatureEngine::new(3600, 1024);
        engine.put_signature("tool_use_1", "a".repeat(64));

        let signature = engine.get_signature("tool_use_1");
        assert_eq!(signature.as_deref(), Some("a".repeat(64).as_str()));
    }

    #[test]
    fn short_signatures_are_not_cached() {
        let engine = ThoughtSignatureEngine::new(3600, 1024);
        engine.put_signature("tool_use_1", "short");
        assert!(engine.get_signature("tool_use_1").is_none());
    }

    #[test]
    fn get_or_fallback_uses_sentinel_when_missing() {
        let engine = ThoughtSignatureEngine::new(3600, 1024);
        assert_eq!(
            engine.get_or_fallback("missing").as_ref(),
            "skip_thought_signature_validator"
        );
    }

    #[test]
    fn get_or_fallback_prefers_cached_value() {
        let engine = ThoughtSignatureEngine::new(3600, 1024);
        engine.put_signature("tool_use_1", "b".repeat(64));
        assert_eq!(
            engine.get_or_fallback("tool_use_1").as_ref(),
            "b".repeat(64).as_str()
        );
    }
}

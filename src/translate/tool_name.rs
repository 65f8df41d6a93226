//! Tool-name sanitization and the bounded `(session, model, sanitized) →
//! original` mapping cache (§3, §4.2.2).

use moka::sync::Cache;
use std::time::Duration;

const TOOL_NAME_CACHE_TTL: Duration = Duration::from_secs(30 * 60);
const TOOL_NAME_CACHE_CAPACITY: u64 = 512;

/// Replaces characters outside `[A-Za-z0-9_-]` with `_`, trims leading and
/// trailing `_`, falls back to `"tool"` if empty, and caps length at 128.
pub fn sanitize_tool_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    let trimmed = replaced.trim_matches('_');
    let sanitized = if trimmed.is_empty() { "tool" } else { trimmed };
    sanitized.chars().take(128).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ToolNameKey {
    session_id: String,
    model: String,
    sanitized_name: String,
}

/// Bounded TTL+capacity cache from `(session_id, model, sanitized_name)` to
/// the original tool name, so outbound `functionCall.name` values can be
/// rewritten back to what the caller declared.
#[derive(Clone)]
pub struct ToolNameCache {
    inner: Cache<ToolNameKey, String>,
}

impl ToolNameCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(TOOL_NAME_CACHE_CAPACITY)
                .time_to_live(TOOL_NAME_CACHE_TTL)
                .build(),
        }
    }

    /// Records the mapping only when sanitization actually changed the name
    /// (§4.2.2: "If the sanitized form differs from the original").
    pub fn remember(&self, session_id: &str, model: &str, original: &str, sanitized: &str) {
        if original == sanitized {
            return;
        }
        self.inner.insert(
            ToolNameKey {
                session_id: session_id.to_string(),
                model: model.to_string(),
                sanitized_name: sanitized.to_string(),
            },
            original.to_string(),
        );
    }

    /// Looks up the original name for a sanitized one, falling back to the
    /// sanitized name itself when there's no cached mapping (most tool
    /// names need no rewriting at all).
    pub fn resolve(&self, session_id: &str, model: &str, sanitized: &str) -> String {
        self.inner
            .get(&ToolNameKey {
                session_id: session_id.to_string(),
                model: model.to_string(),
                sanitized_name: sanitized.to_string(),
            })
            .unwrap_or_else(|| sanitized.to_string())
    }
}

impl Default for ToolNameCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_invalid_characters() {
        assert_eq!(sanitize_tool_name("my.tool!"), "my_tool");
    }

    #[test]
    fn trims_leading_and_trailing_underscores() {
        assert_eq!(sanitize_tool_name("!!!hello!!!"), "hello");
    }

    #[test]
    fn empty_becomes_tool() {
        assert_eq!(sanitize_tool_name("!!!"), "tool");
    }

    #[test]
    fn caps_length_at_128() {
        let long = "a".repeat(200);
        assert_eq!(sanitize_tool_name(&long).len(), 128);
    }

    #[test]
    fn unchanged_names_are_not_cached() {
        let cache = ToolNameCache::new();
        cache.remember("s1", "m1", "clean_name", "clean_name");
        assert_eq!(cache.resolve("s1", "m1", "clean_name"), "clean_name");
    }

    #[test]
    fn round_trips_within_session_and_model() {
        let cache = ToolNameCache::new();
        cache.remember("s1", "m1", "my.tool!", "my_tool");
        assert_eq!(cache.resolve("s1", "m1", "my_tool"), "my.tool!");
    }

    #[test]
    fn distinct_sessions_do_not_collide() {
        let cache = ToolNameCache::new();
        cache.remember("s1", "m1", "a.b", "a_b");
        cache.remember("s2", "m1", "a!b", "a_b");
        assert_eq!(cache.resolve("s1", "m1", "a_b"), "a.b");
        assert_eq!(cache.resolve("s2", "m1", "a_b"), "a!b");
    }

    #[test]
    fn distinct_models_do_not_collide() {
        let cache = ToolNameCache::new();
        cache.remember("s1", "model-a", "x.y", "x_y");
        cache.remember("s1", "model-b", "x!y", "x_y");
        assert_eq!(cache.resolve("s1", "model-a", "x_y"), "x.y");
        assert_eq!(cache.resolve("s1", "model-b", "x_y"), "x!y");
    }

    #[test]
    fn unknown_sanitized_name_falls_back_to_itself() {
        let cache = ToolNameCache::new();
        assert_eq!(cache.resolve("s1", "m1", "never_seen"), "never_seen");
    }
}

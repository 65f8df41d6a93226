//! The protocol translator (§4.2): pure(ish) functions mapping each public
//! API family to and from the native Antigravity request/response shape,
//! plus the two bounded caches the mapping depends on.

pub mod inbound;
pub mod model;
pub mod outbound;
pub mod signature;
pub mod stream;
pub mod tool_name;

use self::model::ModelFamily;
use self::signature::SignatureStore;
use self::tool_name::ToolNameCache;

/// Shared, process-lifetime state the translator needs across requests: the
/// tool-name and signature caches (§3, §9 — "global state is confined to
/// ... the two caches").
#[derive(Clone)]
pub struct TranslateContext {
    pub tool_names: ToolNameCache,
    pub signatures: SignatureStore,
}

impl TranslateContext {
    pub fn new() -> Self {
        Self {
            tool_names: ToolNameCache::new(),
            signatures: SignatureStore::new(),
        }
    }
}

impl Default for TranslateContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-request bookkeeping threaded from inbound translation through to
/// outbound translation: the identifiers and family facts needed to map the
/// response back into the caller's shape.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub session_id: String,
    pub request_id: String,
    /// The model name as requested by the client, echoed back in responses.
    pub requested_model: String,
    /// After date-suffix stripping and haiku redirection (§4.2.1).
    pub normalized_model: String,
    pub family: ModelFamily,
    pub thinking_capable: bool,
}

//! Id generation: request ids, the deterministic session-id hash, and
//! synthetic tool-call ids for inbound requests that omit them.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// `agent-<uuid>`, assigned fresh to every translated native request (§4.2.4).
pub fn generate_request_id() -> String {
    format!("agent-{}", Uuid::new_v4())
}

/// SHA-256 of the first user-authored text in a conversation, truncated to
/// 32 hex chars; falls back to a random UUID when no user text exists.
/// Used only to namespace the tool-name cache (§3).
pub fn session_id_for(first_user_text: Option<&str>) -> String {
    match first_user_text {
        Some(text) if !text.is_empty() => {
            let digest = Sha256::digest(text.as_bytes());
            hex_prefix(&digest, 32)
        }
        _ => Uuid::new_v4().to_string(),
    }
}

fn hex_prefix(bytes: &[u8], hex_chars: usize) -> String {
    let mut out = String::with_capacity(hex_chars);
    for byte in bytes {
        if out.len() >= hex_chars {
            break;
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out.truncate(hex_chars);
    out
}

/// Synthetic tool-call id for inbound parts that omit one (Gemini family,
/// §4.2.4).
pub fn generate_tool_use_id() -> String {
    format!("tool_use_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_deterministic_for_identical_text() {
        assert_eq!(session_id_for(Some("hello")), session_id_for(Some("hello")));
    }

    #[test]
    fn session_id_changes_with_text() {
        assert_ne!(session_id_for(Some("hello")), session_id_for(Some("world")));
    }

    #[test]
    fn session_id_is_32_hex_chars() {
        let id = session_id_for(Some("hello world"));
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_id_falls_back_to_uuid_when_no_user_text() {
        let id = session_id_for(None);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn request_id_has_agent_prefix() {
        assert!(generate_request_id().starts_with("agent-"));
    }
}

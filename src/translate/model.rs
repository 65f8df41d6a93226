//! Model-family detection and name normalization (§4.2.1).

/// Which public API family a model name most resembles upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Claude,
    Gemini,
    Unknown,
}

impl ModelFamily {
    pub fn detect(model: &str) -> Self {
        let lower = model.to_ascii_lowercase();
        if lower.contains("claude") {
            ModelFamily::Claude
        } else if lower.contains("gemini") {
            ModelFamily::Gemini
        } else {
            ModelFamily::Unknown
        }
    }
}

/// Strips a trailing `-YYYYMMDD` date suffix and redirects haiku models to
/// the gemini flash-lite tier, matching what the upstream actually serves.
pub fn normalize_model_name(model: &str) -> String {
    let stripped = strip_date_suffix(model);
    if stripped.to_ascii_lowercase().contains("haiku") {
        return "gemini-2.5-flash-lite".to_string();
    }
    stripped
}

fn strip_date_suffix(model: &str) -> String {
    if let Some(idx) = model.rfind('-') {
        let (head, tail) = model.split_at(idx);
        let digits = &tail[1..];
        if digits.len() == 8 && digits.bytes().all(|b| b.is_ascii_digit()) {
            return head.to_string();
        }
    }
    model.to_string()
}

/// A model is "thinking-capable" if it's a claude model whose name mentions
/// thinking, or a gemini model whose name mentions thinking or whose major
/// version is ≥ 3 (§4.2.1).
pub fn is_thinking_capable(family: ModelFamily, normalized_model: &str) -> bool {
    let lower = normalized_model.to_ascii_lowercase();
    match family {
        ModelFamily::Claude => lower.contains("thinking"),
        ModelFamily::Gemini => lower.contains("thinking") || gemini_major_version_at_least(&lower, 3),
        ModelFamily::Unknown => false,
    }
}

fn gemini_major_version_at_least(lower_model: &str, min_major: u32) -> bool {
    let Some(rest) = lower_model.strip_prefix("gemini-") else {
        return false;
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().is_ok_and(|major| major >= min_major)
}

/// Gemini upstream caps `maxOutputTokens` at 16384 (§4.2.1).
pub const GEMINI_MAX_OUTPUT_TOKENS: u32 = 16384;

/// Representative model names for the `/v1/models`-style catalog endpoints.
/// The gateway has no real model registry of its own — every request passes
/// its model name through to upstream unexamined beyond family detection —
/// so this list exists only to give catalog-probing clients something
/// sensible to enumerate.
pub const KNOWN_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-pro-thinking",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-3.0-pro",
    "claude-sonnet-4-5",
    "claude-sonnet-4-5-thinking",
    "claude-haiku-3-5",
];

pub fn cap_max_output_tokens(family: ModelFamily, requested: Option<u32>) -> Option<u32> {
    match (family, requested) {
        (ModelFamily::Gemini, Some(n)) => Some(n.min(GEMINI_MAX_OUTPUT_TOKENS)),
        (ModelFamily::Gemini, None) => None,
        (_, requested) => requested,
    }
}

/// `reasoning_effort` (OpenAI) maps to a thinking token budget (§4.2.4).
pub fn reasoning_effort_to_thinking_budget(effort: &str) -> Option<i64> {
    match effort {
        "low" => Some(8000),
        "medium" => Some(16000),
        "high" => Some(32000),
        _ => None,
    }
}

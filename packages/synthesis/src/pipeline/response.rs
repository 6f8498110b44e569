//! AI response hygiene.
//!
//! Providers frequently wrap JSON in markdown code fences despite
//! instructions not to. These helpers strip the wrapping before
//! parsing; a response that still fails to parse is the caller's
//! problem to degrade around, never a reason to abort a job.

/// Strip a leading/trailing markdown code fence, if present.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the info string ("json", "JSON", ...) on the opening fence.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => return trimmed,
    };

    rest.trim_end()
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or_else(|| rest.trim())
}

/// Parse a possibly fence-wrapped JSON payload.
pub fn parse_json<T: serde::de::DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    serde_json::from_str(strip_code_fences(text))
}

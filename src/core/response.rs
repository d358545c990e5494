//! Discord length limits for rendered text
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Count characters instead of bytes, add per-field embed limits
//! - 1.0.0: Initial truncation helpers

/// Message content limit
pub const MESSAGE_LIMIT: usize = 2000;
/// Embed description limit
pub const EMBED_LIMIT: usize = 4096;
pub const EMBED_TITLE_LIMIT: usize = 256;
pub const EMBED_FIELD_NAME_LIMIT: usize = 256;
pub const EMBED_FIELD_VALUE_LIMIT: usize = 1024;
pub const EMBED_FOOTER_LIMIT: usize = 2048;
/// Button, select option and text input labels
pub const LABEL_LIMIT: usize = 80;

/// Truncate text to at most `limit` characters, ending in "..." when cut
pub fn truncate_to(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Truncate text to fit the embed description limit
pub fn truncate_for_embed(text: &str) -> String {
    truncate_to(text, EMBED_LIMIT)
}

/// Truncate text to fit the message content limit
pub fn truncate_for_message(text: &str) -> String {
    truncate_to(text, MESSAGE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_embed_short() {
        let text = "short text";
        assert_eq!(truncate_for_embed(text), text);
    }

    #[test]
    fn test_truncate_for_embed_long() {
        let text = "a".repeat(5000);
        let result = truncate_for_embed(&text);
        assert_eq!(result.chars().count(), EMBED_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_exactly_at_limit() {
        let text = "a".repeat(MESSAGE_LIMIT);
        assert_eq!(truncate_for_message(&text), text);
    }

    #[test]
    fn test_utf8_safety() {
        let text = "世界".repeat(100);
        let result = truncate_to(&text, 11);
        assert_eq!(result.chars().count(), 11);
        assert!(result.starts_with("世界世界"));
    }

    #[test]
    fn test_tiny_limit() {
        assert_eq!(truncate_to("abcdef", 2), "...");
    }
}

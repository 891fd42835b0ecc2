// ! Text normalization helpers for generated output
// !
// ! Generation backends frequently wrap JSON answers in a Markdown code
// ! fence even when asked not to. Stripping the fence before parsing is an
// ! explicit, tested step on the parsing path; it is a known fragility until
// ! backends can be constrained to emit bare JSON.

/// Strip a leading/trailing triple-backtick fence from generated text.
///
/// Handles bare ``` fences and language-tagged fences like ```json. Text
/// without a fence is returned trimmed but otherwise untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop an optional language tag on the opening fence line
    let body = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };

    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{"name":"Ada","email":"a@b.com"}"#;

    #[test]
    fn test_bare_text_is_trimmed_only() {
        assert_eq!(strip_code_fence(RECORD), RECORD);
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }

    #[test]
    fn test_plain_fence() {
        let fenced = format!("```\n{RECORD}\n```");
        assert_eq!(strip_code_fence(&fenced), RECORD);
    }

    #[test]
    fn test_language_tagged_fence() {
        let fenced = format!("```json\n{RECORD}\n```");
        assert_eq!(strip_code_fence(&fenced), RECORD);
    }

    #[test]
    fn test_fence_with_surrounding_whitespace() {
        let fenced = format!("\n\n```json\n{RECORD}\n```\n\n");
        assert_eq!(strip_code_fence(&fenced), RECORD);
    }

    #[test]
    fn test_unterminated_fence_still_yields_body() {
        let fenced = format!("```json\n{RECORD}");
        assert_eq!(strip_code_fence(&fenced), RECORD);
    }
}

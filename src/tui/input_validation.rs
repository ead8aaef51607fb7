//! Input normalization before dispatch, grounded in
//! `src/ui/input.rs`'s routing but adding the NFC/control-char/
//! length gate that plain-text CLI input never needed.

use crate::error::InputValidationError;
use unicode_normalization::UnicodeNormalization;

pub const MAX_INPUT_LEN: usize = 16_384;

/// Normalizes raw terminal input to Unicode NFC, strips control
/// characters other than newline/tab, and enforces a length cap.
/// Returns the failures as typed errors rather than silently truncating,
/// so the caller can surface a system message without adding the input
/// to conversation history.
pub fn normalize_input(raw: &str) -> Result<String, InputValidationError> {
    let normalized: String = raw.nfc().collect();

    if let Some(bad) = normalized.chars().find(|c| c.is_control() && *c != '\n' && *c != '\t') {
        let _ = bad;
        return Err(InputValidationError::ControlCharacter);
    }

    if normalized.len() > MAX_INPUT_LEN {
        return Err(InputValidationError::TooLong { len: normalized.len(), max: MAX_INPUT_LEN });
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_combining_characters_to_nfc() {
        let decomposed = "e\u{0301}"; // e + combining acute accent
        let result = normalize_input(decomposed).unwrap();
        assert_eq!(result, "\u{00e9}");
    }

    #[test]
    fn preserves_newlines_and_tabs() {
        let result = normalize_input("line one\n\tindented").unwrap();
        assert_eq!(result, "line one\n\tindented");
    }

    #[test]
    fn rejects_other_control_characters() {
        let err = normalize_input("hello\x07world").unwrap_err();
        assert_eq!(err, InputValidationError::ControlCharacter);
    }

    #[test]
    fn rejects_input_over_the_length_cap() {
        let huge = "a".repeat(MAX_INPUT_LEN + 1);
        let err = normalize_input(&huge).unwrap_err();
        assert_eq!(err, InputValidationError::TooLong { len: MAX_INPUT_LEN + 1, max: MAX_INPUT_LEN });
    }
}

/// Compare two secrets without short-circuiting on the first differing byte.
///
/// Length is still observable; content is not.
pub fn secure_eq(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len()
        && provided
            .as_bytes()
            .iter()
            .zip(expected.as_bytes().iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Verify an admin API key against the configured one
pub fn verify_api_key(provided: &str, expected: &str) -> bool {
    !expected.is_empty() && secure_eq(provided, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_eq_matches() {
        assert!(secure_eq("password123", "password123"));
        assert!(secure_eq("", ""));
    }

    #[test]
    fn test_secure_eq_mismatch() {
        assert!(!secure_eq("password124", "password123"));
        assert!(!secure_eq("Password123", "password123"));
    }

    #[test]
    fn test_secure_eq_different_length() {
        assert!(!secure_eq("pass", "password123"));
    }

    #[test]
    fn test_secure_eq_multibyte() {
        assert!(secure_eq("pässwörd", "pässwörd"));
        assert!(!secure_eq("pässwörd", "passwörd"));
    }

    #[test]
    fn test_verify_api_key_valid() {
        assert!(verify_api_key("test-key", "test-key"));
    }

    #[test]
    fn test_verify_api_key_invalid() {
        assert!(!verify_api_key("wrong-key", "test-key"));
    }

    #[test]
    fn test_verify_api_key_rejects_empty_expected() {
        assert!(!verify_api_key("", ""));
    }
}

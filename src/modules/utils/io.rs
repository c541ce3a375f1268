/// Helper function to validate email format
pub fn is_valid_email(email: &str) -> bool {
    // Basic shape check only; the store decides what a unique key is
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
        && !domain.contains('@')
        && email.len() >= 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        // Valid emails
        assert!(is_valid_email("admin@formease.com"));
        assert!(is_valid_email("jeff.kosi@formease.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));

        // Invalid emails
        assert!(!is_valid_email("user@example")); // Missing TLD
        assert!(!is_valid_email("user example.com")); // Contains space
        assert!(!is_valid_email("user")); // No @ symbol
        assert!(!is_valid_email("")); // Empty string
        assert!(!is_valid_email("user@@example.com")); // Multiple @ symbols
        assert!(!is_valid_email("@example.com")); // Empty local part
        assert!(!is_valid_email("user@example.")); // Trailing dot
    }
}

use regex::Regex;

pub fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,64}$")
        .map_or(false, |re| re.is_match(email))
}

/// Firebase minimum: at least 6 characters, at least one number.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 6 && password.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@domain"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn password_needs_length_and_a_digit() {
        assert!(is_valid_password("abcde1"));
        assert!(!is_valid_password("abc1"));
        assert!(!is_valid_password("abcdefgh"));
    }
}

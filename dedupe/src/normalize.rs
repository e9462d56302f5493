//! Canonical forms of the fields the matcher compares.

/// Phones with fewer digits than this are ignored by the phone pass.
pub const MIN_PHONE_DIGITS: usize = 7;

pub fn normalize_email(email: Option<&str>) -> String {
    email.map(|e| e.trim().to_lowercase()).unwrap_or_default()
}

pub fn normalize_phone(phone: Option<&str>) -> String {
    phone
        .map(|p| p.chars().filter(|c| c.is_ascii_digit()).collect())
        .unwrap_or_default()
}

/// `"first last"`, lowercased with whitespace runs collapsed.
pub fn normalize_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last)
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(Some("  A@X.com ")), "a@x.com");
        assert_eq!(normalize_email(None), "");
        assert_eq!(normalize_email(Some("   ")), "");
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(Some("(555) 123-4567")), "5551234567");
        assert_eq!(normalize_phone(Some("+1 555.123.4567 ext")), "15551234567");
        assert_eq!(normalize_phone(None), "");
        assert_eq!(normalize_phone(Some("n/a")), "");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Jon ", "  Smith  "), "jon smith");
        assert_eq!(normalize_name("Mary  Ann", "DE\tLA Cruz"), "mary ann de la cruz");
        assert_eq!(normalize_name("", ""), "");
        assert_eq!(normalize_name("Cher", ""), "cher");
    }
}

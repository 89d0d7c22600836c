/// Light-weight format checks used by the create/update handlers. Constraint
/// violations surface as 400s; the database unique indexes stay the source of
/// truth for uniqueness.

pub fn is_valid_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        _ => false,
    }
}

/// `#RGB` or `#RRGGBB`.
pub fn is_valid_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn is_valid_country_code(value: &str) -> bool {
    (2..=3).contains(&value.len()) && value.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn is_valid_username(value: &str) -> bool {
    (3..=50).contains(&value.len())
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("ops@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn hex_colors() {
        assert!(is_valid_hex_color("#fff"));
        assert!(is_valid_hex_color("#00FF7F"));
        assert!(!is_valid_hex_color("00FF7F"));
        assert!(!is_valid_hex_color("#00FF7"));
        assert!(!is_valid_hex_color("#ggg"));
    }

    #[test]
    fn country_codes() {
        assert!(is_valid_country_code("DE"));
        assert!(is_valid_country_code("DEU"));
        assert!(!is_valid_country_code("D"));
        assert!(!is_valid_country_code("DEUX"));
        assert!(!is_valid_country_code("D1"));
    }

    #[test]
    fn usernames() {
        assert!(is_valid_username("jane_doe"));
        assert!(!is_valid_username("jd"));
        assert!(!is_valid_username("jane doe"));
    }
}

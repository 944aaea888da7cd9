//! Utility functions

/// Characters the realtime tree refuses inside a single path segment.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['/', '.', '#', '$', '[', ']'];

pub fn is_valid_key_segment(s: &str) -> bool {
    !s.is_empty() && s.len() <= 768 && !s.chars().any(|c| FORBIDDEN_KEY_CHARS.contains(&c) || c.is_control())
}

pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        match local.chars().count() {
            0 => format!("***{}", domain),
            1 | 2 => format!("{}***{}", local.chars().next().unwrap_or('*'), domain),
            _ => format!("{}***{}", local.chars().take(2).collect::<String>(), domain),
        }
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_segments() {
        assert!(is_valid_key_segment("prop_1700000000000"));
        assert!(!is_valid_key_segment(""));
        assert!(!is_valid_key_segment("a/b"));
        assert!(!is_valid_key_segment("a.b"));
        assert!(!is_valid_key_segment("$id"));
    }

    #[test]
    fn masks_email() {
        assert_eq!(mask_email("jo@mail.cm"), "j***@mail.cm");
        assert_eq!(mask_email("tenant@mail.cm"), "te***@mail.cm");
        assert_eq!(mask_email("nope"), "***");
    }
}

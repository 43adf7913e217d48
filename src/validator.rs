/*
 * Responsibility
 * - collect field-attributed validation failures (first message per field wins)
 * - shape checks shared by DTOs (email, phone, website, uniqueness)
 */
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use std::sync::LazyLock;

use regex::Regex;

// local part per the HTML living standard; domain labels of 1-63 chars,
// no leading or trailing hyphen, at least one dot.
static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

// optional `+`, then digit groups separated by a single space or hyphen
static PHONE_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9]{1,4}(?:[ -]?[0-9]{1,4}){1,5}$").expect("phone pattern compiles")
});

pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &'static str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

pub fn is_email(s: &str) -> bool {
    s.len() <= 254 && EMAIL_RX.is_match(s)
}

/// 7 to 15 digits in total.
pub fn is_phone(s: &str) -> bool {
    PHONE_RX.is_match(s) && (7..=15).contains(&s.chars().filter(char::is_ascii_digit).count())
}

/// Absolute http(s) URL with a host.
pub fn is_website(s: &str) -> bool {
    url::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_per_field_wins() {
        let mut v = Validator::new();
        v.check(false, "name", "must be provided");
        v.check(false, "name", "must not be more than 200 bytes long");
        v.check(true, "email", "must be provided");

        let errors = v.into_result().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["name"], "must be provided");
    }

    #[test]
    fn email_shape() {
        assert!(is_email("anna@example.com"));
        assert!(is_email("a.b+c@sub.example.bz"));
        assert!(!is_email("anna.example.com"));
        assert!(!is_email("anna@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("anna@@example.com"));
        assert!(!is_email("anna @example.com"));
        assert!(!is_email("anna@.com"));
    }

    #[test]
    fn email_rejects_malformed_domains_and_punctuation() {
        for bad in [
            "a@b..c",
            "a@-b.c",
            "a@b-.c",
            "a<b>@c.d",
            "a@b_c.d",
            "(x)@y.z",
            "anna@example.com.",
        ] {
            assert!(!is_email(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn phone_shape() {
        assert!(is_phone("601-4111"));
        assert!(is_phone("+501 601 4111"));
        assert!(!is_phone("601"));
        assert!(!is_phone("call me"));
        assert!(!is_phone(""));
    }

    #[test]
    fn phone_rejects_stray_separators() {
        for bad in ["--- 1234567", "+ 1 2 3 4 5 6 7", "601--4111", "601-4111-", "+501 (601) 4111"] {
            assert!(!is_phone(bad), "{bad:?} should be rejected");
        }
        assert!(is_phone("+501-601-4111"));
        assert!(!is_phone("1234567890123456"));
    }

    #[test]
    fn website_shape() {
        assert!(is_website("https://appletree.edu.bz"));
        assert!(is_website("http://example.com/about"));
        assert!(!is_website("appletree.edu.bz"));
        assert!(!is_website("ftp://example.com"));
    }

    #[test]
    fn uniqueness() {
        assert!(unique(&["online", "blended"]));
        assert!(!unique(&["online", "online"]));
        assert!(unique::<&str>(&[]));
    }
}

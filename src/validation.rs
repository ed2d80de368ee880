//! Field validation rules for request payloads.

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

/// Syntactic format a string field must satisfy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Email,
    Phone,
}

/// Rule for one string field. Absent and null are treated the same.
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldRule {
    pub required: bool,
    pub format: Option<Format>,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
}

impl FieldRule {
    pub const fn optional() -> Self {
        FieldRule {
            required: false,
            format: None,
            max_length: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

/// Validate one field against its rule.
pub fn validate_field(field: &str, value: Option<&str>, rule: &FieldRule) -> Result<(), AppError> {
    let value = match value {
        Some(v) => v,
        None if rule.required => return Err(AppError::Validation(format!("{} is required", field))),
        None => return Ok(()),
    };
    if rule.required && value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if let Some(format) = rule.format {
        validate_format(field, value, format)?;
    }
    if let Some(max) = rule.max_length {
        if value.chars().count() > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

fn validate_format(field: &str, value: &str, format: Format) -> Result<(), AppError> {
    match format {
        Format::Email => {
            if !is_email(value) {
                return Err(AppError::Validation(format!("{} must be a valid email", field)));
            }
        }
        Format::Phone => {
            if !is_phone(value) {
                return Err(AppError::Validation(format!("{} must be a valid phone number", field)));
            }
        }
    }
    Ok(())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\r\n]+@[^@\r\n]+$").expect("email pattern compiles"))
}

fn phone_extension_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(ext\.|ext|x)\s*\d+$").expect("extension pattern compiles")
    })
}

fn phone_chars_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d\s\-.()]*$").expect("phone pattern compiles"))
}

/// Exactly one `@`, neither first nor last; no line breaks.
pub fn is_email(value: &str) -> bool {
    email_regex().is_match(value)
}

/// Digits, whitespace and `-.()` with at least one digit. `+` may appear anywhere;
/// a trailing `x`, `ext` or `ext.` extension is allowed.
pub fn is_phone(value: &str) -> bool {
    let without_plus = value.replace('+', "");
    let trimmed = without_plus.trim_end();
    let main = match phone_extension_regex().find(trimmed) {
        Some(ext) => &trimmed[..ext.start()],
        None => trimmed,
    };
    main.chars().any(|c| c.is_numeric()) && phone_chars_regex().is_match(main)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_email() {
        assert!(is_email("a@example.com"));
        assert!(is_email("first.last+tag@mail.example.co.uk"));
    }

    #[test]
    fn accepts_single_label_domain() {
        assert!(is_email("admin@localhost"));
        assert!(is_email("a@b"));
    }

    #[test]
    fn rejects_malformed_email() {
        assert!(!is_email("not-an-email"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("a@"));
        assert!(!is_email("a@@example.com"));
        assert!(!is_email("a@b@c"));
        assert!(!is_email("a@exa\nmple.com"));
        assert!(!is_email(""));
    }

    #[test]
    fn accepts_common_phone_shapes() {
        assert!(is_phone("+44 20 7946 0958"));
        assert!(is_phone("(555) 123-4567"));
        assert!(is_phone("555.123.4567 ext. 12"));
        assert!(is_phone("5551234567x9"));
        assert!(is_phone("555 1234 EXT 7"));
    }

    #[test]
    fn accepts_short_and_plus_anywhere_numbers() {
        assert!(is_phone("12-34"));
        assert!(is_phone("1"));
        assert!(is_phone("44+20 7946"));
        assert!(is_phone("123  "));
    }

    #[test]
    fn rejects_bad_phone() {
        assert!(!is_phone("call me"));
        assert!(!is_phone("555-CALL-NOW"));
        assert!(!is_phone("+-()"));
        assert!(!is_phone("123 ext. abc"));
        assert!(!is_phone(""));
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        let rule = FieldRule::optional().required();
        assert!(validate_field("email", None, &rule).is_err());
        assert!(validate_field("email", Some("   "), &rule).is_err());
    }

    #[test]
    fn max_length_counts_characters() {
        let rule = FieldRule::optional().max_length(3);
        assert!(validate_field("postcode", Some("äöü"), &rule).is_ok());
        assert!(validate_field("postcode", Some("äöüß"), &rule).is_err());
    }

    #[test]
    fn optional_field_absent_is_ok() {
        let rule = FieldRule::optional().format(Format::Phone);
        assert!(validate_field("phone", None, &rule).is_ok());
    }
}

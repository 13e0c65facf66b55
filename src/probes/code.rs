//! # Fixed-length codes from raw recognizer output.
//!
//! OCR output is noisy: whitespace, stray punctuation, misread letters in a
//! numeric code. [`CodeFormat`] keeps only the characters of its charset, takes
//! the first `len` of them and rejects the result when fewer remain.
//!
//! ```rust
//! use retryvisor::CodeFormat;
//!
//! let four_digits = CodeFormat::digits(4);
//! assert_eq!(four_digits.extract(" 12a3-45\n").as_deref(), Some("1234"));
//! assert_eq!(four_digits.extract("7 1"), None);
//! assert!(four_digits.accepts("0042"));
//! ```

use serde::{Deserialize, Serialize};

/// Characters a code may contain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Charset {
    /// ASCII `0-9`.
    #[default]
    Digits,
    /// ASCII letters and digits.
    Alphanumeric,
}

impl Charset {
    #[inline]
    fn contains(&self, c: char) -> bool {
        match self {
            Charset::Digits => c.is_ascii_digit(),
            Charset::Alphanumeric => c.is_ascii_alphanumeric(),
        }
    }
}

/// Shape of the code a recognizer is expected to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFormat {
    pub len: usize,
    pub charset: Charset,
}

impl CodeFormat {
    /// A numeric code of exactly `len` digits.
    pub const fn digits(len: usize) -> Self {
        Self {
            len,
            charset: Charset::Digits,
        }
    }

    /// An alphanumeric code of exactly `len` characters.
    pub const fn alphanumeric(len: usize) -> Self {
        Self {
            len,
            charset: Charset::Alphanumeric,
        }
    }

    /// Extracts a code from raw text, or `None` if it holds too few usable characters.
    pub fn extract(&self, raw: &str) -> Option<String> {
        let code: String = raw
            .chars()
            .filter(|c| self.charset.contains(*c))
            .take(self.len)
            .collect();
        (self.len > 0 && code.len() == self.len).then_some(code)
    }

    /// Whether `value` is already a complete code.
    pub fn accepts(&self, value: &str) -> bool {
        value.chars().count() == self.len && value.chars().all(|c| self.charset.contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_len_digits() {
        assert_eq!(
            CodeFormat::digits(4).extract("98765").as_deref(),
            Some("9876")
        );
    }

    #[test]
    fn too_short_is_rejected() {
        assert_eq!(CodeFormat::digits(4).extract("12 3"), None);
        assert_eq!(CodeFormat::digits(4).extract(""), None);
    }

    #[test]
    fn non_ascii_digits_are_ignored() {
        assert_eq!(CodeFormat::digits(2).extract("١٢34").as_deref(), Some("34"));
    }

    #[test]
    fn alphanumeric_keeps_letters() {
        assert_eq!(
            CodeFormat::alphanumeric(5).extract("a-B 3_c9x").as_deref(),
            Some("aB3c9")
        );
    }

    #[test]
    fn zero_length_never_extracts() {
        assert_eq!(CodeFormat::digits(0).extract("123"), None);
    }

    #[test]
    fn accepts_checks_length_and_charset() {
        let fmt = CodeFormat::digits(4);
        assert!(fmt.accepts("1234"));
        assert!(!fmt.accepts("123"));
        assert!(!fmt.accepts("12a4"));
        assert!(!fmt.accepts(""));
    }
}

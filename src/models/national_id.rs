//! National ID (RUT) value type

use std::fmt;

/// Normalized national ID: uppercase digits, `-`, check character
///
/// `12.345.678-k`, `12345678K` and `12345678-K` all normalize to `12345678-K`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NationalId(String);

impl NationalId {
    /// Normalize a raw cell value
    pub fn normalize(raw: &str) -> Self {
        let body: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_uppercase)
            .collect();

        if body.chars().count() < 2 {
            return Self(body);
        }

        let split = body.char_indices().last().map(|(i, _)| i).unwrap_or(0);
        Self(format!("{}-{}", &body[..split], &body[split..]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number part and check character
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.0.split_once('-')
    }

    /// JavaScript regex source matching this ID as printed in the portal table
    ///
    /// Tolerates thousands separators, a missing `-` and a lowercase check
    /// character, and refuses to match inside a longer digit run.
    pub fn row_pattern(&self) -> String {
        let Some((number, check)) = self.parts() else {
            return regex::escape(&self.0);
        };

        let number_pattern = number
            .chars()
            .map(|c| regex::escape(&c.to_string()))
            .collect::<Vec<_>>()
            .join(r"\.?");
        let check_pattern = if check == "K" {
            "[Kk]".to_string()
        } else {
            regex::escape(check)
        };

        format!(r"(?<!\d){}-?{}(?!\d)", number_pattern, check_pattern)
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

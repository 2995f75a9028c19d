use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Encyclopedia language edition, used verbatim as the API subdomain.
///
/// Only lowercase ASCII letters and `-` are accepted (2..=12 chars), so a
/// code can never rewrite the request host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCodeError(pub String);

impl fmt::Display for LanguageCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid language code {:?}", self.0)
    }
}

impl std::error::Error for LanguageCodeError {}

impl LanguageCode {
    /// Languages the explorer UI ships translations for.
    pub const UI_LANGUAGES: [&'static str; 3] = ["en", "de", "fr"];

    pub fn new(code: &str) -> Result<Self, LanguageCodeError> {
        let code = code.trim().to_ascii_lowercase();
        let valid_len = (2..=12).contains(&code.len());
        let valid_chars = code.bytes().all(|b| b.is_ascii_lowercase() || b == b'-');
        if !valid_len || !valid_chars || code.starts_with('-') || code.ends_with('-') {
            return Err(LanguageCodeError(code));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_ui_translation(&self) -> bool {
        Self::UI_LANGUAGES.contains(&self.0.as_str())
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self("en".to_string())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = LanguageCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for LanguageCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        LanguageCode::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// Supported site languages
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language the site is translated into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ro,
    En,
    Hu,
}

impl Language {
    /// Every supported language, default first
    pub const ALL: [Language; 3] = [Language::Ro, Language::En, Language::Hu];

    /// Language used when a key is missing from the current one
    pub const DEFAULT: Language = Language::Ro;

    pub fn code(self) -> &'static str {
        match self {
            Language::Ro => "ro",
            Language::En => "en",
            Language::Hu => "hu",
        }
    }

    /// Name of the translation file for this language
    pub fn file_name(self) -> String {
        format!("{}.json", self.code())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ro" => Ok(Language::Ro),
            "en" => Ok(Language::En),
            "hu" => Ok(Language::Hu),
            other => Err(ApiError::UnsupportedLanguage(other.to_string())),
        }
    }
}

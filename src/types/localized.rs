//! Text fields that CKAN portals publish either as a plain string or per language.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Languages tried, in order, when a single text is needed from a translated field.
pub const PREFERRED_LANGUAGES: &[&str] = &["de", "en", "fr", "it"];

/// A CKAN text field such as a title or description.
///
/// Multilingual portals send `{"de": "...", "fr": "..."}` where single
/// language ones send a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Translations(#[serde(deserialize_with = "translations")] BTreeMap<String, String>),
}

impl LocalizedText {
    /// The text in `language`. A plain string counts as every language.
    pub fn get(&self, language: &str) -> Option<&str> {
        match self {
            LocalizedText::Plain(text) => Some(text),
            LocalizedText::Translations(texts) => texts.get(language).map(String::as_str),
        }
    }

    /// A single text: the plain string, or the first translation found
    /// following [`PREFERRED_LANGUAGES`], or any translation.
    pub fn text(&self) -> Option<&str> {
        match self {
            LocalizedText::Plain(text) => Some(text),
            LocalizedText::Translations(texts) => PREFERRED_LANGUAGES
                .iter()
                .find_map(|language| texts.get(*language))
                .or_else(|| texts.values().next())
                .map(String::as_str),
        }
    }

    /// Language codes available; empty for a plain string.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        let texts = match self {
            LocalizedText::Plain(_) => None,
            LocalizedText::Translations(texts) => Some(texts),
        };
        texts.into_iter().flat_map(|texts| texts.keys().map(String::as_str))
    }
}

impl From<&str> for LocalizedText {
    fn from(text: &str) -> Self {
        LocalizedText::Plain(text.to_string())
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text().unwrap_or_default())
    }
}

/// Untranslated languages come as `null` or `""`; both are left out.
fn translations<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(language, text)| text.filter(|t| !t.is_empty()).map(|t| (language, t)))
        .collect())
}

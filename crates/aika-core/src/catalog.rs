//! ÖNACE industry categories.
//!
//! The backend lists the categories it can filter by; when that listing is
//! unavailable the client falls back to a built-in list of the most common
//! sections.

use serde::{Deserialize, Serialize};

/// Code of the category that applies to all industries.
pub const GENERAL_CODE: &str = "0";

/// An ÖNACE classification section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnaceCategory {
    pub code: String,
    pub name_german: String,
    pub name_english: String,
    #[serde(default)]
    pub description: String,
}

impl OnaceCategory {
    fn new(code: &str, name_german: &str, name_english: &str, description: &str) -> Self {
        Self {
            code: code.to_string(),
            name_german: name_german.to_string(),
            name_english: name_english.to_string(),
            description: description.to_string(),
        }
    }

    pub fn name(&self, language: Language) -> &str {
        match language {
            Language::German => &self.name_german,
            Language::English => &self.name_english,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[strum(serialize = "de", serialize = "german")]
    German,
    #[default]
    #[strum(serialize = "en", serialize = "english")]
    English,
}

/// Categories used when the backend cannot be asked. General comes first.
pub fn fallback_categories() -> Vec<OnaceCategory> {
    vec![
        OnaceCategory::new(GENERAL_CODE, "Allgemein", "General", "Applies to all industries"),
        OnaceCategory::new(
            "A",
            "Land- und Forstwirtschaft",
            "Agriculture",
            "Agriculture, Forestry, and Fishing",
        ),
        OnaceCategory::new("C", "Herstellung von Waren", "Manufacturing", "Manufacturing"),
        OnaceCategory::new(
            "K",
            "Finanz- und Versicherungsdienstleistungen",
            "Financial Services",
            "Financial and Insurance Services",
        ),
        OnaceCategory::new("F", "Bau", "Construction", "Construction"),
        OnaceCategory::new("G", "Handel", "Trade", "Trade"),
        OnaceCategory::new("H", "Verkehr und Lagerei", "Transport", "Transport and Storage"),
        OnaceCategory::new(
            "I",
            "Beherbergung und Gastronomie",
            "Hospitality",
            "Accommodation and Catering",
        ),
        OnaceCategory::new(
            "L",
            "Grundstücks- und Wohnungswesen",
            "Real Estate",
            "Real Estate Activities",
        ),
        OnaceCategory::new("D", "Energieversorgung", "Energy", "Energy Supply"),
        OnaceCategory::new(
            "E",
            "Wasserversorgung",
            "Water/Waste",
            "Water Supply and Waste Management",
        ),
    ]
}

/// The set of categories the user can choose from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    categories: Vec<OnaceCategory>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::fallback()
    }
}

impl CategoryCatalog {
    pub fn new(categories: Vec<OnaceCategory>) -> Self {
        Self { categories }
    }

    pub fn fallback() -> Self {
        Self::new(fallback_categories())
    }

    pub fn categories(&self) -> &[OnaceCategory] {
        &self.categories
    }

    pub fn get(&self, code: &str) -> Option<&OnaceCategory> {
        self.categories.iter().find(|c| c.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Display name of `code`; unknown codes are shown as-is.
    pub fn name_of<'a>(&'a self, code: &'a str, language: Language) -> &'a str {
        self.get(code).map_or(code, |c| c.name(language))
    }
}

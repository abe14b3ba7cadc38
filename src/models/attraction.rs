//! Attraction records, raw and aggregated

use serde::{Deserialize, Serialize};

/// One row of attraction data as returned by the catalog.
///
/// A single attraction usually spans several rows, one per title/text/url
/// variant. Every field may be missing.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RawAttractionRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RawAttractionRow {
    /// Row with only the attraction name set
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_city(mut self, city_name: impl Into<String>) -> Self {
        self.city_name = Some(city_name.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One logical attraction after merging all of its rows.
///
/// This is the evidence unit handed to response generation.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AggregatedAttraction {
    pub name: String,
    pub city_name: String,
    pub location: String,
    pub titles: Vec<String>,
    /// Text snippets, each capped by the aggregation budget
    pub texts: Vec<String>,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let row: RawAttractionRow = serde_json::from_str(r#"{"name": "Eram Garden"}"#).unwrap();
        assert_eq!(row.name.as_deref(), Some("Eram Garden"));
        assert!(row.city_name.is_none());
        assert!(row.url.is_none());
    }

    #[test]
    fn test_builder_sets_fields() {
        let row = RawAttractionRow::named("Persepolis")
            .with_city("Marvdasht")
            .with_title("History")
            .with_text("Ceremonial capital of the Achaemenid Empire");
        assert_eq!(row.city_name.as_deref(), Some("Marvdasht"));
        assert_eq!(row.title.as_deref(), Some("History"));
        assert!(row.location.is_none());
    }
}

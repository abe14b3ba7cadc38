use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use super::CatalogStore;
use crate::models::{BoundingBox, CityRecord, RawAttractionRow};
use crate::{Result, TravelAdviserError};

/// Catalog held in memory, loaded from a JSON document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    #[serde(default)]
    pub cities: Vec<CityRecord>,
    #[serde(default)]
    pub attractions: Vec<RawAttractionRow>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new(cities: Vec<CityRecord>, attractions: Vec<RawAttractionRow>) -> Self {
        Self {
            cities,
            attractions,
        }
    }

    /// Load and parse a catalog JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading catalog from: {:?}", path);

        let content = fs::read_to_string(path)?;
        let catalog = Self::parse_json(&content)?;

        info!(
            "Loaded {} cities and {} attraction rows",
            catalog.cities.len(),
            catalog.attractions.len()
        );
        Ok(catalog)
    }

    /// Parse catalog JSON content
    pub fn parse_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| TravelAdviserError::store(format!("Failed to parse catalog JSON: {e}")))
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_city_by_name(&self, name: &str) -> Result<Option<CityRecord>> {
        Ok(self.cities.iter().find(|city| city.name == name).cloned())
    }

    async fn find_cities_in_box(
        &self,
        bbox: &BoundingBox,
        limit: usize,
    ) -> Result<Vec<CityRecord>> {
        Ok(self
            .cities
            .iter()
            .filter(|city| bbox.contains(&city.coordinate))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_attraction_rows(
        &self,
        city_names: &[String],
        limit: usize,
    ) -> Result<Vec<RawAttractionRow>> {
        Ok(self
            .attractions
            .iter()
            .filter(|row| {
                row.city_name
                    .as_ref()
                    .is_some_and(|city| city_names.contains(city))
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CATALOG: &str = r#"{
        "cities": [
            {"name": "Shiraz", "coordinate": {"latitude": 29.6, "longitude": 52.5}},
            {"name": "Tokyo", "coordinate": {"latitude": 35.6, "longitude": 139.7}}
        ],
        "attractions": [
            {"name": "Eram Garden", "city_name": "Shiraz", "text": "Persian garden"},
            {"name": "Senso-ji", "city_name": "Tokyo"},
            {"name": "Orphan"}
        ]
    }"#;

    #[tokio::test]
    async fn test_find_city_by_exact_name() {
        let catalog = InMemoryCatalog::parse_json(CATALOG).unwrap();
        let city = catalog.find_city_by_name("Shiraz").await.unwrap();
        assert_eq!(city.unwrap().coordinate, Coordinate::new(29.6, 52.5));
        assert!(catalog.find_city_by_name("shiraz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_cities_in_box_respects_limit() {
        let catalog = InMemoryCatalog::parse_json(CATALOG).unwrap();
        let world = BoundingBox {
            min_lat: -90.0,
            max_lat: 90.0,
            min_lon: -180.0,
            max_lon: 180.0,
        };
        assert_eq!(catalog.find_cities_in_box(&world, 10).await.unwrap().len(), 2);
        assert_eq!(catalog.find_cities_in_box(&world, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_rows_filters_by_city() {
        let catalog = InMemoryCatalog::parse_json(CATALOG).unwrap();
        let rows = catalog
            .fetch_attraction_rows(&["Shiraz".to_string()], 100)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name.as_deref(), Some("Eram Garden"));
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = InMemoryCatalog::load(temp_file.path()).unwrap();
        assert_eq!(catalog.cities.len(), 2);
        assert_eq!(catalog.attractions.len(), 3);
    }

    #[test]
    fn test_file_not_found() {
        let result = InMemoryCatalog::load("nonexistent_catalog.json");
        assert!(matches!(result.unwrap_err(), TravelAdviserError::Io { .. }));
    }

    #[test]
    fn test_invalid_json_is_store_error() {
        let result = InMemoryCatalog::parse_json("{not json");
        assert!(matches!(result.unwrap_err(), TravelAdviserError::Store { .. }));
    }
}

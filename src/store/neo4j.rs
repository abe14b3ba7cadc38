use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::CatalogStore;
use crate::config::StoreConfig;
use crate::models::{BoundingBox, CityRecord, RawAttractionRow};
use crate::{Result, TravelAdviserError};

const CITY_BY_NAME: &str = "\
MATCH (n:City) WHERE n.Name = $name \
RETURN n.Name, n.lat, n.long LIMIT 1";

const CITIES_IN_BOX: &str = "\
MATCH (n:City) \
WITH n, toFloat(n.lat) AS lat, toFloat(n.long) AS lon \
WHERE lat >= $min_lat AND lat <= $max_lat \
AND lon >= $min_lon AND lon <= $max_lon \
RETURN n.Name, n.lat, n.long LIMIT $limit";

const ATTRACTIONS_IN_CITIES: &str = "\
MATCH (n:Attraction) WHERE n.city_name IN $city_names \
RETURN n.name, n.city_name, n.location, n.title, n.text, n.url LIMIT $limit";

/// Read-only catalog client for the Neo4j HTTP transactional endpoint
pub struct Neo4jHttpStore {
    client: Client,
    commit_url: String,
    user: String,
    password: Option<String>,
}

/// Body of a `tx/commit` response
#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

impl Neo4jHttpStore {
    /// Create a new client
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(concat!("travel-adviser/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TravelAdviserError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            commit_url: commit_url(&config.url, &config.database),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Run one parameterized read statement and return its rows
    async fn query(&self, statement: &str, parameters: Value) -> Result<Vec<Vec<Value>>> {
        let body = json!({
            "statements": [{ "statement": statement, "parameters": parameters }]
        });

        let response = self
            .client
            .post(&self.commit_url)
            .basic_auth(&self.user, self.password.as_ref())
            .header("access-mode", "READ")
            .json(&body)
            .send()
            .await
            .map_err(|e| TravelAdviserError::store(format!("Neo4j request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TravelAdviserError::store(format!(
                "Neo4j returned {status}: {error_text}"
            )));
        }

        let commit: CommitResponse = response
            .json()
            .await
            .map_err(|e| {
                TravelAdviserError::store(format!("Failed to parse Neo4j response: {e}"))
            })?;

        into_rows(commit)
    }
}

#[async_trait]
impl CatalogStore for Neo4jHttpStore {
    #[instrument(level = "debug", skip(self))]
    async fn find_city_by_name(&self, name: &str) -> Result<Option<CityRecord>> {
        let rows = self.query(CITY_BY_NAME, json!({ "name": name })).await?;
        Ok(rows.iter().find_map(|row| city_from_row(row)))
    }

    #[instrument(level = "debug", skip(self))]
    async fn find_cities_in_box(
        &self,
        bbox: &BoundingBox,
        limit: usize,
    ) -> Result<Vec<CityRecord>> {
        let rows = self
            .query(
                CITIES_IN_BOX,
                json!({
                    "min_lat": bbox.min_lat,
                    "max_lat": bbox.max_lat,
                    "min_lon": bbox.min_lon,
                    "max_lon": bbox.max_lon,
                    "limit": limit,
                }),
            )
            .await?;

        let cities: Vec<CityRecord> = rows.iter().filter_map(|row| city_from_row(row)).collect();
        if cities.len() < rows.len() {
            warn!(
                "Skipped {} city rows without a usable name or coordinate",
                rows.len() - cities.len()
            );
        }
        Ok(cities)
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_attraction_rows(
        &self,
        city_names: &[String],
        limit: usize,
    ) -> Result<Vec<RawAttractionRow>> {
        let rows = self
            .query(
                ATTRACTIONS_IN_CITIES,
                json!({ "city_names": city_names, "limit": limit }),
            )
            .await?;

        debug!("Fetched {} attraction rows", rows.len());
        Ok(rows.iter().map(|row| attraction_from_row(row)).collect())
    }

    async fn health_check(&self) -> Result<()> {
        self.query("RETURN 1", json!({})).await.map(|_| ())
    }
}

fn commit_url(base_url: &str, database: &str) -> String {
    format!(
        "{}/db/{}/tx/commit",
        base_url.trim_end_matches('/'),
        urlencoding::encode(database)
    )
}

fn into_rows(commit: CommitResponse) -> Result<Vec<Vec<Value>>> {
    if let Some(error) = commit.errors.first() {
        return Err(TravelAdviserError::store(format!(
            "{}: {}",
            error.code, error.message
        )));
    }

    Ok(commit
        .results
        .into_iter()
        .flat_map(|result| result.data)
        .map(|data| data.row)
        .collect())
}

fn city_from_row(row: &[Value]) -> Option<CityRecord> {
    let name = row.first().and_then(value_as_text)?;
    let latitude = row.get(1).and_then(value_as_f64)?;
    let longitude = row.get(2).and_then(value_as_f64)?;
    Some(CityRecord::new(name, latitude, longitude))
}

fn attraction_from_row(row: &[Value]) -> RawAttractionRow {
    let field = |index: usize| row.get(index).and_then(value_as_text);
    RawAttractionRow {
        name: field(0),
        city_name: field(1),
        location: field(2),
        title: field(3),
        text: field(4),
        url: field(5),
    }
}

/// Catalog coordinates were imported from CSV and may be stored as strings.
fn value_as_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(json: Value) -> CommitResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_commit_url() {
        assert_eq!(
            commit_url("http://localhost:7474/", "neo4j"),
            "http://localhost:7474/db/neo4j/tx/commit"
        );
        assert_eq!(
            commit_url("https://db.example.com", "travel data"),
            "https://db.example.com/db/travel%20data/tx/commit"
        );
    }

    #[test]
    fn test_city_rows_accept_numeric_strings() {
        let rows = into_rows(commit(json!({
            "results": [{
                "columns": ["n.Name", "n.lat", "n.long"],
                "data": [
                    { "row": ["Shiraz", 29.6, 52.5], "meta": [null, null, null] },
                    { "row": ["Marvdasht", "29.8", " 52.3 "], "meta": [null, null, null] },
                    { "row": ["Nowhere", null, 1.0], "meta": [null, null, null] }
                ]
            }],
            "errors": []
        })))
        .unwrap();

        let cities: Vec<CityRecord> = rows.iter().filter_map(|row| city_from_row(row)).collect();
        assert_eq!(
            cities,
            vec![
                CityRecord::new("Shiraz", 29.6, 52.5),
                CityRecord::new("Marvdasht", 29.8, 52.3),
            ]
        );
    }

    #[test]
    fn test_errors_become_store_failures() {
        let result = into_rows(commit(json!({
            "results": [],
            "errors": [{
                "code": "Neo.ClientError.Statement.SyntaxError",
                "message": "Invalid input"
            }]
        })));
        let err = result.unwrap_err();
        assert!(matches!(err, TravelAdviserError::Store { .. }));
        assert!(err.to_string().contains("SyntaxError"));
    }

    #[test]
    fn test_attraction_row_mapping() {
        let row = vec![
            json!("Persepolis"),
            json!("Marvdasht"),
            Value::Null,
            json!("Overview"),
            json!("Ceremonial capital"),
            json!("https://example.com/persepolis"),
        ];
        let attraction = attraction_from_row(&row);
        assert_eq!(attraction.name.as_deref(), Some("Persepolis"));
        assert!(attraction.location.is_none());
        assert_eq!(attraction.url.as_deref(), Some("https://example.com/persepolis"));
    }

    #[test]
    fn test_short_rows_leave_fields_empty() {
        let attraction = attraction_from_row(&[json!("Eram Garden")]);
        assert_eq!(attraction, RawAttractionRow::named("Eram Garden"));
    }

    #[test]
    fn test_box_query_converts_string_coordinates() {
        assert!(CITIES_IN_BOX.contains("toFloat(n.lat) AS lat"));
        assert!(CITIES_IN_BOX.contains("toFloat(n.long) AS lon"));
        assert!(CITIES_IN_BOX.contains("lat >= $min_lat AND lat <= $max_lat"));
        assert!(CITIES_IN_BOX.contains("lon >= $min_lon AND lon <= $max_lon"));
        assert!(!CITIES_IN_BOX.contains("n.lat >="));
    }

    #[test]
    fn test_client_creation() {
        let store = Neo4jHttpStore::new(&StoreConfig::default()).unwrap();
        assert_eq!(store.commit_url, "http://localhost:7474/db/neo4j/tx/commit");
    }
}

//! Catalog store access
//!
//! The city and attraction catalog lives in an external graph store and is
//! read-only from this crate. Components receive an `Arc<dyn CatalogStore>`
//! at construction time.

use async_trait::async_trait;

use crate::Result;
use crate::models::{BoundingBox, CityRecord, RawAttractionRow};

pub mod memory;
pub mod neo4j;

pub use memory::InMemoryCatalog;
pub use neo4j::Neo4jHttpStore;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Exact-name city lookup
    async fn find_city_by_name(&self, name: &str) -> Result<Option<CityRecord>>;

    /// Cities whose coordinate lies inside `bbox`, at most `limit` of them
    async fn find_cities_in_box(&self, bbox: &BoundingBox, limit: usize)
    -> Result<Vec<CityRecord>>;

    /// Attraction rows belonging to any of `city_names`, at most `limit` rows
    async fn fetch_attraction_rows(
        &self,
        city_names: &[String],
        limit: usize,
    ) -> Result<Vec<RawAttractionRow>>;

    /// Check that the store is reachable
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

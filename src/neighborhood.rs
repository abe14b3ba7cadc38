//! Neighborhood resolution
//!
//! Resolves a destination name to its catalog record and collects the cities
//! that lie within the configured radius around it.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::Result;
use crate::geo::GeoBoxResolver;
use crate::models::CityRecord;
use crate::store::CatalogStore;

/// Finds catalog cities around a named destination
pub struct CityNeighborhoodFinder {
    store: Arc<dyn CatalogStore>,
    radius_km: f64,
    limit: usize,
}

impl CityNeighborhoodFinder {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, radius_km: f64, limit: usize) -> Self {
        Self {
            store,
            radius_km,
            limit,
        }
    }

    /// Cities near `city_name`, at most `limit` of them.
    ///
    /// An unknown city yields an empty list. The destination itself is always
    /// part of a non-empty result; other cities keep the store's order.
    #[instrument(skip(self))]
    pub async fn find_neighbors(&self, city_name: &str) -> Result<Vec<CityRecord>> {
        let Some(city) = self.store.find_city_by_name(city_name).await? else {
            debug!("City {} is not in the catalog", city_name);
            return Ok(Vec::new());
        };

        debug!(
            "Resolved {} at ({})",
            city.name,
            city.coordinate.format_coordinates()
        );

        let bbox = GeoBoxResolver::resolve(city.coordinate, self.radius_km);
        let mut neighbors = self.store.find_cities_in_box(&bbox, self.limit).await?;

        if !neighbors.iter().any(|neighbor| neighbor.name == city.name) {
            neighbors.insert(0, city);
        }
        neighbors.truncate(self.limit);

        debug!("Found {} cities within {}km", neighbors.len(), self.radius_km);
        Ok(neighbors)
    }
}

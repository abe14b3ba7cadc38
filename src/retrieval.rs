//! Retrieval pipeline
//!
//! Turns a question and its conversation into the evidence handed to answer
//! generation: trip intent, neighboring cities and aggregated attractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::Result;
use crate::aggregate::AttractionAggregator;
use crate::config::RetrievalConfig;
use crate::intent::TripIntentExtractor;
use crate::llm::LanguageModel;
use crate::models::{AggregatedAttraction, ConversationState, TripIntent};
use crate::neighborhood::CityNeighborhoodFinder;
use crate::store::CatalogStore;

/// Result of one retrieval run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalOutcome {
    /// Intent with the effective stay duration
    pub intent: TripIntent,
    /// Names of the cities whose attractions were considered
    pub neighbor_cities: Vec<String>,
    /// Evidence for generation, at most two per day of stay
    pub attractions: Vec<AggregatedAttraction>,
    pub generated_at: DateTime<Utc>,
}

impl RetrievalOutcome {
    /// Outcome without any evidence
    #[must_use]
    pub fn empty(intent: TripIntent) -> Self {
        Self {
            intent,
            neighbor_cities: Vec::new(),
            attractions: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attractions.is_empty()
    }
}

/// Limits applied by the orchestrator
#[derive(Debug, Clone, Copy)]
pub struct RetrievalLimits {
    pub max_attraction_rows: usize,
    pub hard_limit_records: usize,
    pub default_stay_days: u32,
}

impl From<&RetrievalConfig> for RetrievalLimits {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            max_attraction_rows: config.max_attraction_rows as usize,
            hard_limit_records: config.hard_limit_records as usize,
            default_stay_days: config.default_stay_days,
        }
    }
}

impl RetrievalLimits {
    /// Attractions allowed for a stay of `days`
    #[must_use]
    pub fn record_limit(&self, days: u32) -> usize {
        (days as usize)
            .saturating_mul(2)
            .min(self.hard_limit_records)
    }
}

/// Runs intent extraction, neighborhood lookup and aggregation in sequence
pub struct RetrievalOrchestrator {
    extractor: TripIntentExtractor,
    finder: CityNeighborhoodFinder,
    store: Arc<dyn CatalogStore>,
    aggregator: AttractionAggregator,
    limits: RetrievalLimits,
}

impl RetrievalOrchestrator {
    #[must_use]
    pub fn new(
        extractor: TripIntentExtractor,
        finder: CityNeighborhoodFinder,
        store: Arc<dyn CatalogStore>,
        aggregator: AttractionAggregator,
        limits: RetrievalLimits,
    ) -> Self {
        Self {
            extractor,
            finder,
            store,
            aggregator,
            limits,
        }
    }

    /// Wire the pipeline from shared collaborators and configuration
    #[must_use]
    pub fn from_config(
        store: Arc<dyn CatalogStore>,
        llm: Arc<dyn LanguageModel>,
        config: &RetrievalConfig,
    ) -> Self {
        let finder = CityNeighborhoodFinder::new(
            Arc::clone(&store),
            config.search_radius_km,
            config.max_neighbor_cities as usize,
        );
        Self::new(
            TripIntentExtractor::new(llm),
            finder,
            store,
            AttractionAggregator::default(),
            RetrievalLimits::from(config),
        )
    }

    /// Collect evidence for `question`.
    ///
    /// A question without a usable destination, or whose destination is not
    /// in the catalog, yields an empty outcome rather than an error.
    #[instrument(skip(self, question, conversation), fields(session_id = %conversation.session_id))]
    pub async fn run(
        &self,
        question: &str,
        conversation: &ConversationState,
    ) -> Result<RetrievalOutcome> {
        let mut intent = self.extractor.extract(question, conversation).await?;

        let Some(destination) = intent.destination_city.clone() else {
            debug!("No usable destination, returning empty outcome");
            return Ok(RetrievalOutcome::empty(intent));
        };

        if intent.stay_duration_days == 0 {
            intent.stay_duration_days = self.limits.default_stay_days;
        }
        let record_limit = self.limits.record_limit(intent.stay_duration_days);

        let neighbors = self.finder.find_neighbors(&destination).await?;
        if neighbors.is_empty() {
            debug!("No catalog cities around {}", destination);
            return Ok(RetrievalOutcome::empty(intent));
        }

        let neighbor_cities: Vec<String> = neighbors.into_iter().map(|city| city.name).collect();
        let rows = self
            .store
            .fetch_attraction_rows(&neighbor_cities, self.limits.max_attraction_rows)
            .await?;

        let mut attractions = self.aggregator.aggregate(&rows);
        attractions.truncate(record_limit);

        info!(
            "Retrieved {} attractions for {} ({} days) from {} rows across {} cities",
            attractions.len(),
            destination,
            intent.stay_duration_days,
            rows.len(),
            neighbor_cities.len()
        );

        Ok(RetrievalOutcome {
            intent,
            neighbor_cities,
            attractions,
            generated_at: Utc::now(),
        })
    }
}

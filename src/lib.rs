//! Travel adviser retrieval backend
//!
//! Resolves what trip a user is asking about, finds the catalog cities around
//! the destination and condenses their attractions into evidence for answer
//! generation.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod intent;
pub mod llm;
pub mod logging;
pub mod models;
pub mod neighborhood;
pub mod retrieval;
pub mod session;
pub mod store;
pub mod web;

// Re-export core types for public API
pub use aggregate::{AggregatedTextBudget, AttractionAggregator};
pub use config::AdviserConfig;
pub use error::TravelAdviserError;
pub use geo::GeoBoxResolver;
pub use intent::{IntentSignals, TripIntentExtractor};
pub use llm::{GenerationRequest, LanguageModel, OpenAiChatClient};
pub use models::{
    AggregatedAttraction, BoundingBox, ChatMessage, ChatRole, CityRecord, ConversationState,
    Coordinate, RawAttractionRow, TripIntent,
};
pub use neighborhood::CityNeighborhoodFinder;
pub use retrieval::{RetrievalLimits, RetrievalOrchestrator, RetrievalOutcome};
pub use store::{CatalogStore, InMemoryCatalog, Neo4jHttpStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TravelAdviserError>;

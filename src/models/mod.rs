//! Data models for the travel adviser
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates, bounding boxes and catalog cities
//! - Attraction: raw catalog rows and merged attractions
//! - Intent: destination and stay duration extracted from a conversation
//! - Conversation: the per-request chat snapshot

pub mod attraction;
pub mod conversation;
pub mod intent;
pub mod location;

// Re-export all public types for convenient access
pub use attraction::{AggregatedAttraction, RawAttractionRow};
pub use conversation::{ChatMessage, ChatRole, ConversationState};
pub use intent::TripIntent;
pub use location::{BoundingBox, CityRecord, Coordinate};

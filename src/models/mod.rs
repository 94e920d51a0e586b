mod recommendation;
mod visit;

pub use recommendation::{EnrichedRecommendation, FreshnessWindow, Recommendation};
pub use visit::{NewVisit, Rating, Visit, VisitWithVenue};

/// Venue metadata returned by the venue provider, keyed by field name
pub type VenueDetails = serde_json::Map<String, serde_json::Value>;

pub mod badges;
pub mod gamification;
pub mod learners;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod state;

// Re-export the router builder to make it easily accessible
// to the binary and the integration tests.
pub use middleware::require_identity;
pub use router::build_router;

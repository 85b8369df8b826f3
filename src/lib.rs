pub mod burndown;
pub mod burndown_config;
pub mod calendar;
pub mod capacity;
pub mod config;
pub mod effort;
pub mod errors;
pub mod forecast;
pub mod init;
pub mod project;
pub mod projector;
pub mod roles;

// Re-export the projection entry points
pub use projector::{DeliveryProjection, DeliveryProjector, ProjectionInput};

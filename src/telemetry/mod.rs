mod publisher;
mod snapshot;

pub use publisher::{TelemetryConfig, TelemetryFeed, TelemetryPublisher};
pub use snapshot::{TelemetrySnapshot, WIRE_FIELD_COUNT};

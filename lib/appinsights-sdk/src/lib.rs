pub mod client;
pub mod connection_string;
pub mod envelope;
pub mod error;
pub mod in_memory;
pub mod ingestion;
pub mod telemetry;

pub use client::TelemetryClient;
pub use connection_string::ConnectionString;
pub use error::TelemetryError;
pub use in_memory::InMemoryTelemetryClient;
pub use ingestion::{builder::AppInsightsClientBuilder, client::AppInsightsClient};
pub use telemetry::{EventTelemetry, ExceptionDetails, ExceptionTelemetry, PropertyBag};

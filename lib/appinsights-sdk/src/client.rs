use crate::{
    error::TelemetryError,
    telemetry::{EventTelemetry, ExceptionTelemetry},
};

/// Submission side of a telemetry client.
///
/// Both calls must return without waiting for network delivery. Implementations
/// queue the record and ship it on their own schedule.
pub trait TelemetryClient: Send + Sync {
    fn track_event(&self, event: EventTelemetry) -> Result<(), TelemetryError>;
    fn track_exception(&self, exception: ExceptionTelemetry) -> Result<(), TelemetryError>;
}

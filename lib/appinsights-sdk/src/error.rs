use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("missing instrumentation key")]
    MissingInstrumentationKey,
    #[error("invalid connection string segment: '{0}'")]
    InvalidConnectionString(String),
    #[error("unable to serialize telemetry property: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unable to acquire lock: {0}")]
    Lock(String),
    #[error("unable to instantiate the http client for telemetry sending: {0}")]
    HTTPClientCreationError(reqwest::Error),
    #[error("unable to send telemetry: rejected as invalid: {0}")]
    BadRequest(String),
    #[error("unable to send telemetry: unauthorized")]
    Unauthorized,
    #[error("unable to send telemetry: no access")]
    Forbidden,
    #[error("unable to send telemetry: rate limited")]
    RateLimited,
    #[error("unable to send telemetry: {0}")]
    Unknown(String),
}

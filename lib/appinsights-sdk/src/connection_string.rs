use std::str::FromStr;

use crate::error::TelemetryError;

pub static DEFAULT_INGESTION_ENDPOINT: &str = "https://dc.services.visualstudio.com";

/// Parsed form of an Application Insights connection string,
/// e.g. `InstrumentationKey=00000000-0000-0000-0000-000000000000;IngestionEndpoint=https://westeurope-5.in.applicationinsights.azure.com/`.
///
/// A value without any `=` is taken as a bare instrumentation key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionString {
    pub instrumentation_key: String,
    pub ingestion_endpoint: String,
}

impl ConnectionString {
    /// The batch ingestion URL.
    pub fn track_url(&self) -> String {
        format!("{}/v2.1/track", self.ingestion_endpoint.trim_end_matches('/'))
    }
}

impl FromStr for ConnectionString {
    type Err = TelemetryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(TelemetryError::MissingInstrumentationKey);
        }
        if !value.contains('=') {
            return Ok(Self {
                instrumentation_key: value.to_string(),
                ingestion_endpoint: DEFAULT_INGESTION_ENDPOINT.to_string(),
            });
        }

        let mut instrumentation_key = None;
        let mut ingestion_endpoint = None;
        let mut endpoint_suffix = None;
        let mut location = None;

        for segment in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, val) = segment
                .split_once('=')
                .ok_or_else(|| TelemetryError::InvalidConnectionString(segment.to_string()))?;
            let val = val.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "instrumentationkey" => instrumentation_key = Some(val.to_string()),
                "ingestionendpoint" => ingestion_endpoint = Some(val.to_string()),
                "endpointsuffix" => endpoint_suffix = Some(val.trim_matches('.').to_string()),
                "location" => location = Some(val.trim_matches('.').to_string()),
                // Other services (live metrics, profiler, ...) are not used here.
                _ => {}
            }
        }

        let instrumentation_key = instrumentation_key
            .filter(|key| !key.is_empty())
            .ok_or(TelemetryError::MissingInstrumentationKey)?;

        let ingestion_endpoint = match (ingestion_endpoint, endpoint_suffix) {
            (Some(endpoint), _) => endpoint,
            (None, Some(suffix)) => match location {
                Some(location) => format!("https://{}.dc.{}", location, suffix),
                None => format!("https://dc.{}", suffix),
            },
            (None, None) => DEFAULT_INGESTION_ENDPOINT.to_string(),
        };

        Ok(Self {
            instrumentation_key,
            ingestion_endpoint,
        })
    }
}

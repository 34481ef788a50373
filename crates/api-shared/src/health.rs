use crate::types::HealthRes;

/// Simple health service for the REST API
///
/// This service provides a standardised way to report that the analysis API is up. It does not
/// contact the completion backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Temporal analysis API is running. POST to /analyze to analyze text.".into(),
        }
    }
}

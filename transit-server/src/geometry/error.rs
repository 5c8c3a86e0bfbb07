//! Geometry provider error types.

/// Errors from a routing provider.
///
/// None of these reach the caller of the planner: the guarded provider
/// replaces a failed lookup with a straight-line estimate.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// HTTP request failed (network error, connect timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error status
    #[error("routing API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Provider answered but found no route
    #[error("no route: {code}")]
    NoRoute { code: String },

    /// Call did not finish in time
    #[error("routing call timed out after {ms} ms")]
    Timeout { ms: u64 },

    /// Provider is shutting down
    #[error("routing provider unavailable")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GeometryError::Api {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "routing API error 503: Service Unavailable");

        let err = GeometryError::NoRoute {
            code: "NoSegment".into(),
        };
        assert_eq!(err.to_string(), "no route: NoSegment");

        let err = GeometryError::Timeout { ms: 3000 };
        assert_eq!(err.to_string(), "routing call timed out after 3000 ms");
    }
}

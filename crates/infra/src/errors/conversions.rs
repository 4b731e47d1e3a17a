//! Conversions from external infrastructure errors into domain errors.

use feedstream_domain::FeedError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FeedError);

impl From<InfraError> for FeedError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FeedError> for InfraError {
    fn from(value: FeedError) -> Self {
        InfraError(value)
    }
}

trait IntoFeedError {
    fn into_feed_error(self) -> FeedError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FeedError */
/* -------------------------------------------------------------------------- */

impl IntoFeedError for HttpError {
    fn into_feed_error(self) -> FeedError {
        if self.is_timeout() {
            return FeedError::transport(format!("HTTP request timed out: {self}"), None);
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return FeedError::transport(format!("HTTP connection failure: {self}"), None);
        }

        if self.is_builder() {
            return FeedError::Configuration(format!("invalid HTTP request: {self}"));
        }

        FeedError::transport(self, None)
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_feed_error())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

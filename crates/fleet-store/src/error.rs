//! Error types for fleet-store.

/// Result type for fleet-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error produced by a backend driver, passed through untouched.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in fleet-store.
///
/// An empty result set is never an error: list operations return an empty
/// `Vec` and the latest-reading lookup returns `None`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend failed to execute a statement (connectivity, malformed
    /// query, driver timeout). Not retried.
    #[error("Backend error: {0}")]
    Backend(#[source] BackendError),

    /// A mandatory column was null or absent in a returned row.
    #[error("Missing value for column {column}")]
    MissingColumn { column: String },

    /// A column held a value of a different type than requested.
    #[error("Column {column} is not a {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    /// Filter text rejected because it would escape the statement literal.
    #[error("Unsafe filter expression: {0}")]
    UnsafeFilter(String),

    /// Vehicle identifier rejected for the same reason as
    /// [`Error::UnsafeFilter`].
    #[error("Unsafe vehicle id: {0}")]
    UnsafeVehicleId(String),
}

impl Error {
    /// Wrap a driver error.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BackendError>,
    {
        Error::Backend(err.into())
    }

    /// Shorthand for [`Error::MissingColumn`].
    pub fn missing(column: &str) -> Self {
        Error::MissingColumn {
            column: column.to_string(),
        }
    }
}

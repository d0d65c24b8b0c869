//! Standard error response body.

use serde::{Deserialize, Serialize};

/// The JSON body returned for all error responses.
///
/// ```json
/// { "error": "cannot delete the last remaining version", "code": "last_version" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub error: String,

    /// Machine-readable error code.
    ///
    /// | `code` | HTTP status |
    /// |--------|------------|
    /// | `invalid_json` | 400 |
    /// | `invalid_parameter` | 400 |
    /// | `not_found` | 404 |
    /// | `id_conflict` | 409 |
    /// | `last_version` | 409 |
    /// | `revision_pending` | 409 |
    /// | `persistence_failed` | 500 |
    /// | `internal_error` | 500 |
    pub code: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a static code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
        }
    }
}

/// Well-known error codes.
pub mod codes {
    pub const INVALID_JSON: &str = "invalid_json";
    pub const INVALID_PARAMETER: &str = "invalid_parameter";
    pub const NOT_FOUND: &str = "not_found";
    pub const ID_CONFLICT: &str = "id_conflict";
    pub const LAST_VERSION: &str = "last_version";
    pub const REVISION_PENDING: &str = "revision_pending";
    pub const PERSISTENCE_FAILED: &str = "persistence_failed";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

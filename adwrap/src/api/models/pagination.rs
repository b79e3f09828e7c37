use serde::Deserialize;
use utoipa::IntoParams;

/// Standard pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(default)]
pub struct Pagination {
    /// Number of records to skip
    pub skip: i64,
    /// Maximum number of records to return
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}
